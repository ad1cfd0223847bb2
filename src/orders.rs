//! Persisted order records and display-date helpers.

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::cart::OrderLine;

/// An immutable, persisted order.
///
/// `total_amount` keeps the exact two-decimal string captured at checkout;
/// the history browser and dashboard treat it as the value of record so a
/// re-fetched order reproduces the amount the customer was charged,
/// digit for digit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Display date, D/M/YYYY.
    pub date: String,
    pub order_number: u64,
    pub items: Vec<OrderLine>,
    pub total_amount: String,
}

/// One page of order history: orders keyed by their store-assigned id, in
/// backend order, plus the continuation cursor for the next page.
#[derive(Debug, Clone, Default)]
pub struct OrderPage {
    pub orders: Vec<(String, Order)>,
    pub next_cursor: Option<String>,
}

/// Format a date the way receipts and order cards show it: D/M/YYYY with
/// no zero padding.
pub fn display_date(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.day(), date.month(), date.year())
}

/// Today's display date in local time.
pub fn today_display_date() -> String {
    display_date(Local::now().date_naive())
}

/// Parse a D/M/YYYY display date. Zero-padded fields are accepted too.
pub fn parse_display_date(raw: &str) -> Option<NaiveDate> {
    let mut parts = raw.trim().splitn(3, '/');
    let day: u32 = parts.next()?.trim().parse().ok()?;
    let month: u32 = parts.next()?.trim().parse().ok()?;
    let year: i32 = parts.next()?.trim().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
