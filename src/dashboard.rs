//! Single-pass sales aggregation for the back-office dashboard.

use std::collections::BTreeMap;

use chrono::Datelike;
use tracing::warn;

use crate::orders::{parse_display_date, Order};

/// Aggregated sales buckets over a set of fetched orders.
///
/// Keys follow the dashboard's historical conventions: plain years,
/// zero-padded `YYYY-MM` months and `YYYY-MM-DD` days, and the literal
/// `totalAmount` string for the distribution breakdown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesSummary {
    pub yearly_totals: BTreeMap<i32, f64>,
    pub yearly_order_counts: BTreeMap<i32, u64>,
    pub monthly_totals: BTreeMap<String, f64>,
    pub daily_totals: BTreeMap<String, f64>,
    pub amount_distribution: BTreeMap<String, u64>,
}

impl SalesSummary {
    /// Orders that made it into the buckets.
    pub fn order_count(&self) -> u64 {
        self.yearly_order_counts.values().sum()
    }
}

/// Bucket every order by year, year-month, and year-month-day in one pass.
///
/// Orders whose date or total fails to parse are skipped with a warning
/// rather than aborting the aggregation.
pub fn summarize<'a, I>(orders: I) -> SalesSummary
where
    I: IntoIterator<Item = &'a Order>,
{
    let mut summary = SalesSummary::default();

    for order in orders {
        let Some(date) = parse_display_date(&order.date) else {
            warn!(
                order_number = order.order_number,
                date = %order.date,
                "skipping order with unparseable date"
            );
            continue;
        };
        let total: f64 = match order.total_amount.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(
                    order_number = order.order_number,
                    total_amount = %order.total_amount,
                    "skipping order with unparseable total"
                );
                continue;
            }
        };

        let year = date.year();
        let month_key = format!("{year}-{:02}", date.month());
        let day_key = format!("{month_key}-{:02}", date.day());

        *summary.yearly_totals.entry(year).or_insert(0.0) += total;
        *summary.yearly_order_counts.entry(year).or_insert(0) += 1;
        *summary.monthly_totals.entry(month_key).or_insert(0.0) += total;
        *summary.daily_totals.entry(day_key).or_insert(0.0) += total;
        *summary
            .amount_distribution
            .entry(order.total_amount.clone())
            .or_insert(0) += 1;
    }

    summary
}
