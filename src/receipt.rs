//! Receipt derivation for the external print bridge.
//!
//! The bridge owns layout and the physical printer; the engine only ships
//! the per-line GST expansion and the grand total in the bridge's wire
//! shape.

use serde::{Deserialize, Serialize};

use crate::cart::OrderLine;

/// One printed line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub name: String,
    pub qty: f64,
    pub price: f64,
    /// GST percentage, 0 when the item carries none.
    pub gst: f64,
    /// qty x price, increased by this line's GST.
    pub amount_with_gst: f64,
}

/// The full print job payload: lines plus tax-inclusive total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub items: Vec<ReceiptLine>,
    pub total: f64,
}

impl Receipt {
    /// Derive a receipt from cart or order lines.
    pub fn from_lines(lines: &[OrderLine]) -> Self {
        let items: Vec<ReceiptLine> = lines
            .iter()
            .map(|line| ReceiptLine {
                name: line.item.name.clone(),
                qty: line.quantity,
                price: line.item.price,
                gst: line.item.tax_percentage_or_zero(),
                amount_with_gst: line.amount_with_tax(),
            })
            .collect();
        let total = items.iter().map(|line| line.amount_with_gst).sum();
        Self { items, total }
    }
}
