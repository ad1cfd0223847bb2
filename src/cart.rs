//! Cart ledger: the mutable, session-scoped sequence of pending order lines.
//!
//! The ledger is owned by a single checkout session and never persisted;
//! it is cleared after a successful checkout or an explicit reset. Totals
//! are computed without intermediate rounding; two-decimal formatting is
//! presentation's job.

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogItem;
use crate::error::EngineError;

/// A pending line: a catalog item snapshot and its accumulated quantity.
///
/// Serializes flat (item fields plus `qty`) to match the shape persisted
/// orders have always carried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    #[serde(flatten)]
    pub item: CatalogItem,
    #[serde(rename = "qty")]
    pub quantity: f64,
}

impl OrderLine {
    /// Line amount before tax.
    pub fn amount(&self) -> f64 {
        self.item.price * self.quantity
    }

    /// Line amount including this line's GST.
    pub fn amount_with_tax(&self) -> f64 {
        let amount = self.amount();
        amount + amount * self.item.tax_percentage_or_zero() / 100.0
    }
}

/// How the operator resolved a quantity for a custom-quantity item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuantityInput {
    /// A count (or weight) entered directly.
    Count(f64),
    /// A target spend amount, converted through the unit price.
    Spend(f64),
    /// One of the item's predefined quantities, by position.
    Preset(usize),
}

/// Resolve a [`QuantityInput`] against an item before it may be added.
///
/// Spend conversion requires a positive unit price and fails with
/// [`EngineError::InvalidPriceForConversion`] otherwise, before any ledger
/// mutation. Preset selection must name an existing entry.
pub fn resolve_quantity(item: &CatalogItem, input: QuantityInput) -> Result<f64, EngineError> {
    match input {
        QuantityInput::Count(quantity) => Ok(quantity),
        QuantityInput::Spend(amount) => {
            if !item.price.is_finite() || item.price <= 0.0 {
                return Err(EngineError::InvalidPriceForConversion);
            }
            Ok(amount / item.price)
        }
        QuantityInput::Preset(index) => item
            .predefined_quantities
            .as_ref()
            .and_then(|presets| presets.get(index).copied())
            .ok_or(EngineError::PresetUnavailable(index)),
    }
}

/// Insertion-ordered collection of pending order lines, at most one line
/// per catalog item id.
#[derive(Debug, Default)]
pub struct CartLedger {
    lines: Vec<OrderLine>,
}

impl CartLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` of `item`, accumulating onto an existing line for the
    /// same id or appending a new line at the end.
    ///
    /// Non-positive (or non-finite) quantities are discarded silently.
    pub fn add_line(&mut self, item: &CatalogItem, quantity: f64) {
        if !quantity.is_finite() || quantity <= 0.0 {
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|line| line.item.id == item.id) {
            line.quantity += quantity;
        } else {
            self.lines.push(OrderLine {
                item: item.clone(),
                quantity,
            });
        }
    }

    /// Reduce the matching line's quantity by exactly 1, removing the line
    /// once it drops to zero or below. No-op on an unknown id.
    pub fn decrement_one(&mut self, item_id: &str) {
        if let Some(line) = self.lines.iter_mut().find(|line| line.item.id == item_id) {
            line.quantity -= 1.0;
            if line.quantity <= 0.0 {
                self.remove_line(item_id);
            }
        }
    }

    /// Remove the matching line unconditionally. No-op if absent.
    pub fn remove_line(&mut self, item_id: &str) {
        self.lines.retain(|line| line.item.id != item_id);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of line amounts, optionally adding each line's GST.
    pub fn total(&self, tax_inclusive: bool) -> f64 {
        self.lines
            .iter()
            .map(|line| {
                if tax_inclusive {
                    line.amount_with_tax()
                } else {
                    line.amount()
                }
            })
            .sum()
    }
}
