//! Catalog item model, boundary validation, and the in-memory catalog cache.
//!
//! The cache is a read-only snapshot of sellable items refreshed from the
//! external catalog store on demand. Lookups and search are pure projections
//! over the snapshot and never trigger a reload.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::EngineError;
use crate::stores::CatalogStore;

/// How a quantity is chosen when the item is rung up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QuantityMode {
    /// One unit per tap.
    #[default]
    #[serde(rename = "no")]
    Fixed,
    /// The operator resolves a quantity first (count, spend, or preset).
    #[serde(rename = "yes")]
    Custom,
}

/// A sellable item as the catalog store hands it out.
///
/// `price` is the unit price, tax-exclusive whenever `tax_percentage` is
/// present. The id is assigned by the store on create and is empty on
/// records that have not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub custom_quantity: QuantityMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predefined_quantities: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_percentage: Option<f64>,
}

impl CatalogItem {
    /// This line's GST percentage, treating an absent value as 0%.
    pub fn tax_percentage_or_zero(&self) -> f64 {
        self.tax_percentage.unwrap_or(0.0)
    }

    /// Validate the record before it crosses the store boundary.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.name.trim().is_empty() {
            return Err(EngineError::InvalidRecord("item name is required".into()));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(EngineError::InvalidRecord(
                "item price must be a non-negative number".into(),
            ));
        }
        if let Some(tax) = self.tax_percentage {
            if !tax.is_finite() || !(0.0..=99.0).contains(&tax) {
                return Err(EngineError::InvalidRecord(
                    "tax percentage must lie in 0..=99".into(),
                ));
            }
        }
        if let Some(presets) = &self.predefined_quantities {
            if presets.iter().any(|q| !q.is_finite() || *q < 0.0) {
                return Err(EngineError::InvalidRecord(
                    "predefined quantities must be non-negative".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Coarse cache status for the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogState {
    /// Never loaded.
    Empty,
    /// Holding a snapshot from the last successful load.
    Ready,
    /// Last load failed; any previous snapshot is still served.
    Unavailable,
}

/// In-memory snapshot of the catalog.
#[derive(Debug)]
pub struct CatalogCache {
    items: Vec<CatalogItem>,
    state: CatalogState,
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogCache {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            state: CatalogState::Empty,
        }
    }

    /// Replace the snapshot with a fresh load from the store.
    ///
    /// The swap happens only after the full item list arrived, so readers
    /// never observe a partially-applied refresh. On failure the previous
    /// snapshot is retained and the state flips to [`CatalogState::Unavailable`].
    pub async fn load(&mut self, store: &dyn CatalogStore) -> Result<usize, EngineError> {
        match store.list_items().await {
            Ok(fresh) => {
                let count = fresh.len();
                self.items = fresh;
                self.state = CatalogState::Ready;
                info!(items = count, "catalog cache refreshed");
                Ok(count)
            }
            Err(error) => {
                warn!(error = %error, "catalog load failed, keeping previous snapshot");
                self.state = CatalogState::Unavailable;
                Err(EngineError::CatalogUnavailable(error))
            }
        }
    }

    pub fn find_by_id(&self, id: &str) -> Option<&CatalogItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Case-insensitive substring search over item names. An empty term
    /// matches everything.
    pub fn search(&self, term: &str) -> Vec<&CatalogItem> {
        let needle = term.trim().to_lowercase();
        self.items
            .iter()
            .filter(|item| item.name.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn state(&self) -> CatalogState {
        self.state
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, name: &str, price: f64, tax: Option<f64>) -> CatalogItem {
        CatalogItem {
            id: id.to_string(),
            name: name.to_string(),
            price,
            custom_quantity: QuantityMode::Fixed,
            predefined_quantities: None,
            unit: None,
            tax_percentage: tax,
        }
    }

    #[test]
    fn custom_quantity_round_trips_as_yes_no() {
        let mut weighed = item("i1", "Chicken Leg", 290.0, Some(5.0));
        weighed.custom_quantity = QuantityMode::Custom;
        weighed.predefined_quantities = Some(vec![0.25, 0.5, 1.0]);
        weighed.unit = Some("kg".to_string());

        let json = serde_json::to_value(&weighed).expect("serialize item");
        assert_eq!(json["customQuantity"], "yes");
        assert_eq!(json["predefinedQuantities"][1], 0.5);
        assert_eq!(json["taxPercentage"], 5.0);

        let parsed: CatalogItem = serde_json::from_value(json).expect("parse item");
        assert_eq!(parsed, weighed);
    }

    #[test]
    fn absent_optional_fields_parse_with_defaults() {
        let parsed: CatalogItem =
            serde_json::from_value(serde_json::json!({ "name": "Egg Tray", "price": 210.0 }))
                .expect("minimal item should parse");
        assert_eq!(parsed.id, "");
        assert_eq!(parsed.custom_quantity, QuantityMode::Fixed);
        assert_eq!(parsed.tax_percentage, None);
        assert_eq!(parsed.tax_percentage_or_zero(), 0.0);
    }

    #[test]
    fn validate_rejects_bad_records() {
        assert!(item("", "  ", 10.0, None).validate().is_err());
        assert!(item("", "Feed Bag", -1.0, None).validate().is_err());
        assert!(item("", "Feed Bag", 10.0, Some(120.0)).validate().is_err());

        let mut presets = item("", "Feed Bag", 10.0, Some(12.0));
        presets.predefined_quantities = Some(vec![0.5, -2.0]);
        assert!(presets.validate().is_err());

        assert!(item("", "Feed Bag", 10.0, Some(0.0)).validate().is_ok());
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let mut cache = CatalogCache::new();
        cache.items = vec![
            item("i1", "Chicken Leg", 290.0, None),
            item("i2", "Chicken Breast", 310.0, None),
            item("i3", "Egg Tray", 210.0, None),
        ];
        cache.state = CatalogState::Ready;

        let hits = cache.search("chickEN");
        assert_eq!(hits.len(), 2);
        assert_eq!(cache.search("").len(), 3);
        assert!(cache.search("mutton").is_empty());
        assert_eq!(cache.find_by_id("i3").map(|i| i.name.as_str()), Some("Egg Tray"));
        assert!(cache.find_by_id("missing").is_none());
    }
}
