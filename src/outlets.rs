//! Outlet records and the back-office outlet directory.
//!
//! Outlets are the physical shops the back office manages. Validation runs
//! at the engine boundary so a half-filled form never reaches the backend.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::EngineError;
use crate::stores::OutletStore;

/// A physical shop record. The id is store-assigned on create.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Outlet {
    #[serde(default, rename = "store_id")]
    pub id: String,
    #[serde(rename = "store_name")]
    pub name: String,
    pub city: String,
    pub address: String,
    /// GST registration number.
    #[serde(rename = "gst")]
    pub gst_number: String,
    pub pincode: String,
}

impl Outlet {
    /// All fields except the id are mandatory.
    pub fn validate(&self) -> Result<(), EngineError> {
        let required = [
            ("store name", &self.name),
            ("city", &self.city),
            ("address", &self.address),
            ("GST number", &self.gst_number),
            ("pincode", &self.pincode),
        ];
        for (label, value) in required {
            if value.trim().is_empty() {
                return Err(EngineError::InvalidRecord(format!("{label} is required")));
            }
        }
        Ok(())
    }
}

/// In-memory view over the outlet list, reloaded after every mutation so
/// the back office sees its own writes.
#[derive(Debug, Default)]
pub struct OutletDirectory {
    outlets: Vec<Outlet>,
}

impl OutletDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load(&mut self, store: &dyn OutletStore) -> Result<usize, EngineError> {
        self.outlets = store.list_outlets().await?;
        info!(outlets = self.outlets.len(), "outlet directory refreshed");
        Ok(self.outlets.len())
    }

    /// Validate and create, then reload. Returns the store-assigned id.
    pub async fn create(
        &mut self,
        store: &dyn OutletStore,
        outlet: &Outlet,
    ) -> Result<String, EngineError> {
        outlet.validate()?;
        let id = store.create_outlet(outlet).await?;
        self.load(store).await?;
        Ok(id)
    }

    pub async fn update(
        &mut self,
        store: &dyn OutletStore,
        id: &str,
        outlet: &Outlet,
    ) -> Result<(), EngineError> {
        outlet.validate()?;
        store.update_outlet(id, outlet).await?;
        self.load(store).await?;
        Ok(())
    }

    pub async fn delete(&mut self, store: &dyn OutletStore, id: &str) -> Result<(), EngineError> {
        store.delete_outlet(id).await?;
        self.load(store).await?;
        Ok(())
    }

    pub fn outlets(&self) -> &[Outlet] {
        &self.outlets
    }

    /// Case-insensitive substring search over outlet names.
    pub fn search(&self, term: &str) -> Vec<&Outlet> {
        let needle = term.trim().to_lowercase();
        self.outlets
            .iter()
            .filter(|outlet| outlet.name.to_lowercase().contains(&needle))
            .collect()
    }
}
