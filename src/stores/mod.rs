//! Store trait seams and the adapters behind them.
//!
//! The engine talks to its collaborators only through these traits; each
//! persistence backend revision gets its own adapter and the engine stays
//! untouched when one is swapped for another.

pub mod http;
pub mod keyed;
pub mod memory;
pub mod print;

use async_trait::async_trait;

use crate::catalog::CatalogItem;
use crate::error::StoreError;
use crate::orders::{Order, OrderPage};
use crate::outlets::Outlet;
use crate::receipt::Receipt;

pub use http::HttpBackend;
pub use keyed::KeyedBackend;
pub use memory::MemoryBackend;
pub use print::HttpPrinter;

/// External service of record for sellable items.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_items(&self) -> Result<Vec<CatalogItem>, StoreError>;

    /// Persist a new item; returns the store-assigned id.
    async fn create_item(&self, item: &CatalogItem) -> Result<String, StoreError>;

    async fn update_item(&self, id: &str, item: &CatalogItem) -> Result<(), StoreError>;

    async fn delete_item(&self, id: &str) -> Result<(), StoreError>;
}

/// External service of record for completed orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn count_orders(&self) -> Result<u64, StoreError>;

    /// Persist an order and return its store-assigned id. `request_id` is a
    /// client-generated token a backend with idempotency support may use to
    /// deduplicate a retried insert; backends without it ignore the token.
    async fn insert_order(&self, order: &Order, request_id: &str) -> Result<String, StoreError>;

    /// Fetch one page of orders, oldest-key first, starting after `cursor`.
    async fn list_orders(
        &self,
        page_size: usize,
        cursor: Option<&str>,
    ) -> Result<OrderPage, StoreError>;
}

/// External directory of outlet records.
#[async_trait]
pub trait OutletStore: Send + Sync {
    async fn list_outlets(&self) -> Result<Vec<Outlet>, StoreError>;

    /// Persist a new outlet; returns the store-assigned id.
    async fn create_outlet(&self, outlet: &Outlet) -> Result<String, StoreError>;

    async fn update_outlet(&self, id: &str, outlet: &Outlet) -> Result<(), StoreError>;

    async fn delete_outlet(&self, id: &str) -> Result<(), StoreError>;
}

/// External print bridge driving the receipt printer.
#[async_trait]
pub trait PrintService: Send + Sync {
    async fn submit_receipt(&self, receipt: &Receipt) -> Result<(), StoreError>;
}
