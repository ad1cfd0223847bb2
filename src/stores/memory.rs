//! In-process backend used by tests and demos.
//!
//! Behaves like the remote backends (key-assigned ids, key-ordered order
//! pagination, request-id deduplication on order inserts) and additionally
//! counts calls and simulates failures so tests can assert *when* the
//! engine talks to its collaborators, not just what it sends.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::catalog::CatalogItem;
use crate::error::StoreError;
use crate::orders::{Order, OrderPage};
use crate::outlets::Outlet;
use crate::receipt::Receipt;

use super::{CatalogStore, OrderStore, OutletStore, PrintService};

/// Snapshot of how often each store operation ran.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CallCounters {
    pub list_items: u64,
    pub count_orders: u64,
    pub insert_order: u64,
    pub list_orders: u64,
    pub submit_receipt: u64,
}

#[derive(Default)]
struct MemoryState {
    items: Vec<CatalogItem>,
    orders: Vec<(String, Order)>,
    outlets: Vec<Outlet>,
    receipts: Vec<Receipt>,
    /// request id -> order id, for insert deduplication.
    request_index: HashMap<String, String>,
    next_key: u64,
    fail_catalog: bool,
    fail_orders: bool,
    fail_outlets: bool,
    fail_print: bool,
    calls: CallCounters,
}

impl MemoryState {
    fn assign_key(&mut self, prefix: &str) -> String {
        self.next_key += 1;
        format!("{prefix}{:06}", self.next_key)
    }
}

/// In-memory store implementing every backend trait.
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the catalog, assigning keys to items without an id.
    pub fn with_items(items: Vec<CatalogItem>) -> Self {
        let backend = Self::new();
        if let Ok(mut state) = backend.state.lock() {
            for mut item in items {
                if item.id.is_empty() {
                    item.id = state.assign_key("i");
                }
                state.items.push(item);
            }
        }
        backend
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Config("memory store lock poisoned".to_string()))
    }

    pub fn set_catalog_failing(&self, failing: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_catalog = failing;
        }
    }

    pub fn set_orders_failing(&self, failing: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_orders = failing;
        }
    }

    pub fn set_outlets_failing(&self, failing: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_outlets = failing;
        }
    }

    pub fn set_print_failing(&self, failing: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_print = failing;
        }
    }

    pub fn calls(&self) -> CallCounters {
        self.state
            .lock()
            .map(|state| state.calls.clone())
            .unwrap_or_default()
    }

    pub fn stored_orders(&self) -> Vec<(String, Order)> {
        self.state
            .lock()
            .map(|state| state.orders.clone())
            .unwrap_or_default()
    }

    pub fn submitted_receipts(&self) -> Vec<Receipt> {
        self.state
            .lock()
            .map(|state| state.receipts.clone())
            .unwrap_or_default()
    }

    fn unreachable(node: &str) -> StoreError {
        StoreError::Unreachable(format!("memory://{node}"))
    }

    fn not_found(what: &str) -> StoreError {
        StoreError::Rejected {
            status: 404,
            message: format!("{what} not found"),
        }
    }
}

#[async_trait]
impl CatalogStore for MemoryBackend {
    async fn list_items(&self) -> Result<Vec<CatalogItem>, StoreError> {
        let mut state = self.lock()?;
        state.calls.list_items += 1;
        if state.fail_catalog {
            return Err(Self::unreachable("items"));
        }
        Ok(state.items.clone())
    }

    async fn create_item(&self, item: &CatalogItem) -> Result<String, StoreError> {
        let mut state = self.lock()?;
        if state.fail_catalog {
            return Err(Self::unreachable("items"));
        }
        let mut stored = item.clone();
        stored.id = state.assign_key("i");
        let id = stored.id.clone();
        state.items.push(stored);
        Ok(id)
    }

    async fn update_item(&self, id: &str, item: &CatalogItem) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if state.fail_catalog {
            return Err(Self::unreachable("items"));
        }
        let slot = state
            .items
            .iter_mut()
            .find(|existing| existing.id == id)
            .ok_or_else(|| Self::not_found("Item"))?;
        *slot = CatalogItem {
            id: id.to_string(),
            ..item.clone()
        };
        Ok(())
    }

    async fn delete_item(&self, id: &str) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if state.fail_catalog {
            return Err(Self::unreachable("items"));
        }
        state.items.retain(|item| item.id != id);
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryBackend {
    async fn count_orders(&self) -> Result<u64, StoreError> {
        let mut state = self.lock()?;
        state.calls.count_orders += 1;
        if state.fail_orders {
            return Err(Self::unreachable("orders"));
        }
        Ok(state.orders.len() as u64)
    }

    async fn insert_order(&self, order: &Order, request_id: &str) -> Result<String, StoreError> {
        let mut state = self.lock()?;
        state.calls.insert_order += 1;
        if state.fail_orders {
            return Err(Self::unreachable("orders"));
        }
        if let Some(existing) = state.request_index.get(request_id) {
            return Ok(existing.clone());
        }
        let id = state.assign_key("o");
        state.orders.push((id.clone(), order.clone()));
        state.request_index.insert(request_id.to_string(), id.clone());
        Ok(id)
    }

    async fn list_orders(
        &self,
        page_size: usize,
        cursor: Option<&str>,
    ) -> Result<OrderPage, StoreError> {
        let mut state = self.lock()?;
        state.calls.list_orders += 1;
        if state.fail_orders {
            return Err(Self::unreachable("orders"));
        }
        let start = match cursor {
            Some(cursor) => state
                .orders
                .iter()
                .position(|(id, _)| id == cursor)
                .map(|pos| pos + 1)
                .unwrap_or(state.orders.len()),
            None => 0,
        };
        let orders: Vec<(String, Order)> = state
            .orders
            .iter()
            .skip(start)
            .take(page_size)
            .cloned()
            .collect();
        let next_cursor = orders.last().map(|(id, _)| id.clone());
        Ok(OrderPage {
            orders,
            next_cursor,
        })
    }
}

#[async_trait]
impl OutletStore for MemoryBackend {
    async fn list_outlets(&self) -> Result<Vec<Outlet>, StoreError> {
        let state = self.lock()?;
        if state.fail_outlets {
            return Err(Self::unreachable("stores"));
        }
        Ok(state.outlets.clone())
    }

    async fn create_outlet(&self, outlet: &Outlet) -> Result<String, StoreError> {
        let mut state = self.lock()?;
        if state.fail_outlets {
            return Err(Self::unreachable("stores"));
        }
        let mut stored = outlet.clone();
        stored.id = state.assign_key("s");
        let id = stored.id.clone();
        state.outlets.push(stored);
        Ok(id)
    }

    async fn update_outlet(&self, id: &str, outlet: &Outlet) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if state.fail_outlets {
            return Err(Self::unreachable("stores"));
        }
        let slot = state
            .outlets
            .iter_mut()
            .find(|existing| existing.id == id)
            .ok_or_else(|| Self::not_found("Store"))?;
        *slot = Outlet {
            id: id.to_string(),
            ..outlet.clone()
        };
        Ok(())
    }

    async fn delete_outlet(&self, id: &str) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if state.fail_outlets {
            return Err(Self::unreachable("stores"));
        }
        state.outlets.retain(|outlet| outlet.id != id);
        Ok(())
    }
}

#[async_trait]
impl PrintService for MemoryBackend {
    async fn submit_receipt(&self, receipt: &Receipt) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.calls.submit_receipt += 1;
        if state.fail_print {
            return Err(Self::unreachable("print"));
        }
        state.receipts.push(receipt.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(number: u64) -> Order {
        Order {
            date: "7/3/2024".to_string(),
            order_number: number,
            items: vec![],
            total_amount: format!("{number}.00"),
        }
    }

    #[tokio::test]
    async fn insert_order_deduplicates_by_request_id() {
        let backend = MemoryBackend::new();
        let first = backend
            .insert_order(&order(1), "req-1")
            .await
            .expect("insert");
        let replay = backend
            .insert_order(&order(1), "req-1")
            .await
            .expect("replayed insert");
        assert_eq!(first, replay);
        assert_eq!(backend.stored_orders().len(), 1);

        let second = backend
            .insert_order(&order(2), "req-2")
            .await
            .expect("second insert");
        assert_ne!(first, second);
        assert_eq!(backend.count_orders().await.expect("count"), 2);
    }

    #[tokio::test]
    async fn list_orders_pages_from_cursor() {
        let backend = MemoryBackend::new();
        for n in 1..=3 {
            backend
                .insert_order(&order(n), &format!("req-{n}"))
                .await
                .expect("insert");
        }

        let first = backend.list_orders(2, None).await.expect("first page");
        assert_eq!(first.orders.len(), 2);
        let cursor = first.next_cursor.expect("cursor on full page");

        let second = backend
            .list_orders(2, Some(&cursor))
            .await
            .expect("second page");
        assert_eq!(second.orders.len(), 1);
        assert_eq!(second.orders[0].1.order_number, 3);

        // A stale cursor that no longer resolves yields an empty page.
        let stale = backend
            .list_orders(2, Some("o-does-not-exist"))
            .await
            .expect("stale cursor tolerated");
        assert!(stale.orders.is_empty());
        assert_eq!(stale.next_cursor, None);
    }

    #[tokio::test]
    async fn failure_toggle_simulates_an_unreachable_backend() {
        let backend = MemoryBackend::new();
        backend.set_orders_failing(true);
        let err = backend.count_orders().await.expect_err("orders down");
        assert!(matches!(err, StoreError::Unreachable(_)));

        backend.set_orders_failing(false);
        assert_eq!(backend.count_orders().await.expect("orders back"), 0);
    }

    #[tokio::test]
    async fn update_item_requires_an_existing_id() {
        let backend = MemoryBackend::new();
        let item = CatalogItem {
            id: String::new(),
            name: "Egg Tray".to_string(),
            price: 210.0,
            custom_quantity: Default::default(),
            predefined_quantities: None,
            unit: None,
            tax_percentage: None,
        };
        let err = backend
            .update_item("missing", &item)
            .await
            .expect_err("unknown id");
        assert!(matches!(err, StoreError::Rejected { status: 404, .. }));

        let id = backend.create_item(&item).await.expect("create");
        let mut cheaper = item.clone();
        cheaper.price = 180.0;
        backend.update_item(&id, &cheaper).await.expect("update");
        let items = backend.list_items().await.expect("list");
        assert_eq!(items[0].price, 180.0);
        assert_eq!(items[0].id, id);
    }
}
