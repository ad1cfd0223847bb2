//! One terminal session: catalog, cart, checkout, and order history wired
//! to the configured backend, with an observable event stream for the UI.
//!
//! The session is the single mutator of its own state; every operation
//! runs on the caller's control flow and the only suspension points are
//! the store calls themselves.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::warn;

use crate::cart::{resolve_quantity, CartLedger, QuantityInput};
use crate::catalog::{CatalogCache, CatalogItem, QuantityMode};
use crate::checkout::{CheckoutCoordinator, CheckoutState};
use crate::dashboard::{summarize, SalesSummary};
use crate::error::EngineError;
use crate::events::{EngineEvent, EventBus};
use crate::history::{HistoryBrowser, DEFAULT_PAGE_SIZE};
use crate::orders::Order;
use crate::stores::{CatalogStore, OrderStore, PrintService};

/// What a catalog tap should do next.
#[derive(Debug, Clone, PartialEq)]
pub enum RingUp {
    /// One unit was added to the cart.
    Added,
    /// The item wants an operator-resolved quantity first; feed the result
    /// into [`PosSession::add_resolved`].
    NeedsQuantity(CatalogItem),
}

/// A running point-of-sale session.
pub struct PosSession {
    catalog_store: Arc<dyn CatalogStore>,
    order_store: Arc<dyn OrderStore>,
    printer: Option<Arc<dyn PrintService>>,
    catalog: CatalogCache,
    cart: CartLedger,
    checkout: CheckoutCoordinator,
    history: HistoryBrowser,
    events: EventBus,
}

impl PosSession {
    /// Open a session: fetch the order count, then load the catalog.
    ///
    /// A failed catalog load does not abort the open: the terminal comes
    /// up with an empty, unavailable catalog and the operator retries via
    /// [`PosSession::reload_catalog`]. A failed order count does abort:
    /// without it no order can be numbered.
    pub async fn open(
        catalog_store: Arc<dyn CatalogStore>,
        order_store: Arc<dyn OrderStore>,
        printer: Option<Arc<dyn PrintService>>,
    ) -> Result<Self, EngineError> {
        let checkout = CheckoutCoordinator::begin(order_store.as_ref()).await?;
        let mut session = Self {
            catalog_store,
            order_store,
            printer,
            catalog: CatalogCache::new(),
            cart: CartLedger::new(),
            checkout,
            history: HistoryBrowser::new(DEFAULT_PAGE_SIZE),
            events: EventBus::new(),
        };
        if let Err(error) = session.reload_catalog().await {
            warn!(error = %error, "session opened without a catalog snapshot");
        }
        Ok(session)
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    // -----------------------------------------------------------------------
    // Catalog
    // -----------------------------------------------------------------------

    pub fn catalog(&self) -> &CatalogCache {
        &self.catalog
    }

    /// Re-fetch the catalog snapshot from the store.
    pub async fn reload_catalog(&mut self) -> Result<usize, EngineError> {
        let count = self.catalog.load(self.catalog_store.as_ref()).await?;
        self.events.emit(EngineEvent::CatalogRefreshed { items: count });
        Ok(count)
    }

    /// Validate and create a catalog item, then reload so the terminal sees
    /// its own write. Returns the store-assigned id.
    pub async fn create_item(&mut self, item: &CatalogItem) -> Result<String, EngineError> {
        item.validate()?;
        let id = self.catalog_store.create_item(item).await?;
        self.refresh_after_admin_write().await;
        Ok(id)
    }

    pub async fn update_item(&mut self, id: &str, item: &CatalogItem) -> Result<(), EngineError> {
        item.validate()?;
        self.catalog_store.update_item(id, item).await?;
        self.refresh_after_admin_write().await;
        Ok(())
    }

    pub async fn delete_item(&mut self, id: &str) -> Result<(), EngineError> {
        self.catalog_store.delete_item(id).await?;
        self.refresh_after_admin_write().await;
        Ok(())
    }

    /// The admin write already succeeded; a reload failure only leaves the
    /// cache stale (and flagged unavailable), so it is logged, not raised.
    async fn refresh_after_admin_write(&mut self) {
        if let Err(error) = self.reload_catalog().await {
            warn!(error = %error, "catalog reload after admin write failed");
        }
    }

    // -----------------------------------------------------------------------
    // Cart
    // -----------------------------------------------------------------------

    pub fn cart(&self) -> &CartLedger {
        &self.cart
    }

    /// Handle a catalog tap: fixed-quantity items go straight into the
    /// cart, custom-quantity items come back asking for a resolution.
    pub fn ring_up(&mut self, item_id: &str) -> Result<RingUp, EngineError> {
        let item = self
            .catalog
            .find_by_id(item_id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownItem(item_id.to_string()))?;
        match item.custom_quantity {
            QuantityMode::Fixed => {
                self.cart.add_line(&item, 1.0);
                Ok(RingUp::Added)
            }
            QuantityMode::Custom => Ok(RingUp::NeedsQuantity(item)),
        }
    }

    /// Add a custom-quantity item after resolving the operator's input
    /// (count, spend, or preset). Returns the resolved quantity.
    pub fn add_resolved(
        &mut self,
        item_id: &str,
        input: QuantityInput,
    ) -> Result<f64, EngineError> {
        let item = self
            .catalog
            .find_by_id(item_id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownItem(item_id.to_string()))?;
        let quantity = resolve_quantity(&item, input)?;
        self.cart.add_line(&item, quantity);
        Ok(quantity)
    }

    pub fn decrement_one(&mut self, item_id: &str) {
        self.cart.decrement_one(item_id);
    }

    pub fn remove_line(&mut self, item_id: &str) {
        self.cart.remove_line(item_id);
    }

    pub fn clear_cart(&mut self) {
        self.cart.clear();
    }

    pub fn cart_total(&self, tax_inclusive: bool) -> f64 {
        self.cart.total(tax_inclusive)
    }

    // -----------------------------------------------------------------------
    // Checkout
    // -----------------------------------------------------------------------

    pub fn checkout_state(&self) -> &CheckoutState {
        self.checkout.state()
    }

    pub fn order_count(&self) -> u64 {
        self.checkout.order_count()
    }

    pub fn can_checkout(&self) -> bool {
        self.checkout.can_submit(&self.cart)
    }

    /// Submit the cart as a new order (see [`CheckoutCoordinator::submit`]).
    pub async fn checkout(&mut self) -> Result<Order, EngineError> {
        self.checkout
            .submit(
                &mut self.cart,
                self.order_store.as_ref(),
                self.printer.as_deref(),
                &self.events,
            )
            .await
    }

    // -----------------------------------------------------------------------
    // History and dashboard
    // -----------------------------------------------------------------------

    pub fn history(&self) -> &HistoryBrowser {
        &self.history
    }

    /// Fetch and merge the next page of order history.
    pub async fn load_more_orders(&mut self) -> Result<usize, EngineError> {
        self.history.load_more(self.order_store.as_ref()).await
    }

    /// Restart history paging from the top.
    pub fn reset_history(&mut self) {
        self.history.reset();
    }

    /// Orders whose display date falls on exactly the given day.
    pub fn orders_on(&self, date: NaiveDate) -> Vec<&(String, Order)> {
        self.history.orders_on(date)
    }

    /// Aggregate everything fetched so far into dashboard buckets.
    pub fn sales_summary(&self) -> SalesSummary {
        summarize(self.history.orders().iter().map(|(_, order)| order))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryBackend;

    fn weighed_item(name: &str, price: f64) -> CatalogItem {
        CatalogItem {
            id: String::new(),
            name: name.to_string(),
            price,
            custom_quantity: QuantityMode::Custom,
            predefined_quantities: Some(vec![0.25, 0.5, 1.0]),
            unit: Some("kg".to_string()),
            tax_percentage: Some(5.0),
        }
    }

    fn fixed_item(name: &str, price: f64) -> CatalogItem {
        CatalogItem {
            id: String::new(),
            name: name.to_string(),
            price,
            custom_quantity: QuantityMode::Fixed,
            predefined_quantities: None,
            unit: None,
            tax_percentage: None,
        }
    }

    async fn open_session(backend: Arc<MemoryBackend>) -> PosSession {
        let printer: Arc<dyn PrintService> = backend.clone();
        PosSession::open(backend.clone(), backend, Some(printer))
            .await
            .expect("session opens")
    }

    #[tokio::test]
    async fn ring_up_routes_fixed_and_custom_items() {
        let backend = Arc::new(MemoryBackend::with_items(vec![
            fixed_item("Egg Tray", 210.0),
            weighed_item("Chicken Leg", 290.0),
        ]));
        let mut session = open_session(backend).await;

        let fixed_id = session.catalog().search("egg")[0].id.clone();
        let custom_id = session.catalog().search("chicken")[0].id.clone();

        assert_eq!(session.ring_up(&fixed_id).expect("fixed add"), RingUp::Added);
        assert_eq!(session.cart().len(), 1);

        match session.ring_up(&custom_id).expect("custom tap") {
            RingUp::NeedsQuantity(item) => assert_eq!(item.name, "Chicken Leg"),
            RingUp::Added => panic!("custom item must not auto-add"),
        }
        // The tap alone must not touch the ledger.
        assert_eq!(session.cart().len(), 1);

        let qty = session
            .add_resolved(&custom_id, QuantityInput::Spend(145.0))
            .expect("spend conversion");
        assert!((qty - 0.5).abs() < 1e-9);
        assert_eq!(session.cart().len(), 2);

        let err = session.ring_up("ghost").expect_err("unknown id");
        assert!(matches!(err, EngineError::UnknownItem(_)));
    }

    #[tokio::test]
    async fn failed_spend_conversion_leaves_the_cart_unchanged() {
        let mut free = weighed_item("Giveaway", 0.0);
        free.tax_percentage = None;
        let backend = Arc::new(MemoryBackend::with_items(vec![free]));
        let mut session = open_session(backend).await;
        let id = session.catalog().items()[0].id.clone();

        let err = session
            .add_resolved(&id, QuantityInput::Spend(150.0))
            .expect_err("zero price");
        assert!(matches!(err, EngineError::InvalidPriceForConversion));
        assert!(session.cart().is_empty());
    }

    #[tokio::test]
    async fn checkout_round_trips_through_history() {
        let backend = Arc::new(MemoryBackend::with_items(vec![
            fixed_item("A", 290.0),
            fixed_item("B", 300.0),
        ]));
        let mut session = open_session(backend.clone()).await;

        let items = session.catalog().items().to_vec();
        let a = items
            .iter()
            .find(|i| i.name == "A")
            .expect("item A seeded")
            .clone();
        session.ring_up(&a.id).expect("add A");
        session.ring_up(&a.id).expect("add A again");
        let b = items.iter().find(|i| i.name == "B").expect("item B seeded");
        session.ring_up(&b.id).expect("add B");

        // Item A carries no tax here; fake a taxed line via admin update.
        let mut taxed = a.clone();
        taxed.tax_percentage = Some(5.0);
        session.update_item(&a.id, &taxed).await.expect("retax A");
        session.clear_cart();
        session.ring_up(&a.id).expect("add taxed A");
        session.ring_up(&a.id).expect("add taxed A again");
        session.ring_up(&b.id).expect("add B");

        assert!(session.can_checkout());
        let order = session.checkout().await.expect("checkout");
        assert_eq!(order.total_amount, "909.00");
        assert!(session.cart().is_empty());
        assert!(!session.can_checkout());

        // Round-trip: page size 1 reproduces the persisted order.
        let mut browser = HistoryBrowser::new(1);
        browser.load_more(&*backend).await.expect("fetch page");
        let (_, fetched) = &browser.orders()[0];
        assert_eq!(fetched.total_amount, order.total_amount);
        assert_eq!(fetched.items.len(), order.items.len());
        assert_eq!(fetched.items[0].quantity, 2.0);
    }

    #[tokio::test]
    async fn session_opens_with_unavailable_catalog_and_recovers() {
        let backend = Arc::new(MemoryBackend::with_items(vec![fixed_item("A", 10.0)]));
        backend.set_catalog_failing(true);
        let mut session = open_session(backend.clone()).await;

        assert!(session.catalog().is_empty());
        assert_eq!(
            session.catalog().state(),
            crate::catalog::CatalogState::Unavailable
        );

        backend.set_catalog_failing(false);
        let count = session.reload_catalog().await.expect("retry succeeds");
        assert_eq!(count, 1);
        assert_eq!(
            session.catalog().state(),
            crate::catalog::CatalogState::Ready
        );
    }

    #[tokio::test]
    async fn admin_writes_validate_then_reload() {
        let backend = Arc::new(MemoryBackend::new());
        let mut session = open_session(backend.clone()).await;

        let bad = CatalogItem {
            tax_percentage: Some(120.0),
            ..fixed_item("Overtaxed", 10.0)
        };
        let err = session.create_item(&bad).await.expect_err("invalid tax");
        assert!(matches!(err, EngineError::InvalidRecord(_)));
        assert!(session.catalog().is_empty());

        let id = session
            .create_item(&fixed_item("Egg Tray", 210.0))
            .await
            .expect("create");
        assert_eq!(session.catalog().items().len(), 1);
        assert_eq!(session.catalog().find_by_id(&id).map(|i| i.price), Some(210.0));

        session.delete_item(&id).await.expect("delete");
        assert!(session.catalog().is_empty());
    }

    #[tokio::test]
    async fn dashboard_summary_covers_fetched_history() {
        let backend = Arc::new(MemoryBackend::with_items(vec![fixed_item("A", 100.0)]));
        let mut session = open_session(backend.clone()).await;

        let id = session.catalog().items()[0].id.clone();
        for _ in 0..2 {
            session.ring_up(&id).expect("add");
            session.checkout().await.expect("checkout");
        }

        session.load_more_orders().await.expect("load history");
        let summary = session.sales_summary();
        assert_eq!(summary.order_count(), 2);
        assert_eq!(summary.amount_distribution["100.00"], 2);
    }
}
