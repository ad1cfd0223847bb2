//! Tillpoint - point-of-sale order composition engine.
//!
//! The engine owns the terminal-side business state: an in-memory catalog
//! cache, the cart ledger, the checkout coordinator, the paged order
//! history, and the dashboard aggregation. Persistence lives behind the
//! store traits in [`stores`], with one adapter per backend (the generic
//! HTTP API, the keyed realtime store, and an in-process store for tests),
//! so swapping backends never touches the engine.
//!
//! ```no_run
//! use std::sync::Arc;
//! use tillpoint::session::PosSession;
//! use tillpoint::stores::{HttpBackend, HttpPrinter, PrintService};
//! use tillpoint::config::BackendConfig;
//!
//! # async fn run() -> Result<(), tillpoint::error::EngineError> {
//! let config = BackendConfig::new("pos.example.com", "pk_live_123");
//! let backend = Arc::new(HttpBackend::new(config)?);
//! let printer: Arc<dyn PrintService> = Arc::new(HttpPrinter::new("localhost:8000")?);
//!
//! let mut session = PosSession::open(backend.clone(), backend, Some(printer)).await?;
//! session.ring_up("item-id")?;
//! let order = session.checkout().await?;
//! println!("order #{} for {}", order.order_number, order.total_amount);
//! # Ok(())
//! # }
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod api;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod events;
pub mod history;
pub mod orders;
pub mod outlets;
pub mod receipt;
pub mod session;
pub mod stores;

pub use cart::{CartLedger, OrderLine, QuantityInput};
pub use catalog::{CatalogCache, CatalogItem, CatalogState, QuantityMode};
pub use checkout::{CheckoutCoordinator, CheckoutState};
pub use config::BackendConfig;
pub use dashboard::{summarize, SalesSummary};
pub use error::{EngineError, StoreError};
pub use events::EngineEvent;
pub use history::HistoryBrowser;
pub use orders::{Order, OrderPage};
pub use outlets::{Outlet, OutletDirectory};
pub use receipt::{Receipt, ReceiptLine};
pub use session::{PosSession, RingUp};

/// Initialise structured console logging.
///
/// Honours `RUST_LOG` when set; defaults to info with debug for this
/// crate. Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tillpoint=debug"));
    let console_layer = fmt::layer().with_target(true);
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .try_init();
}
