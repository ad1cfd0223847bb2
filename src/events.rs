//! Observable session events for the UI layer.
//!
//! The engine never blocks on delivery: events are advisory notifications
//! over a broadcast channel, and a UI that is not listening simply misses
//! them.

use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 64;

/// Notifications a UI layer can subscribe to instead of polling.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The catalog cache replaced its snapshot.
    CatalogRefreshed { items: usize },
    /// An order was persisted.
    OrderSubmitted {
        order_id: String,
        order_number: u64,
        total_amount: String,
    },
    /// Order persistence failed; the cart is preserved for a retry.
    CheckoutFailed { message: String },
    /// The receipt could not be handed to the print bridge. The order is
    /// already persisted when this fires.
    ReceiptFailed { order_id: String, message: String },
}

/// Broadcast fan-out for [`EngineEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EngineEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }

    pub(crate) fn emit(&self, event: EngineEvent) {
        // Send only fails when nobody is subscribed, which is fine for
        // advisory notifications.
        let _ = self.sender.send(event);
    }
}
