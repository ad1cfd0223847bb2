//! Checkout coordination: turns the cart ledger into an immutable order,
//! persists it, and hands a best-effort receipt to the print bridge.
//!
//! The order counter is fetched once when the session starts and never
//! re-fetched, so two terminals running at once can hand out the same
//! order number. That is a known, accepted limitation of the numbering
//! scheme, not something this coordinator tries to repair.

use tracing::{info, warn};
use uuid::Uuid;

use crate::cart::CartLedger;
use crate::error::EngineError;
use crate::events::{EngineEvent, EventBus};
use crate::orders::{today_display_date, Order};
use crate::receipt::Receipt;
use crate::stores::{OrderStore, PrintService};

/// Where the coordinator is in its submit cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CheckoutState {
    #[default]
    Idle,
    Submitting,
    /// The last submission persisted this order.
    Completed { order_id: String, order_number: u64 },
    /// The last submission failed with this user-facing message.
    Failed { message: String },
}

/// Session-scoped checkout coordinator.
#[derive(Debug)]
pub struct CheckoutCoordinator {
    state: CheckoutState,
    order_count: u64,
}

impl CheckoutCoordinator {
    /// Start a session by fetching the order count once.
    pub async fn begin(store: &dyn OrderStore) -> Result<Self, EngineError> {
        let order_count = store.count_orders().await?;
        info!(order_count, "checkout session started");
        Ok(Self {
            state: CheckoutState::Idle,
            order_count,
        })
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    /// Orders known to exist, including this session's own submissions.
    pub fn order_count(&self) -> u64 {
        self.order_count
    }

    /// Number the next submission will carry.
    pub fn next_order_number(&self) -> u64 {
        self.order_count + 1
    }

    /// Whether the checkout action should be enabled.
    pub fn can_submit(&self, cart: &CartLedger) -> bool {
        !cart.is_empty() && self.state != CheckoutState::Submitting
    }

    /// Submit the cart as a new order.
    ///
    /// On success the ledger is cleared and the receipt goes to the print
    /// bridge best-effort. On persistence failure the ledger is left
    /// untouched so the operator can retry without re-ringing the sale.
    pub async fn submit(
        &mut self,
        cart: &mut CartLedger,
        orders: &dyn OrderStore,
        printer: Option<&dyn PrintService>,
        events: &EventBus,
    ) -> Result<Order, EngineError> {
        if cart.is_empty() {
            return Err(EngineError::EmptyCart);
        }
        self.state = CheckoutState::Submitting;

        let order = Order {
            date: today_display_date(),
            order_number: self.next_order_number(),
            items: cart.lines().to_vec(),
            total_amount: format!("{:.2}", cart.total(true)),
        };
        let request_id = Uuid::new_v4().to_string();

        match orders.insert_order(&order, &request_id).await {
            Ok(order_id) => {
                self.order_count += 1;
                cart.clear();
                self.state = CheckoutState::Completed {
                    order_id: order_id.clone(),
                    order_number: order.order_number,
                };
                info!(
                    order_id = %order_id,
                    order_number = order.order_number,
                    total_amount = %order.total_amount,
                    "order persisted"
                );
                events.emit(EngineEvent::OrderSubmitted {
                    order_id: order_id.clone(),
                    order_number: order.order_number,
                    total_amount: order.total_amount.clone(),
                });

                if let Some(printer) = printer {
                    let receipt = Receipt::from_lines(&order.items);
                    if let Err(error) = printer.submit_receipt(&receipt).await {
                        warn!(
                            order_id = %order_id,
                            error = %error,
                            "receipt submission failed; order is already persisted"
                        );
                        events.emit(EngineEvent::ReceiptFailed {
                            order_id,
                            message: error.to_string(),
                        });
                    }
                }

                Ok(order)
            }
            Err(error) => {
                let message = error.to_string();
                self.state = CheckoutState::Failed {
                    message: message.clone(),
                };
                warn!(error = %message, "order persist failed; cart preserved for retry");
                events.emit(EngineEvent::CheckoutFailed { message });
                Err(EngineError::Store(error))
            }
        }
    }
}
