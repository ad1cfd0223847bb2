//! Error taxonomy shared by the engine and its store adapters.
//!
//! Adapter-level transport failures are mapped into [`StoreError`] with the
//! user-facing messages the terminal shows verbatim; the engine wraps or
//! rejects with [`EngineError`] before any ledger state is touched.

use thiserror::Error;

/// Failure communicating with an external backend (catalog/order/outlet
/// store or the print bridge).
#[derive(Debug, Error)]
pub enum StoreError {
    /// TCP/DNS-level failure before any response arrived.
    #[error("Cannot reach backend at {0}")]
    Unreachable(String),

    /// The request timed out.
    #[error("Connection to {0} timed out")]
    Timeout(String),

    /// The backend answered with a non-success HTTP status.
    #[error("{message} (HTTP {status})")]
    Rejected { status: u16, message: String },

    /// The backend answered 2xx but the body did not match the contract.
    #[error("Invalid response from backend: {0}")]
    InvalidResponse(String),

    /// Any other transport failure with a response-less error.
    #[error("Network error communicating with {url}: {detail}")]
    Network { url: String, detail: String },

    /// Adapter misconfiguration (bad base URL, unbuildable client).
    #[error("{0}")]
    Config(String),
}

/// Engine-level failures surfaced to the UI layer.
///
/// Print failures never appear here: receipt submission is best-effort and
/// its errors are logged at the call site, not propagated.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Catalog load failed; the cache keeps its previous snapshot.
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(StoreError),

    /// Spend-to-quantity conversion attempted on a non-positive unit price.
    #[error("Cannot convert a spend amount: unit price must be positive")]
    InvalidPriceForConversion,

    /// Predefined-quantity selection that names no entry on the item.
    #[error("Item has no predefined quantity at position {0}")]
    PresetUnavailable(usize),

    /// Checkout attempted with nothing in the cart. Raised before any
    /// external call; callers normally disable the action instead.
    #[error("Cannot check out an empty cart")]
    EmptyCart,

    /// An operation referenced an item id the catalog cache does not hold.
    #[error("Unknown catalog item: {0}")]
    UnknownItem(String),

    /// A record failed boundary validation before reaching a store.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// A store call failed; retryable by the user, cart state preserved.
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_messages_are_user_facing() {
        let err = StoreError::Rejected {
            status: 401,
            message: "API key is invalid or expired".into(),
        };
        assert_eq!(err.to_string(), "API key is invalid or expired (HTTP 401)");

        let err = StoreError::Unreachable("https://pos.example.com".into());
        assert_eq!(
            err.to_string(),
            "Cannot reach backend at https://pos.example.com"
        );
    }

    #[test]
    fn engine_error_wraps_store_error_transparently() {
        let err: EngineError = StoreError::Timeout("https://pos.example.com".into()).into();
        assert_eq!(
            err.to_string(),
            "Connection to https://pos.example.com timed out"
        );
    }
}
