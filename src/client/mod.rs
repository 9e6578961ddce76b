//! Buyer-side purchase flow.
//!
//! The client is cooperative async and holds no locks across buyers: all
//! inventory authority lives behind the commit endpoint. These modules cover
//! the catalog snapshot (with a display-only fallback), the notification
//! queue, the recent-activity feed, the payment-host bridge, and the
//! orchestrated purchase flow itself.

pub mod activity;
pub mod api;
pub mod catalog;
pub mod notifications;
pub mod payment_host;
pub mod purchase;
pub mod state;

pub use activity::ActivityFeed;
pub use api::ShopApi;
pub use catalog::CatalogStore;
pub use notifications::{Notification, NotificationKind, NotificationQueue};
pub use payment_host::{PaymentHost, PaymentStatus};
pub use purchase::{mint_transaction_id, BuyerProfile, PurchaseFlow, PurchaseOutcome};
pub use state::{StateStore, UiState};

/// Errors surfaced by the client-side flow before any money has moved.
/// Post-payment terminals are [`PurchaseOutcome`] variants instead, because
/// they require distinct user messaging rather than generic failure handling.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("could not start payment: {0}")]
    Provider(String),

    #[error("another purchase is already in flight")]
    PurchaseInFlight,
}

impl ClientError {
    /// Transport failures and server-side errors are safe to retry against
    /// the idempotent commit endpoint; everything else is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Provider(_) | Self::PurchaseInFlight => false,
        }
    }
}
