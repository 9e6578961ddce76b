use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use tracing::{info, warn};

use crate::handlers::purchases::{PurchaseRequest, PurchaseResponse};
use crate::services::invoicing::{CreateInvoiceRequest, InvoicePayload, LabeledPrice};

use super::activity::ActivityFeed;
use super::api::ShopApi;
use super::catalog::CatalogStore;
use super::notifications::{NotificationKind, NotificationQueue};
use super::payment_host::{PaymentHost, PaymentStatus};
use super::state::StateStore;
use super::ClientError;

const TRANSACTION_SUFFIX_LEN: usize = 9;

/// Identity attached to every purchase the flow makes.
#[derive(Debug, Clone)]
pub struct BuyerProfile {
    pub id: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl BuyerProfile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: None,
            first_name: None,
            last_name: None,
        }
    }
}

/// How a single buy attempt ended, from the buyer's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// Payment went through and the ledger recorded the purchase.
    Completed { transaction_id: String },
    /// No units left, either before the invoice or at commit time.
    SoldOut,
    /// The payment sheet resolved without a payment.
    Declined(PaymentStatus),
    /// The payment sheet never resolved within the configured timeout.
    TimedOut,
    /// Payment was reported as made but the ledger could not record it.
    /// The transaction id is the handle for support follow-up.
    PaidUnrecorded {
        transaction_id: String,
        error: String,
    },
}

/// Mints a client-side transaction id: a millisecond timestamp plus a short
/// random suffix. Uniqueness is ultimately enforced by the ledger; collisions
/// here only surface as benign duplicate commits.
pub fn mint_transaction_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..TRANSACTION_SUFFIX_LEN)
        .map(|_| {
            let chars = b"abcdefghijklmnopqrstuvwxyz0123456789";
            chars[rng.gen_range(0..chars.len())] as char
        })
        .collect();
    format!("tx_{}_{}", Utc::now().timestamp_millis(), suffix)
}

/// Drives one purchase end to end: availability check, invoice, payment
/// sheet, commit, and the notifications and refreshes along the way.
#[derive(Clone)]
pub struct PurchaseFlow {
    api: Arc<ShopApi>,
    catalog: CatalogStore,
    feed: ActivityFeed,
    notifications: NotificationQueue,
    state: StateStore,
    host: Arc<dyn PaymentHost>,
    buyer: BuyerProfile,
    payment_timeout: Duration,
    currency: String,
}

impl PurchaseFlow {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        api: Arc<ShopApi>,
        catalog: CatalogStore,
        feed: ActivityFeed,
        notifications: NotificationQueue,
        state: StateStore,
        host: Arc<dyn PaymentHost>,
        buyer: BuyerProfile,
        payment_timeout: Duration,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            api,
            catalog,
            feed,
            notifications,
            state,
            host,
            buyer,
            payment_timeout,
            currency: currency.into(),
        }
    }

    /// Runs one buy attempt for `gift_id`. At most one attempt runs at a
    /// time; a second call while one is in flight fails fast.
    pub async fn buy(&self, gift_id: &str) -> Result<PurchaseOutcome, ClientError> {
        if self.state.snapshot().processing {
            return Err(ClientError::PurchaseInFlight);
        }
        self.state.set_processing(true);

        let result = self.run(gift_id).await;

        if matches!(
            result,
            Ok(PurchaseOutcome::Completed { .. }) | Ok(PurchaseOutcome::SoldOut)
        ) {
            self.state.close_modal();
        }
        self.state.set_processing(false);
        result
    }

    async fn run(&self, gift_id: &str) -> Result<PurchaseOutcome, ClientError> {
        // Authoritative availability check before any money moves. The
        // catalog snapshot is display state and may be stale or built in.
        let status = self.api.gift_status(gift_id).await?;
        if status.remaining_quantity <= 0 {
            self.notifications
                .push("Sold out", NotificationKind::Error);
            self.catalog.refresh().await;
            return Ok(PurchaseOutcome::SoldOut);
        }

        // The invoice price must come from live listing data. The built-in
        // fallback keeps the shop rendering but is display-only; charging a
        // buyer from it would bill a stale price.
        if self.catalog.snapshot().await.fallback {
            self.catalog.refresh().await;
        }
        let snapshot = self.catalog.snapshot().await;
        if snapshot.fallback {
            self.notifications
                .push("Could not start payment", NotificationKind::Error);
            return Err(ClientError::Provider(
                "catalog unavailable for pricing".to_string(),
            ));
        }
        let gift = match snapshot.gifts.iter().find(|g| g.id == gift_id) {
            Some(gift) => gift.clone(),
            None => {
                self.catalog.refresh().await;
                self.catalog.get(gift_id).await.ok_or_else(|| {
                    ClientError::Api {
                        status: 404,
                        message: format!("unknown gift {gift_id}"),
                    }
                })?
            }
        };

        let transaction_id = mint_transaction_id();
        let payload = InvoicePayload {
            gift_id: gift.id.clone(),
            buyer_id: self.buyer.id.clone(),
            transaction_id: transaction_id.clone(),
        };
        let invoice_req = CreateInvoiceRequest {
            title: gift.name.clone(),
            description: format!("Purchase of {}", gift.name),
            payload: serde_json::to_string(&payload)
                .map_err(|e| ClientError::Provider(e.to_string()))?,
            currency: self.currency.clone(),
            prices: vec![LabeledPrice {
                label: gift.name.clone(),
                amount: gift.price,
            }],
        };

        let invoice_link = match self.api.create_invoice(&invoice_req).await {
            Ok(link) => link,
            Err(err) => {
                warn!(gift_id, %err, "invoice creation failed");
                self.notifications
                    .push("Could not start payment", NotificationKind::Error);
                return Err(err);
            }
        };

        info!(gift_id, transaction_id, "opening payment sheet");
        let status = match tokio::time::timeout(
            self.payment_timeout,
            self.host.open_invoice(&invoice_link),
        )
        .await
        {
            Ok(status) => status,
            Err(_) => {
                warn!(gift_id, transaction_id, "payment sheet timed out");
                self.notifications
                    .push("Payment timed out", NotificationKind::Error);
                return Ok(PurchaseOutcome::TimedOut);
            }
        };

        match status {
            PaymentStatus::Paid => self.commit_paid(&gift.id, transaction_id).await,
            other => {
                self.notifications
                    .push("Payment failed or cancelled", NotificationKind::Error);
                Ok(PurchaseOutcome::Declined(other))
            }
        }
    }

    /// Money has moved; from here every path must leave the buyer with
    /// either a recorded purchase or a transaction id to follow up with.
    async fn commit_paid(
        &self,
        gift_id: &str,
        transaction_id: String,
    ) -> Result<PurchaseOutcome, ClientError> {
        let request = PurchaseRequest {
            buyer_id: self.buyer.id.clone(),
            gift_id: gift_id.to_string(),
            transaction_id: transaction_id.clone(),
            username: self.buyer.username.clone(),
            first_name: self.buyer.first_name.clone(),
            last_name: self.buyer.last_name.clone(),
        };

        let response = match self.commit_with_retry(&request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(transaction_id, %err, "commit unreachable after payment");
                self.notifications.push(
                    "Payment received but the purchase could not be recorded",
                    NotificationKind::Error,
                );
                return Ok(PurchaseOutcome::PaidUnrecorded {
                    transaction_id,
                    error: err.to_string(),
                });
            }
        };

        if response.success {
            self.notifications.push(
                "Payment successful and gift added!",
                NotificationKind::Success,
            );
            self.catalog.refresh().await;
            self.feed.refresh().await;
            return Ok(PurchaseOutcome::Completed { transaction_id });
        }

        match response.error.as_deref() {
            Some("out_of_stock") => {
                self.notifications
                    .push("Sold out before payment settled", NotificationKind::Error);
                self.catalog.refresh().await;
                Ok(PurchaseOutcome::SoldOut)
            }
            other => {
                let error = other.unwrap_or("unknown").to_string();
                warn!(transaction_id, error, "commit rejected after payment");
                self.notifications.push(
                    "Payment received but the purchase could not be recorded",
                    NotificationKind::Error,
                );
                Ok(PurchaseOutcome::PaidUnrecorded {
                    transaction_id,
                    error,
                })
            }
        }
    }

    /// One retry, and only for outcomes where the commit may not have been
    /// durably applied. The ledger's transaction id uniqueness makes the
    /// replay safe.
    async fn commit_with_retry(
        &self,
        request: &PurchaseRequest,
    ) -> Result<PurchaseResponse, ClientError> {
        match self.api.commit_purchase(request).await {
            Ok(response) if response.error.as_deref() == Some("persistence_error") => {
                warn!(
                    transaction_id = request.transaction_id,
                    "commit not recorded, replaying once"
                );
                self.api.commit_purchase(request).await
            }
            Ok(response) => Ok(response),
            Err(err) if err.is_retryable() => {
                warn!(
                    transaction_id = request.transaction_id,
                    %err,
                    "commit transport failure, replaying once"
                );
                self.api.commit_purchase(request).await
            }
            Err(err) => Err(err),
        }
    }
}
