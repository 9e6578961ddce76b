use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Domain events emitted by the purchase pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    CatalogSeeded {
        gifts: usize,
    },
    InvoiceIssued {
        gift_id: String,
        buyer_id: String,
        transaction_id: String,
    },
    GiftPurchased {
        gift_id: String,
        buyer_id: String,
        transaction_id: String,
        remaining_quantity: i32,
    },
    /// The commit found no remaining inventory for the gift.
    PurchaseRejected {
        gift_id: String,
        transaction_id: String,
        reason: String,
    },
    /// A commit replayed a transaction id that was already recorded.
    DuplicateCommit {
        transaction_id: String,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the consumer is gone.
    /// Event delivery is observability, not correctness; commits must not
    /// fail because the channel closed.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(err) = self.send(event).await {
            warn!("dropping domain event: {}", err);
        }
    }
}

/// Consumes domain events and logs them. Spawned once at startup.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    while let Some(event) = rx.recv().await {
        match &event {
            Event::CatalogSeeded { gifts } => {
                info!(gifts, "catalog seeded");
            }
            Event::InvoiceIssued {
                gift_id,
                buyer_id,
                transaction_id,
            } => {
                info!(%gift_id, %buyer_id, %transaction_id, "invoice issued");
            }
            Event::GiftPurchased {
                gift_id,
                buyer_id,
                transaction_id,
                remaining_quantity,
            } => {
                info!(
                    %gift_id,
                    %buyer_id,
                    %transaction_id,
                    remaining_quantity,
                    "gift purchased"
                );
            }
            Event::PurchaseRejected {
                gift_id,
                transaction_id,
                reason,
            } => {
                info!(%gift_id, %transaction_id, %reason, "purchase rejected");
            }
            Event::DuplicateCommit { transaction_id } => {
                info!(%transaction_id, "duplicate commit resolved to prior result");
            }
        }
    }
    info!("event channel closed; processor exiting");
}
