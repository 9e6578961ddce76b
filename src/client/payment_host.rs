use async_trait::async_trait;

/// Terminal outcome of a payment sheet, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Paid,
    Cancelled,
    Failed,
}

impl PaymentStatus {
    /// Host callbacks carry a status string. Only `paid` may ever trigger a
    /// commit; anything unrecognized is treated as failed.
    pub fn from_callback(raw: &str) -> Self {
        match raw {
            "paid" => Self::Paid,
            "cancelled" => Self::Cancelled,
            _ => Self::Failed,
        }
    }
}

/// The surrounding application shell that renders the native payment sheet.
///
/// Contract: given an invoice link, resolves exactly once with the terminal
/// status. A host that never resolves is bounded by the purchase flow's
/// payment timeout; closing the sheet without paying simply resolves to a
/// non-paid status (or never resolves), so no cancellation signal needs to
/// reach the ledger.
#[async_trait]
pub trait PaymentHost: Send + Sync {
    async fn open_invoice(&self, invoice_link: &str) -> PaymentStatus;
}
