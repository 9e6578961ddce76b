use crate::{
    config::AppConfig,
    errors::ServiceError,
    events::{Event, EventSender},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument};
use validator::Validate;

/// One line item on an invoice. Amounts are in the smallest currency unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledPrice {
    pub label: String,
    pub amount: i64,
}

/// The state carried through the provider and back: enough to match a paid
/// outcome to its purchase without server-side session storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoicePayload {
    pub gift_id: String,
    pub buyer_id: String,
    pub transaction_id: String,
}

/// Request body for invoice creation, passed through to the provider.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    #[validate(length(min = 1, max = 32))]
    pub title: String,
    #[validate(length(min = 1, max = 255))]
    pub description: String,
    /// JSON-encoded [`InvoicePayload`]
    pub payload: String,
    pub currency: String,
    #[validate(length(min = 1))]
    pub prices: Vec<LabeledPrice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvoiceResponse {
    pub invoice_link: String,
}

/// Provider wire format for `createInvoiceLink`.
#[derive(Serialize)]
struct ProviderInvoiceBody<'a> {
    title: &'a str,
    description: &'a str,
    payload: &'a str,
    /// Empty for the native-currency flow; the real credential rides in the
    /// URL, never in the body.
    provider_token: &'a str,
    currency: &'a str,
    prices: &'a [LabeledPrice],
    start_parameter: &'a str,
}

#[derive(Deserialize)]
struct ProviderResponse {
    ok: bool,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Proxies invoice creation to the payment provider. The provider credential
/// lives only here; clients see invoice links and nothing else.
#[derive(Clone)]
pub struct InvoiceService {
    http: reqwest::Client,
    provider_api_base: String,
    provider_token: String,
    currency: String,
    event_sender: EventSender,
}

impl InvoiceService {
    pub fn new(cfg: &AppConfig, event_sender: EventSender) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            http,
            provider_api_base: cfg.provider_api_base.trim_end_matches('/').to_string(),
            provider_token: cfg.provider_token.clone(),
            currency: cfg.invoice_currency.clone(),
            event_sender,
        }
    }

    /// Creates a provider-hosted invoice link for one gift purchase.
    ///
    /// No local inventory is touched here: invoices can be abandoned silently
    /// by the buyer, so issuing one must never reserve or decrement stock.
    #[instrument(skip(self, req), fields(title = %req.title))]
    pub async fn create_invoice_link(
        &self,
        req: &CreateInvoiceRequest,
    ) -> Result<String, ServiceError> {
        req.validate()?;

        if let Some(bad) = req.prices.iter().find(|p| p.amount <= 0) {
            return Err(ServiceError::ProviderError(format!(
                "invoice price for '{}' must be positive",
                bad.label
            )));
        }
        if req.currency != self.currency {
            return Err(ServiceError::ProviderError(format!(
                "unsupported currency '{}', expected '{}'",
                req.currency, self.currency
            )));
        }

        let payload: InvoicePayload = serde_json::from_str(&req.payload).map_err(|_| {
            ServiceError::InvalidInput(
                "payload must encode gift_id, buyer_id and transaction_id".to_string(),
            )
        })?;

        let url = format!(
            "{}/bot{}/createInvoiceLink",
            self.provider_api_base, self.provider_token
        );
        let body = ProviderInvoiceBody {
            title: &req.title,
            description: &req.description,
            payload: &req.payload,
            provider_token: "",
            currency: &req.currency,
            prices: &req.prices,
            start_parameter: "start_parameter",
        };

        // Strip the URL from transport errors: it carries the credential.
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::ProviderError(e.without_url().to_string()))?;

        let parsed: ProviderResponse = response
            .json()
            .await
            .map_err(|_| ServiceError::ProviderError("invalid provider response".to_string()))?;

        if !parsed.ok {
            return Err(ServiceError::ProviderError(
                parsed
                    .description
                    .unwrap_or_else(|| "provider rejected the invoice".to_string()),
            ));
        }

        let link = parsed.result.ok_or_else(|| {
            ServiceError::ProviderError("provider response missing invoice link".to_string())
        })?;

        info!(
            gift_id = %payload.gift_id,
            transaction_id = %payload.transaction_id,
            "invoice link created"
        );
        self.event_sender
            .send_or_log(Event::InvoiceIssued {
                gift_id: payload.gift_id,
                buyer_id: payload.buyer_id,
                transaction_id: payload.transaction_id,
            })
            .await;

        Ok(link)
    }
}
