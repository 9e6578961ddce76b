use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::handlers::gifts::{GiftResponse, GiftStatusResponse};
use crate::handlers::purchases::{PurchaseRequest, PurchaseResponse};
use crate::services::invoicing::{CreateInvoiceRequest, CreateInvoiceResponse};
use crate::services::purchases::ActivityEntry;

use super::ClientError;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Typed HTTP client for the shop API.
#[derive(Debug, Clone)]
pub struct ShopApi {
    http: reqwest::Client,
    base_url: String,
}

impl ShopApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self::with_client(http, base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub async fn list_gifts(&self) -> Result<Vec<GiftResponse>, ClientError> {
        let response = self
            .http
            .get(format!("{}/api/gifts", self.base_url))
            .send()
            .await?;
        Self::expect_json(response).await
    }

    pub async fn gift_status(&self, gift_id: &str) -> Result<GiftStatusResponse, ClientError> {
        let response = self
            .http
            .get(format!("{}/api/gifts/{}/status", self.base_url, gift_id))
            .send()
            .await?;
        Self::expect_json(response).await
    }

    pub async fn recent_purchases(&self, limit: u64) -> Result<Vec<ActivityEntry>, ClientError> {
        let response = self
            .http
            .get(format!("{}/api/recent-purchases", self.base_url))
            .query(&[("limit", limit)])
            .send()
            .await?;
        Self::expect_json(response).await
    }

    /// Issues an invoice. Any failure maps to [`ClientError::Provider`]: from
    /// the buyer's point of view the payment could not be started, whatever
    /// the mechanism.
    pub async fn create_invoice(&self, req: &CreateInvoiceRequest) -> Result<String, ClientError> {
        let response = self
            .http
            .post(format!("{}/api/create-invoice", self.base_url))
            .json(req)
            .send()
            .await
            .map_err(|e| ClientError::Provider(e.without_url().to_string()))?;

        if !response.status().is_success() {
            return Err(ClientError::Provider(Self::error_message(response).await));
        }

        let body: CreateInvoiceResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Provider(e.without_url().to_string()))?;
        Ok(body.invoice_link)
    }

    /// Sends a commit request. The `{success, error}` body shape is preserved
    /// across statuses so callers can branch on the business code; an
    /// unparseable body becomes an [`ClientError::Api`] carrying the status.
    pub async fn commit_purchase(
        &self,
        req: &PurchaseRequest,
    ) -> Result<PurchaseResponse, ClientError> {
        let response = self
            .http
            .post(format!("{}/api/purchase", self.base_url))
            .json(req)
            .send()
            .await?;

        let status = response.status().as_u16();
        match response.json::<PurchaseResponse>().await {
            Ok(body) => Ok(body),
            Err(_) => Err(ClientError::Api {
                status,
                message: "unparseable purchase response".to_string(),
            }),
        }
    }

    async fn expect_json<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: Self::error_message(response).await,
            });
        }
        Ok(response.json().await?)
    }

    async fn error_message(response: reqwest::Response) -> String {
        match response.json::<serde_json::Value>().await {
            Ok(body) => body
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("request failed")
                .to_string(),
            Err(_) => "request failed".to_string(),
        }
    }
}
