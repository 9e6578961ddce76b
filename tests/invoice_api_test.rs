mod common;

use axum::http::StatusCode;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::TestApp;

const PROVIDER_PATH: &str = "/bottest-provider-token-0123456789/createInvoiceLink";

fn invoice_body() -> serde_json::Value {
    json!({
        "title": "Durov Stand",
        "description": "Purchase of Durov Stand",
        "payload": "{\"gift_id\":\"durov_stand_001\",\"buyer_id\":\"buyer_1\",\"transaction_id\":\"tx_1700000000000_abc123def\"}",
        "currency": "XTR",
        "prices": [{"label": "Durov Stand", "amount": 1}],
    })
}

#[tokio::test]
async fn invoice_creation_returns_the_provider_link() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PROVIDER_PATH))
        .and(body_partial_json(json!({
            "currency": "XTR",
            "provider_token": "",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": "https://t.me/$abc123",
        })))
        .expect(1)
        .mount(&provider)
        .await;

    let app = TestApp::with_provider_base(&provider.uri()).await;

    let (status, body) = app.post_json("/api/create-invoice", invoice_body()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["invoice_link"], "https://t.me/$abc123");
}

#[tokio::test]
async fn provider_rejection_surfaces_as_bad_gateway() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PROVIDER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": false,
            "description": "PAYMENT_PROVIDER_INVALID",
        })))
        .mount(&provider)
        .await;

    let app = TestApp::with_provider_base(&provider.uri()).await;

    let (status, body) = app.post_json("/api/create-invoice", invoice_body()).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "provider_error");
}

#[tokio::test]
async fn unreachable_provider_surfaces_as_bad_gateway() {
    // Nothing is listening at the default provider base in tests.
    let app = TestApp::new().await;

    let (status, body) = app.post_json("/api/create-invoice", invoice_body()).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "provider_error");
}

#[tokio::test]
async fn non_positive_amounts_never_reach_the_provider() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PROVIDER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": "https://t.me/$never",
        })))
        .expect(0)
        .mount(&provider)
        .await;

    let app = TestApp::with_provider_base(&provider.uri()).await;

    let mut body = invoice_body();
    body["prices"][0]["amount"] = json!(0);
    let (status, response) = app.post_json("/api/create-invoice", body).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(response["code"], "provider_error");
}

#[tokio::test]
async fn malformed_payload_is_rejected() {
    let app = TestApp::new().await;

    let mut body = invoice_body();
    body["payload"] = json!("not json at all");
    let (status, response) = app.post_json("/api/create-invoice", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["code"], "invalid_input");
}

#[tokio::test]
async fn empty_title_fails_validation() {
    let app = TestApp::new().await;

    let mut body = invoice_body();
    body["title"] = json!("");
    let (status, response) = app.post_json("/api/create-invoice", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["code"], "validation_error");
}
