//! giftdrop API library
//!
//! Backend and purchase-flow client for a shop of scarce, price-tagged
//! digital gifts. The server side owns the catalog and the purchase ledger;
//! the [`client`] module drives the buyer-side flow (invoice, payment host,
//! commit, notifications, activity feed).
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod client;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod services;

use axum::{
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use handlers::AppServices;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: AppServices,
}

/// Builds the HTTP API router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/gifts", get(handlers::gifts::list_gifts))
        .route("/api/gifts/:id/status", get(handlers::gifts::gift_status))
        .route(
            "/api/recent-purchases",
            get(handlers::purchases::recent_purchases),
        )
        .route("/api/purchase", post(handlers::purchases::commit_purchase))
        .route("/api/create-invoice", post(handlers::invoices::create_invoice))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
