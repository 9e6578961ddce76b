pub mod gifts;
pub mod health;
pub mod invoices;
pub mod purchases;

use crate::{config::AppConfig, db::DbPool, events::EventSender, services};
use std::sync::Arc;

/// Aggregated services used by the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<services::catalog::CatalogService>,
    pub invoicing: Arc<services::invoicing::InvoiceService>,
    pub purchases: Arc<services::purchases::PurchaseService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender, cfg: &AppConfig) -> Self {
        let catalog = Arc::new(services::catalog::CatalogService::new(
            db.clone(),
            event_sender.clone(),
        ));
        let invoicing = Arc::new(services::invoicing::InvoiceService::new(
            cfg,
            event_sender.clone(),
        ));
        let purchases = Arc::new(services::purchases::PurchaseService::new(
            db,
            event_sender,
        ));

        Self {
            catalog,
            invoicing,
            purchases,
        }
    }
}
