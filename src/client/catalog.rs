use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

use crate::handlers::gifts::GiftResponse;
use crate::services::catalog::DEFAULT_GIFTS;

use super::api::ShopApi;

/// Current client view of the catalog. `fallback` marks data that did not
/// come from the listing endpoint; it keeps the UI rendering but must never
/// be treated as authoritative for purchase decisions. The purchase flow
/// re-reads the gift status endpoint before issuing an invoice.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub gifts: Vec<GiftResponse>,
    pub fallback: bool,
}

/// Client-side catalog store: remote listing with a built-in display
/// fallback so the shop always renders.
#[derive(Clone)]
pub struct CatalogStore {
    api: Arc<ShopApi>,
    inner: Arc<RwLock<CatalogSnapshot>>,
}

impl CatalogStore {
    pub fn new(api: Arc<ShopApi>) -> Self {
        Self {
            api,
            inner: Arc::new(RwLock::new(CatalogSnapshot {
                gifts: builtin_catalog(),
                fallback: true,
            })),
        }
    }

    /// Re-fetches the listing. On failure the last live snapshot is kept, or
    /// the built-in catalog when no live data has ever arrived; either way
    /// this is a display degrade only.
    pub async fn refresh(&self) {
        match self.api.list_gifts().await {
            Ok(gifts) => {
                let mut inner = self.inner.write().await;
                inner.gifts = gifts;
                inner.fallback = false;
            }
            Err(err) => {
                warn!("catalog refresh failed, keeping fallback view: {}", err);
            }
        }
    }

    pub async fn snapshot(&self) -> CatalogSnapshot {
        self.inner.read().await.clone()
    }

    pub async fn get(&self, gift_id: &str) -> Option<GiftResponse> {
        self.inner
            .read()
            .await
            .gifts
            .iter()
            .find(|g| g.id == gift_id)
            .cloned()
    }
}

/// The fixed built-in catalog, mirroring the server's seed data.
pub fn builtin_catalog() -> Vec<GiftResponse> {
    DEFAULT_GIFTS
        .iter()
        .map(|g| GiftResponse {
            id: g.id.to_string(),
            name: g.name.to_string(),
            price: g.price,
            availability: [g.remaining, g.total],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_backend_keeps_builtin_catalog() {
        // Nothing listens on this port; the refresh must degrade, not error.
        let api = Arc::new(ShopApi::new("http://127.0.0.1:9"));
        let store = CatalogStore::new(api);

        store.refresh().await;

        let snapshot = store.snapshot().await;
        assert!(snapshot.fallback);
        assert_eq!(snapshot.gifts.len(), 4);
        assert!(snapshot.gifts.iter().any(|g| g.id == "telegatruck_002"));
    }

    #[tokio::test]
    async fn get_resolves_fallback_entries() {
        let api = Arc::new(ShopApi::new("http://127.0.0.1:9"));
        let store = CatalogStore::new(api);

        let gift = store.get("joy_stick_003").await.expect("builtin gift");
        assert_eq!(gift.name, "Joy Stick");
        assert_eq!(gift.price, 1200);
        assert_eq!(gift.availability, [50, 200]);
    }
}
