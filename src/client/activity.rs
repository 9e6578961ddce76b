use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

use crate::services::purchases::ActivityEntry;

use super::api::ShopApi;

const DEFAULT_FEED_LIMIT: u64 = 10;

/// Read-mostly feed of recent purchases across all buyers. Unreachable
/// backend degrades to a seeded placeholder list; after a local successful
/// commit the feed is refreshed so the buyer's own purchase shows up without
/// waiting for the next poll.
#[derive(Clone)]
pub struct ActivityFeed {
    api: Arc<ShopApi>,
    inner: Arc<RwLock<FeedSnapshot>>,
    limit: u64,
}

#[derive(Debug, Clone)]
struct FeedSnapshot {
    entries: Vec<ActivityEntry>,
    placeholder: bool,
}

impl ActivityFeed {
    pub fn new(api: Arc<ShopApi>) -> Self {
        Self::with_limit(api, DEFAULT_FEED_LIMIT)
    }

    pub fn with_limit(api: Arc<ShopApi>, limit: u64) -> Self {
        Self {
            api,
            inner: Arc::new(RwLock::new(FeedSnapshot {
                entries: placeholder_entries(),
                placeholder: true,
            })),
            limit,
        }
    }

    /// Re-fetches the feed; keeps the previous view on failure.
    pub async fn refresh(&self) {
        match self.api.recent_purchases(self.limit).await {
            Ok(entries) => {
                let mut inner = self.inner.write().await;
                inner.entries = entries;
                inner.placeholder = false;
            }
            Err(err) => {
                warn!("activity feed refresh failed, keeping current view: {}", err);
            }
        }
    }

    /// Most recent entries, newest first.
    pub async fn recent(&self, limit: usize) -> Vec<ActivityEntry> {
        let inner = self.inner.read().await;
        inner.entries.iter().take(limit).cloned().collect()
    }

    /// True while the feed shows placeholder rather than live data.
    pub async fn is_placeholder(&self) -> bool {
        self.inner.read().await.placeholder
    }
}

fn placeholder_entries() -> Vec<ActivityEntry> {
    let now = chrono::Utc::now();
    vec![
        ActivityEntry {
            id: Uuid::new_v4(),
            username: "telegram_user".to_string(),
            gift_name: "Durov Stand".to_string(),
            gift_id: "durov_stand_001".to_string(),
            purchased_at: now,
        },
        ActivityEntry {
            id: Uuid::new_v4(),
            username: "test_user".to_string(),
            gift_name: "Telegatruck".to_string(),
            gift_id: "telegatruck_002".to_string(),
            purchased_at: now,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_backend_keeps_placeholder_feed() {
        let api = Arc::new(ShopApi::new("http://127.0.0.1:9"));
        let feed = ActivityFeed::new(api);

        feed.refresh().await;

        assert!(feed.is_placeholder().await);
        let entries = feed.recent(10).await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].gift_id, "durov_stand_001");
    }

    #[tokio::test]
    async fn recent_respects_the_requested_limit() {
        let api = Arc::new(ShopApi::new("http://127.0.0.1:9"));
        let feed = ActivityFeed::new(api);

        let entries = feed.recent(1).await;
        assert_eq!(entries.len(), 1);
    }
}
