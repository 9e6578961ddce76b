use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub kind: NotificationKind,
    pub created_at: DateTime<Utc>,
}

/// Transient user-facing feedback channel. Every notification owns a
/// cancellable expiry timer; timer expiry and manual dismissal run the same
/// removal path, so there is no double-removal race. Multiple notifications
/// coexist and display in insertion order.
#[derive(Clone)]
pub struct NotificationQueue {
    inner: Arc<QueueInner>,
}

struct QueueInner {
    entries: Mutex<Vec<Notification>>,
    timers: DashMap<u64, JoinHandle<()>>,
    next_id: AtomicU64,
    ttl: Duration,
}

impl NotificationQueue {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                entries: Mutex::new(Vec::new()),
                timers: DashMap::new(),
                next_id: AtomicU64::new(1),
                ttl,
            }),
        }
    }

    /// Appends a notification and schedules its self-removal. Safe to call
    /// from any point in the purchase flow, including error paths.
    pub fn push(&self, message: impl Into<String>, kind: NotificationKind) -> u64 {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let notification = Notification {
            id,
            message: message.into(),
            kind,
            created_at: Utc::now(),
        };

        self.inner
            .entries
            .lock()
            .expect("notification lock poisoned")
            .push(notification);

        let queue = self.clone();
        let ttl = self.inner.ttl;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            queue.dismiss(id);
        });
        self.inner.timers.insert(id, handle);

        id
    }

    /// Removes a notification and cancels its timer. Called both by the
    /// expiry timer and by manual dismissal; returns false when the id is
    /// already gone.
    pub fn dismiss(&self, id: u64) -> bool {
        let removed = {
            let mut entries = self
                .inner
                .entries
                .lock()
                .expect("notification lock poisoned");
            let before = entries.len();
            entries.retain(|n| n.id != id);
            entries.len() != before
        };

        if let Some((_, handle)) = self.inner.timers.remove(&id) {
            // No-op when the timer itself is the caller: abort only takes
            // effect at an await point, and the removal is already done.
            handle.abort();
        }

        removed
    }

    /// Current notifications in insertion order.
    pub fn snapshot(&self) -> Vec<Notification> {
        self.inner
            .entries
            .lock()
            .expect("notification lock poisoned")
            .clone()
    }

    pub fn len(&self) -> usize {
        self.inner
            .entries
            .lock()
            .expect("notification lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
