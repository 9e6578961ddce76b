use std::sync::Arc;
use tokio::sync::watch;

/// Owned UI state for the purchase surface. No ambient globals: every
/// mutation goes through [`StateStore`] and is observed via `watch`
/// subscriptions, so updates flow one way.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UiState {
    pub selected_gift: Option<String>,
    pub modal_open: bool,
    /// True while a purchase attempt is in flight; the buy action is
    /// disabled until it clears.
    pub processing: bool,
}

#[derive(Clone)]
pub struct StateStore {
    tx: Arc<watch::Sender<UiState>>,
}

impl StateStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(UiState::default());
        Self { tx: Arc::new(tx) }
    }

    /// Subscribe to state changes. Receivers see the latest value on every
    /// mutation.
    pub fn subscribe(&self) -> watch::Receiver<UiState> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> UiState {
        self.tx.borrow().clone()
    }

    pub fn open_modal(&self, gift_id: &str) {
        self.update(|s| {
            s.selected_gift = Some(gift_id.to_string());
            s.modal_open = true;
        });
    }

    pub fn close_modal(&self) {
        self.update(|s| {
            s.selected_gift = None;
            s.modal_open = false;
        });
    }

    pub fn set_processing(&self, processing: bool) {
        self.update(|s| s.processing = processing);
    }

    fn update(&self, f: impl FnOnce(&mut UiState)) {
        self.tx.send_modify(f);
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_observe_modal_transitions() {
        let store = StateStore::new();
        let mut rx = store.subscribe();

        store.open_modal("telegatruck_002");
        rx.changed().await.expect("state change");
        let state = rx.borrow().clone();
        assert!(state.modal_open);
        assert_eq!(state.selected_gift.as_deref(), Some("telegatruck_002"));

        store.close_modal();
        rx.changed().await.expect("state change");
        assert!(!rx.borrow().modal_open);
        assert_eq!(rx.borrow().selected_gift, None);
    }

    #[test]
    fn processing_flag_round_trips() {
        let store = StateStore::new();
        assert!(!store.snapshot().processing);
        store.set_processing(true);
        assert!(store.snapshot().processing);
        store.set_processing(false);
        assert!(!store.snapshot().processing);
    }
}
