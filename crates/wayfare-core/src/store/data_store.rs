// ── Store container ──
//
// The single dispatch path. Every action is reduced synchronously into a
// fresh immutable `AppState`, which is then published to subscribers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::trace;

use super::state::{AppState, StoreAction};
use crate::stream::StateStream;

/// Owns the composed state. Inject it (usually as `Arc<Store>`) wherever
/// state is read or actions are dispatched; there is no global instance.
pub struct Store {
    state: watch::Sender<Arc<AppState>>,
    last_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self::with_state(AppState::default())
    }

    /// Start from a pre-populated state (tests, cached snapshots).
    pub fn with_state(state: AppState) -> Self {
        let (state, _) = watch::channel(Arc::new(state));
        let (last_refresh, _) = watch::channel(None);
        Self {
            state,
            last_refresh,
        }
    }

    /// Reduce `action` into the current state and publish the result.
    pub fn dispatch(&self, action: StoreAction) {
        trace!(action = %action.type_tag(), "dispatch");
        // `send_modify` updates unconditionally, even with zero receivers.
        self.state
            .send_modify(|state| *state = Arc::new(state.reduce(&action)));
    }

    /// Current snapshot (cheap `Arc` clone).
    pub fn state(&self) -> Arc<AppState> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> StateStream {
        StateStream::new(self.state.subscribe())
    }

    /// When the background refresh last completed a full pass.
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.borrow()
    }

    pub(crate) fn mark_refreshed(&self) {
        self.last_refresh.send_modify(|t| *t = Some(Utc::now()));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::Location;
    use crate::params::ListParams;

    fn goa() -> Location {
        Location {
            id: 1_u64.into(),
            name: "Goa".into(),
            short_name: None,
        }
    }

    #[test]
    fn dispatch_replaces_snapshot() {
        let store = Store::new();
        let before = store.state();

        store.dispatch(StoreAction::list_request::<Location>(ListParams::new()));
        store.dispatch(StoreAction::list_success(vec![goa()]));

        let after = store.state();
        assert!(!Arc::ptr_eq(&before, &after));
        assert!(before.locations.items.is_empty());
        assert_eq!(after.locations.items.len(), 1);
    }

    #[tokio::test]
    async fn subscribers_see_dispatches() {
        let store = Store::new();
        let mut stream = store.subscribe();

        store.dispatch(StoreAction::list_request::<Location>(ListParams::new()));
        let snap = stream.changed().await.unwrap();
        assert!(snap.locations.is_fetching);
    }

    #[test]
    fn refresh_timestamp() {
        let store = Store::new();
        assert!(store.last_refresh().is_none());
        store.mark_refreshed();
        assert!(store.last_refresh().is_some());
    }
}
