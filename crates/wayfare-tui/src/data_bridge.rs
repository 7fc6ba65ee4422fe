//! Data bridge: connects the console's store to TUI actions.
//!
//! Runs as a background task. Publishes the current snapshot, kicks off
//! the initial list fetches and the periodic refresh, then forwards every
//! new [`AppState`](wayfare_core::AppState) as [`Action::StateUpdated`]
//! until cancelled.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use wayfare_core::{Console, ListParams, ResourceKind};

use crate::action::{Action, Notification};

/// Resources the catalog screens list, fetched at startup and refreshed.
pub const CATALOG_KINDS: [ResourceKind; 6] = [
    ResourceKind::Hotels,
    ResourceKind::CabTypes,
    ResourceKind::Locations,
    ResourceKind::MealPlans,
    ResourceKind::TripPlanRequests,
    ResourceKind::Users,
];

/// Run one list fetch in the background. The store sees the outcome
/// through the thunk; a failure is also surfaced as a toast.
pub fn spawn_fetch(console: &Console, kind: ResourceKind, action_tx: &mpsc::UnboundedSender<Action>) {
    let console = console.clone();
    let tx = action_tx.clone();
    tokio::spawn(async move {
        match console.fetch_kind(kind, ListParams::new()).await {
            Ok(count) => debug!(resource = %kind, count, "fetch complete"),
            Err(e) => {
                warn!(resource = %kind, error = %e, "fetch failed");
                let _ = tx.send(Action::Notify(Notification::error(format!(
                    "{}: {e}",
                    kind.label()
                ))));
            }
        }
    });
}

pub async fn spawn_data_bridge(
    console: Console,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let mut states = console.subscribe();
    let _ = action_tx.send(Action::StateUpdated(states.latest()));

    for kind in CATALOG_KINDS {
        spawn_fetch(&console, kind, &action_tx);
    }
    console.start_refresh(CATALOG_KINDS.to_vec()).await;
    info!("data bridge running");

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            next = states.changed() => {
                let Some(state) = next else { break };
                if action_tx.send(Action::StateUpdated(state)).is_err() {
                    break;
                }
            }
        }
    }

    console.shutdown().await;
    debug!("data bridge stopped");
}
