// ── Console facade ──
//
// Owns the store and the transport. Runs the fetch thunks that drive each
// slice through request/success/failure, hands out search functions for
// pickers, and keeps an optional background refresh alive.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ConsoleConfig;
use crate::error::CoreError;
use crate::model::{
    Cab, CabPrice, CabType, EntityId, Hotel, Location, LocationService, MealPlan, ResourceKind,
    Role, RoomType, TripPlanRequest, User,
};
use crate::params::ListParams;
use crate::select::{SearchFn, SearchFuture};
use crate::store::{AppState, Resource, Store, StoreAction};
use crate::stream::StateStream;
use crate::transport::{self, Transport};

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ConsoleInner>`. All state changes go through
/// the store's single dispatch path.
#[derive(Clone)]
pub struct Console {
    inner: Arc<ConsoleInner>,
}

struct ConsoleInner {
    store: Arc<Store>,
    transport: Arc<dyn Transport>,
    refresh_interval: Duration,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Console {
    /// Build the HTTP transport from `config` and start with an empty store.
    pub fn new(config: &ConsoleConfig) -> Result<Self, CoreError> {
        let client = transport::connect(config)?;
        debug!(api_url = %config.api_url, "console created");
        Ok(Self::with_transport(
            Arc::new(client),
            Arc::new(Store::new()),
            Duration::from_secs(config.refresh_interval_secs),
        ))
    }

    /// Assemble a console from parts. `refresh_interval` of zero disables
    /// [`start_refresh`](Self::start_refresh).
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        store: Arc<Store>,
        refresh_interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(ConsoleInner {
                store,
                transport,
                refresh_interval,
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.inner.store
    }

    pub fn state(&self) -> Arc<AppState> {
        self.inner.store.state()
    }

    pub fn subscribe(&self) -> StateStream {
        self.inner.store.subscribe()
    }

    // ── Fetch thunks ─────────────────────────────────────────────

    /// Fetch `T`'s collection and merge it into the store.
    ///
    /// Dispatches request, then success or failure. The outcome is also
    /// returned: callers get the batch, or the same error the store saw.
    pub async fn fetch_list<T: Resource>(&self, params: ListParams) -> Result<Vec<T>, CoreError> {
        let store = &self.inner.store;
        store.dispatch(StoreAction::list_request::<T>(params.clone()));

        match list_as::<T>(self.inner.transport.as_ref(), &params).await {
            Ok(items) => {
                debug!(resource = %T::KIND, count = items.len(), "list fetched");
                store.dispatch(StoreAction::list_success(items.clone()));
                Ok(items)
            }
            Err(e) => {
                debug!(resource = %T::KIND, error = %e, "list fetch failed");
                store.dispatch(StoreAction::list_failure::<T>(e.clone()));
                Err(e)
            }
        }
    }

    /// Fetch one record and merge it into `T`'s collection.
    pub async fn fetch_item<T: Resource>(&self, id: &EntityId) -> Result<T, CoreError> {
        let store = &self.inner.store;
        store.dispatch(StoreAction::item_request::<T>(id.clone()));

        let result = async {
            let raw = self.inner.transport.get(T::KIND.path(), id).await?;
            decode::<T>(raw)
        }
        .await;

        match result {
            Ok(item) => {
                store.dispatch(StoreAction::item_success(item.clone()));
                Ok(item)
            }
            Err(e) => {
                debug!(resource = %T::KIND, %id, error = %e, "item fetch failed");
                store.dispatch(StoreAction::item_failure::<T>(e.clone()));
                Err(e)
            }
        }
    }

    /// Run the list thunk for a resource chosen at runtime. Returns the
    /// number of records fetched. A successful fetch stamps the store's
    /// `last_refresh`; a failed one leaves it alone.
    pub async fn fetch_kind(&self, kind: ResourceKind, params: ListParams) -> Result<usize, CoreError> {
        let count = match kind {
            ResourceKind::CabTypes => self.fetch_list::<CabType>(params).await?.len(),
            ResourceKind::Cabs => self.fetch_list::<Cab>(params).await?.len(),
            ResourceKind::Locations => self.fetch_list::<Location>(params).await?.len(),
            ResourceKind::LocationServices => {
                self.fetch_list::<LocationService>(params).await?.len()
            }
            ResourceKind::MealPlans => self.fetch_list::<MealPlan>(params).await?.len(),
            ResourceKind::RoomTypes => self.fetch_list::<RoomType>(params).await?.len(),
            ResourceKind::Hotels => self.fetch_list::<Hotel>(params).await?.len(),
            ResourceKind::CabPrices => self.fetch_list::<CabPrice>(params).await?.len(),
            ResourceKind::TripPlanRequests => {
                self.fetch_list::<TripPlanRequest>(params).await?.len()
            }
            ResourceKind::Roles => self.fetch_list::<Role>(params).await?.len(),
            ResourceKind::Users => self.fetch_list::<User>(params).await?.len(),
        };
        self.inner.store.mark_refreshed();
        Ok(count)
    }

    // ── Picker support ───────────────────────────────────────────

    /// A search function over `T` for a [`RemoteSelect`](crate::select::RemoteSelect).
    ///
    /// The query is sent as the `q` parameter on top of `base`. Results go
    /// to the picker only; the store is not touched.
    pub fn searcher<T: Resource>(&self, base: ListParams) -> SearchFn<T> {
        let transport = Arc::clone(&self.inner.transport);
        Arc::new(move |query: String| -> SearchFuture<T> {
            let transport = Arc::clone(&transport);
            let params = base.clone().search(&query);
            Box::pin(async move { list_as::<T>(transport.as_ref(), &params).await })
        })
    }

    // ── Background refresh ───────────────────────────────────────

    /// Re-fetch `kinds` every refresh interval until [`shutdown`](Self::shutdown).
    /// Does nothing when the interval is zero.
    pub async fn start_refresh(&self, kinds: Vec<ResourceKind>) {
        let interval = self.inner.refresh_interval;
        if interval.is_zero() || kinds.is_empty() {
            debug!("background refresh disabled");
            return;
        }

        let cancel = self.inner.cancel.child_token();
        let handle = tokio::spawn(refresh_task(self.clone(), kinds, interval, cancel));
        self.inner.task_handles.lock().await.push(handle);
        info!(interval_secs = interval.as_secs(), "background refresh started");
    }

    /// Cancel background tasks and wait for them to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        debug!("console shut down");
    }
}

/// List through the transport and decode into `T`.
async fn list_as<T: Resource>(
    transport: &dyn Transport,
    params: &ListParams,
) -> Result<Vec<T>, CoreError> {
    let raw = transport.list(T::KIND.path(), params).await?;
    raw.into_iter().map(decode::<T>).collect()
}

fn decode<T: Resource>(value: Value) -> Result<T, CoreError> {
    serde_json::from_value(value).map_err(|e| CoreError::Decode {
        resource: T::KIND.key().to_owned(),
        message: e.to_string(),
    })
}

/// One refresh pass per tick. A failing resource is logged and skipped;
/// the task keeps running. Only successful fetches move `last_refresh`.
async fn refresh_task(
    console: Console,
    kinds: Vec<ResourceKind>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                for kind in &kinds {
                    if let Err(e) = console.fetch_kind(*kind, ListParams::new()).await {
                        warn!(resource = %kind, error = %e, "periodic refresh failed");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    use futures_util::future::BoxFuture;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::store::selectors;

    /// In-memory transport: canned responses per path, records every call.
    #[derive(Default)]
    struct FakeTransport {
        lists: HashMap<String, Result<Vec<Value>, CoreError>>,
        items: HashMap<String, Value>,
        calls: StdMutex<Vec<(String, ListParams)>>,
    }

    impl FakeTransport {
        fn with_list(mut self, path: &str, result: Result<Vec<Value>, CoreError>) -> Self {
            self.lists.insert(path.into(), result);
            self
        }

        fn with_item(mut self, path: &str, id: &str, value: Value) -> Self {
            self.items.insert(format!("{path}/{id}"), value);
            self
        }

        fn calls(&self) -> Vec<(String, ListParams)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Transport for FakeTransport {
        fn list<'a>(
            &'a self,
            path: &'a str,
            params: &'a ListParams,
        ) -> BoxFuture<'a, Result<Vec<Value>, CoreError>> {
            self.calls.lock().unwrap().push((path.into(), params.clone()));
            let result = self.lists.get(path).cloned().unwrap_or_else(|| Ok(Vec::new()));
            Box::pin(async move { result })
        }

        fn get<'a>(
            &'a self,
            path: &'a str,
            id: &'a EntityId,
        ) -> BoxFuture<'a, Result<Value, CoreError>> {
            let result = self
                .items
                .get(&format!("{path}/{id}"))
                .cloned()
                .ok_or_else(|| CoreError::NotFound {
                    resource: path.into(),
                    identifier: id.to_string(),
                });
            Box::pin(async move { result })
        }
    }

    fn console(fake: FakeTransport) -> (Console, Arc<FakeTransport>) {
        let fake = Arc::new(fake);
        let console = Console::with_transport(
            Arc::clone(&fake) as Arc<dyn Transport>,
            Arc::new(Store::new()),
            Duration::from_secs(60),
        );
        (console, fake)
    }

    #[tokio::test]
    async fn fetch_list_merges_and_returns_batch() {
        let (console, fake) = console(FakeTransport::default().with_list(
            "users",
            Ok(vec![json!({"id": 7, "name": "Bob"}), json!({"id": "8", "name": "Ana"})]),
        ));

        let users = console
            .fetch_list::<User>(ListParams::new().with("role", "admin"))
            .await
            .unwrap();
        assert_eq!(users.len(), 2);

        let state = console.state();
        let sel = selectors::<User>(&state);
        assert!(!sel.is_fetching());
        assert_eq!(sel.get_item(Some(&8_u64.into())).unwrap().name, "Ana");
        assert_eq!(fake.calls()[0].1.get("role"), Some("admin"));
    }

    #[tokio::test]
    async fn failure_is_dispatched_and_returned() {
        let (console, _) = console(
            FakeTransport::default()
                .with_list("hotels", Ok(vec![json!({"id": 1, "name": "Sea Breeze"})])),
        );
        console.fetch_list::<Hotel>(ListParams::new()).await.unwrap();

        let (failing, _) = console_sharing(&console, FakeTransport::default().with_list(
            "hotels",
            Err(CoreError::Api {
                message: "boom".into(),
                status: Some(502),
            }),
        ));
        let err = failing.fetch_list::<Hotel>(ListParams::new()).await.unwrap_err();
        assert!(matches!(err, CoreError::Api { status: Some(502), .. }));

        let state = failing.state();
        assert!(!state.hotels.is_fetching);
        assert_eq!(state.hotels.items.len(), 1);
    }

    /// A second console over the same store with a different transport.
    fn console_sharing(base: &Console, fake: FakeTransport) -> (Console, Arc<FakeTransport>) {
        let fake = Arc::new(fake);
        let console = Console::with_transport(
            Arc::clone(&fake) as Arc<dyn Transport>,
            Arc::clone(base.store()),
            Duration::ZERO,
        );
        (console, fake)
    }

    #[tokio::test]
    async fn decode_errors_name_the_resource() {
        let (console, _) = console(
            FakeTransport::default().with_list("cab-types", Ok(vec![json!({"name": "no id"})])),
        );
        let err = console.fetch_list::<CabType>(ListParams::new()).await.unwrap_err();
        assert!(matches!(err, CoreError::Decode { ref resource, .. } if resource == "cab_types"));
        assert!(!console.state().cab_types.is_fetching);
    }

    #[tokio::test]
    async fn fetch_item_merges_into_collection() {
        let (console, _) = console(
            FakeTransport::default()
                .with_list(
                    "locations",
                    Ok(vec![json!({"id": 1, "name": "Goa"}), json!({"id": 2, "name": "Pune"})]),
                )
                .with_item("locations", "1", json!({"id": 1, "name": "North Goa"})),
        );
        console.fetch_list::<Location>(ListParams::new()).await.unwrap();

        let goa = console.fetch_item::<Location>(&"1".into()).await.unwrap();
        assert_eq!(goa.name, "North Goa");

        let state = console.state();
        let names: Vec<String> = state.locations.items.iter().map(|l| l.name.clone()).collect();
        assert_eq!(names, vec!["North Goa", "Pune"]);
        assert!(!state.locations.is_fetching_item);

        let missing = console.fetch_item::<Location>(&99_u64.into()).await.unwrap_err();
        assert!(missing.is_not_found());
    }

    #[tokio::test]
    async fn searcher_sends_q_and_leaves_store_alone() {
        let (console, fake) = console(
            FakeTransport::default()
                .with_list("locations", Ok(vec![json!({"id": 2, "name": "Jaipur"})])),
        );
        let search = console.searcher::<Location>(ListParams::new().with("country", "IN"));

        let found = search("Ja".into()).await.unwrap();
        assert_eq!(found[0].name, "Jaipur");

        let calls = fake.calls();
        assert_eq!(calls[0].1.get("q"), Some("Ja"));
        assert_eq!(calls[0].1.get("country"), Some("IN"));
        assert!(console.state().locations.items.is_empty());
    }

    #[tokio::test]
    async fn fetch_kind_dispatches_by_runtime_kind() {
        let (console, _) = console(
            FakeTransport::default()
                .with_list("meal-plans", Ok(vec![json!({"id": 1, "name": "CP"})])),
        );
        let count = console
            .fetch_kind(ResourceKind::MealPlans, ListParams::new())
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(console.state().count(ResourceKind::MealPlans), 1);
        assert!(console.store().last_refresh().is_some());
    }

    #[tokio::test]
    async fn failed_fetch_kind_leaves_refresh_unstamped() {
        let (console, _) = console(FakeTransport::default().with_list("users", Err(CoreError::Timeout)));
        let err = console.fetch_kind(ResourceKind::Users, ListParams::new()).await.unwrap_err();
        assert!(matches!(err, CoreError::Timeout));
        assert!(console.store().last_refresh().is_none());
    }

    /// Parks every list call until the test releases it.
    struct GatedTransport {
        gate: tokio::sync::Mutex<Option<tokio::sync::oneshot::Receiver<Vec<Value>>>>,
    }

    impl Transport for GatedTransport {
        fn list<'a>(
            &'a self,
            _path: &'a str,
            _params: &'a ListParams,
        ) -> BoxFuture<'a, Result<Vec<Value>, CoreError>> {
            Box::pin(async move {
                let rx = self.gate.lock().await.take().ok_or(CoreError::Timeout)?;
                rx.await.map_err(|_| CoreError::Timeout)
            })
        }

        fn get<'a>(
            &'a self,
            _path: &'a str,
            _id: &'a EntityId,
        ) -> BoxFuture<'a, Result<Value, CoreError>> {
            Box::pin(async { Err(CoreError::Timeout) })
        }
    }

    #[tokio::test]
    async fn request_is_dispatched_before_the_transport_answers() {
        let (release, gate) = tokio::sync::oneshot::channel();
        let console = Console::with_transport(
            Arc::new(GatedTransport {
                gate: tokio::sync::Mutex::new(Some(gate)),
            }),
            Arc::new(Store::new()),
            Duration::ZERO,
        );

        let mut states = console.subscribe();
        let pending = tokio::spawn({
            let console = console.clone();
            async move { console.fetch_list::<User>(ListParams::new()).await }
        });

        let mid_flight = states.changed().await.unwrap();
        assert!(selectors::<User>(&mid_flight).is_fetching());
        assert!(!pending.is_finished());

        release.send(vec![json!({"id": 7, "name": "Bob"})]).unwrap();
        let users = pending.await.unwrap().unwrap();
        assert_eq!(users.len(), 1);

        let state = console.state();
        assert!(!selectors::<User>(&state).is_fetching());
        assert_eq!(selectors::<User>(&state).items().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_runs_until_shutdown() {
        let (console, fake) = console(
            FakeTransport::default()
                .with_list("roles", Ok(vec![json!({"id": 1, "name": "Admin"})]))
                .with_list("users", Err(CoreError::Timeout)),
        );
        console
            .start_refresh(vec![ResourceKind::Users, ResourceKind::Roles])
            .await;

        tokio::time::sleep(Duration::from_secs(61)).await;
        tokio::task::yield_now().await;
        console.shutdown().await;

        let paths: Vec<String> = fake.calls().into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["users", "roles"]);
        assert_eq!(console.state().roles.items.len(), 1);
        assert!(console.store().last_refresh().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_with_only_failures_never_stamps() {
        let (console, fake) = console(FakeTransport::default().with_list("users", Err(CoreError::Timeout)));
        console.start_refresh(vec![ResourceKind::Users]).await;

        tokio::time::sleep(Duration::from_secs(61)).await;
        tokio::task::yield_now().await;
        console.shutdown().await;

        assert_eq!(fake.calls().len(), 1);
        assert!(console.state().users.items.is_empty());
        assert!(console.store().last_refresh().is_none());
    }

    #[tokio::test]
    async fn zero_interval_disables_refresh() {
        let fake = Arc::new(FakeTransport::default());
        let console = Console::with_transport(
            Arc::clone(&fake) as Arc<dyn Transport>,
            Arc::new(Store::new()),
            Duration::ZERO,
        );
        console.start_refresh(vec![ResourceKind::Users]).await;
        console.shutdown().await;
        assert!(fake.calls().is_empty());
    }
}
