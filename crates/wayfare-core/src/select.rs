// ── Remote search / select ──
//
// Headless state machine behind every entity picker: a query goes out
// through an injected fetch function, results come back, and the visible
// option list is reconciled with whatever is already selected. Rendering
// and event plumbing belong to the front end; this type only decides
// what the picker shows and what a selection means.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::future::BoxFuture;
use tracing::debug;

use crate::error::CoreError;
use crate::model::{Entity, EntityId};

pub type SearchFuture<T> = BoxFuture<'static, Result<Vec<T>, CoreError>>;

/// Performs one search. Receives the raw query text (`""` for "everything").
pub type SearchFn<T> = Arc<dyn Fn(String) -> SearchFuture<T> + Send + Sync>;

// ── Values ───────────────────────────────────────────────────────────

/// One pickable entry.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectOption<T> {
    /// A record the server returned.
    Existing(Arc<T>),
    /// Free text the user chose to create; its id is the raw text.
    Created { id: EntityId, label: String },
}

impl<T: Entity> SelectOption<T> {
    pub fn created(text: &str) -> Self {
        Self::Created {
            id: EntityId::Str(text.to_owned()),
            label: text.to_owned(),
        }
    }

    pub fn id(&self) -> &EntityId {
        match self {
            Self::Existing(entity) => entity.id(),
            Self::Created { id, .. } => id,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Existing(entity) => entity.label(),
            Self::Created { label, .. } => label.clone(),
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created { .. })
    }
}

impl<T> From<T> for SelectOption<T> {
    fn from(entity: T) -> Self {
        Self::Existing(Arc::new(entity))
    }
}

/// The current selection.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectValue<T> {
    Single(Option<SelectOption<T>>),
    Multiple(Vec<SelectOption<T>>),
}

impl<T: Entity> SelectValue<T> {
    pub fn empty(multiple: bool) -> Self {
        if multiple {
            Self::Multiple(Vec::new())
        } else {
            Self::Single(None)
        }
    }

    pub fn options(&self) -> &[SelectOption<T>] {
        match self {
            Self::Single(Some(option)) => std::slice::from_ref(option),
            Self::Single(None) => &[],
            Self::Multiple(options) => options,
        }
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.options().iter().any(|o| o.id() == id)
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.options().iter().map(|o| o.id().clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.options().is_empty()
    }

    /// Reshape to the given mode, keeping what fits.
    fn into_mode(self, multiple: bool) -> Self {
        match (self, multiple) {
            (Self::Single(option), true) => Self::Multiple(option.into_iter().collect()),
            (Self::Multiple(options), false) => Self::Single(options.into_iter().next()),
            (value, _) => value,
        }
    }
}

// ── Props and notifications ──────────────────────────────────────────

#[derive(Clone)]
pub struct SelectProps<T> {
    /// Form field name, echoed in every change notification.
    pub name: String,
    pub multiple: bool,
    /// Offer the raw query as a new option when a search finds nothing.
    pub creatable: bool,
    /// Search for `""` once at mount, before any focus.
    pub fetch_on_mount: bool,
    pub fetch: SearchFn<T>,
}

impl<T> SelectProps<T> {
    pub fn new(name: impl Into<String>, fetch: SearchFn<T>) -> Self {
        Self {
            name: name.into(),
            multiple: false,
            creatable: false,
            fetch_on_mount: false,
            fetch,
        }
    }

    #[must_use]
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    #[must_use]
    pub fn creatable(mut self) -> Self {
        self.creatable = true;
        self
    }

    #[must_use]
    pub fn fetch_on_mount(mut self) -> Self {
        self.fetch_on_mount = true;
        self
    }
}

impl<T> fmt::Debug for SelectProps<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectProps")
            .field("name", &self.name)
            .field("multiple", &self.multiple)
            .field("creatable", &self.creatable)
            .field("fetch_on_mount", &self.fetch_on_mount)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectPhase {
    /// Closed.
    Idle,
    /// Open, nothing fetched yet.
    FocusedEmpty,
    /// A search for the latest query is in flight.
    Querying,
    FocusedWithOptions,
}

/// Emitted on every selection change: the new value and the field name.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionChanged<T> {
    pub value: SelectValue<T>,
    pub field: String,
}

/// Emitted when an open picker closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blurred {
    pub field: String,
}

// ── Searches ─────────────────────────────────────────────────────────

/// A search the picker wants performed. The caller decides where it runs
/// and feeds the [`SearchResponse`] back through [`RemoteSelect::resolve`].
pub struct SearchRequest<T> {
    seq: u64,
    query: String,
    latest: Arc<AtomicU64>,
    fetch: SearchFn<T>,
}

impl<T: Send + 'static> SearchRequest<T> {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// `true` once the picker has issued a newer search.
    pub fn is_superseded(&self) -> bool {
        self.latest.load(Ordering::Acquire) != self.seq
    }

    pub async fn run(self) -> SearchResponse<T> {
        let result = (self.fetch)(self.query.clone()).await;
        SearchResponse {
            seq: self.seq,
            query: self.query,
            result,
        }
    }

    /// Wait out `delay`, then search unless a newer query arrived in the
    /// meantime. Typing bursts collapse into one request.
    pub async fn run_debounced(self, delay: Duration) -> Option<SearchResponse<T>> {
        tokio::time::sleep(delay).await;
        if self.is_superseded() {
            debug!(seq = self.seq, query = %self.query, "search superseded before sending");
            return None;
        }
        Some(self.run().await)
    }
}

impl<T> fmt::Debug for SearchRequest<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchRequest")
            .field("seq", &self.seq)
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct SearchResponse<T> {
    pub seq: u64,
    pub query: String,
    pub result: Result<Vec<T>, CoreError>,
}

// ── State machine ────────────────────────────────────────────────────

pub struct RemoteSelect<T> {
    props: SelectProps<T>,
    value: SelectValue<T>,
    phase: SelectPhase,
    query: String,
    results: Vec<Arc<T>>,
    /// The query `results` answer; `None` until a search lands.
    results_query: Option<String>,
    /// Sequence number of the most recently issued search.
    latest: Arc<AtomicU64>,
    mounted: bool,
    /// Single mode closes one turn after a selection, not during it.
    pending_close: bool,
}

impl<T: Entity> RemoteSelect<T> {
    pub fn new(props: SelectProps<T>, value: SelectValue<T>) -> Self {
        let value = value.into_mode(props.multiple);
        Self {
            props,
            value,
            phase: SelectPhase::Idle,
            query: String::new(),
            results: Vec::new(),
            results_query: None,
            latest: Arc::new(AtomicU64::new(0)),
            mounted: false,
            pending_close: false,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn props(&self) -> &SelectProps<T> {
        &self.props
    }

    pub fn value(&self) -> &SelectValue<T> {
        &self.value
    }

    pub fn phase(&self) -> SelectPhase {
        self.phase
    }

    pub fn query_text(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[Arc<T>] {
        &self.results
    }

    pub fn is_open(&self) -> bool {
        self.phase != SelectPhase::Idle
    }

    pub fn is_loading(&self) -> bool {
        self.phase == SelectPhase::Querying
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Replace the selection from outside (controlled value).
    pub fn set_value(&mut self, value: SelectValue<T>) {
        self.value = value.into_mode(self.props.multiple);
    }

    /// Called once when the picker first appears. Yields the warm-up
    /// search when `fetch_on_mount` is set; later calls yield nothing.
    pub fn mount(&mut self) -> Option<SearchRequest<T>> {
        if self.mounted {
            return None;
        }
        self.mounted = true;
        self.props.fetch_on_mount.then(|| self.issue(String::new()))
    }

    pub fn focus(&mut self) {
        if self.phase == SelectPhase::Idle {
            self.phase = self.settled_phase();
        }
    }

    /// Close the picker. Returns the blur notification if it was open.
    pub fn blur(&mut self) -> Option<Blurred> {
        self.pending_close = false;
        if self.phase == SelectPhase::Idle {
            return None;
        }
        self.phase = SelectPhase::Idle;
        Some(Blurred {
            field: self.props.name.clone(),
        })
    }

    /// A pointer press somewhere on screen. Presses outside the picker's
    /// area close it.
    pub fn pointer_down(&mut self, inside: bool) -> Option<Blurred> {
        if inside { None } else { self.blur() }
    }

    /// The query text changed. Opens the picker and issues a search.
    pub fn query(&mut self, text: impl Into<String>) -> SearchRequest<T> {
        self.query = text.into();
        self.phase = SelectPhase::Querying;
        self.issue(self.query.clone())
    }

    /// Apply a finished search.
    ///
    /// Returns `Ok(true)` when the results were applied, `Ok(false)` when
    /// the response was stale (a newer search was issued) and discarded.
    /// A failed search, stale or not, leaves the current options untouched
    /// and hands the error back.
    pub fn resolve(&mut self, response: SearchResponse<T>) -> Result<bool, CoreError> {
        let latest = self.latest.load(Ordering::Acquire);
        if response.seq < latest {
            debug!(
                field = %self.props.name,
                seq = response.seq,
                latest,
                "discarding stale search response"
            );
            // Stale results are dropped, stale errors still reach the caller.
            return response.result.map(|_| false);
        }

        match response.result {
            Ok(items) => {
                self.results = items.into_iter().map(Arc::new).collect();
                self.results_query = Some(response.query);
                if self.phase != SelectPhase::Idle {
                    self.phase = SelectPhase::FocusedWithOptions;
                }
                Ok(true)
            }
            Err(e) => {
                if self.phase == SelectPhase::Querying {
                    self.phase = self.settled_phase();
                }
                Err(e)
            }
        }
    }

    /// Options to display, in order: selected entries missing from the
    /// results, then the results, then the "create" entry if it applies.
    pub fn visible_options(&self) -> Vec<SelectOption<T>> {
        let mut options: Vec<SelectOption<T>> = self
            .value
            .options()
            .iter()
            .filter(|selected| !self.results.iter().any(|r| r.id() == selected.id()))
            .cloned()
            .collect();

        options.extend(self.results.iter().cloned().map(SelectOption::Existing));

        if let Some(created) = self.create_option() {
            if !options.iter().any(|o| o.id() == created.id()) {
                options.push(created);
            }
        }
        options
    }

    /// Toggle `option`. Multi mode adds or removes it by id; single mode
    /// replaces the value and schedules the close for [`settle`](Self::settle).
    pub fn select(&mut self, option: SelectOption<T>) -> SelectionChanged<T> {
        match &mut self.value {
            SelectValue::Multiple(selected) => {
                if let Some(pos) = selected.iter().position(|o| o.id() == option.id()) {
                    selected.remove(pos);
                } else {
                    selected.push(option);
                }
            }
            SelectValue::Single(current) => {
                *current = Some(option);
                self.pending_close = true;
            }
        }
        self.changed()
    }

    /// Select the `index`-th visible option.
    pub fn select_index(&mut self, index: usize) -> Option<SelectionChanged<T>> {
        let option = self.visible_options().into_iter().nth(index)?;
        Some(self.select(option))
    }

    /// Run deferred work once the current event has been handled.
    pub fn settle(&mut self) -> Option<Blurred> {
        if self.pending_close {
            self.blur()
        } else {
            None
        }
    }

    pub fn clear(&mut self) -> SelectionChanged<T> {
        self.value = SelectValue::empty(self.props.multiple);
        self.changed()
    }

    // ── Internals ────────────────────────────────────────────────────

    fn issue(&self, query: String) -> SearchRequest<T> {
        let seq = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(field = %self.props.name, seq, %query, "search issued");
        SearchRequest {
            seq,
            query,
            latest: Arc::clone(&self.latest),
            fetch: Arc::clone(&self.props.fetch),
        }
    }

    fn settled_phase(&self) -> SelectPhase {
        if self.results.is_empty() {
            SelectPhase::FocusedEmpty
        } else {
            SelectPhase::FocusedWithOptions
        }
    }

    fn create_option(&self) -> Option<SelectOption<T>> {
        let blank = self.query.trim().is_empty();
        let answered = self.results_query.as_deref() == Some(self.query.as_str());
        (self.props.creatable && !blank && answered && self.results.is_empty())
            .then(|| SelectOption::created(&self.query))
    }

    fn changed(&self) -> SelectionChanged<T> {
        SelectionChanged {
            value: self.value.clone(),
            field: self.props.name.clone(),
        }
    }
}

impl<T> fmt::Debug for RemoteSelect<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteSelect")
            .field("props", &self.props)
            .field("phase", &self.phase)
            .field("query", &self.query)
            .field("results", &self.results.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::Location;
    use pretty_assertions::assert_eq;

    fn loc(id: u64, name: &str) -> Location {
        Location {
            id: id.into(),
            name: name.into(),
            short_name: None,
        }
    }

    /// A fetch function that answers every query with `items`.
    fn fixed(items: Vec<Location>) -> SearchFn<Location> {
        Arc::new(move |_query: String| -> SearchFuture<Location> {
            let items = items.clone();
            Box::pin(async move { Ok(items) })
        })
    }

    fn failing() -> SearchFn<Location> {
        Arc::new(|_query: String| -> SearchFuture<Location> {
            Box::pin(async { Err(CoreError::Timeout) })
        })
    }

    fn response(seq: u64, query: &str, items: Vec<Location>) -> SearchResponse<Location> {
        SearchResponse {
            seq,
            query: query.into(),
            result: Ok(items),
        }
    }

    fn ids(options: &[SelectOption<Location>]) -> Vec<EntityId> {
        options.iter().map(|o| o.id().clone()).collect()
    }

    #[tokio::test]
    async fn preserved_selection_and_new_match() {
        let props = SelectProps::new("destinations", fixed(vec![loc(2, "Jaipur")])).multiple();
        let mut select =
            RemoteSelect::new(props, SelectValue::Multiple(vec![loc(1, "Goa").into()]));

        select.focus();
        let request = select.query("Ja");
        assert_eq!(select.phase(), SelectPhase::Querying);

        let resp = request.run().await;
        assert!(select.resolve(resp).unwrap());
        assert_eq!(select.phase(), SelectPhase::FocusedWithOptions);

        let visible = select.visible_options();
        assert_eq!(ids(&visible), vec![1_u64.into(), 2_u64.into()]);

        let change = select.select(visible[1].clone());
        assert_eq!(change.field, "destinations");
        assert_eq!(change.value.ids(), vec![1_u64.into(), 2_u64.into()]);
        // Multi mode stays open.
        assert!(select.settle().is_none());
        assert!(select.is_open());
    }

    #[tokio::test]
    async fn creatable_offers_exactly_one_synthetic_option() {
        let props = SelectProps::new("city", fixed(Vec::new())).multiple().creatable();
        let mut select = RemoteSelect::new(props, SelectValue::empty(true));

        let request = select.query("Brand New City");
        // Nothing offered until the search for this text has answered.
        assert!(select.visible_options().is_empty());

        select.resolve(request.run().await).unwrap();
        let visible = select.visible_options();
        assert_eq!(visible.len(), 1);
        assert!(visible[0].is_created());
        assert_eq!(visible[0].id(), &EntityId::Str("Brand New City".into()));

        // Once chosen it is a preserved selection, not a second option.
        select.select(visible[0].clone());
        assert_eq!(select.visible_options().len(), 1);
    }

    #[tokio::test]
    async fn create_option_keeps_the_typed_text_verbatim() {
        let props = SelectProps::new("city", fixed(Vec::new())).creatable();
        let mut select = RemoteSelect::new(props, SelectValue::empty(false));

        let request = select.query(" Old Manali ");
        select.resolve(request.run().await).unwrap();
        let visible = select.visible_options();
        assert_eq!(ids(&visible), vec![EntityId::Str(" Old Manali ".into())]);
        assert_eq!(visible[0].label(), " Old Manali ");

        // Whitespace alone is not something to create.
        let request = select.query("   ");
        select.resolve(request.run().await).unwrap();
        assert!(select.visible_options().is_empty());
    }

    #[test]
    fn no_create_option_when_not_creatable_or_matches_exist() {
        let props = SelectProps::new("city", fixed(Vec::new()));
        let mut select = RemoteSelect::new(props, SelectValue::empty(false));
        let resp = tokio_test::block_on(select.query("Nowhere").run());
        select.resolve(resp).unwrap();
        assert!(select.visible_options().is_empty());

        let props = SelectProps::new("city", fixed(Vec::new())).creatable();
        let mut select = RemoteSelect::new(props, SelectValue::empty(false));
        let req = select.query("Go");
        select.resolve(response(req.seq(), "Go", vec![loc(1, "Goa")])).unwrap();
        assert!(select.visible_options().iter().all(|o| !o.is_created()));
    }

    #[test]
    fn stale_responses_are_discarded() {
        let props = SelectProps::new("city", fixed(Vec::new()));
        let mut select = RemoteSelect::new(props, SelectValue::empty(false));

        let first = select.query("J");
        let second = select.query("Ja");
        assert!(first.is_superseded());
        assert!(!second.is_superseded());

        assert!(select.resolve(response(second.seq(), "Ja", vec![loc(2, "Jaipur")])).unwrap());
        let late = response(first.seq(), "J", vec![loc(3, "Jodhpur"), loc(2, "Jaipur")]);
        assert!(!select.resolve(late).unwrap());

        assert_eq!(ids(&select.visible_options()), vec![2_u64.into()]);
    }

    #[test]
    fn stale_failures_still_surface() {
        let props = SelectProps::new("city", fixed(Vec::new()));
        let mut select = RemoteSelect::new(props, SelectValue::empty(false));
        select.focus();

        let first = select.query("G");
        let second = select.query("Go");
        let late = SearchResponse {
            seq: first.seq(),
            query: "G".into(),
            result: Err(CoreError::Timeout),
        };
        assert!(matches!(select.resolve(late), Err(CoreError::Timeout)));
        // The newer search is still the one being waited on.
        assert_eq!(select.phase(), SelectPhase::Querying);

        assert!(select.resolve(response(second.seq(), "Go", vec![loc(1, "Goa")])).unwrap());
        assert_eq!(select.phase(), SelectPhase::FocusedWithOptions);
    }

    #[tokio::test]
    async fn failed_search_keeps_options_and_returns_error() {
        let props = SelectProps::new("city", failing());
        let mut select = RemoteSelect::new(props, SelectValue::empty(false));
        let req = select.query("Go");
        select.resolve(response(req.seq(), "Go", vec![loc(1, "Goa")])).unwrap();

        let failed = select.query("Goa").run().await;
        assert_eq!(select.resolve(failed).unwrap_err(), CoreError::Timeout);
        assert_eq!(ids(&select.visible_options()), vec![1_u64.into()]);
        assert_eq!(select.phase(), SelectPhase::FocusedWithOptions);
    }

    #[test]
    fn single_mode_replaces_and_closes_on_settle() {
        let props = SelectProps::new("cab_type", fixed(Vec::new()));
        let mut select = RemoteSelect::new(props, SelectValue::Single(Some(loc(1, "Goa").into())));
        select.focus();
        assert_eq!(select.phase(), SelectPhase::FocusedEmpty);

        let change = select.select(loc(2, "Jaipur").into());
        assert_eq!(change.value.ids(), vec![2_u64.into()]);
        // Still open until the event has finished.
        assert!(select.is_open());

        let blurred = select.settle().unwrap();
        assert_eq!(blurred.field, "cab_type");
        assert_eq!(select.phase(), SelectPhase::Idle);
        assert!(select.settle().is_none());
    }

    #[test]
    fn pointer_outside_blurs_once() {
        let props = SelectProps::new("tags", fixed(Vec::new())).multiple();
        let mut select = RemoteSelect::new(props, SelectValue::empty(true));
        select.focus();

        assert!(select.pointer_down(true).is_none());
        assert!(select.pointer_down(false).is_some());
        assert!(select.pointer_down(false).is_none());
        assert!(select.blur().is_none());
    }

    #[test]
    fn mount_fetches_once_when_requested() {
        let props = SelectProps::new("tags", fixed(Vec::new())).fetch_on_mount();
        let mut select = RemoteSelect::new(props, SelectValue::empty(false));

        let warmup = select.mount().unwrap();
        assert_eq!(warmup.query(), "");
        assert!(select.mount().is_none());

        // The warm-up lands while closed; focusing shows it.
        select.resolve(response(warmup.seq(), "", vec![loc(1, "Goa")])).unwrap();
        assert_eq!(select.phase(), SelectPhase::Idle);
        select.focus();
        assert_eq!(select.phase(), SelectPhase::FocusedWithOptions);

        let props = SelectProps::new("tags", fixed(Vec::new()));
        assert!(RemoteSelect::new(props, SelectValue::empty(false)).mount().is_none());
    }

    #[test]
    fn multi_toggle_removes_by_id_and_clear_empties() {
        let props = SelectProps::new("tags", fixed(Vec::new())).multiple();
        let mut select = RemoteSelect::new(props, SelectValue::Single(Some(loc(1, "Goa").into())));
        assert!(matches!(select.value(), SelectValue::Multiple(v) if v.len() == 1));

        let change = select.select(loc(1, "Goa (renamed)").into());
        assert!(change.value.is_empty());

        select.select(loc(4, "Pune").into());
        assert!(select.clear().value.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn debounced_search_skips_superseded_queries() {
        let props = SelectProps::new("city", fixed(vec![loc(2, "Jaipur")]));
        let mut select = RemoteSelect::new(props, SelectValue::empty(false));

        let first = select.query("J");
        let second = select.query("Ja");

        let delay = Duration::from_millis(250);
        let (a, b) = tokio::join!(first.run_debounced(delay), second.run_debounced(delay));
        assert!(a.is_none());
        assert!(select.resolve(b.unwrap()).unwrap());
        assert_eq!(select.results().len(), 1);
    }
}
