//! Data layer between `wayfare-api` and the front ends (CLI / TUI).
//!
//! - **[`Collection`]**: immutable, insertion-ordered, id-keyed entity
//!   container. Merging a batch returns a new value; known ids keep their
//!   position and take the fresh snapshot, new ids are appended.
//!
//! - **[`ResourceSlice`]**: `is_fetching` flags plus one collection,
//!   driven by the list and item request/success/failure triads
//!   ([`SliceAction`]). Every resource gets one slice in [`AppState`];
//!   [`StoreAction`] routes each action to its own slice only.
//!
//! - **[`Store`]**: the single dispatch path. Publishes every new
//!   `Arc<AppState>` through a `watch` channel; [`StateStream`] follows it.
//!
//! - **[`selectors`]**: read-only projections (`is_fetching`, `items`,
//!   `get_item`) over one slice of a snapshot.
//!
//! - **[`Console`]**: facade owning the store and a [`Transport`]. Its
//!   fetch thunks update the store *and* return the outcome to the caller;
//!   it also hands out search functions and runs the background refresh.
//!
//! - **[`RemoteSelect`]**: headless search-and-pick state machine reused
//!   by every entity picker.

pub mod config;
pub mod console;
pub mod error;
pub mod model;
pub mod params;
pub mod select;
pub mod store;
pub mod stream;
pub mod transport;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{AuthCredentials, ConsoleConfig, TlsVerification};
pub use console::Console;
pub use error::{CoreError, FieldErrors};
pub use params::ListParams;
pub use select::{
    Blurred, RemoteSelect, SearchFn, SearchRequest, SearchResponse, SelectOption, SelectPhase,
    SelectProps, SelectValue, SelectionChanged,
};
pub use store::{
    AppState, Collection, Resource, ResourceSlice, Selectors, SliceAction, Store, StoreAction,
    selectors,
};
pub use stream::StateStream;
pub use transport::Transport;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Cab, CabPrice, CabType, Entity, EntityId, Hotel, Location, LocationService, MealPlan,
    ResourceKind, Role, RoomType, TripPlanRequest, TripPlanStatus, User,
};
