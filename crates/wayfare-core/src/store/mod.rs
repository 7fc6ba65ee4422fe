// ── Normalized entity store ──
//
// Immutable collections, per-resource slices, the composed state and the
// container that dispatches into it.

mod collection;
mod data_store;
mod selectors;
mod slice;
mod state;

pub use collection::Collection;
pub use data_store::Store;
pub use selectors::{Selectors, selectors};
pub use slice::{ResourceSlice, SliceAction};
pub use state::{AppState, Resource, StoreAction};
