// ── Domain model ──
//
// Typed records for every resource the administration API serves. Each
// record carries a mandatory `EntityId`; the generic store machinery is
// parameterized over the `Entity` trait rather than probing JSON shapes.

pub mod access;
pub mod catalog;
pub mod entity_id;
pub mod pricing;
pub mod resource;
pub mod trip;

// ── Re-exports ──────────────────────────────────────────────────────

pub use entity_id::EntityId;
pub use resource::ResourceKind;

pub use access::{Role, User};
pub use catalog::{Cab, CabType, Hotel, Location, LocationService, MealPlan, RoomType};
pub use pricing::CabPrice;
pub use trip::{TripPlanRequest, TripPlanStatus};

/// A server-originated record with a unique id.
///
/// Records are immutable snapshots: a refresh replaces the stored value
/// wholesale, nothing is patched in place.
pub trait Entity: Clone + Send + Sync + 'static {
    fn id(&self) -> &EntityId;

    /// Human-readable name used by list rows and select options.
    fn label(&self) -> String;
}
