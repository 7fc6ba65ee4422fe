// ── Composed application state ──
//
// One resource slice per entity type under a distinct key, and the single
// reducer that routes each action to its own slice only.

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CoreError;
use crate::model::{
    Cab, CabPrice, CabType, Entity, EntityId, Hotel, Location, LocationService, MealPlan,
    ResourceKind, Role, RoomType, TripPlanRequest, User,
};
use crate::params::ListParams;

use super::slice::{ResourceSlice, SliceAction};

/// An entity type that owns a slice of [`AppState`].
///
/// Ties a record to its [`ResourceKind`] (slice key and REST path) and to
/// the [`StoreAction`] variant that carries its lifecycle actions.
pub trait Resource: Entity + Serialize + DeserializeOwned + fmt::Debug {
    const KIND: ResourceKind;

    fn slice(state: &AppState) -> &ResourceSlice<Self>;

    fn wrap(action: SliceAction<Self>) -> StoreAction;

    /// The slice action inside `action`, if it addresses this resource.
    fn extract(action: &StoreAction) -> Option<&SliceAction<Self>>;
}

macro_rules! composed_state {
    ( $( $variant:ident => $field:ident : $ty:ty ),* $(,)? ) => {
        /// Every action the store accepts, tagged by the slice it targets.
        #[derive(Debug, Clone)]
        pub enum StoreAction {
            $( $variant(SliceAction<$ty>), )*
        }

        impl StoreAction {
            pub fn kind(&self) -> ResourceKind {
                match self {
                    $( Self::$variant(_) => ResourceKind::$variant, )*
                }
            }

            fn suffix(&self) -> &'static str {
                match self {
                    $( Self::$variant(a) => a.tag(), )*
                }
            }

            pub fn error(&self) -> Option<&CoreError> {
                match self {
                    $( Self::$variant(a) => a.error(), )*
                }
            }
        }

        /// The whole client-side cache: one slice per resource.
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct AppState {
            $( pub $field: ResourceSlice<$ty>, )*
        }

        impl AppState {
            /// Apply one action. Only the addressed slice is rebuilt; every
            /// other slice is carried over sharing its storage.
            #[must_use]
            pub fn reduce(&self, action: &StoreAction) -> Self {
                let mut next = self.clone();
                match action {
                    $( StoreAction::$variant(a) => next.$field = self.$field.reduce(a), )*
                }
                next
            }

            pub fn is_fetching(&self, kind: ResourceKind) -> bool {
                match kind {
                    $( ResourceKind::$variant => self.$field.is_fetching, )*
                }
            }

            pub fn count(&self, kind: ResourceKind) -> usize {
                match kind {
                    $( ResourceKind::$variant => self.$field.items.len(), )*
                }
            }
        }

        $(
            impl Resource for $ty {
                const KIND: ResourceKind = ResourceKind::$variant;

                fn slice(state: &AppState) -> &ResourceSlice<Self> {
                    &state.$field
                }

                fn wrap(action: SliceAction<Self>) -> StoreAction {
                    StoreAction::$variant(action)
                }

                fn extract(action: &StoreAction) -> Option<&SliceAction<Self>> {
                    match action {
                        StoreAction::$variant(a) => Some(a),
                        _ => None,
                    }
                }
            }
        )*
    };
}

composed_state! {
    CabTypes => cab_types: CabType,
    Cabs => cabs: Cab,
    Locations => locations: Location,
    LocationServices => location_services: LocationService,
    MealPlans => meal_plans: MealPlan,
    RoomTypes => room_types: RoomType,
    Hotels => hotels: Hotel,
    CabPrices => cab_prices: CabPrice,
    TripPlanRequests => trip_plan_requests: TripPlanRequest,
    Roles => roles: Role,
    Users => users: User,
}

// ── Action constructors ──────────────────────────────────────────────

impl StoreAction {
    /// `"<key>/<list|item>/<request|success|failure>"`, unique per slice.
    pub fn type_tag(&self) -> String {
        format!("{}/{}", self.kind().key(), self.suffix())
    }

    pub fn list_request<T: Resource>(params: ListParams) -> Self {
        T::wrap(SliceAction::ListRequest(params))
    }

    pub fn list_success<T: Resource>(items: Vec<T>) -> Self {
        T::wrap(SliceAction::ListSuccess(items))
    }

    pub fn list_failure<T: Resource>(error: CoreError) -> Self {
        T::wrap(SliceAction::ListFailure(error))
    }

    pub fn item_request<T: Resource>(id: EntityId) -> Self {
        T::wrap(SliceAction::ItemRequest(id))
    }

    pub fn item_success<T: Resource>(item: T) -> Self {
        T::wrap(SliceAction::ItemSuccess(item))
    }

    pub fn item_failure<T: Resource>(error: CoreError) -> Self {
        T::wrap(SliceAction::ItemFailure(error))
    }
}

impl AppState {
    pub fn slice<T: Resource>(&self) -> &ResourceSlice<T> {
        T::slice(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;
    use strum::IntoEnumIterator;

    fn cab_type(id: u64, name: &str) -> CabType {
        CabType {
            id: id.into(),
            name: name.into(),
            capacity: None,
        }
    }

    #[test]
    fn actions_route_only_to_their_slice() {
        let state = AppState::default()
            .reduce(&StoreAction::list_success(vec![cab_type(1, "Sedan")]));
        let next = state.reduce(&StoreAction::list_request::<User>(ListParams::new()));

        assert!(next.users.is_fetching);
        assert!(!next.cab_types.is_fetching);
        assert!(next.cab_types.items.ptr_eq(&state.cab_types.items));
        assert_eq!(next.cab_types, state.cab_types);
    }

    #[test]
    fn type_tags_are_distinct_per_slice() {
        let a = StoreAction::list_request::<CabType>(ListParams::new());
        let b = StoreAction::list_request::<Location>(ListParams::new());
        assert_eq!(a.type_tag(), "cab_types/list/request");
        assert_eq!(b.type_tag(), "locations/list/request");
        assert_eq!(
            StoreAction::item_failure::<TripPlanRequest>(CoreError::Timeout).type_tag(),
            "trip_plan_requests/item/failure"
        );
    }

    #[test]
    fn list_request_tags_for_every_slice() {
        let tags: Vec<String> = ResourceKind::iter()
            .map(|kind| format!("{}/list/request", kind.key()))
            .collect();
        insta::assert_snapshot!(tags.join("\n"), @r"
        cab_types/list/request
        cabs/list/request
        locations/list/request
        location_services/list/request
        meal_plans/list/request
        room_types/list/request
        hotels/list/request
        cab_prices/list/request
        trip_plan_requests/list/request
        roles/list/request
        users/list/request
        ");
    }

    #[test]
    fn every_kind_has_a_slice() {
        let state = AppState::default();
        let kinds: HashSet<ResourceKind> = ResourceKind::iter().collect();
        for kind in &kinds {
            assert!(!state.is_fetching(*kind));
            assert_eq!(state.count(*kind), 0);
        }
        assert_eq!(CabPrice::KIND, ResourceKind::CabPrices);
    }

    #[test]
    fn extract_matches_own_variant() {
        let action = StoreAction::item_request::<Hotel>(3_u64.into());
        assert!(Hotel::extract(&action).is_some());
        assert!(User::extract(&action).is_none());
        assert_eq!(action.kind(), ResourceKind::Hotels);
    }
}
