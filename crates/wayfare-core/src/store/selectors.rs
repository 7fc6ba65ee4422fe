// Read-only projections over one slice of the composed state.

use std::sync::Arc;

use super::collection::Collection;
use super::slice::ResourceSlice;
use super::state::{AppState, Resource};
use crate::model::EntityId;

/// Projections for resource `T`, borrowed from a state snapshot.
pub struct Selectors<'a, T> {
    slice: &'a ResourceSlice<T>,
}

/// Selectors for `T`'s slice of `state`.
pub fn selectors<T: Resource>(state: &AppState) -> Selectors<'_, T> {
    Selectors {
        slice: T::slice(state),
    }
}

impl<'a, T: Resource> Selectors<'a, T> {
    pub fn is_fetching(&self) -> bool {
        self.slice.is_fetching
    }

    pub fn is_fetching_item(&self) -> bool {
        self.slice.is_fetching_item
    }

    pub fn items(&self) -> Vec<Arc<T>> {
        self.slice.items.get()
    }

    /// Tolerates a missing or blank id.
    pub fn get_item(&self, id: Option<&EntityId>) -> Option<Arc<T>> {
        self.slice.items.get_item(id)
    }

    pub fn collection(&self) -> &'a Collection<T> {
        &self.slice.items
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::User;
    use crate::store::StoreAction;

    #[test]
    fn users_lookup_by_id() {
        let bob = User {
            id: 7_u64.into(),
            name: "Bob".into(),
            email: None,
            roles: Vec::new(),
        };
        let state = AppState::default().reduce(&StoreAction::list_success(vec![bob]));
        let users = selectors::<User>(&state);

        assert_eq!(users.get_item(Some(&7_u64.into())).unwrap().name, "Bob");
        assert!(users.get_item(Some(&99_u64.into())).is_none());
        assert!(users.get_item(None).is_none());
        assert!(!users.is_fetching());
        assert_eq!(users.items().len(), 1);
    }
}
