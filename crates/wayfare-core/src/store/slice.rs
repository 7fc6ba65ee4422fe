// ── Async resource slice ──
//
// Reducer-shaped state for one entity type: the collection plus the two
// loading flags driven by the list and item request/success/failure triads.

use crate::error::CoreError;
use crate::model::{Entity, EntityId};
use crate::params::ListParams;

use super::collection::Collection;

/// The request lifecycle of one resource.
#[derive(Debug, Clone)]
pub enum SliceAction<T> {
    ListRequest(ListParams),
    ListSuccess(Vec<T>),
    ListFailure(CoreError),
    ItemRequest(EntityId),
    ItemSuccess(T),
    ItemFailure(CoreError),
}

impl<T> SliceAction<T> {
    /// Tag suffix, `"list/request"` and so on. The composed store prefixes
    /// it with the slice key.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::ListRequest(_) => "list/request",
            Self::ListSuccess(_) => "list/success",
            Self::ListFailure(_) => "list/failure",
            Self::ItemRequest(_) => "item/request",
            Self::ItemSuccess(_) => "item/success",
            Self::ItemFailure(_) => "item/failure",
        }
    }

    pub fn error(&self) -> Option<&CoreError> {
        match self {
            Self::ListFailure(e) | Self::ItemFailure(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResourceSlice<T> {
    /// True from a list request until its success or failure is reduced.
    pub is_fetching: bool,
    pub is_fetching_item: bool,
    pub items: Collection<T>,
}

impl<T> Default for ResourceSlice<T> {
    fn default() -> Self {
        Self {
            is_fetching: false,
            is_fetching_item: false,
            items: Collection::new(),
        }
    }
}

impl<T: PartialEq> PartialEq for ResourceSlice<T> {
    fn eq(&self, other: &Self) -> bool {
        self.is_fetching == other.is_fetching
            && self.is_fetching_item == other.is_fetching_item
            && self.items == other.items
    }
}

impl<T: Entity> ResourceSlice<T> {
    /// Pure transition: previous state + action → next state.
    ///
    /// Failures never clear the collection; stale data beats no data.
    #[must_use]
    pub fn reduce(&self, action: &SliceAction<T>) -> Self {
        let mut next = self.clone();
        match action {
            SliceAction::ListRequest(_) => next.is_fetching = true,
            SliceAction::ListSuccess(batch) => {
                next.is_fetching = false;
                next.items = self.items.insert(batch.iter().cloned());
            }
            SliceAction::ListFailure(_) => next.is_fetching = false,
            SliceAction::ItemRequest(_) => next.is_fetching_item = true,
            SliceAction::ItemSuccess(item) => {
                next.is_fetching_item = false;
                next.items = self.items.insert([item.clone()]);
            }
            SliceAction::ItemFailure(_) => next.is_fetching_item = false,
        }
        next
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::User;
    use pretty_assertions::assert_eq;

    fn user(id: u64, name: &str) -> User {
        User {
            id: id.into(),
            name: name.into(),
            email: None,
            roles: Vec::new(),
        }
    }

    fn names(slice: &ResourceSlice<User>) -> Vec<String> {
        slice.items.iter().map(|u| u.name.clone()).collect()
    }

    #[test]
    fn list_lifecycle() {
        let s0 = ResourceSlice::<User>::default();
        assert!(!s0.is_fetching);
        assert!(s0.items.is_empty());

        let s1 = s0.reduce(&SliceAction::ListRequest(ListParams::new()));
        assert!(s1.is_fetching);

        let s2 = s1.reduce(&SliceAction::ListSuccess(vec![user(1, "A")]));
        assert!(!s2.is_fetching);
        assert_eq!(names(&s2), vec!["A"]);

        let s3 = s2.reduce(&SliceAction::ListRequest(ListParams::new()));
        let s4 = s3.reduce(&SliceAction::ListFailure(CoreError::Timeout));
        assert!(!s4.is_fetching);
        assert_eq!(s4.items, s2.items);
        assert!(s4.items.ptr_eq(&s2.items));
    }

    #[test]
    fn item_lifecycle_merges_into_items() {
        let s = ResourceSlice::default()
            .reduce(&SliceAction::ListSuccess(vec![user(1, "A"), user(2, "B")]))
            .reduce(&SliceAction::ItemRequest(2_u64.into()));
        assert!(s.is_fetching_item);
        assert!(!s.is_fetching);

        let s = s.reduce(&SliceAction::ItemSuccess(user(2, "B2")));
        assert!(!s.is_fetching_item);
        assert_eq!(names(&s), vec!["A", "B2"]);

        let s = s
            .reduce(&SliceAction::ItemRequest(3_u64.into()))
            .reduce(&SliceAction::ItemFailure(CoreError::Timeout));
        assert!(!s.is_fetching_item);
        assert_eq!(s.items.len(), 2);
    }

    #[test]
    fn overlapping_requests_follow_latest_reduction() {
        let s = ResourceSlice::default()
            .reduce(&SliceAction::ListRequest(ListParams::new()))
            .reduce(&SliceAction::ListRequest(ListParams::new().search("b")))
            .reduce(&SliceAction::ListSuccess(vec![user(2, "B")]));
        assert!(!s.is_fetching);

        let s = s.reduce(&SliceAction::ListSuccess(vec![user(1, "A"), user(2, "B")]));
        assert_eq!(names(&s), vec!["B", "A"]);
    }

    #[test]
    fn tags() {
        let action: SliceAction<User> = SliceAction::ItemFailure(CoreError::Timeout);
        assert_eq!(action.tag(), "item/failure");
        assert_eq!(action.error(), Some(&CoreError::Timeout));
    }
}
