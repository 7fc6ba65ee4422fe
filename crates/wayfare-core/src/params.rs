use std::collections::BTreeMap;

/// Query-string parameters for a list fetch.
///
/// Ordered so the same parameters always serialize to the same query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams(BTreeMap<String, String>);

/// Parameter name the API reads free-text search from.
pub const SEARCH_PARAM: &str = "q";

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a parameter.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Set the free-text search query. An empty query removes it.
    #[must_use]
    pub fn search(mut self, query: &str) -> Self {
        let query = query.trim();
        if query.is_empty() {
            self.0.remove(SEARCH_PARAM);
        } else {
            self.0.insert(SEARCH_PARAM.into(), query.into());
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_query(&self) -> Vec<(String, String)> {
        self.0.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ListParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
