//! Client-side search and filtering.
//!
//! Pure derivation of the displayed subset of a resource list. The input list
//! is never mutated and the result keeps the input order.

use std::collections::BTreeMap;

use crate::models::{value_text, Resource, ResourceSchema};

/// Filter value meaning "no restriction".
pub const ALL: &str = "All";

/// Current search text plus discrete filter selections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub search: String,
    /// Field (dotted path allowed) -> required value
    pub selections: BTreeMap<String, String>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    #[must_use]
    pub fn with_selection(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.selections.insert(field.into(), value.into());
        self
    }

    /// Whether anything would be filtered out.
    pub fn is_active(&self) -> bool {
        !self.search.trim().is_empty() || self.selections.values().any(|v| !is_all(v))
    }
}

fn is_all(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case(ALL)
}

/// Applies [`FilterState`] to resource lists.
#[derive(Debug, Clone)]
pub struct FilterEngine {
    searchable: Vec<String>,
}

impl FilterEngine {
    pub fn new<I, S>(searchable: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            searchable: searchable.into_iter().map(Into::into).collect(),
        }
    }

    pub fn for_schema(schema: &ResourceSchema) -> Self {
        Self::new(schema.searchable.iter().copied())
    }

    /// Derive the visible subset of `list`.
    ///
    /// Search is a case-insensitive substring match over the searchable
    /// fields; selections are exact matches. Everything combines with AND.
    pub fn apply(&self, list: &[Resource], state: &FilterState) -> Vec<Resource> {
        let needle = state.search.trim().to_lowercase();
        let selections: Vec<(&String, &String)> = state
            .selections
            .iter()
            .filter(|(_, value)| !is_all(value))
            .collect();

        list.iter()
            .filter(|resource| needle.is_empty() || self.haystack(resource).contains(&needle))
            .filter(|resource| {
                selections.iter().all(|(field, expected)| {
                    resource
                        .field(field)
                        .map(|value| value_text(value) == expected.as_str())
                        .unwrap_or(false)
                })
            })
            .cloned()
            .collect()
    }

    fn haystack(&self, resource: &Resource) -> String {
        self.searchable
            .iter()
            .filter_map(|field| resource.field(field))
            .map(value_text)
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}
