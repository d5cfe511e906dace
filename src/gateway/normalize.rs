//! Payload normalization.
//!
//! List endpoints answer with either a bare array or an object wrapping the
//! array under a known key; entity endpoints answer with the entity itself or
//! an envelope around it. These helpers collapse every variant into one
//! canonical shape.

use serde_json::{Map, Value};

use crate::errors::ResourceError;
use crate::models::{Pagination, Resource, ResourceKind};

/// Generic wrapper keys tried after the resource-specific ones.
const GENERIC_LIST_KEYS: [&str; 4] = ["data", "items", "results", "docs"];
const GENERIC_ENTITY_KEYS: [&str; 2] = ["data", "result"];

/// A normalized page of entities.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPayload {
    pub items: Vec<Resource>,
    pub pagination: Pagination,
    /// Entries dropped for lacking an id or repeating one
    pub skipped: usize,
}

/// Unwrap a list response for `kind`.
///
/// Returns a `Shape` error when no array can be found.
pub fn extract_list(kind: ResourceKind, body: &Value) -> Result<ListPayload, ResourceError> {
    extract_list_with_keys(kind.collection_keys(), body)
}

/// Unwrap a list response, looking for the array under `keys` first.
pub fn extract_list_with_keys(keys: &[&str], body: &Value) -> Result<ListPayload, ResourceError> {
    let (array, envelope) = match body {
        Value::Array(items) => (items, None),
        Value::Object(map) => {
            let array = find_array(map, keys).ok_or_else(|| {
                ResourceError::shape(format!(
                    "Expected a list under one of {:?}",
                    keys.iter().chain(GENERIC_LIST_KEYS.iter()).collect::<Vec<_>>()
                ))
            })?;
            (array, Some(map))
        }
        _ => return Err(ResourceError::shape("Expected a list response")),
    };

    let mut items: Vec<Resource> = Vec::with_capacity(array.len());
    let mut skipped = 0;
    for value in array {
        match Resource::from_value(value.clone()) {
            Some(resource) if items.iter().any(|r| r.id == resource.id) => {
                tracing::warn!("Dropping duplicate entity id {}", resource.id);
                skipped += 1;
            }
            Some(resource) => items.push(resource),
            None => {
                tracing::warn!("Dropping list entry without an identifier");
                skipped += 1;
            }
        }
    }

    let pagination = envelope
        .map(|map| pagination_from(map, items.len()))
        .unwrap_or_else(|| Pagination {
            total_items: Some(items.len() as u64),
            ..Pagination::default()
        });

    Ok(ListPayload {
        items,
        pagination,
        skipped,
    })
}

fn find_array<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Vec<Value>> {
    keys.iter()
        .chain(GENERIC_LIST_KEYS.iter())
        .find_map(|key| match map.get(*key)? {
            Value::Array(items) => Some(items),
            // `{ data: { blogs: [...] } }`
            Value::Object(inner) => find_array(inner, keys),
            _ => None,
        })
}

fn pagination_from(map: &Map<String, Value>, count: usize) -> Pagination {
    let number = |keys: &[&str]| {
        keys.iter().find_map(|key| {
            let value = map.get(*key)?;
            value
                .as_u64()
                .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
        })
    };

    // A page past the last one is reported as-is so callers can step back
    let current_page = number(&["currentPage", "page"]).map(page_number).unwrap_or(1);
    let total_pages = number(&["totalPages", "pages"]).map(page_number).unwrap_or(1);
    let total_items = number(&["total", "totalItems", "count"]).or(Some(count as u64));

    Pagination {
        current_page,
        total_pages,
        total_items,
    }
}

fn page_number(value: u64) -> u32 {
    u32::try_from(value.max(1)).unwrap_or(u32::MAX)
}

/// Unwrap a single entity from a create/update response.
///
/// Returns `None` when the payload holds no identifiable entity.
pub fn extract_entity(kind: ResourceKind, body: &Value) -> Option<Resource> {
    let map = body.as_object()?;
    if map.contains_key("_id") || map.contains_key("id") {
        return Resource::from_value(body.clone());
    }

    std::iter::once(kind.singular_key())
        .chain(GENERIC_ENTITY_KEYS)
        .find_map(|key| extract_entity(kind, map.get(key)?))
}

/// Pull a human-readable message out of an error body.
pub fn error_message(body: &Value) -> Option<String> {
    let map = body.as_object()?;
    ["message", "error", "msg", "detail"]
        .iter()
        .find_map(|key| match map.get(*key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            nested @ Value::Object(_) => error_message(nested),
            _ => None,
        })
        .or_else(|| {
            // express-validator style `{ errors: [{ msg }] }`
            map.get("errors")?
                .as_array()?
                .iter()
                .find_map(error_message)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wrapped_and_bare_lists_normalize_identically() {
        let entries = json!([
            { "_id": "s1", "title": "Summer sale" },
            { "_id": "s2", "title": "Winter sale" }
        ]);
        let wrapped = json!({ "sliders": entries.clone() });

        let from_bare = extract_list(ResourceKind::Slider, &entries).unwrap();
        let from_wrapped = extract_list(ResourceKind::Slider, &wrapped).unwrap();

        assert_eq!(from_bare.items, from_wrapped.items);
        assert_eq!(from_bare.items.len(), 2);
        assert_eq!(from_wrapped.pagination.total_pages, 1);
    }

    #[test]
    fn test_list_pagination_metadata() {
        let body = json!({
            "blogs": [{ "_id": "b1" }],
            "currentPage": 2,
            "totalPages": "5",
            "total": 41
        });
        let payload = extract_list(ResourceKind::Blog, &body).unwrap();
        assert_eq!(
            payload.pagination,
            Pagination {
                current_page: 2,
                total_pages: 5,
                total_items: Some(41)
            }
        );
    }

    #[test]
    fn test_page_past_the_end_is_not_inflated() {
        let body = json!({ "blogs": [], "currentPage": 2, "totalPages": 1, "total": 2 });
        let payload = extract_list(ResourceKind::Blog, &body).unwrap();
        assert_eq!(payload.pagination.current_page, 2);
        assert_eq!(payload.pagination.total_pages, 1);
    }

    #[test]
    fn test_oversized_page_numbers_saturate() {
        let body = json!({ "blogs": [], "currentPage": 0, "totalPages": u64::MAX });
        let payload = extract_list(ResourceKind::Blog, &body).unwrap();
        assert_eq!(payload.pagination.current_page, 1);
        assert_eq!(payload.pagination.total_pages, u32::MAX);
    }

    #[test]
    fn test_nested_data_envelope() {
        let body = json!({ "success": true, "data": { "transactions": [{ "id": 7 }] } });
        let payload = extract_list(ResourceKind::Transaction, &body).unwrap();
        assert_eq!(payload.items[0].id, "7");
    }

    #[test]
    fn test_missing_array_is_shape_error() {
        let err = extract_list(ResourceKind::Review, &json!({ "ok": true })).unwrap_err();
        assert_eq!(err.error_code(), crate::errors::codes::SHAPE_ERROR);
        assert!(extract_list(ResourceKind::Review, &json!("<html>")).is_err());
    }

    #[test]
    fn test_duplicates_and_anonymous_entries_are_dropped() {
        let body = json!([
            { "_id": "a", "n": 1 },
            { "_id": "a", "n": 2 },
            { "title": "anonymous" }
        ]);
        let payload = extract_list(ResourceKind::Certificate, &body).unwrap();
        assert_eq!(payload.items.len(), 1);
        assert_eq!(payload.items[0].field("n"), Some(&json!(1)));
        assert_eq!(payload.skipped, 2);
    }

    #[test]
    fn test_extract_entity_envelopes() {
        let bare = json!({ "_id": "c1", "title": "ISO" });
        let keyed = json!({ "certificate": { "_id": "c1", "title": "ISO" } });
        let data = json!({ "success": true, "data": { "_id": "c1", "title": "ISO" } });

        for body in [bare, keyed, data] {
            let entity = extract_entity(ResourceKind::Certificate, &body).unwrap();
            assert_eq!(entity.id, "c1");
        }
        assert!(extract_entity(ResourceKind::Certificate, &json!({ "success": true })).is_none());
    }

    #[test]
    fn test_error_message_variants() {
        assert_eq!(
            error_message(&json!({ "message": "Out of stock" })).as_deref(),
            Some("Out of stock")
        );
        assert_eq!(
            error_message(&json!({ "error": { "message": "Bad token" } })).as_deref(),
            Some("Bad token")
        );
        assert_eq!(
            error_message(&json!({ "errors": [{ "msg": "Title too short" }] })).as_deref(),
            Some("Title too short")
        );
        assert!(error_message(&json!("Internal Server Error")).is_none());
    }
}
