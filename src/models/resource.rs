//! Generic resource entity as delivered by the admin API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// One entity of a managed resource family (a blog post, a slider, ...).
///
/// The identifier is normalized from `_id` or `id` (string or number). All
/// other payload keys are kept verbatim in `fields`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Resource {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Build a resource from a JSON object, returning `None` when the value is
    /// not an object or carries no usable identifier.
    pub fn from_value(value: Value) -> Option<Self> {
        let Value::Object(fields) = value else {
            return None;
        };
        let id = extract_id(&fields)?;
        Some(Self { id, fields })
    }

    /// Look up a field, following dotted paths into nested objects
    /// (`user.email`).
    pub fn field(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut current = self.fields.get(first)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    pub fn text(&self, path: &str) -> Option<&str> {
        self.field(path).and_then(Value::as_str)
    }

    pub fn status(&self) -> Option<&str> {
        self.text("status")
    }

    /// Server-assigned creation timestamp, when present and parseable.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.text("createdAt").or_else(|| self.text("created_at"))?;
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }

    /// Overlay `partial` onto this resource's fields. The identifier never
    /// changes.
    pub fn merge(&mut self, partial: &Map<String, Value>) {
        for (key, value) in partial {
            if key == "_id" || key == "id" {
                continue;
            }
            self.fields.insert(key.clone(), value.clone());
        }
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

fn extract_id(fields: &Map<String, Value>) -> Option<String> {
    ["_id", "id"].iter().find_map(|key| match fields.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Render a JSON value as plain text for searching and form encoding.
///
/// Arrays are joined with spaces; `null` renders as an empty string.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        Value::Object(_) => value.to_string(),
    }
}

/// Pagination metadata of the most recent list load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_items: Option<u64>,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            current_page: 1,
            total_pages: 1,
            total_items: None,
        }
    }
}

/// A file uploaded alongside a create/update submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Multipart field name (e.g. `image`, `video`)
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Field values plus uploads sent by a create or update call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Submission {
    pub fields: Map<String, Value>,
    pub attachments: Vec<Attachment>,
}

impl Submission {
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            attachments: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.attachments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_normalizes_ids() {
        let mongo = Resource::from_value(json!({ "_id": "65ab", "title": "Summer" })).unwrap();
        assert_eq!(mongo.id, "65ab");

        let numeric = Resource::from_value(json!({ "id": 42, "title": "Winter" })).unwrap();
        assert_eq!(numeric.id, "42");

        assert!(Resource::from_value(json!({ "title": "No id" })).is_none());
        assert!(Resource::from_value(json!({ "id": "" })).is_none());
        assert!(Resource::from_value(json!(["not", "an", "object"])).is_none());
    }

    #[test]
    fn test_field_follows_dotted_paths() {
        let refund = Resource::from_value(json!({
            "_id": "r1",
            "status": "pending",
            "user": { "email": "ana@example.com" }
        }))
        .unwrap();

        assert_eq!(refund.text("user.email"), Some("ana@example.com"));
        assert_eq!(refund.status(), Some("pending"));
        assert!(refund.field("user.phone").is_none());
    }

    #[test]
    fn test_created_at_parsing() {
        let full =
            Resource::from_value(json!({ "_id": "a", "createdAt": "2024-03-01T10:00:00Z" }))
                .unwrap();
        assert_eq!(
            full.created_at().unwrap().to_rfc3339(),
            "2024-03-01T10:00:00+00:00"
        );

        let date_only =
            Resource::from_value(json!({ "_id": "b", "created_at": "2024-03-01" })).unwrap();
        assert!(date_only.created_at().is_some());

        let garbage = Resource::from_value(json!({ "_id": "c", "createdAt": "soon" })).unwrap();
        assert!(garbage.created_at().is_none());
    }

    #[test]
    fn test_merge_keeps_identifier() {
        let mut slider =
            Resource::from_value(json!({ "_id": "s1", "title": "Old", "isActive": true }))
                .unwrap();
        let partial = json!({ "_id": "other", "title": "New" });
        slider.merge(partial.as_object().unwrap());

        assert_eq!(slider.id, "s1");
        assert_eq!(slider.text("title"), Some("New"));
        assert_eq!(slider.text("_id"), Some("s1"));
        assert_eq!(slider.field("isActive"), Some(&json!(true)));
    }

    #[test]
    fn test_value_text() {
        assert_eq!(value_text(&json!(["rust", "shop", null])), "rust shop");
        assert_eq!(value_text(&json!(12.5)), "12.5");
        assert_eq!(value_text(&Value::Null), "");
    }
}
