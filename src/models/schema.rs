//! Per-resource form schema, search fields and pagination strategy.

use serde_json::{json, Map, Value};

use super::ResourceKind;
use crate::form::Rule;

/// How a resource list is paged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationMode {
    /// The endpoint pages; each page change is a new `load`
    Server { page_size: usize },
    /// The whole list is loaded once and paged locally after filtering
    Client { page_size: usize },
}

impl PaginationMode {
    pub fn page_size(&self) -> usize {
        match self {
            PaginationMode::Server { page_size } | PaginationMode::Client { page_size } => {
                *page_size
            }
        }
    }
}

/// One editable field of a resource form.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub rules: Vec<Rule>,
    /// Value of the field in an empty create template
    pub default: Value,
}

impl FieldSpec {
    fn text(name: &'static str, label: &'static str, rules: Vec<Rule>) -> Self {
        Self {
            name,
            label,
            rules,
            default: json!(""),
        }
    }

    fn number(name: &'static str, label: &'static str, rules: Vec<Rule>) -> Self {
        Self {
            name,
            label,
            rules,
            default: Value::Null,
        }
    }

    fn list(name: &'static str, label: &'static str, rules: Vec<Rule>) -> Self {
        Self {
            name,
            label,
            rules,
            default: json!([]),
        }
    }

    fn flag(name: &'static str, label: &'static str, default: bool) -> Self {
        Self {
            name,
            label,
            rules: Vec::new(),
            default: Value::Bool(default),
        }
    }
}

/// Everything a presenter needs to know about one resource family.
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub kind: ResourceKind,
    pub fields: Vec<FieldSpec>,
    /// Fields joined into the search haystack
    pub searchable: Vec<&'static str>,
    /// Fields offered as discrete filter controls
    pub filterable: Vec<&'static str>,
    pub server_paginated: bool,
}

const REVIEW_STATUSES: &[&str] = &["approved", "pending", "rejected"];
const REFUND_STATUSES: &[&str] = &["pending", "approved", "rejected", "processed"];
const NOTIFICATION_TYPES: &[&str] = &["info", "promotion", "order", "system"];
const STOCK_OPERATIONS: &[&str] = &["add", "remove", "set"];
const TRANSACTION_TYPES: &[&str] = &["credit", "debit", "refund"];

impl ResourceSchema {
    pub fn for_kind(kind: ResourceKind) -> Self {
        use Rule::*;

        let (fields, searchable, filterable, server_paginated) = match kind {
            ResourceKind::Blog => (
                vec![
                    FieldSpec::text(
                        "title",
                        "Title",
                        vec![Required, MinLength(5), MaxLength(200)],
                    ),
                    FieldSpec::text("content", "Content", vec![Required, MinLength(50)]),
                    FieldSpec::text("category", "Category", vec![Required]),
                    FieldSpec::list("tags", "Tag", vec![NonEmptyList]),
                    FieldSpec::text("image", "Cover image", vec![Url]),
                    FieldSpec::flag("published", "Published", false),
                ],
                vec!["title", "category", "tags", "author"],
                vec!["category", "published"],
                true,
            ),
            ResourceKind::Slider => (
                vec![
                    FieldSpec::text("title", "Title", vec![Required, MaxLength(100)]),
                    FieldSpec::text("image", "Image", vec![Required, Url]),
                    FieldSpec::text("link", "Link", vec![Url]),
                    FieldSpec::number(
                        "order",
                        "Display order",
                        vec![NumberRange { min: 0.0, max: 100.0 }],
                    ),
                    FieldSpec::flag("isActive", "Active", true),
                ],
                vec!["title", "link"],
                vec!["isActive"],
                false,
            ),
            ResourceKind::Certificate => (
                vec![
                    FieldSpec::text("title", "Title", vec![Required, MinLength(3)]),
                    FieldSpec::text("issuer", "Issuer", vec![Required]),
                    FieldSpec::text("issueDate", "Issue date", vec![Required]),
                    FieldSpec::text("imageUrl", "Image", vec![Url]),
                    FieldSpec::text("description", "Description", vec![MaxLength(1000)]),
                ],
                vec!["title", "issuer", "description"],
                vec!["issuer"],
                false,
            ),
            ResourceKind::Review => (
                vec![FieldSpec::text(
                    "status",
                    "Status",
                    vec![Required, OneOf(REVIEW_STATUSES)],
                )],
                vec!["comment", "userName", "productName"],
                vec!["status", "rating"],
                false,
            ),
            ResourceKind::Notification => (
                vec![
                    FieldSpec::text("title", "Title", vec![Required, MaxLength(120)]),
                    FieldSpec::text("message", "Message", vec![Required, MinLength(5)]),
                    FieldSpec::text("type", "Type", vec![Required, OneOf(NOTIFICATION_TYPES)]),
                ],
                vec!["title", "message"],
                vec!["type", "read"],
                false,
            ),
            ResourceKind::Refund => (
                vec![
                    FieldSpec::text("status", "Status", vec![Required, OneOf(REFUND_STATUSES)]),
                    FieldSpec::text("adminNote", "Admin note", vec![MaxLength(500)]),
                ],
                vec!["orderId", "reason", "user.email", "user.name"],
                vec!["status"],
                false,
            ),
            ResourceKind::StockItem => (
                vec![
                    FieldSpec::text("productId", "Product", vec![Required]),
                    FieldSpec::number(
                        "quantity",
                        "Quantity",
                        vec![Required, NumberRange { min: 0.0, max: 1_000_000.0 }],
                    ),
                    FieldSpec::text("operation", "Operation", vec![Required, OneOf(STOCK_OPERATIONS)]),
                    FieldSpec::text("note", "Note", vec![MaxLength(250)]),
                ],
                vec!["productName", "sku", "productId"],
                vec!["status", "category"],
                false,
            ),
            ResourceKind::Transaction => (
                vec![
                    FieldSpec::text("userId", "Customer", vec![Required]),
                    FieldSpec::number(
                        "amount",
                        "Amount",
                        vec![Required, NumberRange { min: 0.01, max: 10_000_000.0 }],
                    ),
                    FieldSpec::text("type", "Type", vec![Required, OneOf(TRANSACTION_TYPES)]),
                    FieldSpec::text("description", "Description", vec![MaxLength(250)]),
                ],
                vec!["reference", "description", "userId", "user.email"],
                vec!["type", "status"],
                false,
            ),
        };

        Self {
            kind,
            fields,
            searchable,
            filterable,
            server_paginated,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Empty create template built from the field defaults.
    pub fn template(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|f| (f.name.to_string(), f.default.clone()))
            .collect()
    }

    pub fn pagination(&self, page_size: usize) -> PaginationMode {
        if self.server_paginated {
            PaginationMode::Server { page_size }
        } else {
            PaginationMode::Client { page_size }
        }
    }
}
