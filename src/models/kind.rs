//! Resource families managed by the dashboard and their REST endpoints.

use serde::{Deserialize, Serialize};

/// HTTP method of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// A mutating endpoint. `{id}` in the path is replaced by the entity id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub method: Method,
    pub path: &'static str,
    /// Whether the endpoint expects a multipart form body
    pub multipart: bool,
}

impl Route {
    const fn json(method: Method, path: &'static str) -> Self {
        Self {
            method,
            path,
            multipart: false,
        }
    }

    const fn multipart(method: Method, path: &'static str) -> Self {
        Self {
            method,
            path,
            multipart: true,
        }
    }

    pub fn path_for(&self, id: &str) -> String {
        path_with_id(self.path, id)
    }
}

/// Substitute `{id}` in `template` with the percent-encoded `id`.
pub fn path_with_id(template: &str, id: &str) -> String {
    template.replace("{id}", &urlencoding::encode(id))
}

/// The endpoint set of one resource family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoints {
    pub list: &'static str,
    pub create: Option<Route>,
    pub update: Option<Route>,
    pub delete: Option<Route>,
    /// JSON endpoint for quick field toggles; falls back to `update`
    pub toggle: Option<Route>,
    /// Like/unlike endpoint
    pub like: Option<Route>,
    /// Per-entity history listing (`{id}` placeholder)
    pub history: Option<&'static str>,
}

/// A resource family managed by one dashboard page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    Blog,
    Slider,
    Certificate,
    Review,
    Notification,
    Refund,
    StockItem,
    Transaction,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 8] = [
        ResourceKind::Blog,
        ResourceKind::Slider,
        ResourceKind::Certificate,
        ResourceKind::Review,
        ResourceKind::Notification,
        ResourceKind::Refund,
        ResourceKind::StockItem,
        ResourceKind::Transaction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Blog => "blog",
            ResourceKind::Slider => "slider",
            ResourceKind::Certificate => "certificate",
            ResourceKind::Review => "review",
            ResourceKind::Notification => "notification",
            ResourceKind::Refund => "refund",
            ResourceKind::StockItem => "stock",
            ResourceKind::Transaction => "transaction",
        }
    }

    /// Human-readable singular label used in notices.
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Blog => "Blog",
            ResourceKind::Slider => "Slider",
            ResourceKind::Certificate => "Certificate",
            ResourceKind::Review => "Review",
            ResourceKind::Notification => "Notification",
            ResourceKind::Refund => "Refund",
            ResourceKind::StockItem => "Stock item",
            ResourceKind::Transaction => "Transaction",
        }
    }

    /// Keys under which list endpoints wrap their array.
    pub fn collection_keys(&self) -> &'static [&'static str] {
        match self {
            ResourceKind::Blog => &["blogs"],
            ResourceKind::Slider => &["sliders"],
            ResourceKind::Certificate => &["certificates"],
            ResourceKind::Review => &["reviews"],
            ResourceKind::Notification => &["notifications"],
            ResourceKind::Refund => &["refunds"],
            ResourceKind::StockItem => &["stock", "stocks", "items"],
            ResourceKind::Transaction => &["transactions"],
        }
    }

    /// Key under which entity endpoints may wrap a single object.
    pub fn singular_key(&self) -> &'static str {
        match self {
            ResourceKind::Blog => "blog",
            ResourceKind::Slider => "slider",
            ResourceKind::Certificate => "certificate",
            ResourceKind::Review => "review",
            ResourceKind::Notification => "notification",
            ResourceKind::Refund => "refund",
            ResourceKind::StockItem => "stock",
            ResourceKind::Transaction => "transaction",
        }
    }

    pub fn endpoints(&self) -> Endpoints {
        use Method::*;

        match self {
            ResourceKind::Blog => Endpoints {
                list: "/api/blogs",
                create: Some(Route::json(Post, "/api/blogs")),
                update: Some(Route::json(Put, "/api/blogs/{id}")),
                delete: Some(Route::json(Delete, "/api/blogs/{id}")),
                toggle: None,
                like: Some(Route::json(Put, "/api/blogs/{id}/like")),
                history: None,
            },
            ResourceKind::Slider => Endpoints {
                list: "/api/sliders",
                create: Some(Route::multipart(Post, "/sliders")),
                update: Some(Route::multipart(Put, "/sliders/{id}")),
                delete: Some(Route::json(Delete, "/sliders/{id}")),
                toggle: Some(Route::json(Put, "/sliders/{id}")),
                like: None,
                history: None,
            },
            ResourceKind::Certificate => Endpoints {
                list: "/api/certificates",
                create: Some(Route::json(Post, "/api/certificates")),
                update: Some(Route::json(Put, "/api/certificates/{id}")),
                delete: Some(Route::json(Delete, "/api/certificates/{id}")),
                toggle: None,
                like: None,
                history: None,
            },
            ResourceKind::Review => Endpoints {
                list: "/api/reviews/admin/all",
                create: None,
                update: Some(Route::json(Put, "/api/reviews/admin/approve/{id}")),
                delete: Some(Route::json(Delete, "/api/reviews/admin/{id}")),
                toggle: None,
                like: None,
                history: None,
            },
            ResourceKind::Notification => Endpoints {
                list: "/api/notifications",
                create: Some(Route::json(Post, "/api/notifications/send")),
                update: None,
                delete: Some(Route::json(Delete, "/api/notifications/{id}")),
                toggle: None,
                like: None,
                history: None,
            },
            ResourceKind::Refund => Endpoints {
                list: "/api/refunds",
                create: None,
                update: Some(Route::json(Put, "/api/refunds/{id}")),
                delete: Some(Route::json(Delete, "/api/refunds/{id}")),
                toggle: None,
                like: None,
                history: None,
            },
            ResourceKind::StockItem => Endpoints {
                list: "/api/stock",
                create: Some(Route::json(Post, "/api/stock/update")),
                update: None,
                delete: None,
                toggle: None,
                like: None,
                history: Some("/api/stock/history/{id}"),
            },
            ResourceKind::Transaction => Endpoints {
                list: "/api/transactions/all",
                create: Some(Route::json(Post, "/api/transactions/create")),
                update: None,
                delete: None,
                toggle: None,
                like: None,
                history: None,
            },
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_path_substitution() {
        let route = ResourceKind::Review.endpoints().update.unwrap();
        assert_eq!(route.path_for("abc"), "/api/reviews/admin/approve/abc");
        assert_eq!(route.method, Method::Put);
    }

    #[test]
    fn test_ids_are_encoded_as_one_segment() {
        let route = ResourceKind::Slider.endpoints().delete.unwrap();
        assert_eq!(route.path_for("a/b?c=1"), "/sliders/a%2Fb%3Fc%3D1");
        assert_eq!(
            path_with_id("/api/stock/history/{id}", "sku 42"),
            "/api/stock/history/sku%2042"
        );
    }

    #[test]
    fn test_slider_mutations_are_multipart() {
        let endpoints = ResourceKind::Slider.endpoints();
        assert!(endpoints.create.unwrap().multipart);
        assert!(endpoints.update.unwrap().multipart);
        assert!(!endpoints.delete.unwrap().multipart);
    }

    #[test]
    fn test_read_only_families() {
        let transactions = ResourceKind::Transaction.endpoints();
        assert!(transactions.update.is_none());
        assert!(transactions.delete.is_none());
        assert_eq!(
            ResourceKind::StockItem.endpoints().history,
            Some("/api/stock/history/{id}")
        );
    }
}
