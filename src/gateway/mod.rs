//! HTTP gateway boundary.
//!
//! The gateway issues authenticated requests against the admin API. Every
//! response is normalized here (see [`normalize`]) before a store sees it, so
//! stores only ever deal with canonical lists and entities.

pub mod normalize;
mod rest;

#[cfg(test)]
pub(crate) mod testing;

pub use rest::RestGateway;

use std::future::Future;

use serde_json::Value;

use crate::errors::ResourceError;
use crate::models::{Attachment, Method};

/// Request body.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    #[default]
    Empty,
    Json(Value),
    Multipart {
        fields: serde_json::Map<String, Value>,
        files: Vec<Attachment>,
    },
}

/// A request relative to the API base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Body,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: Body::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }
}

/// Raw response: status plus decoded body.
///
/// Bodies that are not JSON are kept as `Value::String`; empty bodies are
/// `Value::Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn non-2xx responses into server errors carrying the server message.
    pub fn into_result(self) -> Result<Value, ResourceError> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(ResourceError::server(
                self.status,
                normalize::error_message(&self.body),
            ))
        }
    }
}

/// Boundary component issuing authenticated HTTP calls.
///
/// Transport failures come back as `Network` errors; HTTP error statuses are
/// returned as responses and interpreted by [`ApiResponse::into_result`].
pub trait HttpGateway: Send + Sync + 'static {
    fn send(
        &self,
        request: ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, ResourceError>> + Send;
}

impl<G: HttpGateway> HttpGateway for std::sync::Arc<G> {
    fn send(
        &self,
        request: ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, ResourceError>> + Send {
        (**self).send(request)
    }
}
