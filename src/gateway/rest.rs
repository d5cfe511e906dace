//! reqwest-backed gateway against the live admin API.

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;

use super::{ApiRequest, ApiResponse, Body, HttpGateway};
use crate::config::Config;
use crate::errors::{FieldError, ResourceError};
use crate::models::{value_text, Method};

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// HTTP gateway for the admin REST API.
#[derive(Clone)]
pub struct RestGateway {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl RestGateway {
    /// Build a gateway from configuration.
    pub fn from_config(config: &Config) -> Result<Self, ResourceError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ResourceError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: None,
        }
    }

    /// Set the bearer token for authentication
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl HttpGateway for RestGateway {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ResourceError> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        tracing::debug!(
            request_id = %request_id,
            "{} {}",
            request.method.as_str(),
            request.path
        );

        let mut builder = self
            .client
            .request(method, self.url(&request.path))
            .header(REQUEST_ID_HEADER, &request_id);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(ref token) = self.api_token {
            builder = builder.bearer_auth(token);
        }

        builder = match request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(&value),
            Body::Multipart { fields, files } => {
                let mut form = Form::new();
                for (key, value) in fields {
                    let text = match value {
                        Value::Array(_) | Value::Object(_) => value.to_string(),
                        other => value_text(&other),
                    };
                    form = form.text(key, text);
                }
                for file in files {
                    let part = Part::bytes(file.bytes)
                        .file_name(file.file_name)
                        .mime_str(&file.content_type)
                        .map_err(|_| {
                            ResourceError::validation(vec![FieldError::new(
                                file.field.clone(),
                                format!("Unsupported file type {}", file.content_type),
                            )])
                        })?;
                    form = form.part(file.field, part);
                }
                builder.multipart(form)
            }
        };

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(request_id = %request_id, "Request failed: {}", e);
            ResourceError::from(e)
        })?;

        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        tracing::debug!(request_id = %request_id, status, "Response received");

        Ok(ApiResponse { status, body })
    }
}
