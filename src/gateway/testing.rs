//! Scripted gateway double for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;

use super::{ApiRequest, ApiResponse, HttpGateway};
use crate::errors::ResourceError;
use crate::models::Method;

type Scripted = (Result<ApiResponse, ResourceError>, Option<Duration>);

/// Replays queued responses in order and records every request it receives.
///
/// Each call takes the next response, then yields to the runtime once before
/// answering so that concurrent callers interleave the way real network calls
/// do. Responses queued with a delay resolve only after that delay.
#[derive(Clone, Default)]
pub(crate) struct ScriptedGateway {
    responses: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<ApiRequest>>>,
}

impl ScriptedGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, status: u16, body: Value) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back((Ok(ApiResponse::new(status, body)), None));
        self
    }

    pub(crate) fn respond_after(&self, delay: Duration, status: u16, body: Value) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back((Ok(ApiResponse::new(status, body)), Some(delay)));
        self
    }

    pub(crate) fn fail(&self, error: ResourceError) -> &Self {
        self.responses.lock().unwrap().push_back((Err(error), None));
        self
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, method: Method) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method)
            .count()
    }
}

impl HttpGateway for ScriptedGateway {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ResourceError> {
        self.requests.lock().unwrap().push(request);
        let next = self.responses.lock().unwrap().pop_front();
        tokio::task::yield_now().await;
        match next {
            Some((response, delay)) => {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                response
            }
            None => Err(ResourceError::network("no scripted response left")),
        }
    }
}
