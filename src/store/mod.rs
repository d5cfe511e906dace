//! Resource store: the single source of truth for one resource family.
//!
//! The store holds the loaded list and its pagination metadata and runs the
//! CRUD lifecycle against the gateway. The local list only changes after a
//! confirmed server response, except for optimistic toggles, which are rolled
//! back when the server rejects them.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::errors::ResourceError;
use crate::gateway::normalize::{self, ListPayload};
use crate::gateway::{ApiRequest, ApiResponse, Body, HttpGateway};
use crate::models::{path_with_id, Pagination, Resource, ResourceKind, Route, Submission};

/// Keys under which history endpoints wrap their entries.
const HISTORY_KEYS: [&str; 3] = ["history", "movements", "entries"];

/// Parameters of the most recent list load, reused by `reload`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Default)]
struct StoreState {
    items: Vec<Resource>,
    pagination: Pagination,
    last_query: ListQuery,
    server_filters: Vec<(String, String)>,
    /// Sequence number handed to the latest load request
    issued_loads: u64,
    /// Sequence number of the load whose result is currently held
    applied_load: u64,
    loaded: bool,
}

/// In-memory list plus CRUD lifecycle for one resource family.
pub struct ResourceStore<G: HttpGateway> {
    kind: ResourceKind,
    gateway: Arc<G>,
    state: Arc<RwLock<StoreState>>,
    in_flight: Arc<Mutex<HashSet<String>>>,
    lifecycle: CancellationToken,
}

impl<G: HttpGateway> Clone for ResourceStore<G> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            gateway: Arc::clone(&self.gateway),
            state: Arc::clone(&self.state),
            in_flight: Arc::clone(&self.in_flight),
            lifecycle: self.lifecycle.clone(),
        }
    }
}

/// Marks a mutation as in flight until dropped.
struct InFlight {
    keys: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

impl<G: HttpGateway> ResourceStore<G> {
    pub fn new(kind: ResourceKind, gateway: Arc<G>) -> Self {
        Self {
            kind,
            gateway,
            state: Arc::new(RwLock::new(StoreState::default())),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            lifecycle: CancellationToken::new(),
        }
    }

    /// Bind the store to the lifecycle of its owning view. Once `token` is
    /// cancelled, responses that resolve later no longer touch the list.
    #[must_use]
    pub fn with_lifecycle(mut self, token: CancellationToken) -> Self {
        self.lifecycle = token;
        self
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn lifecycle(&self) -> &CancellationToken {
        &self.lifecycle
    }

    pub fn is_defunct(&self) -> bool {
        self.lifecycle.is_cancelled()
    }

    /// Copy of the held list in server order.
    pub fn snapshot(&self) -> Vec<Resource> {
        self.read().items.clone()
    }

    pub fn get(&self, id: &str) -> Option<Resource> {
        self.read().items.iter().find(|r| r.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().items.is_empty()
    }

    pub fn pagination(&self) -> Pagination {
        self.read().pagination
    }

    pub fn last_query(&self) -> ListQuery {
        self.read().last_query
    }

    pub fn is_loaded(&self) -> bool {
        self.read().loaded
    }

    /// Whether any mutating operation is in flight.
    pub fn is_saving(&self) -> bool {
        !self.keys().is_empty()
    }

    /// Whether the mutation identified by `key` (`create`, `remove:{id}`,
    /// ...) is in flight.
    pub fn is_busy(&self, key: &str) -> bool {
        self.keys().contains(key)
    }

    /// Query parameters sent with every list load (`status=pending`).
    pub fn set_server_filters(&self, filters: Vec<(String, String)>) {
        self.write().server_filters = filters;
    }

    /// Fetch a list page and replace the held list.
    ///
    /// On failure the previous list is kept untouched. A response without a
    /// recognizable list degrades to an empty list.
    pub async fn load(
        &self,
        page: Option<u32>,
        page_size: Option<usize>,
    ) -> Result<Vec<Resource>, ResourceError> {
        let query = ListQuery { page, page_size };
        let (seq, filters) = {
            let mut state = self.write();
            state.issued_loads += 1;
            state.last_query = query;
            (state.issued_loads, state.server_filters.clone())
        };

        let mut request = ApiRequest::get(self.kind.endpoints().list);
        if let Some(page) = page {
            request = request.with_query("page", page);
        }
        if let Some(limit) = page_size {
            request = request.with_query("limit", limit);
        }
        for (key, value) in filters {
            request = request.with_query(key, value);
        }

        let body = self
            .gateway
            .send(request)
            .await
            .and_then(ApiResponse::into_result)
            .map_err(|e| {
                tracing::warn!("Failed to load {} list: {}", self.kind, e);
                e
            })?;

        let payload = normalize::extract_list(self.kind, &body).unwrap_or_else(|e| {
            tracing::warn!("Treating {} list as empty: {}", self.kind, e);
            ListPayload {
                items: Vec::new(),
                pagination: Pagination::default(),
                skipped: 0,
            }
        });

        if self.is_defunct() {
            tracing::debug!("Discarding {} list for a torn-down view", self.kind);
            return Ok(payload.items);
        }

        let mut state = self.write();
        if seq < state.applied_load {
            tracing::debug!("Discarding stale {} list response", self.kind);
            return Ok(state.items.clone());
        }
        state.applied_load = seq;
        state.items = payload.items;
        state.pagination = payload.pagination;
        state.loaded = true;

        tracing::info!(
            "Loaded {} {} entries (page {}/{})",
            state.items.len(),
            self.kind,
            state.pagination.current_page,
            state.pagination.total_pages
        );
        Ok(state.items.clone())
    }

    /// Repeat the most recent load with the same page parameters.
    pub async fn reload(&self) -> Result<Vec<Resource>, ResourceError> {
        let query = self.last_query();
        self.load(query.page, query.page_size).await
    }

    /// Create an entity and append the server's copy to the list.
    pub async fn create(&self, submission: Submission) -> Result<Resource, ResourceError> {
        let route = self.route(self.kind.endpoints().create, "created")?;
        let _guard = self.begin("create".to_string(), "Saving")?;

        let body = self
            .send(Self::mutation(route, route.path.to_string(), submission))
            .await?;

        let Some(resource) = normalize::extract_entity(self.kind, &body) else {
            tracing::warn!(
                "{} create response carried no entity; reloading list",
                self.kind
            );
            self.reload().await?;
            return Err(ResourceError::shape(format!(
                "{} was saved but the server did not return it",
                self.kind.label()
            )));
        };

        if self.is_defunct() {
            return Ok(resource);
        }

        let mut state = self.write();
        match state.items.iter_mut().find(|r| r.id == resource.id) {
            // Upsert endpoints (stock updates) answer with an existing entity
            Some(existing) => *existing = resource.clone(),
            None => {
                state.items.push(resource.clone());
                if let Some(total) = state.pagination.total_items.as_mut() {
                    *total += 1;
                }
            }
        }
        tracing::info!("Created {} {}", self.kind, resource.id);
        Ok(resource)
    }

    /// Send changed fields for `id` and replace the entry in place.
    pub async fn update(&self, id: &str, partial: Submission) -> Result<Resource, ResourceError> {
        let route = self.route(self.kind.endpoints().update, "updated")?;
        let _guard = self.begin(format!("update:{}", id), "Saving")?;
        let patch = partial.fields.clone();

        let body = self
            .send(Self::mutation(route, route.path_for(id), partial))
            .await?;
        let confirmed = normalize::extract_entity(self.kind, &body);

        if self.is_defunct() {
            return confirmed.ok_or_else(|| self.missing_entity(id));
        }

        let mut state = self.write();
        let entry = state.items.iter_mut().find(|r| r.id == id);
        let resource = match (confirmed, entry) {
            (Some(confirmed), Some(entry)) => {
                *entry = confirmed.clone();
                confirmed
            }
            (Some(confirmed), None) => confirmed,
            // Acknowledgement-only responses patch the local copy
            (None, Some(entry)) => {
                entry.merge(&patch);
                entry.clone()
            }
            (None, None) => return Err(self.missing_entity(id)),
        };
        tracing::info!("Updated {} {}", self.kind, id);
        Ok(resource)
    }

    /// Delete `id` remotely, then splice it out of the list.
    pub async fn remove(&self, id: &str) -> Result<(), ResourceError> {
        let route = self.route(self.kind.endpoints().delete, "deleted")?;
        let _guard = self.begin(format!("remove:{}", id), "Deleting")?;

        self.send(ApiRequest::new(route.method, route.path_for(id)))
            .await?;

        if self.is_defunct() {
            return Ok(());
        }

        let mut state = self.write();
        let before = state.items.len();
        state.items.retain(|r| r.id != id);
        if state.items.len() < before {
            if let Some(total) = state.pagination.total_items.as_mut() {
                *total = total.saturating_sub(1);
            }
        }
        tracing::info!("Deleted {} {}", self.kind, id);
        Ok(())
    }

    /// Apply `mutator` to the local entry immediately, then confirm the change
    /// remotely. If the server rejects it, the touched fields are restored.
    pub async fn toggle_optimistic<F>(&self, id: &str, mutator: F) -> Result<Resource, ResourceError>
    where
        F: FnOnce(&mut Map<String, Value>),
    {
        let endpoints = self.kind.endpoints();
        let route = self.route(endpoints.toggle.or(endpoints.update), "changed")?;
        self.apply_optimistic(route, id, mutator).await
    }

    /// Optimistic like/unlike against the family's like endpoint.
    pub async fn like_optimistic<F>(&self, id: &str, mutator: F) -> Result<Resource, ResourceError>
    where
        F: FnOnce(&mut Map<String, Value>),
    {
        let route = self.route(self.kind.endpoints().like, "liked")?;
        self.apply_optimistic(route, id, mutator).await
    }

    async fn apply_optimistic<F>(
        &self,
        route: Route,
        id: &str,
        mutator: F,
    ) -> Result<Resource, ResourceError>
    where
        F: FnOnce(&mut Map<String, Value>),
    {
        let _guard = self.begin(format!("toggle:{}", id), "Saving")?;

        let (previous, changed, optimistic) = {
            let mut state = self.write();
            let entry = state
                .items
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| self.not_loaded(id))?;
            let previous = entry.fields.clone();
            mutator(&mut entry.fields);
            let changed = changed_fields(&previous, &entry.fields);
            (previous, changed, entry.clone())
        };

        if changed.is_empty() {
            return Ok(optimistic);
        }

        let request = ApiRequest::new(route.method, route.path_for(id))
            .with_body(Body::Json(Value::Object(changed.clone())));

        match self.send(request).await {
            Ok(body) => {
                let confirmed = normalize::extract_entity(self.kind, &body);
                if self.is_defunct() {
                    return Ok(confirmed.unwrap_or(optimistic));
                }
                let mut state = self.write();
                match (confirmed, state.items.iter_mut().find(|r| r.id == id)) {
                    (Some(confirmed), Some(entry)) => {
                        *entry = confirmed.clone();
                        Ok(confirmed)
                    }
                    (_, Some(entry)) => Ok(entry.clone()),
                    (confirmed, None) => Ok(confirmed.unwrap_or(optimistic)),
                }
            }
            Err(e) => {
                if !self.is_defunct() {
                    let mut state = self.write();
                    if let Some(entry) = state.items.iter_mut().find(|r| r.id == id) {
                        for key in changed.keys() {
                            match previous.get(key) {
                                Some(value) => entry.fields.insert(key.clone(), value.clone()),
                                None => entry.fields.remove(key),
                            };
                        }
                    }
                    tracing::warn!("Rolled back {} {} after failed update: {}", self.kind, id, e);
                }
                Err(e)
            }
        }
    }

    /// Fetch the history entries of one entity (stock movements).
    pub async fn history(&self, id: &str) -> Result<Vec<Resource>, ResourceError> {
        let path = self
            .kind
            .endpoints()
            .history
            .ok_or_else(|| self.unsupported("listed with history"))?;

        let body = self
            .send(ApiRequest::get(path_with_id(path, id)))
            .await?;

        Ok(normalize::extract_list_with_keys(&HISTORY_KEYS, &body)
            .map(|payload| payload.items)
            .unwrap_or_else(|e| {
                tracing::warn!("Treating {} history as empty: {}", self.kind, e);
                Vec::new()
            }))
    }

    async fn send(&self, request: ApiRequest) -> Result<Value, ResourceError> {
        let method = request.method;
        let path = request.path.clone();
        self.gateway
            .send(request)
            .await
            .and_then(ApiResponse::into_result)
            .map_err(|e| {
                tracing::warn!("{} {} failed: {}", method.as_str(), path, e);
                e
            })
    }

    fn mutation(route: Route, path: String, submission: Submission) -> ApiRequest {
        let body = if route.multipart || !submission.attachments.is_empty() {
            Body::Multipart {
                fields: submission.fields,
                files: submission.attachments,
            }
        } else {
            Body::Json(Value::Object(submission.fields))
        };
        ApiRequest::new(route.method, path).with_body(body)
    }

    fn begin(&self, key: String, activity: &str) -> Result<InFlight, ResourceError> {
        let mut keys = self.keys();
        if !keys.insert(key.clone()) {
            tracing::debug!("Ignoring duplicate {} request for {}", key, self.kind);
            return Err(ResourceError::busy(activity));
        }
        Ok(InFlight {
            keys: Arc::clone(&self.in_flight),
            key,
        })
    }

    fn route(&self, route: Option<Route>, verb: &str) -> Result<Route, ResourceError> {
        route.ok_or_else(|| self.unsupported(verb))
    }

    fn unsupported(&self, verb: &str) -> ResourceError {
        ResourceError::config(format!("{} entries cannot be {}", self.kind.label(), verb))
    }

    fn not_loaded(&self, id: &str) -> ResourceError {
        ResourceError::shape(format!(
            "{} {} is not in the current list",
            self.kind.label(),
            id
        ))
    }

    fn missing_entity(&self, id: &str) -> ResourceError {
        ResourceError::shape(format!(
            "{} {} was saved but the server did not return it",
            self.kind.label(),
            id
        ))
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn keys(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fields whose value differs between `before` and `after`. Removed fields
/// are reported as `null`.
fn changed_fields(before: &Map<String, Value>, after: &Map<String, Value>) -> Map<String, Value> {
    let mut changed: Map<String, Value> = after
        .iter()
        .filter(|(key, value)| before.get(*key) != Some(*value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    for key in before.keys() {
        if !after.contains_key(key) {
            changed.insert(key.clone(), Value::Null);
        }
    }
    changed
}
