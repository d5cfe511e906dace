//! Resource presenter: the end-to-end behavior of one dashboard page.
//!
//! A presenter wires a [`ResourceStore`], a [`FilterEngine`] and a
//! [`FormSession`] together and adds what a page needs on top: initial load,
//! refresh, search and filter bindings, pagination, modal orchestration,
//! delete confirmation, notices and polling.

mod notice;

pub use notice::{Notice, NoticeBoard, NoticeLevel};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::{json, Map, Value};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::Config;
use crate::errors::{ErrorKind, FieldError, ResourceError};
use crate::filter::{FilterEngine, FilterState};
use crate::form::FormSession;
use crate::gateway::HttpGateway;
use crate::models::{Attachment, PaginationMode, Resource, ResourceKind, ResourceSchema, Submission};
use crate::session::SessionStore;
use crate::store::ResourceStore;

/// Knobs shared by every presenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenterSettings {
    pub page_size: usize,
    pub notice_ttl: Duration,
}

impl Default for PresenterSettings {
    fn default() -> Self {
        Self {
            page_size: 10,
            notice_ttl: Duration::from_secs(3),
        }
    }
}

impl From<&Config> for PresenterSettings {
    fn from(config: &Config) -> Self {
        Self {
            page_size: config.page_size,
            notice_ttl: config.notice_ttl,
        }
    }
}

/// Which modal, if any, is open. At most one at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    Closed,
    Form,
    ConfirmDelete { id: String },
}

/// Pagination as shown under the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

pub struct ResourcePresenter<G: HttpGateway> {
    schema: Arc<ResourceSchema>,
    store: ResourceStore<G>,
    engine: FilterEngine,
    filter: FilterState,
    form: FormSession,
    modal: Modal,
    mode: PaginationMode,
    client_page: usize,
    notices: Arc<Mutex<NoticeBoard>>,
    lifecycle: CancellationToken,
    poller: Option<JoinHandle<()>>,
}

impl<G: HttpGateway> ResourcePresenter<G> {
    pub fn new(kind: ResourceKind, gateway: Arc<G>, settings: PresenterSettings) -> Self {
        let schema = Arc::new(ResourceSchema::for_kind(kind));
        let lifecycle = CancellationToken::new();
        let store = ResourceStore::new(kind, gateway).with_lifecycle(lifecycle.clone());

        Self {
            engine: FilterEngine::for_schema(&schema),
            form: FormSession::new(Arc::clone(&schema)),
            mode: schema.pagination(settings.page_size.max(1)),
            schema,
            store,
            filter: FilterState::new(),
            modal: Modal::Closed,
            client_page: 1,
            notices: Arc::new(Mutex::new(NoticeBoard::new(settings.notice_ttl))),
            lifecycle,
            poller: None,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.schema.kind
    }

    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    pub fn store(&self) -> &ResourceStore<G> {
        &self.store
    }

    pub fn form(&self) -> &FormSession {
        &self.form
    }

    pub fn modal(&self) -> &Modal {
        &self.modal
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn pagination_mode(&self) -> PaginationMode {
        self.mode
    }

    pub fn is_torn_down(&self) -> bool {
        self.lifecycle.is_cancelled()
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|h| !h.is_finished())
    }

    // ==================== LOADING ====================

    /// Initial load when the page is shown.
    pub async fn mount(&mut self) -> Result<(), ResourceError> {
        tracing::info!("Mounting {} page", self.kind());
        self.client_page = 1;
        let result = match self.mode {
            PaginationMode::Server { page_size } => self.store.load(Some(1), Some(page_size)).await,
            PaginationMode::Client { .. } => self.store.load(None, None).await,
        };
        self.report(result).map(|_| ())
    }

    /// Re-fetch the current page on demand.
    pub async fn refresh(&mut self) -> Result<(), ResourceError> {
        if !self.store.is_loaded() {
            return self.mount().await;
        }
        let result = self.store.reload().await;
        self.report(result).map(|_| ())
    }

    // ==================== SEARCH & FILTERS ====================

    pub fn set_search(&mut self, text: impl Into<String>) {
        self.filter.search = text.into();
        self.client_page = 1;
    }

    pub fn set_filter(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.filter.selections.insert(field.into(), value.into());
        self.client_page = 1;
    }

    pub fn clear_filters(&mut self) {
        self.filter = FilterState::new();
        self.client_page = 1;
    }

    /// Distinct values present for a filterable field, for filter dropdowns.
    pub fn filter_options(&self, field: &str) -> Vec<String> {
        let mut options: Vec<String> = self
            .store
            .snapshot()
            .iter()
            .filter_map(|r| r.field(field))
            .map(crate::models::value_text)
            .filter(|v| !v.is_empty())
            .collect();
        options.sort();
        options.dedup();
        options
    }

    /// Rows to display: filtered, and for client-paged resources, the
    /// current page of the filtered list.
    pub fn visible(&self) -> Vec<Resource> {
        let filtered = self.engine.apply(&self.store.snapshot(), &self.filter);
        match self.mode {
            PaginationMode::Server { .. } => filtered,
            PaginationMode::Client { page_size } => {
                let page = self.page_info_for(filtered.len()).page;
                filtered
                    .into_iter()
                    .skip((page - 1) * page_size)
                    .take(page_size)
                    .collect()
            }
        }
    }

    pub fn page_info(&self) -> PageInfo {
        match self.mode {
            PaginationMode::Server { .. } => {
                let pagination = self.store.pagination();
                PageInfo {
                    page: pagination.current_page as usize,
                    total_pages: pagination.total_pages as usize,
                    total_items: pagination
                        .total_items
                        .map(|t| t as usize)
                        .unwrap_or_else(|| self.store.len()),
                }
            }
            PaginationMode::Client { .. } => {
                let filtered = self.engine.apply(&self.store.snapshot(), &self.filter);
                self.page_info_for(filtered.len())
            }
        }
    }

    fn page_info_for(&self, total_items: usize) -> PageInfo {
        let page_size = self.mode.page_size();
        let total_pages = total_items.div_ceil(page_size).max(1);
        PageInfo {
            page: self.client_page.clamp(1, total_pages),
            total_pages,
            total_items,
        }
    }

    pub async fn next_page(&mut self) -> Result<(), ResourceError> {
        let page = self.page_info().page + 1;
        self.go_to_page(page).await
    }

    pub async fn previous_page(&mut self) -> Result<(), ResourceError> {
        let page = self.page_info().page.saturating_sub(1);
        self.go_to_page(page).await
    }

    /// Move the pagination cursor. Out-of-range pages are ignored.
    pub async fn go_to_page(&mut self, page: usize) -> Result<(), ResourceError> {
        let info = self.page_info();
        if page < 1 || page > info.total_pages || page == info.page {
            return Ok(());
        }
        match self.mode {
            PaginationMode::Server { page_size } => {
                let result = self.store.load(Some(page as u32), Some(page_size)).await;
                self.report(result).map(|_| ())
            }
            PaginationMode::Client { .. } => {
                self.client_page = page;
                Ok(())
            }
        }
    }

    // ==================== FORMS ====================

    /// Open the create modal with an empty draft.
    pub fn open_create(&mut self) -> Result<(), ResourceError> {
        self.ensure_closed()?;
        if self.kind().endpoints().create.is_none() {
            return Err(ResourceError::config(format!(
                "{} entries cannot be created here",
                self.schema.kind.label()
            )));
        }
        self.form.begin(None)?;
        self.modal = Modal::Form;
        Ok(())
    }

    /// Open the edit modal with a draft cloned from `id`.
    pub fn open_edit(&mut self, id: &str) -> Result<(), ResourceError> {
        self.ensure_closed()?;
        if self.kind().endpoints().update.is_none() {
            return Err(ResourceError::config(format!(
                "{} entries cannot be edited",
                self.kind().label()
            )));
        }
        let resource = self.store.get(id).ok_or_else(|| {
            ResourceError::shape(format!("{} {} is not in the current list", self.kind().label(), id))
        })?;
        self.form.begin(Some(&resource))?;
        self.modal = Modal::Form;
        Ok(())
    }

    pub fn set_field(&mut self, name: &str, value: Value) -> Result<(), ResourceError> {
        self.form.set_field(name, value)
    }

    pub fn attach(&mut self, attachment: Attachment) -> Result<(), ResourceError> {
        self.form.attach(attachment)
    }

    /// Submit the open form. Validation failures keep the modal open; any
    /// other outcome closes it.
    pub async fn submit(&mut self) -> Result<Resource, ResourceError> {
        if self.modal != Modal::Form {
            return Err(ResourceError::validation(vec![FieldError::new(
                "form",
                "No form is open",
            )]));
        }

        let is_edit = self.form.draft().is_some_and(|d| d.is_edit());
        let result = self.form.commit(&self.store).await;

        if let Err(ref e) = result {
            if matches!(e.kind, ErrorKind::Validation { .. }) {
                return result;
            }
        }

        self.modal = Modal::Closed;
        let label = self.kind().label();
        match &result {
            Ok(_) if is_edit => self.notify_success(format!("{} updated", label)),
            Ok(_) => {
                self.notify_success(format!("{} created", label));
                self.resync_server_page().await;
            }
            Err(e) => self.notify_error(e),
        }
        result
    }

    /// Close whatever modal is open, discarding any draft.
    pub fn close_modal(&mut self) {
        self.form.cancel();
        self.modal = Modal::Closed;
    }

    // ==================== DELETE ====================

    /// Ask for confirmation before deleting `id`.
    pub fn request_delete(&mut self, id: &str) -> Result<(), ResourceError> {
        self.ensure_closed()?;
        if self.kind().endpoints().delete.is_none() {
            return Err(ResourceError::config(format!(
                "{} entries cannot be deleted",
                self.kind().label()
            )));
        }
        self.modal = Modal::ConfirmDelete { id: id.to_string() };
        Ok(())
    }

    pub fn cancel_delete(&mut self) {
        if matches!(self.modal, Modal::ConfirmDelete { .. }) {
            self.modal = Modal::Closed;
        }
    }

    /// Issue the confirmed delete.
    pub async fn confirm_delete(&mut self) -> Result<(), ResourceError> {
        let Modal::ConfirmDelete { id } = std::mem::replace(&mut self.modal, Modal::Closed) else {
            return Err(ResourceError::validation(vec![FieldError::new(
                "delete",
                "Nothing to delete",
            )]));
        };

        let result = self.store.remove(&id).await;
        match &result {
            Ok(()) => {
                self.notify_success(format!("{} deleted", self.kind().label()));
                self.resync_server_page().await;
            }
            Err(e) => self.notify_error(e),
        }
        result
    }

    // ==================== QUICK ACTIONS ====================

    /// Optimistic field toggle (active flag, publish flag).
    pub async fn toggle<F>(&mut self, id: &str, mutator: F) -> Result<Resource, ResourceError>
    where
        F: FnOnce(&mut Map<String, Value>),
    {
        let result = self.store.toggle_optimistic(id, mutator).await;
        if let Err(ref e) = result {
            self.notify_error(e);
        }
        result
    }

    /// Flip a boolean field optimistically.
    pub async fn toggle_flag(&mut self, id: &str, field: &str) -> Result<Resource, ResourceError> {
        let field = field.to_string();
        self.toggle(id, move |fields| {
            let current = fields.get(&field).and_then(Value::as_bool).unwrap_or(false);
            fields.insert(field, Value::Bool(!current));
        })
        .await
    }

    /// Like or unlike `id`, remembering the choice in `session`.
    pub async fn toggle_like(
        &mut self,
        id: &str,
        session: &mut SessionStore,
    ) -> Result<Resource, ResourceError> {
        let kind = self.kind();
        let liked = session.is_liked(kind, id);
        let result = self
            .store
            .like_optimistic(id, move |fields| {
                let likes = fields.get("likes").and_then(Value::as_i64).unwrap_or(0);
                let likes = if liked { (likes - 1).max(0) } else { likes + 1 };
                fields.insert("likes".to_string(), json!(likes));
            })
            .await;
        match result {
            Ok(resource) => {
                session.set_liked(kind, id, !liked);
                Ok(resource)
            }
            Err(e) => {
                self.notify_error(&e);
                Err(e)
            }
        }
    }

    /// Move an entity to a new status (approve a review, reject a refund).
    pub async fn set_status(&mut self, id: &str, status: &str) -> Result<Resource, ResourceError> {
        let mut fields = Map::new();
        fields.insert("status".to_string(), json!(status));
        let result = self.store.update(id, Submission::from_fields(fields)).await;
        match &result {
            Ok(_) => self.notify_success(format!("{} marked {}", self.kind().label(), status)),
            Err(e) => self.notify_error(e),
        }
        result
    }

    pub async fn approve(&mut self, id: &str) -> Result<Resource, ResourceError> {
        self.set_status(id, "approved").await
    }

    /// History entries of one entity (stock movements).
    pub async fn history(&mut self, id: &str) -> Result<Vec<Resource>, ResourceError> {
        let result = self.store.history(id).await;
        if let Err(ref e) = result {
            self.notify_error(e);
        }
        result
    }

    // ==================== NOTICES ====================

    pub fn notices(&self) -> Vec<Notice> {
        self.board().active()
    }

    pub fn dismiss_notice(&self, id: Uuid) -> bool {
        self.board().dismiss(id)
    }

    // ==================== POLLING & LIFECYCLE ====================

    /// Re-load the list every `interval` until teardown.
    ///
    /// Each tick runs as its own task, so a slow or failing tick never delays
    /// the next one; ticks missed while the runtime was busy are skipped.
    pub fn start_polling(&mut self, interval: Duration) {
        if self.is_polling() || self.is_torn_down() {
            return;
        }
        if interval.is_zero() {
            tracing::warn!("Refusing to poll {} with a zero interval", self.kind());
            return;
        }

        let store = self.store.clone();
        let notices = Arc::clone(&self.notices);
        let token = self.lifecycle.clone();
        let kind = self.kind();

        tracing::info!("Polling {} every {:?}", kind, interval);
        self.poller = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // First tick fires immediately; the page was just loaded.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let store = store.clone();
                        let notices = Arc::clone(&notices);
                        tokio::spawn(async move {
                            if let Err(e) = store.reload().await {
                                if !store.is_defunct() {
                                    lock(&notices).error(&e);
                                }
                            }
                        });
                    }
                }
            }
            tracing::debug!("Stopped polling {}", kind);
        }));
    }

    /// Tear the view down: stop polling, drop any draft, and ignore every
    /// request still in flight.
    pub fn teardown(&mut self) {
        if self.is_torn_down() {
            return;
        }
        self.lifecycle.cancel();
        if let Some(handle) = self.poller.take() {
            handle.abort();
        }
        self.form.cancel();
        self.modal = Modal::Closed;
        tracing::info!("Tore down {} page", self.kind());
    }

    // ==================== HELPERS ====================

    fn ensure_closed(&self) -> Result<(), ResourceError> {
        if self.modal == Modal::Closed {
            Ok(())
        } else {
            Err(ResourceError::busy("Another dialog"))
        }
    }

    /// After a create or delete on a server-paged list, re-fetch the page so
    /// page boundaries and totals match the server.
    async fn resync_server_page(&mut self) {
        let PaginationMode::Server { page_size } = self.mode else {
            return;
        };
        let result = self.store.reload().await;
        if self.report(result).is_err() {
            return;
        }

        // The last page emptied out; step back to the new last page
        let pagination = self.store.pagination();
        if self.store.is_empty() && pagination.current_page > 1 {
            let page = pagination
                .total_pages
                .min(pagination.current_page - 1)
                .max(1);
            let result = self.store.load(Some(page), Some(page_size)).await;
            let _ = self.report(result);
        }
    }

    fn report<T>(&self, result: Result<T, ResourceError>) -> Result<T, ResourceError> {
        if let Err(ref e) = result {
            self.notify_error(e);
        }
        result
    }

    fn notify_success(&self, message: String) {
        if !self.is_torn_down() {
            self.board().success(message);
        }
    }

    fn notify_error(&self, error: &ResourceError) {
        if !self.is_torn_down() {
            self.board().error(error);
        }
    }

    fn board(&self) -> MutexGuard<'_, NoticeBoard> {
        lock(&self.notices)
    }
}

impl<G: HttpGateway> Drop for ResourcePresenter<G> {
    fn drop(&mut self) {
        self.lifecycle.cancel();
    }
}

fn lock(board: &Mutex<NoticeBoard>) -> MutexGuard<'_, NoticeBoard> {
    board.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::ScriptedGateway;
    use crate::models::Method;

    fn presenter(kind: ResourceKind) -> (ResourcePresenter<ScriptedGateway>, ScriptedGateway) {
        let gateway = ScriptedGateway::new();
        let settings = PresenterSettings {
            page_size: 2,
            notice_ttl: Duration::from_secs(60),
        };
        (
            ResourcePresenter::new(kind, Arc::new(gateway.clone()), settings),
            gateway,
        )
    }

    fn stock() -> Value {
        json!({ "stock": [
            { "_id": "p1", "productName": "Linen shirt", "status": "in_stock", "quantity": 40 },
            { "_id": "p2", "productName": "Wool coat", "status": "low_stock", "quantity": 2 },
            { "_id": "p3", "productName": "Linen trousers", "status": "in_stock", "quantity": 12 },
            { "_id": "p4", "productName": "Silk scarf", "status": "out_of_stock", "quantity": 0 },
            { "_id": "p5", "productName": "Linen dress", "status": "in_stock", "quantity": 9 }
        ]})
    }

    fn ids(list: &[Resource]) -> Vec<&str> {
        list.iter().map(|r| r.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_client_pagination_over_filtered_view() {
        let (mut page, gateway) = presenter(ResourceKind::StockItem);
        gateway.respond(200, stock());
        page.mount().await.unwrap();

        assert_eq!(ids(&page.visible()), vec!["p1", "p2"]);
        assert_eq!(
            page.page_info(),
            PageInfo { page: 1, total_pages: 3, total_items: 5 }
        );

        page.next_page().await.unwrap();
        page.next_page().await.unwrap();
        assert_eq!(ids(&page.visible()), vec!["p5"]);
        page.next_page().await.unwrap();
        assert_eq!(page.page_info().page, 3);

        page.set_search("linen");
        page.set_filter("status", "in_stock");
        assert_eq!(page.page_info().total_items, 3);
        assert_eq!(ids(&page.visible()), vec!["p1", "p3"]);

        page.set_filter("status", "All");
        page.set_search("");
        page.previous_page().await.unwrap();
        assert_eq!(page.page_info().page, 1);
        assert_eq!(gateway.count(Method::Get), 1);
    }

    #[tokio::test]
    async fn test_server_pagination_loads_pages() {
        let (mut page, gateway) = presenter(ResourceKind::Blog);
        gateway
            .respond(200, json!({ "blogs": [{ "_id": "b1" }, { "_id": "b2" }], "currentPage": 1, "totalPages": 2 }))
            .respond(200, json!({ "blogs": [{ "_id": "b3" }], "currentPage": 2, "totalPages": 2 }));
        page.mount().await.unwrap();
        page.next_page().await.unwrap();

        assert_eq!(ids(&page.visible()), vec!["b3"]);
        assert_eq!(page.page_info().page, 2);
        let requests = gateway.requests();
        assert_eq!(requests[1].query[0], ("page".to_string(), "2".to_string()));

        // Past the last page nothing is fetched
        page.next_page().await.unwrap();
        assert_eq!(gateway.count(Method::Get), 2);
    }

    #[tokio::test]
    async fn test_mount_failure_posts_notice() {
        let (mut page, gateway) = presenter(ResourceKind::Refund);
        gateway.fail(ResourceError::network("Could not reach the server"));

        assert!(page.mount().await.is_err());
        let notices = page.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert_eq!(notices[0].message, "Could not reach the server");
    }

    #[tokio::test]
    async fn test_single_modal_at_a_time() {
        let (mut page, gateway) = presenter(ResourceKind::Certificate);
        gateway.respond(200, json!([{ "_id": "c1", "title": "ISO" }]));
        page.mount().await.unwrap();

        page.open_create().unwrap();
        assert_eq!(page.open_edit("c1").unwrap_err().kind, ErrorKind::Busy);
        assert_eq!(page.request_delete("c1").unwrap_err().kind, ErrorKind::Busy);

        page.close_modal();
        page.open_edit("c1").unwrap();
        assert_eq!(page.form().draft().unwrap().value("title"), Some(&json!("ISO")));
    }

    #[tokio::test]
    async fn test_submit_validation_keeps_modal_open() {
        let (mut page, gateway) = presenter(ResourceKind::Notification);
        page.open_create().unwrap();
        page.set_field("title", json!("Flash sale")).unwrap();

        let err = page.submit().await.unwrap_err();

        assert!(!err.is_user_visible());
        assert_eq!(page.modal(), &Modal::Form);
        assert!(page.notices().is_empty());
        assert!(gateway.requests().is_empty());
    }

    #[tokio::test]
    async fn test_submit_create_closes_modal_with_notice() {
        let (mut page, gateway) = presenter(ResourceKind::Notification);
        gateway
            .respond(200, json!({ "notifications": [] }))
            .respond(201, json!({ "notification": { "_id": "n1", "title": "Flash sale" } }));
        page.mount().await.unwrap();

        page.open_create().unwrap();
        page.set_field("title", json!("Flash sale")).unwrap();
        page.set_field("message", json!("Everything 20% off today")).unwrap();
        page.set_field("type", json!("promotion")).unwrap();
        let created = page.submit().await.unwrap();

        assert_eq!(created.id, "n1");
        assert_eq!(page.modal(), &Modal::Closed);
        assert_eq!(ids(&page.visible()), vec!["n1"]);
        assert_eq!(page.notices()[0].message, "Notification created");
        assert_eq!(gateway.requests()[1].path, "/api/notifications/send");
    }

    #[tokio::test]
    async fn test_read_only_kinds_refuse_forms() {
        let (mut page, _) = presenter(ResourceKind::Review);
        assert_eq!(page.open_create().unwrap_err().kind, ErrorKind::Config);

        let (mut page, _) = presenter(ResourceKind::Transaction);
        assert_eq!(page.request_delete("t1").unwrap_err().kind, ErrorKind::Config);
    }

    #[tokio::test]
    async fn test_edit_refused_without_update_route() {
        let (mut page, gateway) = presenter(ResourceKind::Notification);
        gateway.respond(200, json!({ "notifications": [{ "_id": "n1", "title": "Sale" }] }));
        page.mount().await.unwrap();

        let err = page.open_edit("n1").unwrap_err();

        assert_eq!(err.kind, ErrorKind::Config);
        assert_eq!(page.modal(), &Modal::Closed);
        assert!(!page.form().is_open());
        assert_eq!(gateway.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let (mut page, gateway) = presenter(ResourceKind::Slider);
        gateway
            .respond(200, json!({ "sliders": [{ "_id": "s1" }, { "_id": "s2" }] }))
            .respond(200, json!({ "message": "Slider deleted" }));
        page.mount().await.unwrap();

        page.request_delete("s1").unwrap();
        assert_eq!(page.modal(), &Modal::ConfirmDelete { id: "s1".to_string() });
        page.cancel_delete();
        assert_eq!(gateway.count(Method::Delete), 0);

        page.request_delete("s1").unwrap();
        page.confirm_delete().await.unwrap();

        assert_eq!(gateway.count(Method::Delete), 1);
        assert_eq!(ids(&page.visible()), vec!["s2"]);
        assert_eq!(page.notices()[0].message, "Slider deleted");
        assert!(page.confirm_delete().await.is_err());
    }

    #[tokio::test]
    async fn test_failed_delete_posts_server_message() {
        let (mut page, gateway) = presenter(ResourceKind::Slider);
        gateway
            .respond(200, json!({ "sliders": [{ "_id": "s1" }] }))
            .respond(403, json!({ "message": "Admins only" }));
        page.mount().await.unwrap();

        page.request_delete("s1").unwrap();
        assert!(page.confirm_delete().await.is_err());

        assert_eq!(ids(&page.visible()), vec!["s1"]);
        assert_eq!(page.notices()[0].message, "Admins only");
        assert_eq!(page.modal(), &Modal::Closed);
    }

    #[tokio::test]
    async fn test_toggle_flag_rollback_posts_notice() {
        let (mut page, gateway) = presenter(ResourceKind::Slider);
        gateway
            .respond(200, json!({ "sliders": [{ "_id": "s1", "isActive": true }] }))
            .respond(500, Value::Null);
        page.mount().await.unwrap();

        assert!(page.toggle_flag("s1", "isActive").await.is_err());

        let slider = page.store().get("s1").unwrap();
        assert_eq!(slider.field("isActive"), Some(&json!(true)));
        assert_eq!(page.notices().len(), 1);
    }

    #[tokio::test]
    async fn test_blog_publish_toggle_targets_update_route() {
        let (mut page, gateway) = presenter(ResourceKind::Blog);
        gateway
            .respond(200, json!({ "blogs": [{ "_id": "b1", "published": false, "likes": 9 }] }))
            .respond(200, json!({ "blog": { "_id": "b1", "published": true, "likes": 9 } }));
        page.mount().await.unwrap();

        let toggled = page.toggle_flag("b1", "published").await.unwrap();

        assert_eq!(toggled.field("published"), Some(&json!(true)));
        assert_eq!(toggled.field("likes"), Some(&json!(9)));
        let request = &gateway.requests()[1];
        assert_eq!(request.method, Method::Put);
        assert_eq!(request.path, "/api/blogs/b1");
    }

    #[tokio::test]
    async fn test_delete_emptying_last_page_steps_back() {
        let (mut page, gateway) = presenter(ResourceKind::Blog);
        gateway
            .respond(200, json!({ "blogs": [{ "_id": "b1" }, { "_id": "b2" }], "currentPage": 1, "totalPages": 2, "total": 3 }))
            .respond(200, json!({ "blogs": [{ "_id": "b3" }], "currentPage": 2, "totalPages": 2, "total": 3 }))
            .respond(200, json!({ "message": "Blog deleted" }))
            .respond(200, json!({ "blogs": [], "currentPage": 2, "totalPages": 1, "total": 2 }))
            .respond(200, json!({ "blogs": [{ "_id": "b1" }, { "_id": "b2" }], "currentPage": 1, "totalPages": 1, "total": 2 }));
        page.mount().await.unwrap();
        page.next_page().await.unwrap();

        page.request_delete("b3").unwrap();
        page.confirm_delete().await.unwrap();

        assert_eq!(ids(&page.visible()), vec!["b1", "b2"]);
        assert_eq!(
            page.page_info(),
            PageInfo { page: 1, total_pages: 1, total_items: 2 }
        );
        let requests = gateway.requests();
        assert_eq!(requests[4].query[0], ("page".to_string(), "1".to_string()));
    }

    #[tokio::test]
    async fn test_toggle_like_tracks_session() {
        let (mut page, gateway) = presenter(ResourceKind::Blog);
        let mut session = SessionStore::new();
        gateway
            .respond(200, json!({ "blogs": [{ "_id": "b1", "likes": 3 }] }))
            .respond(200, json!({ "message": "Liked" }))
            .respond(200, json!({ "message": "Unliked" }));
        page.mount().await.unwrap();

        let liked = page.toggle_like("b1", &mut session).await.unwrap();
        assert_eq!(liked.field("likes"), Some(&json!(4)));
        assert!(session.is_liked(ResourceKind::Blog, "b1"));

        let unliked = page.toggle_like("b1", &mut session).await.unwrap();
        assert_eq!(unliked.field("likes"), Some(&json!(3)));
        assert!(!session.is_liked(ResourceKind::Blog, "b1"));
    }

    #[tokio::test]
    async fn test_set_status_approves_review() {
        let (mut page, gateway) = presenter(ResourceKind::Review);
        gateway
            .respond(200, json!({ "reviews": [{ "_id": "r1", "status": "pending" }] }))
            .respond(200, json!({ "review": { "_id": "r1", "status": "approved" } }));
        page.mount().await.unwrap();

        page.approve("r1").await.unwrap();

        assert_eq!(page.store().get("r1").unwrap().status(), Some("approved"));
        assert_eq!(gateway.requests()[1].path, "/api/reviews/admin/approve/r1");
        assert_eq!(page.notices()[0].message, "Review marked approved");
    }

    #[tokio::test]
    async fn test_filter_options() {
        let (mut page, gateway) = presenter(ResourceKind::StockItem);
        gateway.respond(200, stock());
        page.mount().await.unwrap();

        assert_eq!(
            page.filter_options("status"),
            vec!["in_stock", "low_stock", "out_of_stock"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_survives_failed_ticks_and_stops_on_teardown() {
        let (mut page, gateway) = presenter(ResourceKind::Notification);
        gateway
            .respond(200, json!({ "notifications": [] }))
            .respond(200, json!({ "notifications": [{ "_id": "n1" }] }))
            .respond(500, json!({ "message": "Notification service down" }))
            .respond(200, json!({ "notifications": [{ "_id": "n1" }, { "_id": "n2" }] }));
        page.mount().await.unwrap();

        page.start_polling(Duration::from_secs(30));
        assert!(page.is_polling());
        tokio::time::sleep(Duration::from_secs(95)).await;

        assert_eq!(gateway.count(Method::Get), 4);
        assert_eq!(ids(&page.visible()), vec!["n1", "n2"]);
        assert_eq!(page.notices()[0].message, "Notification service down");

        page.teardown();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(gateway.count(Method::Get), 4);
        assert!(!page.is_polling());
    }

    #[tokio::test]
    async fn test_teardown_ignores_late_results() {
        let (mut page, gateway) = presenter(ResourceKind::Slider);
        gateway.respond(200, json!({ "sliders": [{ "_id": "s1" }] }));

        page.teardown();
        page.mount().await.unwrap();

        assert!(page.visible().is_empty());
        assert!(page.notices().is_empty());
    }
}
