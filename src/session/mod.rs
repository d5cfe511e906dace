//! Scoped client-side session state.
//!
//! Holds cross-page state that used to live in global browser storage: the
//! set of entities the admin has liked and a one-shot handoff slot used when
//! navigating from a list to a detail view. The session has an explicit
//! lifecycle and is passed to whoever needs it.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};

use crate::models::{Resource, ResourceKind};

#[derive(Debug, Clone)]
pub struct SessionStore {
    started_at: DateTime<Utc>,
    liked: HashMap<ResourceKind, BTreeSet<String>>,
    handoff: Option<(ResourceKind, Resource)>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            liked: HashMap::new(),
            handoff: None,
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn is_liked(&self, kind: ResourceKind, id: &str) -> bool {
        self.liked
            .get(&kind)
            .map(|ids| ids.contains(id))
            .unwrap_or(false)
    }

    pub fn set_liked(&mut self, kind: ResourceKind, id: &str, liked: bool) {
        let ids = self.liked.entry(kind).or_default();
        if liked {
            ids.insert(id.to_string());
        } else {
            ids.remove(id);
        }
    }

    pub fn liked(&self, kind: ResourceKind) -> Vec<&str> {
        self.liked
            .get(&kind)
            .map(|ids| ids.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Park `resource` for the next view of `kind`, replacing any earlier one.
    pub fn hand_off(&mut self, kind: ResourceKind, resource: Resource) {
        self.handoff = Some((kind, resource));
    }

    /// Take the parked resource if it was parked for `kind`. The slot is
    /// emptied either way.
    pub fn take_handoff(&mut self, kind: ResourceKind) -> Option<Resource> {
        match self.handoff.take() {
            Some((parked, resource)) if parked == kind => Some(resource),
            Some((parked, _)) => {
                tracing::debug!("Dropping {} handoff requested as {}", parked, kind);
                None
            }
            None => None,
        }
    }

    /// End the session, forgetting everything it held.
    pub fn end(&mut self) {
        tracing::debug!(
            "Ending admin session started at {}",
            self.started_at.to_rfc3339()
        );
        self.liked.clear();
        self.handoff = None;
    }
}
