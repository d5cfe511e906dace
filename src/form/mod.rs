//! Form sessions: one in-progress create or edit interaction.
//!
//! A session owns a draft copy of the fields. The resource list is never
//! touched by the draft; only a confirmed create/update through the store
//! changes it.

mod rules;

pub use rules::Rule;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::errors::{FieldError, ResourceError};
use crate::gateway::HttpGateway;
use crate::models::{Attachment, Resource, ResourceSchema, Submission};
use crate::store::ResourceStore;

/// Session state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum FormState {
    Idle,
    Editing,
    /// Local validation failed on commit; the draft is kept
    EditingWithErrors,
    /// The server rejected the commit; the draft was discarded
    IdleWithError(ResourceError),
}

/// Working copy of a resource's fields.
#[derive(Debug, Clone, PartialEq)]
pub struct FormDraft {
    pub fields: Map<String, Value>,
    /// Entity being edited; `None` for a create form
    pub original: Option<Resource>,
    pub errors: BTreeMap<String, FieldError>,
    pub dirty: BTreeSet<String>,
    pub attachments: Vec<Attachment>,
}

impl FormDraft {
    pub fn is_edit(&self) -> bool {
        self.original.is_some()
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn error(&self, name: &str) -> Option<&FieldError> {
        self.errors.get(name)
    }

    fn baseline(&self, name: &str) -> Option<&Value> {
        self.original.as_ref().and_then(|r| r.fields.get(name))
    }
}

/// Manages a single add/edit form for one resource family.
#[derive(Debug)]
pub struct FormSession {
    schema: Arc<ResourceSchema>,
    draft: Option<FormDraft>,
    state: FormState,
}

impl FormSession {
    pub fn new(schema: Arc<ResourceSchema>) -> Self {
        Self {
            schema,
            draft: None,
            state: FormState::Idle,
        }
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn draft(&self) -> Option<&FormDraft> {
        self.draft.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.draft.is_some()
    }

    pub fn is_dirty(&self) -> bool {
        self.draft
            .as_ref()
            .map(|d| !d.dirty.is_empty() || !d.attachments.is_empty())
            .unwrap_or(false)
    }

    /// Names of fields changed against the original, sorted.
    pub fn dirty_fields(&self) -> Vec<&str> {
        self.draft
            .as_ref()
            .map(|d| d.dirty.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Start a create form (`None`) or an edit form cloned from `initial`.
    ///
    /// Fails when another draft is already open.
    pub fn begin(&mut self, initial: Option<&Resource>) -> Result<&FormDraft, ResourceError> {
        if self.draft.is_some() {
            return Err(ResourceError::busy("Another form"));
        }

        let fields = match initial {
            Some(resource) => {
                let mut fields = self.schema.template();
                fields.extend(resource.fields.clone());
                fields
            }
            None => self.schema.template(),
        };

        tracing::debug!(
            "Opening {} form for {}",
            if initial.is_some() { "edit" } else { "create" },
            self.schema.kind
        );

        self.state = FormState::Editing;
        Ok(self.draft.insert(FormDraft {
            fields,
            original: initial.cloned(),
            errors: BTreeMap::new(),
            dirty: BTreeSet::new(),
            attachments: Vec::new(),
        }))
    }

    /// Update one field, clearing its previous validation error.
    pub fn set_field(&mut self, name: &str, value: Value) -> Result<(), ResourceError> {
        let draft = self.draft.as_mut().ok_or_else(no_open_form)?;

        let unchanged = match draft.baseline(name) {
            Some(baseline) => *baseline == value,
            None if draft.is_edit() => value.is_null(),
            None => false,
        };
        if unchanged {
            draft.dirty.remove(name);
        } else {
            draft.dirty.insert(name.to_string());
        }

        draft.errors.remove(name);
        draft.fields.insert(name.to_string(), value);
        Ok(())
    }

    /// Attach an upload; a second upload for the same field replaces the first.
    pub fn attach(&mut self, attachment: Attachment) -> Result<(), ResourceError> {
        let draft = self.draft.as_mut().ok_or_else(no_open_form)?;
        draft.errors.remove(&attachment.field);
        draft.attachments.retain(|a| a.field != attachment.field);
        draft.attachments.push(attachment);
        Ok(())
    }

    /// Check every field of the draft and return all violations, in schema
    /// order. Calling it again without changes yields the same result.
    pub fn validate(&mut self) -> Vec<FieldError> {
        let Some(draft) = self.draft.as_mut() else {
            return Vec::new();
        };

        let mut errors = Vec::new();
        for spec in &self.schema.fields {
            // An upload satisfies the field it targets
            if draft.attachments.iter().any(|a| a.field == spec.name) {
                continue;
            }
            let value = draft.fields.get(spec.name);
            if let Some(message) = spec.rules.iter().find_map(|rule| rule.check(spec.label, value)) {
                errors.push(FieldError::new(spec.name, message));
            }
        }

        draft.errors = errors
            .iter()
            .map(|e| (e.field.clone(), e.clone()))
            .collect();
        errors
    }

    /// Validate, then create or update through `store`.
    ///
    /// Validation failures keep the draft open and never touch the network.
    /// Remote failures end the session with the error surfaced.
    pub async fn commit<G: HttpGateway>(
        &mut self,
        store: &ResourceStore<G>,
    ) -> Result<Resource, ResourceError> {
        if self.draft.is_none() {
            return Err(no_open_form());
        }

        let errors = self.validate();
        if !errors.is_empty() {
            tracing::debug!(
                "{} form has {} invalid fields",
                self.schema.kind,
                errors.len()
            );
            self.state = FormState::EditingWithErrors;
            return Err(ResourceError::validation(errors));
        }

        let Some(draft) = self.draft.take() else {
            return Err(no_open_form());
        };

        let outcome = match draft.original {
            None => {
                store
                    .create(Submission {
                        fields: draft.fields,
                        attachments: draft.attachments,
                    })
                    .await
            }
            Some(original) => {
                let changed: Map<String, Value> = draft
                    .fields
                    .into_iter()
                    .filter(|(name, _)| draft.dirty.contains(name))
                    .collect();
                if changed.is_empty() && draft.attachments.is_empty() {
                    tracing::debug!("Nothing changed on {} {}", self.schema.kind, original.id);
                    Ok(original)
                } else {
                    store
                        .update(
                            &original.id,
                            Submission {
                                fields: changed,
                                attachments: draft.attachments,
                            },
                        )
                        .await
                }
            }
        };

        self.state = match &outcome {
            Ok(_) => FormState::Idle,
            Err(e) => FormState::IdleWithError(e.clone()),
        };
        outcome
    }

    /// Discard the draft without any network call.
    pub fn cancel(&mut self) {
        if self.draft.take().is_some() {
            tracing::debug!("Discarded {} draft", self.schema.kind);
        }
        self.state = FormState::Idle;
    }
}

fn no_open_form() -> ResourceError {
    ResourceError::validation(vec![FieldError::new("form", "No form is open")])
}
