//! Session-held form draft and the edit operations on it.

use serde::Serialize;
use tracing::{debug, info};

use formforge_core::validate::{validate_field_name, validate_form_label};
use formforge_core::{CoreError, Draft, FieldType, FormId, SessionId};
use formforge_storage::FormRepository;

use crate::error::EngineError;
use crate::materialize::{FieldRegistry, FormInstance, generate_fields};
use crate::session::{SessionData, SessionStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorState {
    /// No draft in the session.
    Empty,
    /// A draft is present; it may hold zero fields.
    Editing(Draft),
}

impl EditorState {
    pub fn draft(&self) -> Option<&Draft> {
        match self {
            Self::Empty => None,
            Self::Editing(draft) => Some(draft),
        }
    }
}

pub const PREDEFINED_GROUP: &str = "Pre-defined fields";
pub const CUSTOM_GROUP: &str = "Custom select fields";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceOption {
    /// Token submitted back to [`FormEditor::add_field`].
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceGroup {
    pub label: String,
    pub options: Vec<ChoiceOption>,
}

/// Options of the editor's type picker: the static types by code, then the
/// stored select fields by label. Empty groups are left out.
pub fn editor_choices<R: FormRepository>(repository: &R) -> Result<Vec<ChoiceGroup>, EngineError> {
    let predefined: Vec<ChoiceOption> = FieldType::PREDEFINED
        .iter()
        .map(|t| ChoiceOption {
            value: t.code().to_string(),
            label: t.display_name().to_string(),
        })
        .collect();
    let custom: Vec<ChoiceOption> = repository
        .get_select_labels()?
        .into_iter()
        .map(|label| ChoiceOption {
            value: label.clone(),
            label,
        })
        .collect();

    Ok([(PREDEFINED_GROUP, predefined), (CUSTOM_GROUP, custom)]
        .into_iter()
        .filter(|(_, options)| !options.is_empty())
        .map(|(label, options)| ChoiceGroup {
            label: label.to_string(),
            options,
        })
        .collect())
}

/// Edit operations on one session's draft. Every operation loads the
/// session, applies the change and writes it back; a failed operation
/// leaves the session as it was.
pub struct FormEditor<'a, R, S> {
    repository: &'a mut R,
    sessions: &'a mut S,
    registry: &'a FieldRegistry,
    session: SessionId,
}

impl<'a, R: FormRepository, S: SessionStore> FormEditor<'a, R, S> {
    pub fn new(
        repository: &'a mut R,
        sessions: &'a mut S,
        registry: &'a FieldRegistry,
        session: SessionId,
    ) -> Self {
        Self {
            repository,
            sessions,
            registry,
            session,
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn state(&self) -> Result<EditorState, EngineError> {
        let data = SessionData::load(&*self.sessions, self.session)?;
        Ok(match data.draft {
            Some(draft) => EditorState::Editing(draft),
            None => EditorState::Empty,
        })
    }

    fn update<T>(
        &mut self,
        edit: impl FnOnce(&mut Draft) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let mut data = SessionData::load(&*self.sessions, self.session)?;
        let mut draft = data.draft.take().unwrap_or_default();
        let out = edit(&mut draft)?;
        data.draft = Some(draft);
        data.store(&mut *self.sessions, self.session)?;
        Ok(out)
    }

    pub fn add_static(
        &mut self,
        name: &str,
        field_type: FieldType,
        label: &str,
    ) -> Result<(), EngineError> {
        self.update(|draft| Ok(draft.add_static(name, field_type, label)?))?;
        debug!(session = %self.session, name, %field_type, "static field added");
        Ok(())
    }

    /// Bind the select field `select_label` under `name`, with its choices
    /// as currently stored.
    pub fn add_select(&mut self, name: &str, select_label: &str) -> Result<(), EngineError> {
        validate_field_name(name)?;
        let choices = self.repository.get_choices(select_label)?;
        self.update(|draft| Ok(draft.add_select(name, select_label, choices)?))?;
        debug!(session = %self.session, name, select_label, "select field bound");
        Ok(())
    }

    /// Add a field from the editor's type picker. A token made only of
    /// digits is a static type code; anything else is a select-field label.
    ///
    /// Only the predefined type codes are accepted. Any other digit token is
    /// a validation error and leaves the draft untouched, instead of being
    /// stored and later rendered with the fallback widget.
    pub fn add_field(&mut self, name: &str, type_token: &str, label: &str) -> Result<(), EngineError> {
        if FieldType::is_type_token(type_token) {
            let field_type = FieldType::parse_token(type_token)
                .filter(|t| FieldType::PREDEFINED.contains(t))
                .ok_or_else(|| {
                    CoreError::validation("field_type", format!("'{type_token}' is not a valid choice"))
                })?;
            self.add_static(name, field_type, label)
        } else {
            self.add_select(name, type_token)
        }
    }

    /// Remove `name` from the draft. Absent names are not an error.
    pub fn remove(&mut self, name: &str) -> Result<bool, EngineError> {
        if self.state()? == EditorState::Empty {
            return Ok(false);
        }
        self.update(|draft| Ok(draft.remove(name)))
    }

    pub fn discard(&mut self) -> Result<(), EngineError> {
        let mut data = SessionData::load(&*self.sessions, self.session)?;
        data.draft = None;
        data.store(&mut *self.sessions, self.session)
    }

    /// Persist the draft as a new form. On success the editor returns to
    /// `Empty`; on any error, a duplicate label included, the draft stays.
    pub fn commit(&mut self, label: &str, template: &[u8]) -> Result<FormId, EngineError> {
        validate_form_label(label)?;
        if template.is_empty() {
            return Err(CoreError::validation("doc_form", "a document template is required").into());
        }

        let mut data = SessionData::load(&*self.sessions, self.session)?;
        let draft = data.draft.take().unwrap_or_default();
        let form_id = self.repository.save_form(label, &draft, template)?;

        data.store(&mut *self.sessions, self.session)?;
        info!(session = %self.session, %form_id, label, fields = draft.len(), "form saved");
        Ok(form_id)
    }

    /// Delete a stored form by label. The draft is not touched.
    pub fn delete_form(&mut self, label: &str) -> Result<bool, EngineError> {
        validate_form_label(label)?;
        let deleted = self.repository.delete_form(label)?;
        if deleted {
            info!(label, "form deleted");
        }
        Ok(deleted)
    }

    /// The form the current draft would render as.
    pub fn preview(&self) -> Result<FormInstance, EngineError> {
        let draft = self.state()?.draft().cloned().unwrap_or_default();
        Ok(generate_fields(&draft, self.registry))
    }
}
