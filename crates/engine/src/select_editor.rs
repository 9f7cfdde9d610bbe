//! Session-held choice list for building select fields.

use tracing::{debug, info};

use formforge_core::validate::{validate_choice, validate_select_label};
use formforge_core::{CoreError, SelectId, SessionId};
use formforge_storage::FormRepository;

use crate::error::EngineError;
use crate::materialize::{FieldRegistry, FieldSpec, Widget};
use crate::session::{SessionData, SessionStore};

/// A select field needs at least this many choices to be saved.
pub const MIN_CHOICES: usize = 2;

pub struct SelectFieldEditor<'a, R, S> {
    repository: &'a mut R,
    sessions: &'a mut S,
    registry: &'a FieldRegistry,
    session: SessionId,
}

impl<'a, R: FormRepository, S: SessionStore> SelectFieldEditor<'a, R, S> {
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

    pub fn choices(&self) -> Result<Vec<String>, EngineError> {
        Ok(SessionData::load(&*self.sessions, self.session)?.choices)
    }

    fn update<T>(
        &mut self,
        edit: impl FnOnce(&mut Vec<String>) -> T,
    ) -> Result<T, EngineError> {
        let mut data = SessionData::load(&*self.sessions, self.session)?;
        let out = edit(&mut data.choices);
        data.store(&mut *self.sessions, self.session)?;
        Ok(out)
    }

    /// Append a choice. Returns false if it was already present.
    pub fn add_choice(&mut self, choice: &str) -> Result<bool, EngineError> {
        validate_choice(choice)?;
        self.update(|choices| {
            if choices.iter().any(|c| c == choice) {
                false
            } else {
                choices.push(choice.to_string());
                true
            }
        })
    }

    /// Returns false if the choice was not present.
    pub fn remove_choice(&mut self, choice: &str) -> Result<bool, EngineError> {
        self.update(|choices| {
            let before = choices.len();
            choices.retain(|c| c != choice);
            choices.len() != before
        })
    }

    pub fn discard(&mut self) -> Result<(), EngineError> {
        self.update(Vec::clear)
    }

    /// Save the pending choices as a select field. The list is cleared on
    /// success and kept on any error.
    pub fn commit(&mut self, label: &str) -> Result<SelectId, EngineError> {
        validate_select_label(label)?;
        let mut data = SessionData::load(&*self.sessions, self.session)?;
        if data.choices.len() < MIN_CHOICES {
            return Err(CoreError::validation(
                "choices",
                format!("a select field needs at least {MIN_CHOICES} choices"),
            )
            .into());
        }

        let select_id = self.repository.save_select_field(label, &data.choices)?;
        info!(%select_id, label, choices = data.choices.len(), "select field saved");

        data.choices.clear();
        data.store(&mut *self.sessions, self.session)?;
        Ok(select_id)
    }

    /// Delete a stored select field. Refused while this session's form draft
    /// binds it; stored forms binding it make the repository refuse.
    pub fn delete(&mut self, label: &str) -> Result<bool, EngineError> {
        validate_select_label(label)?;
        let data = SessionData::load(&*self.sessions, self.session)?;
        if data.draft.as_ref().is_some_and(|d| d.uses_select(label)) {
            debug!(session = %self.session, label, "select field in use by draft");
            return Err(EngineError::SelectInDraft(label.to_string()));
        }

        let deleted = self.repository.delete_select_field(label)?;
        if deleted {
            info!(label, "select field deleted");
        }
        Ok(deleted)
    }

    /// The select widget the pending choices would render as.
    pub fn preview(&self) -> Result<FieldSpec, EngineError> {
        let template = self.registry.default_template();
        let choices = self.choices()?;
        let required = template.required();
        Ok(FieldSpec {
            label: String::new(),
            widget: Widget::Select { choices },
            required,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::session::MemorySessionStore;
    use formforge_core::Draft;
    use formforge_storage::SqliteStorage;

    struct Fixture {
        repo: SqliteStorage,
        sessions: MemorySessionStore,
        registry: FieldRegistry,
        session: SessionId,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                repo: SqliteStorage::open_in_memory().unwrap(),
                sessions: MemorySessionStore::new(),
                registry: FieldRegistry::default(),
                session: SessionId::new(),
            }
        }

        fn editor(&mut self) -> SelectFieldEditor<'_, SqliteStorage, MemorySessionStore> {
            SelectFieldEditor::new(&mut self.repo, &mut self.sessions, &self.registry, self.session)
        }
    }

    #[test]
    fn choices_are_unique_and_ordered() {
        let mut fx = Fixture::new();
        let mut editor = fx.editor();
        assert!(editor.add_choice("Red").unwrap());
        assert!(editor.add_choice("Blue").unwrap());
        assert!(!editor.add_choice("Red").unwrap());
        assert_eq!(editor.choices().unwrap(), vec!["Red", "Blue"]);

        assert!(editor.remove_choice("Red").unwrap());
        assert!(!editor.remove_choice("Green").unwrap());
        assert_eq!(editor.choices().unwrap(), vec!["Blue"]);
    }

    #[test]
    fn empty_choice_is_rejected() {
        let mut fx = Fixture::new();
        let err = fx.editor().add_choice("").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn commit_needs_two_choices() {
        let mut fx = Fixture::new();
        let mut editor = fx.editor();
        editor.add_choice("Red").unwrap();
        let err = editor.commit("Color").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(editor.choices().unwrap(), vec!["Red"]);

        editor.add_choice("Blue").unwrap();
        editor.commit("Color").unwrap();
        assert!(editor.choices().unwrap().is_empty());
        assert_eq!(fx.repo.get_choices("Color").unwrap(), vec!["Red", "Blue"]);
    }

    #[test]
    fn numeric_label_is_rejected() {
        let mut fx = Fixture::new();
        let mut editor = fx.editor();
        editor.add_choice("S").unwrap();
        editor.add_choice("M").unwrap();
        assert_eq!(editor.commit("42").unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    fn duplicate_label_keeps_choices() {
        let mut fx = Fixture::new();
        fx.repo
            .save_select_field("Color", &["Red".to_string(), "Blue".to_string()])
            .unwrap();
        let mut editor = fx.editor();
        editor.add_choice("Cyan").unwrap();
        editor.add_choice("Teal").unwrap();

        assert_eq!(editor.commit("Color").unwrap_err().kind(), ErrorKind::Conflict);
        assert_eq!(editor.choices().unwrap(), vec!["Cyan", "Teal"]);
    }

    #[test]
    fn delete_is_refused_while_draft_binds_field() {
        let mut fx = Fixture::new();
        fx.repo
            .save_select_field("Color", &["Red".to_string(), "Blue".to_string()])
            .unwrap();
        let mut draft = Draft::new();
        draft
            .add_select("favorite", "Color", vec!["Red".into(), "Blue".into()])
            .unwrap();
        SessionData {
            draft: Some(draft),
            choices: Vec::new(),
        }
        .store(&mut fx.sessions, fx.session)
        .unwrap();

        let err = fx.editor().delete("Color").unwrap_err();
        assert!(matches!(err, EngineError::SelectInDraft(_)));
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(fx.repo.get_select_labels().unwrap(), vec!["Color"]);
    }

    #[test]
    fn delete_is_refused_while_a_form_binds_field() {
        let mut fx = Fixture::new();
        fx.repo
            .save_select_field("Color", &["Red".to_string(), "Blue".to_string()])
            .unwrap();
        let mut draft = Draft::new();
        draft.add_select("favorite", "Color", vec![]).unwrap();
        fx.repo.save_form("Survey", &draft, b"docx").unwrap();

        let err = fx.editor().delete("Color").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReferentialIntegrity);

        fx.repo.delete_form("Survey").unwrap();
        assert!(fx.editor().delete("Color").unwrap());
        assert!(!fx.editor().delete("Color").unwrap());
    }

    #[test]
    fn preview_shows_pending_choices() {
        let mut fx = Fixture::new();
        let mut editor = fx.editor();
        editor.add_choice("S").unwrap();
        let spec = editor.preview().unwrap();
        assert_eq!(spec.widget, Widget::Select { choices: vec!["S".to_string()] });
    }

    #[test]
    fn choices_and_draft_share_a_session() {
        let mut fx = Fixture::new();
        let mut draft = Draft::new();
        draft.add_static("name", formforge_core::FieldType::Text, "Name").unwrap();
        SessionData {
            draft: Some(draft.clone()),
            choices: Vec::new(),
        }
        .store(&mut fx.sessions, fx.session)
        .unwrap();

        fx.editor().add_choice("Red").unwrap();
        fx.editor().discard().unwrap();

        let data = SessionData::load(&fx.sessions, fx.session).unwrap();
        assert_eq!(data.draft, Some(draft));
        assert!(data.choices.is_empty());
    }
}
