use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::debug;

use formforge_core::{Draft, FieldDefinition, FormId, SelectId};

use crate::error::StorageError;
use crate::sqlite::SqliteStorage;
use crate::traits::FormRepository;

/// A database file accessed through one short-lived connection per
/// repository call. Nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create the schema if needed and return the handle.
    pub fn initialize(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let db = Self::new(path);
        SqliteStorage::open(&db.path)?;
        debug!(path = %db.path.display(), "database initialized");
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn connect(&self) -> Result<SqliteStorage, StorageError> {
        SqliteStorage::connect(&self.path)
    }
}

impl FormRepository for Database {
    fn get_forms_index(&self) -> Result<IndexMap<String, FormId>, StorageError> {
        self.connect()?.get_forms_index()
    }

    fn get_form_by_id(&self, form_id: FormId) -> Result<(String, FieldDefinition), StorageError> {
        self.connect()?.get_form_by_id(form_id)
    }

    fn get_form_by_label(&self, label: &str) -> Result<FieldDefinition, StorageError> {
        self.connect()?.get_form_by_label(label)
    }

    fn get_doc_form(&self, label: &str) -> Result<Vec<u8>, StorageError> {
        self.connect()?.get_doc_form(label)
    }

    fn get_select_labels(&self) -> Result<Vec<String>, StorageError> {
        self.connect()?.get_select_labels()
    }

    fn get_choices(&self, select_label: &str) -> Result<Vec<String>, StorageError> {
        self.connect()?.get_choices(select_label)
    }

    fn save_form(
        &mut self,
        label: &str,
        draft: &Draft,
        doc_form: &[u8],
    ) -> Result<FormId, StorageError> {
        self.connect()?.save_form(label, draft, doc_form)
    }

    fn delete_form(&mut self, label: &str) -> Result<bool, StorageError> {
        self.connect()?.delete_form(label)
    }

    fn save_select_field(
        &mut self,
        label: &str,
        choices: &[String],
    ) -> Result<SelectId, StorageError> {
        self.connect()?.save_select_field(label, choices)
    }

    fn delete_select_field(&mut self, label: &str) -> Result<bool, StorageError> {
        self.connect()?.delete_select_field(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formforge_core::FieldType;

    #[test]
    fn writes_are_visible_to_later_connections() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = Database::initialize(dir.path().join("forms.db")).unwrap();

        let mut draft = Draft::new();
        draft.add_static("name", FieldType::Text, "Name").unwrap();
        let form_id = db.save_form("Survey", &draft, b"template").unwrap();

        let reopened = Database::new(db.path());
        let (label, definition) = reopened.get_form_by_id(form_id).unwrap();
        assert_eq!(label, "Survey");
        assert_eq!(definition.fields, draft);
    }

    #[test]
    fn restrict_holds_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = Database::initialize(dir.path().join("forms.db")).unwrap();
        db.save_select_field("Color", &["Red".to_string(), "Blue".to_string()])
            .unwrap();
        let mut draft = Draft::new();
        draft
            .add_select("favorite", "Color", db.get_choices("Color").unwrap())
            .unwrap();
        db.save_form("Survey", &draft, b"template").unwrap();

        assert!(matches!(
            db.delete_select_field("Color"),
            Err(StorageError::ReferentialIntegrity(_))
        ));
    }
}
