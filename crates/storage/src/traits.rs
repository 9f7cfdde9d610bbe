use indexmap::IndexMap;

use formforge_core::{Draft, FieldDefinition, FormId, SelectId};

use crate::error::StorageError;

/// Query and command layer over the form schema.
///
/// Writes that touch several tables run in one transaction: a failure part
/// way through (a select field deleted under a draft, a duplicate label)
/// leaves nothing behind.
pub trait FormRepository {
    /// Form labels mapped to their ids, in creation order.
    fn get_forms_index(&self) -> Result<IndexMap<String, FormId>, StorageError>;

    fn get_form_by_id(&self, form_id: FormId) -> Result<(String, FieldDefinition), StorageError>;

    fn get_form_by_label(&self, label: &str) -> Result<FieldDefinition, StorageError>;

    fn get_doc_form(&self, label: &str) -> Result<Vec<u8>, StorageError>;

    fn get_select_labels(&self) -> Result<Vec<String>, StorageError>;

    /// Choices of a select field in the order they were saved.
    fn get_choices(&self, select_label: &str) -> Result<Vec<String>, StorageError>;

    fn save_form(
        &mut self,
        label: &str,
        draft: &Draft,
        doc_form: &[u8],
    ) -> Result<FormId, StorageError>;

    /// Returns false if no form has this label.
    fn delete_form(&mut self, label: &str) -> Result<bool, StorageError>;

    fn save_select_field(
        &mut self,
        label: &str,
        choices: &[String],
    ) -> Result<SelectId, StorageError>;

    /// Returns false if no select field has this label. Fails with
    /// `ReferentialIntegrity` while any form still binds it.
    fn delete_select_field(&mut self, label: &str) -> Result<bool, StorageError>;
}
