use serde::{Deserialize, Serialize};

use crate::draft::Draft;
use crate::field_type::FieldType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticField {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub label: String,
}

/// A select field bound into a form under a per-form name. `label` is the
/// label of the shared select field, `choices` its options at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectBinding {
    pub label: String,
    pub choices: Vec<String>,
}

/// A stored form: the same field maps the editor drafts, plus the template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub fields: Draft,
    pub doc_form: Vec<u8>,
}
