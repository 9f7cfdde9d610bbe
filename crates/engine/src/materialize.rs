//! Turning field definitions into renderable, validatable form instances.
//!
//! A [`FieldRegistry`] maps each static field type to a [`FieldTemplate`].
//! Templates that carry a type tag are *composite*: one logical field becomes
//! two inputs, `{name}-source` holding the content and a hidden
//! `{name}-__type` holding the tag, so the submission can be regrouped by
//! prefix (see [`crate::submission::regroup`]).

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;

use formforge_core::{Draft, FieldType};

use crate::submission::{Submission, SubmittedValue};

/// Joins a composite field's name and sub-key in form keys.
pub const KEY_SEPARATOR: char = '-';
pub const SOURCE_SUBKEY: &str = "source";
pub const TYPE_SUBKEY: &str = "__type";

/// Tag of composite fields whose source is an uploaded image.
pub const IMAGE_TAG: &str = "image";
pub const HTML_TAG: &str = "html";

pub fn composite_key(name: &str, subkey: &str) -> String {
    format!("{name}{KEY_SEPARATOR}{subkey}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Widget {
    Checkbox,
    Text,
    TextArea,
    File { accept: Vec<String> },
    Hidden { value: String },
    Select { choices: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub label: String,
    pub widget: Widget,
    pub required: bool,
}

#[derive(Debug, Clone)]
pub struct FieldTemplate {
    widget: Widget,
    required: bool,
    type_tag: Option<String>,
}

impl FieldTemplate {
    pub fn new(widget: Widget, required: bool) -> Self {
        Self {
            widget,
            required,
            type_tag: None,
        }
    }

    /// Make this a composite template emitting a hidden `__type` sibling.
    pub fn composite(mut self, type_tag: impl Into<String>) -> Self {
        self.type_tag = Some(type_tag.into());
        self
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn type_tag(&self) -> Option<&str> {
        self.type_tag.as_deref()
    }

    fn instantiate(&self, label: &str, choices: Option<&[String]>) -> FieldSpec {
        let widget = match &self.widget {
            Widget::Select { .. } => Widget::Select {
                choices: choices.map(<[String]>::to_vec).unwrap_or_default(),
            },
            other => other.clone(),
        };
        FieldSpec {
            label: label.to_string(),
            widget,
            required: self.required,
        }
    }
}

/// Constructors for each static field type, plus the default used for select
/// bindings and for type codes nothing is registered under.
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    entries: HashMap<FieldType, FieldTemplate>,
    default: FieldTemplate,
}

impl FieldRegistry {
    pub fn new(default: FieldTemplate) -> Self {
        Self {
            entries: HashMap::new(),
            default,
        }
    }

    pub fn register(mut self, field_type: FieldType, template: FieldTemplate) -> Self {
        self.entries.insert(field_type, template);
        self
    }

    pub fn get(&self, field_type: FieldType) -> &FieldTemplate {
        self.entries.get(&field_type).unwrap_or(&self.default)
    }

    pub fn default_template(&self) -> &FieldTemplate {
        &self.default
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::new(FieldTemplate::new(Widget::Select { choices: Vec::new() }, true))
            .register(FieldType::Bool, FieldTemplate::new(Widget::Checkbox, false))
            .register(FieldType::Text, FieldTemplate::new(Widget::Text, true))
            .register(
                FieldType::TextArea,
                FieldTemplate::new(Widget::TextArea, true).composite(HTML_TAG),
            )
            .register(
                FieldType::File,
                FieldTemplate::new(
                    Widget::File {
                        accept: vec!["png".to_string(), "jpg".to_string()],
                    },
                    true,
                )
                .composite(IMAGE_TAG),
            )
    }
}

/// A field that failed validation, keyed by its form key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub key: String,
    pub message: String,
}

/// Materialized form: form key to input spec, in definition order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormInstance {
    fields: IndexMap<String, FieldSpec>,
}

impl FormInstance {
    pub fn fields(&self) -> &IndexMap<String, FieldSpec> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check a submission against every field. Keys the form does not know
    /// about are ignored.
    pub fn validate(&self, submission: &Submission) -> Result<(), Vec<FieldError>> {
        let errors: Vec<FieldError> = self
            .fields
            .iter()
            .filter_map(|(key, spec)| {
                check_field(spec, submission.get(key)).map(|message| FieldError {
                    key: key.clone(),
                    message,
                })
            })
            .collect();

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

fn check_field(spec: &FieldSpec, value: Option<&SubmittedValue>) -> Option<String> {
    match (&spec.widget, value) {
        (Widget::Checkbox, _) => None,
        (Widget::Hidden { value: expected }, Some(SubmittedValue::Text(actual)))
            if actual == expected =>
        {
            None
        }
        (Widget::Hidden { .. }, _) => Some("unexpected field type".to_string()),
        (Widget::Select { choices }, Some(SubmittedValue::Text(choice))) => {
            if choices.iter().any(|c| c == choice) {
                None
            } else {
                Some(format!("'{choice}' is not a valid choice"))
            }
        }
        (Widget::File { accept }, Some(SubmittedValue::File(file))) => {
            if file.bytes.is_empty() {
                return spec.required.then(|| "this field is required".to_string());
            }
            let allowed = file
                .extension()
                .is_some_and(|ext| accept.iter().any(|a| a.eq_ignore_ascii_case(ext)));
            if allowed {
                None
            } else {
                Some(format!("file must be one of: {}", accept.join(", ")))
            }
        }
        (Widget::Text | Widget::TextArea, Some(SubmittedValue::Text(text))) if !text.is_empty() => {
            None
        }
        _ => spec.required.then(|| "this field is required".to_string()),
    }
}

/// Materialize a field set. Pure: safe to call on every request, and the
/// inputs are left untouched.
pub fn generate_fields(fields: &Draft, registry: &FieldRegistry) -> FormInstance {
    let mut instance = FormInstance::default();

    for (name, field) in fields.static_fields() {
        let template = registry.get(field.field_type);
        match template.type_tag() {
            Some(tag) => {
                instance.fields.insert(
                    composite_key(name, SOURCE_SUBKEY),
                    template.instantiate(&field.label, None),
                );
                instance.fields.insert(
                    composite_key(name, TYPE_SUBKEY),
                    FieldSpec {
                        label: String::new(),
                        widget: Widget::Hidden {
                            value: tag.to_string(),
                        },
                        required: false,
                    },
                );
            }
            None => {
                instance
                    .fields
                    .insert(name.clone(), template.instantiate(&field.label, None));
            }
        }
    }

    let select = registry.default_template();
    for (name, binding) in fields.select_fields() {
        instance.fields.insert(
            name.clone(),
            select.instantiate(&binding.label, Some(&binding.choices)),
        );
    }

    instance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submission::UploadedFile;

    fn colors() -> Vec<String> {
        vec!["Red".to_string(), "Blue".to_string()]
    }

    fn survey() -> Draft {
        let mut draft = Draft::new();
        draft.add_static("name", FieldType::Text, "Name").unwrap();
        draft.add_static("agree", FieldType::Bool, "I agree").unwrap();
        draft.add_select("favorite", "Color", colors()).unwrap();
        draft
    }

    #[test]
    fn simple_fields_keep_their_names() {
        let instance = generate_fields(&survey(), &FieldRegistry::default());

        let keys: Vec<_> = instance.keys().collect();
        assert_eq!(keys, vec!["name", "agree", "favorite"]);
        assert_eq!(instance.get("name").unwrap().widget, Widget::Text);
        assert!(!instance.get("agree").unwrap().required);
        assert_eq!(
            instance.get("favorite").unwrap().widget,
            Widget::Select { choices: colors() }
        );
        assert_eq!(instance.get("favorite").unwrap().label, "Color");
    }

    #[test]
    fn composite_fields_expand_into_siblings() {
        let mut draft = Draft::new();
        draft.add_static("photo", FieldType::File, "Photo").unwrap();
        draft.add_static("body", FieldType::TextArea, "Body").unwrap();
        let instance = generate_fields(&draft, &FieldRegistry::default());

        let keys: Vec<_> = instance.keys().collect();
        assert_eq!(
            keys,
            vec!["photo-source", "photo-__type", "body-source", "body-__type"]
        );
        assert_eq!(
            instance.get("photo-__type").unwrap().widget,
            Widget::Hidden {
                value: IMAGE_TAG.to_string()
            }
        );
        assert_eq!(instance.get("photo-source").unwrap().label, "Photo");
        assert_eq!(
            instance.get("body-__type").unwrap().widget,
            Widget::Hidden {
                value: HTML_TAG.to_string()
            }
        );
    }

    #[test]
    fn unknown_type_falls_back_to_default() {
        let mut draft = Draft::new();
        draft.add_static("legacy", FieldType::Unknown(99), "Legacy").unwrap();
        let instance = generate_fields(&draft, &FieldRegistry::default());

        assert_eq!(
            instance.get("legacy").unwrap().widget,
            Widget::Select { choices: vec![] }
        );
    }

    #[test]
    fn generation_does_not_touch_input() {
        let draft = survey();
        let before = draft.clone();
        let first = generate_fields(&draft, &FieldRegistry::default());
        let second = generate_fields(&draft, &FieldRegistry::default());
        assert_eq!(draft, before);
        assert_eq!(first, second);
    }

    #[test]
    fn validate_reports_each_bad_field() {
        let instance = generate_fields(&survey(), &FieldRegistry::default());
        let submission = Submission::new().text("favorite", "Green");

        let errors = instance.validate(&submission).unwrap_err();
        let keys: Vec<_> = errors.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["name", "favorite"]);
    }

    #[test]
    fn validate_accepts_complete_submission() {
        let instance = generate_fields(&survey(), &FieldRegistry::default());
        let submission = Submission::new()
            .text("name", "Alice")
            .text("favorite", "Red")
            .text("csrf_token", "ignored");
        assert!(instance.validate(&submission).is_ok());
    }

    #[test]
    fn validate_checks_file_extension_and_type_tag() {
        let mut draft = Draft::new();
        draft.add_static("photo", FieldType::File, "Photo").unwrap();
        let instance = generate_fields(&draft, &FieldRegistry::default());

        let wrong_ext = Submission::new()
            .file("photo-source", UploadedFile::new("notes.txt", b"abc".to_vec()))
            .text("photo-__type", "image");
        let errors = instance.validate(&wrong_ext).unwrap_err();
        assert_eq!(errors[0].key, "photo-source");

        let wrong_tag = Submission::new()
            .file("photo-source", UploadedFile::new("me.PNG", b"abc".to_vec()))
            .text("photo-__type", "html");
        let errors = instance.validate(&wrong_tag).unwrap_err();
        assert_eq!(errors[0].key, "photo-__type");

        let ok = Submission::new()
            .file("photo-source", UploadedFile::new("me.PNG", b"abc".to_vec()))
            .text("photo-__type", "image");
        assert!(instance.validate(&ok).is_ok());
    }
}
