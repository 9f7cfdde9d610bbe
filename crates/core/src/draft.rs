use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::definition::{SelectBinding, StaticField};
use crate::error::CoreError;
use crate::field_type::FieldType;
use crate::validate::validate_field_name;

/// Field definitions being edited, in the order they were added.
///
/// Static fields and select bindings share one namespace: a name is present
/// in at most one of the two maps. Every mutation below keeps it that way by
/// evicting the other side's entry before inserting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    static_fields: IndexMap<String, StaticField>,
    select_fields: IndexMap<String, SelectBinding>,
}

impl Draft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a draft from maps read back from storage. Names are taken as
    /// stored, without validation; callers check `overlapping_names`.
    pub fn from_parts(
        static_fields: IndexMap<String, StaticField>,
        select_fields: IndexMap<String, SelectBinding>,
    ) -> Self {
        Self {
            static_fields,
            select_fields,
        }
    }

    pub fn static_fields(&self) -> &IndexMap<String, StaticField> {
        &self.static_fields
    }

    pub fn select_fields(&self) -> &IndexMap<String, SelectBinding> {
        &self.select_fields
    }

    pub fn is_empty(&self) -> bool {
        self.static_fields.is_empty() && self.select_fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.static_fields.len() + self.select_fields.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.static_fields.contains_key(name) || self.select_fields.contains_key(name)
    }

    /// Whether any binding refers to the select field with this label.
    pub fn uses_select(&self, select_label: &str) -> bool {
        self.select_fields
            .values()
            .any(|binding| binding.label == select_label)
    }

    /// Upsert a static field, replacing a select binding of the same name.
    pub fn add_static(
        &mut self,
        name: &str,
        field_type: FieldType,
        label: &str,
    ) -> Result<(), CoreError> {
        validate_field_name(name)?;
        self.select_fields.shift_remove(name);
        self.static_fields.insert(
            name.to_string(),
            StaticField {
                field_type,
                label: label.to_string(),
            },
        );
        Ok(())
    }

    /// Upsert a select binding, replacing a static field of the same name.
    pub fn add_select(
        &mut self,
        name: &str,
        select_label: &str,
        choices: Vec<String>,
    ) -> Result<(), CoreError> {
        validate_field_name(name)?;
        self.static_fields.shift_remove(name);
        self.select_fields.insert(
            name.to_string(),
            SelectBinding {
                label: select_label.to_string(),
                choices,
            },
        );
        Ok(())
    }

    /// Remove `name` from whichever map holds it. Returns whether it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        let removed_static = self.static_fields.shift_remove(name).is_some();
        let removed_select = self.select_fields.shift_remove(name).is_some();
        removed_static || removed_select
    }

    /// Names present in both maps. Always empty for drafts built through the
    /// methods above; deserialized drafts are checked with this before saving.
    pub fn overlapping_names(&self) -> Vec<&str> {
        self.static_fields
            .keys()
            .filter(|name| self.select_fields.contains_key(name.as_str()))
            .map(String::as_str)
            .collect()
    }

    pub fn check_disjoint(&self) -> Result<(), CoreError> {
        match self.overlapping_names().first() {
            None => Ok(()),
            Some(name) => Err(CoreError::validation(
                "field_name",
                format!("'{name}' is both a static field and a select field"),
            )),
        }
    }
}
