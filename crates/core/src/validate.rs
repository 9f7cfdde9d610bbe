//! Input checks for names and labels typed into the editors.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

/// Field names become form keys and template variables.
static FIELD_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-z_]\w*$").expect("field name pattern"));

/// Word characters, with inner spaces allowed.
static FORM_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w|\w[\w ]*\w)$").expect("form label pattern"));

/// Prefixes that would shadow keys the form machinery adds itself.
pub const RESERVED_PREFIXES: [&str; 2] = ["validator", "csrf_token"];

/// Key of the submit button on rendered forms.
pub const SUBMIT_KEY: &str = "submit";

pub fn validate_field_name(name: &str) -> Result<(), CoreError> {
    if name.is_empty() {
        return Err(CoreError::validation("field_name", "field name is required"));
    }
    if !FIELD_NAME.is_match(name) {
        return Err(CoreError::validation(
            "field_name",
            format!("'{name}' is not a valid identifier"),
        ));
    }
    let lowered = name.to_ascii_lowercase();
    if RESERVED_PREFIXES.iter().any(|p| lowered.starts_with(p)) || lowered == SUBMIT_KEY {
        return Err(CoreError::validation(
            "field_name",
            format!("'{name}' is reserved"),
        ));
    }
    Ok(())
}

pub fn validate_form_label(label: &str) -> Result<(), CoreError> {
    if !FORM_LABEL.is_match(label) {
        return Err(CoreError::validation(
            "form_label",
            format!("'{label}' is not a valid form label"),
        ));
    }
    Ok(())
}

/// Select labels share the editor's type picker with numeric type codes, so a
/// label made only of digits could never be chosen.
pub fn validate_select_label(label: &str) -> Result<(), CoreError> {
    if label.is_empty() {
        return Err(CoreError::validation("field_label", "select field label is required"));
    }
    if label.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoreError::validation(
            "field_label",
            "select field label cannot consist only of digits",
        ));
    }
    Ok(())
}

pub fn validate_choice(choice: &str) -> Result<(), CoreError> {
    if choice.is_empty() {
        return Err(CoreError::validation("choice_name", "choice must have a name"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_identifiers() {
        for name in ["name", "Name2", "_hidden", "favorite_color", "x"] {
            assert!(validate_field_name(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_malformed_identifiers() {
        for name in ["", "2fast", "with space", "dash-ed", "trailing ", "émoji!"] {
            assert!(validate_field_name(name).is_err(), "{name:?} should be rejected");
        }
    }

    #[test]
    fn rejects_reserved_names() {
        for name in ["validator", "Validators", "csrf_token", "csrf_token2", "submit", "SUBMIT"] {
            let err = validate_field_name(name).unwrap_err();
            assert_eq!(err.control(), "field_name");
        }
        assert!(validate_field_name("submitted").is_ok());
    }

    #[test]
    fn form_labels_allow_inner_spaces_only() {
        assert!(validate_form_label("Survey").is_ok());
        assert!(validate_form_label("Annual survey 2024").is_ok());
        assert!(validate_form_label("Анкета").is_ok());
        assert!(validate_form_label(" Survey").is_err());
        assert!(validate_form_label("Survey ").is_err());
        assert!(validate_form_label("").is_err());
    }

    #[test]
    fn select_labels_cannot_be_numeric() {
        assert!(validate_select_label("Color").is_ok());
        assert!(validate_select_label("Top 10").is_ok());
        assert!(validate_select_label("10").is_err());
        assert!(validate_select_label("").is_err());
    }
}
