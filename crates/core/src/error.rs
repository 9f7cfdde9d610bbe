use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid {control}: {message}")]
    Validation { control: String, message: String },
}

impl CoreError {
    pub fn validation(control: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            control: control.into(),
            message: message.into(),
        }
    }

    /// Name of the input control the error should be reported next to.
    pub fn control(&self) -> &str {
        match self {
            Self::Validation { control, .. } => control,
        }
    }
}
