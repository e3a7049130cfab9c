//! Validation error types

/// Error information for a specific field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValidationError {
    /// The field that failed validation.
    pub field: String,
    /// Human-readable validation error message.
    pub message: String,
}

impl FieldValidationError {
    /// Creates a new field validation error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// A client-side check that failed before anything was submitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Validation failed for {} field(s)", .errors.len())]
pub struct ValidationError {
    /// Every field that failed, in descriptor order.
    pub errors: Vec<FieldValidationError>,
}

impl ValidationError {
    /// Creates a validation error from the failing fields.
    pub fn new(errors: Vec<FieldValidationError>) -> Self {
        Self { errors }
    }

    /// Returns the error for the given field, if it failed.
    pub fn field(&self, field: &str) -> Option<&FieldValidationError> {
        self.errors.iter().find(|e| e.field == field)
    }
}
