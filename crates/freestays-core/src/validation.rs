//! Validation utilities.

use crate::{FieldError, FreestaysError};
use validator::{Validate, ValidationErrors};

/// Extension trait for validation.
pub trait ValidateExt: Validate {
    /// Validates the struct and returns a `FreestaysError` on failure.
    fn validate_request(&self) -> Result<(), FreestaysError> {
        self.validate().map_err(validation_errors_to_freestays_error)
    }
}

impl<T: Validate> ValidateExt for T {}

/// Flattens `validator::ValidationErrors` into field errors.
#[must_use]
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| FieldError {
                field: (*field).to_string(),
                message: error
                    .message
                    .as_ref()
                    .map_or_else(|| error.code.to_string(), ToString::to_string),
                code: error.code.to_string(),
            })
        })
        .collect()
}

/// Converts `validator::ValidationErrors` to `FreestaysError`.
#[must_use]
pub fn validation_errors_to_freestays_error(errors: ValidationErrors) -> FreestaysError {
    let mut fields = field_errors(&errors);
    fields.sort_by(|a, b| a.field.cmp(&b.field));

    let message = fields
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ");

    FreestaysError::Validation(message)
}

/// Common validation functions.
pub mod rules {
    use validator::ValidationError;

    /// Validates that a string is not blank (not empty after trimming).
    pub fn not_blank(value: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::new("not_blank"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(range(min = 1, message = "At least one adult is required"))]
        adults: u32,
        #[validate(custom(function = "rules::not_blank"))]
        code: String,
    }

    #[test]
    fn test_valid_request_passes() {
        let sample = Sample {
            adults: 2,
            code: "PB-1".to_string(),
        };
        assert!(sample.validate_request().is_ok());
    }

    #[test]
    fn test_invalid_request_lists_fields() {
        let sample = Sample {
            adults: 0,
            code: "   ".to_string(),
        };
        let err = sample.validate_request().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("adults: At least one adult is required"));
        assert!(message.contains("code: not_blank"));
    }
}
