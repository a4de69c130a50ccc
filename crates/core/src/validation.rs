//! DTO constraint checking on top of the `validator` crate.
//!
//! `validator` already evaluates every rule on every field; this module
//! flattens its nested error tree into a sorted list of
//! [`FieldViolation`]s so callers see all problems at once.

use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::error::{CoreError, FieldViolation, ValidationFailure};

/// Validate `dto`, reporting every violated rule as a [`CoreError::Validation`].
pub fn validate<T: Validate>(dto: &T) -> Result<(), CoreError> {
    dto.validate()
        .map_err(|errors| CoreError::Validation(collect_violations(&errors)))
}

/// Flatten nested `validator` errors into dotted field paths
/// (`address.city`, `tags[2]`).
pub fn collect_violations(errors: &ValidationErrors) -> ValidationFailure {
    let mut out = Vec::new();
    flatten(errors, "", &mut out);
    ValidationFailure::new(out)
}

fn flatten(errors: &ValidationErrors, prefix: &str, out: &mut Vec<FieldViolation>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                out.extend(field_errors.iter().map(|e| FieldViolation {
                    field: path.clone(),
                    code: e.code.to_string(),
                    message: message_for(e),
                }));
            }
            ValidationErrorsKind::Struct(nested) => flatten(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    flatten(nested, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}

fn message_for(error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }
    let param = |name: &str| error.params.get(name).map(|v| v.to_string());
    match error.code.as_ref() {
        "required" => "must not be null".to_string(),
        "email" => "must be a well-formed email address".to_string(),
        "length" => match (param("min"), param("max"), param("equal")) {
            (_, _, Some(eq)) => format!("length must be {eq}"),
            (Some(min), Some(max), _) => format!("length must be between {min} and {max}"),
            (Some(min), None, _) => format!("length must be at least {min}"),
            (None, Some(max), _) => format!("length must be at most {max}"),
            _ => "invalid length".to_string(),
        },
        "range" => match (param("min"), param("max")) {
            (Some(min), Some(max)) => format!("must be between {min} and {max}"),
            (Some(min), None) => format!("must be greater than or equal to {min}"),
            (None, Some(max)) => format!("must be less than or equal to {max}"),
            _ => "out of range".to_string(),
        },
        other => format!("failed '{other}' constraint"),
    }
}
