//! Translation of `sqlx` failures into [`CoreError`].

use enroll_core::error::CoreError;

/// Classify a database error.
///
/// | Cause                              | Result            |
/// |------------------------------------|-------------------|
/// | `RowNotFound`                      | `NotFound`        |
/// | unique violation (`23505`)         | `Conflict`        |
/// | foreign key violation (`23503`)    | `InvalidArgument` |
/// | anything else                      | `Internal`        |
pub fn db_error(entity: &'static str, err: sqlx::Error) -> CoreError {
    match err {
        sqlx::Error::RowNotFound => CoreError::NotFound {
            entity,
            id: "unknown".to_string(),
        },
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some("23505") => {
                let constraint = db_err.constraint().unwrap_or("unknown");
                CoreError::Conflict(format!(
                    "Duplicate {entity} violates unique constraint: {constraint}"
                ))
            }
            Some("23503") => {
                let constraint = db_err.constraint().unwrap_or("unknown");
                CoreError::InvalidArgument(format!(
                    "{entity} references a missing row ({constraint})"
                ))
            }
            _ => {
                tracing::error!(entity, error = %db_err, "Database error");
                CoreError::Internal("An internal database error occurred".to_string())
            }
        },
        other => {
            tracing::error!(entity, error = %other, "Database error");
            CoreError::Internal("An internal database error occurred".to_string())
        }
    }
}

/// Shorthand for `map_err(|e| db_error(entity, e))`.
pub(crate) trait DbResultExt<T> {
    fn for_entity(self, entity: &'static str) -> Result<T, CoreError>;
}

impl<T> DbResultExt<T> for Result<T, sqlx::Error> {
    fn for_entity(self, entity: &'static str) -> Result<T, CoreError> {
        self.map_err(|err| db_error(entity, err))
    }
}
