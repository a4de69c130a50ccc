//! Entities, DTOs, patch DTOs and filters for each table.

pub mod category;
pub mod course;
pub mod enrollment;
pub mod user;

use enroll_core::audit::AuditMetadata;
use sqlx::postgres::PgRow;
use sqlx::Row;

/// Read the four audit columns shared by audited tables and their `_aud` copies.
pub(crate) fn audit_from_row(row: &PgRow) -> Result<AuditMetadata, sqlx::Error> {
    Ok(AuditMetadata {
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        modified_by: row.try_get("modified_by")?,
        modified_at: row.try_get("modified_at")?,
    })
}

/// Case-insensitive substring match used by the `*_contains` filters.
pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
