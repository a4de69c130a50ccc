//! PostgreSQL repositories, one per table.
//!
//! Each write runs in a single transaction. For audited tables that
//! transaction also inserts the `revinfo` row and the `_aud` snapshot.

use enroll_core::pagination::PageRequest;
use sqlx::{Postgres, QueryBuilder};

pub mod category_repo;
pub mod course_repo;
pub mod enrollment_repo;
pub mod revision_repo;
pub mod user_repo;

pub use category_repo::PgCategoryRepo;
pub use course_repo::PgCourseRepo;
pub use enrollment_repo::PgEnrollmentRepo;
pub use revision_repo::RevisionRepo;
pub use user_repo::PgUserRepo;

/// Append `LIMIT`/`OFFSET` for `request`, saturating at `i64::MAX`.
pub(crate) fn push_page(qb: &mut QueryBuilder<'_, Postgres>, request: PageRequest) {
    let limit = i64::try_from(request.size).unwrap_or(i64::MAX);
    let offset = i64::try_from(request.offset()).unwrap_or(i64::MAX);
    qb.push(" LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
}

/// Append `<column> ILIKE` matching `needle` literally anywhere in the value.
pub(crate) fn push_contains(qb: &mut QueryBuilder<'_, Postgres>, column: &str, needle: &str) {
    qb.push(format!(" {column} ILIKE "))
        .push_bind(contains_pattern(needle))
        .push(" ESCAPE '\\'");
}

fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
