//! Repository for the `revinfo` table and `_aud` snapshot decoding.

use enroll_core::error::CoreError;
use enroll_core::revision::{RevisionKind, RevisionMetadata};
use enroll_core::types::{DbId, RevisionNumber, Timestamp};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgConnection, PgPool, Row};

#[derive(Debug, FromRow)]
struct RevInfoRow {
    rev: RevisionNumber,
    rev_timestamp: Timestamp,
    author: Option<DbId>,
}

impl From<RevInfoRow> for RevisionMetadata {
    fn from(row: RevInfoRow) -> Self {
        RevisionMetadata {
            number: row.rev,
            timestamp: row.rev_timestamp,
            author: row.author,
        }
    }
}

pub struct RevisionRepo;

impl RevisionRepo {
    /// Open a new revision inside the caller's transaction.
    pub async fn create(
        conn: &mut PgConnection,
        author: Option<DbId>,
    ) -> Result<RevisionNumber, sqlx::Error> {
        sqlx::query_scalar::<_, RevisionNumber>("INSERT INTO revinfo (author) VALUES ($1) RETURNING rev")
            .bind(author)
            .fetch_one(conn)
            .await
    }

    pub async fn find(
        pool: &PgPool,
        number: RevisionNumber,
    ) -> Result<Option<RevisionMetadata>, sqlx::Error> {
        let row = sqlx::query_as::<_, RevInfoRow>(
            "SELECT rev, rev_timestamp, author FROM revinfo WHERE rev = $1",
        )
        .bind(number)
        .fetch_optional(pool)
        .await?;
        Ok(row.map(RevisionMetadata::from))
    }
}

/// Decode the newest `_aud` row at or before `number`.
///
/// A deletion older than `number` means the entity no longer existed at
/// that revision.
pub(crate) fn snapshot_from_row<E>(
    row: Option<PgRow>,
    number: RevisionNumber,
) -> Result<Option<(E, RevisionKind)>, CoreError>
where
    E: for<'r> FromRow<'r, PgRow>,
{
    let Some(row) = row else {
        return Ok(None);
    };
    let decode = |err: sqlx::Error| CoreError::Internal(format!("Corrupt audit row: {err}"));

    let rev: RevisionNumber = row.try_get("rev").map_err(decode)?;
    let code: i16 = row.try_get("revtype").map_err(decode)?;
    let kind = RevisionKind::from_code(code)
        .ok_or_else(|| CoreError::Internal(format!("Unknown revision type {code}")))?;

    if kind == RevisionKind::Del && rev < number {
        return Ok(None);
    }
    Ok(Some((E::from_row(&row).map_err(decode)?, kind)))
}
