//! Repository for the `users` table and its `users_aud` history.

use async_trait::async_trait;
use enroll_core::audit::AuditContext;
use enroll_core::entity::Entity;
use enroll_core::error::CoreError;
use enroll_core::pagination::{Page, Pageable};
use enroll_core::repository::Repository;
use enroll_core::revision::{RevisionKind, RevisionMetadata, RevisionReader};
use enroll_core::types::{DbId, RevisionNumber};
use sqlx::{PgConnection, Postgres, QueryBuilder};

use super::revision_repo::{snapshot_from_row, RevisionRepo};
use super::{push_contains, push_page};
use crate::error::DbResultExt;
use crate::models::user::{User, UserFilter};
use crate::DbPool;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, external_id, name, email, deleted, version, \
                       created_by, created_at, modified_by, modified_at";

pub struct PgUserRepo {
    pool: DbPool,
}

impl PgUserRepo {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, user: &User, ctx: &AuditContext) -> Result<User, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let query = format!(
            "INSERT INTO users (external_id, name, email, deleted, version, created_by, modified_by)
             VALUES ($1, $2, $3, $4, 1, $5, $5)
             RETURNING {COLUMNS}"
        );
        let saved = sqlx::query_as::<_, User>(&query)
            .bind(&user.external_id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.deleted)
            .bind(ctx.author)
            .fetch_one(&mut *tx)
            .await?;
        let id = saved.id.unwrap_or_default();
        audit(&mut tx, ctx, RevisionKind::Add, id).await?;
        tx.commit().await?;
        Ok(saved)
    }

    /// Versioned update. `None` when no row matched `(id, version)`.
    async fn update(
        &self,
        id: DbId,
        user: &User,
        ctx: &AuditContext,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let query = format!(
            "UPDATE users SET
                external_id = $3,
                name = $4,
                email = $5,
                deleted = $6,
                version = version + 1,
                modified_by = $7,
                modified_at = NOW()
             WHERE id = $1 AND version = $2
             RETURNING {COLUMNS}"
        );
        let saved = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(user.version)
            .bind(&user.external_id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.deleted)
            .bind(ctx.author)
            .fetch_optional(&mut *tx)
            .await?;
        if saved.is_some() {
            audit(&mut tx, ctx, RevisionKind::Mod, id).await?;
            tx.commit().await?;
        }
        Ok(saved)
    }

    async fn exists(&self, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
    }
}

/// Open a revision and copy the current row into `users_aud`.
async fn audit(
    conn: &mut PgConnection,
    ctx: &AuditContext,
    kind: RevisionKind,
    id: DbId,
) -> Result<RevisionNumber, sqlx::Error> {
    let rev = RevisionRepo::create(conn, ctx.author).await?;
    let query = format!(
        "INSERT INTO users_aud (rev, revtype, {COLUMNS})
         SELECT $1, $2, {COLUMNS} FROM users WHERE id = $3"
    );
    sqlx::query(&query)
        .bind(rev)
        .bind(kind.code())
        .bind(id)
        .execute(conn)
        .await?;
    Ok(rev)
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    qb.push(" WHERE TRUE");
    if !filter.include_deleted {
        qb.push(" AND deleted = FALSE");
    }
    if let Some(name) = &filter.name_contains {
        qb.push(" AND");
        push_contains(qb, "name", name);
    }
    if let Some(external_id) = &filter.external_id {
        qb.push(" AND external_id = ").push_bind(external_id.clone());
    }
}

#[async_trait]
impl Repository<User> for PgUserRepo {
    type Filter = UserFilter;

    async fn find_by_id(&self, id: &DbId) -> Result<Option<User>, CoreError> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .for_entity(User::NAME)
    }

    async fn find_all(&self, filter: &UserFilter, pageable: Pageable) -> Result<Page<User>, CoreError> {
        let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM users"));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY id");

        match pageable {
            Pageable::Unpaged => {
                let rows = qb
                    .build_query_as::<User>()
                    .fetch_all(&self.pool)
                    .await
                    .for_entity(User::NAME)?;
                Ok(Page::unpaged(rows))
            }
            Pageable::Paged(request) => {
                push_page(&mut qb, request);
                let rows = qb
                    .build_query_as::<User>()
                    .fetch_all(&self.pool)
                    .await
                    .for_entity(User::NAME)?;
                let total = self.count(filter).await?;
                Ok(Page::new(rows, total, request))
            }
        }
    }

    async fn count(&self, filter: &UserFilter) -> Result<u64, CoreError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM users");
        push_filter(&mut qb, filter);
        let total: i64 = qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .for_entity(User::NAME)?;
        Ok(total as u64)
    }

    async fn save(&self, user: User, ctx: &AuditContext) -> Result<User, CoreError> {
        let Some(id) = user.id.filter(|_| !user.is_new()) else {
            let saved = self.insert(&user, ctx).await.for_entity(User::NAME)?;
            tracing::debug!(user_id = ?saved.id, "Inserted user");
            return Ok(saved);
        };

        match self.update(id, &user, ctx).await.for_entity(User::NAME)? {
            Some(saved) => Ok(saved),
            None if self.exists(id).await.for_entity(User::NAME)? => {
                Err(CoreError::OptimisticConflict {
                    entity: User::NAME,
                    id: id.to_string(),
                    version: user.version,
                })
            }
            None => Err(CoreError::not_found(User::NAME, id)),
        }
    }

    async fn delete_by_id(&self, id: &DbId, ctx: &AuditContext) -> Result<bool, CoreError> {
        let mut tx = self.pool.begin().await.for_entity(User::NAME)?;
        audit(&mut tx, ctx, RevisionKind::Del, *id)
            .await
            .for_entity(User::NAME)?;
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .for_entity(User::NAME)?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }
        tx.commit().await.for_entity(User::NAME)?;
        Ok(true)
    }
}

#[async_trait]
impl RevisionReader<User> for PgUserRepo {
    async fn revision_numbers(&self, id: &DbId) -> Result<Vec<RevisionNumber>, CoreError> {
        sqlx::query_scalar::<_, RevisionNumber>("SELECT rev FROM users_aud WHERE id = $1 ORDER BY rev")
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .for_entity(User::NAME)
    }

    async fn find_at_revision(
        &self,
        id: &DbId,
        number: RevisionNumber,
    ) -> Result<Option<(User, RevisionKind)>, CoreError> {
        let query = format!(
            "SELECT rev, revtype, {COLUMNS} FROM users_aud
             WHERE id = $1 AND rev <= $2
             ORDER BY rev DESC
             LIMIT 1"
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(number)
            .fetch_optional(&self.pool)
            .await
            .for_entity(User::NAME)?;
        snapshot_from_row(row, number)
    }

    async fn revision_metadata(
        &self,
        number: RevisionNumber,
    ) -> Result<Option<RevisionMetadata>, CoreError> {
        RevisionRepo::find(&self.pool, number)
            .await
            .for_entity("Revision")
    }
}
