//! Repository for the `courses` table and its `courses_aud` history.

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
use crate::models::course::{Course, CourseFilter};
use crate::DbPool;

const COLUMNS: &str = "id, title, description, category_code, max_enrollments, version, \
                       created_by, created_at, modified_by, modified_at";

pub struct PgCourseRepo {
    pool: DbPool,
}

impl PgCourseRepo {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, course: &Course, ctx: &AuditContext) -> Result<Course, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let query = format!(
            "INSERT INTO courses (title, description, category_code, max_enrollments, version, created_by, modified_by)
             VALUES ($1, $2, $3, $4, 1, $5, $5)
             RETURNING {COLUMNS}"
        );
        let saved = sqlx::query_as::<_, Course>(&query)
            .bind(&course.title)
            .bind(&course.description)
            .bind(&course.category_code)
            .bind(course.max_enrollments)
            .bind(ctx.author)
            .fetch_one(&mut *tx)
            .await?;
        audit(&mut tx, ctx, RevisionKind::Add, saved.id.unwrap_or_default()).await?;
        tx.commit().await?;
        Ok(saved)
    }

    async fn update(
        &self,
        id: DbId,
        course: &Course,
        ctx: &AuditContext,
    ) -> Result<Option<Course>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let query = format!(
            "UPDATE courses SET
                title = $3,
                description = $4,
                category_code = $5,
                max_enrollments = $6,
                version = version + 1,
                modified_by = $7,
                modified_at = NOW()
             WHERE id = $1 AND version = $2
             RETURNING {COLUMNS}"
        );
        let saved = sqlx::query_as::<_, Course>(&query)
            .bind(id)
            .bind(course.version)
            .bind(&course.title)
            .bind(&course.description)
            .bind(&course.category_code)
            .bind(course.max_enrollments)
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
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM courses WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
    }
}

/// Open a revision and copy the current row into `courses_aud`.
async fn audit(
    conn: &mut PgConnection,
    ctx: &AuditContext,
    kind: RevisionKind,
    id: DbId,
) -> Result<u64, sqlx::Error> {
    let rev = RevisionRepo::create(conn, ctx.author).await?;
    let query = format!(
        "INSERT INTO courses_aud (rev, revtype, {COLUMNS})
         SELECT $1, $2, {COLUMNS} FROM courses WHERE id = $3"
    );
    let result = sqlx::query(&query)
        .bind(rev)
        .bind(kind.code())
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &CourseFilter) {
    qb.push(" WHERE TRUE");
    if let Some(title) = &filter.title_contains {
        qb.push(" AND");
        push_contains(qb, "title", title);
    }
    if let Some(code) = &filter.category_code {
        qb.push(" AND category_code = ").push_bind(code.clone());
    }
}

#[async_trait]
impl Repository<Course> for PgCourseRepo {
    type Filter = CourseFilter;

    async fn find_by_id(&self, id: &DbId) -> Result<Option<Course>, CoreError> {
        let query = format!("SELECT {COLUMNS} FROM courses WHERE id = $1");
        sqlx::query_as::<_, Course>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .for_entity(Course::NAME)
    }

    async fn find_all(
        &self,
        filter: &CourseFilter,
        pageable: Pageable,
    ) -> Result<Page<Course>, CoreError> {
        let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM courses"));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY id");
        if let Pageable::Paged(request) = pageable {
            push_page(&mut qb, request);
        }

        let rows = qb
            .build_query_as::<Course>()
            .fetch_all(&self.pool)
            .await
            .for_entity(Course::NAME)?;

        match pageable {
            Pageable::Unpaged => Ok(Page::unpaged(rows)),
            Pageable::Paged(request) => {
                let total = self.count(filter).await?;
                Ok(Page::new(rows, total, request))
            }
        }
    }

    async fn count(&self, filter: &CourseFilter) -> Result<u64, CoreError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM courses");
        push_filter(&mut qb, filter);
        let total: i64 = qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .for_entity(Course::NAME)?;
        Ok(total as u64)
    }

    async fn save(&self, course: Course, ctx: &AuditContext) -> Result<Course, CoreError> {
        let Some(id) = course.id.filter(|_| !course.is_new()) else {
            let saved = self.insert(&course, ctx).await.for_entity(Course::NAME)?;
            tracing::debug!(course_id = ?saved.id, "Inserted course");
            return Ok(saved);
        };

        match self.update(id, &course, ctx).await.for_entity(Course::NAME)? {
            Some(saved) => Ok(saved),
            None if self.exists(id).await.for_entity(Course::NAME)? => {
                Err(CoreError::OptimisticConflict {
                    entity: Course::NAME,
                    id: id.to_string(),
                    version: course.version,
                })
            }
            None => Err(CoreError::not_found(Course::NAME, id)),
        }
    }

    /// The `DEL` snapshot is written before the row goes away, so the
    /// revision keeps the course's last state.
    async fn delete_by_id(&self, id: &DbId, ctx: &AuditContext) -> Result<bool, CoreError> {
        let mut tx = self.pool.begin().await.for_entity(Course::NAME)?;
        let snapshotted = audit(&mut tx, ctx, RevisionKind::Del, *id)
            .await
            .for_entity(Course::NAME)?;
        if snapshotted == 0 {
            return Ok(false);
        }
        sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .for_entity(Course::NAME)?;
        tx.commit().await.for_entity(Course::NAME)?;
        Ok(true)
    }
}

#[async_trait]
impl RevisionReader<Course> for PgCourseRepo {
    async fn revision_numbers(&self, id: &DbId) -> Result<Vec<RevisionNumber>, CoreError> {
        sqlx::query_scalar::<_, RevisionNumber>(
            "SELECT rev FROM courses_aud WHERE id = $1 ORDER BY rev",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .for_entity(Course::NAME)
    }

    async fn find_at_revision(
        &self,
        id: &DbId,
        number: RevisionNumber,
    ) -> Result<Option<(Course, RevisionKind)>, CoreError> {
        let query = format!(
            "SELECT rev, revtype, {COLUMNS} FROM courses_aud
             WHERE id = $1 AND rev <= $2
             ORDER BY rev DESC
             LIMIT 1"
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(number)
            .fetch_optional(&self.pool)
            .await
            .for_entity(Course::NAME)?;
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
