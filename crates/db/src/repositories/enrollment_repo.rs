//! Repository for the `enrollments` table.

use async_trait::async_trait;
use enroll_core::audit::AuditContext;
use enroll_core::entity::Entity;
use enroll_core::error::CoreError;
use enroll_core::pagination::{Page, Pageable};
use enroll_core::repository::Repository;
use sqlx::{Postgres, QueryBuilder};

use super::push_page;
use crate::error::DbResultExt;
use crate::models::enrollment::{Enrollment, EnrollmentFilter, EnrollmentId};
use crate::DbPool;

const COLUMNS: &str = "user_id, course_id, status, grade, deleted, version, created_at";

pub struct PgEnrollmentRepo {
    pool: DbPool,
}

impl PgEnrollmentRepo {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &EnrollmentFilter) {
    qb.push(" WHERE TRUE");
    if !filter.include_deleted {
        qb.push(" AND deleted = FALSE");
    }
    if let Some(user_id) = filter.user_id {
        qb.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(course_id) = filter.course_id {
        qb.push(" AND course_id = ").push_bind(course_id);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
}

#[async_trait]
impl Repository<Enrollment> for PgEnrollmentRepo {
    type Filter = EnrollmentFilter;

    async fn find_by_id(&self, id: &EnrollmentId) -> Result<Option<Enrollment>, CoreError> {
        let query =
            format!("SELECT {COLUMNS} FROM enrollments WHERE user_id = $1 AND course_id = $2");
        sqlx::query_as::<_, Enrollment>(&query)
            .bind(id.user_id)
            .bind(id.course_id)
            .fetch_optional(&self.pool)
            .await
            .for_entity(Enrollment::NAME)
    }

    async fn find_all(
        &self,
        filter: &EnrollmentFilter,
        pageable: Pageable,
    ) -> Result<Page<Enrollment>, CoreError> {
        let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM enrollments"));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY user_id, course_id");
        if let Pageable::Paged(request) = pageable {
            push_page(&mut qb, request);
        }
        let rows = qb
            .build_query_as::<Enrollment>()
            .fetch_all(&self.pool)
            .await
            .for_entity(Enrollment::NAME)?;

        match pageable {
            Pageable::Unpaged => Ok(Page::unpaged(rows)),
            Pageable::Paged(request) => Ok(Page::new(rows, self.count(filter).await?, request)),
        }
    }

    async fn count(&self, filter: &EnrollmentFilter) -> Result<u64, CoreError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM enrollments");
        push_filter(&mut qb, filter);
        let total: i64 = qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .for_entity(Enrollment::NAME)?;
        Ok(total as u64)
    }

    async fn save(&self, enrollment: Enrollment, _ctx: &AuditContext) -> Result<Enrollment, CoreError> {
        if enrollment.is_new() {
            let query = format!(
                "INSERT INTO enrollments (user_id, course_id, status, grade, deleted, version)
                 VALUES ($1, $2, $3, $4, $5, 1)
                 RETURNING {COLUMNS}"
            );
            return sqlx::query_as::<_, Enrollment>(&query)
                .bind(enrollment.user_id)
                .bind(enrollment.course_id)
                .bind(enrollment.status)
                .bind(enrollment.grade)
                .bind(enrollment.deleted)
                .fetch_one(&self.pool)
                .await
                .for_entity(Enrollment::NAME);
        }

        let query = format!(
            "UPDATE enrollments SET
                status = $4,
                grade = $5,
                deleted = $6,
                version = version + 1
             WHERE user_id = $1 AND course_id = $2 AND version = $3
             RETURNING {COLUMNS}"
        );
        let saved = sqlx::query_as::<_, Enrollment>(&query)
            .bind(enrollment.user_id)
            .bind(enrollment.course_id)
            .bind(enrollment.version)
            .bind(enrollment.status)
            .bind(enrollment.grade)
            .bind(enrollment.deleted)
            .fetch_optional(&self.pool)
            .await
            .for_entity(Enrollment::NAME)?;

        let key = enrollment.key();
        match saved {
            Some(saved) => Ok(saved),
            None if self.exists_by_id(&key).await? => Err(CoreError::OptimisticConflict {
                entity: Enrollment::NAME,
                id: key.to_string(),
                version: enrollment.version,
            }),
            None => Err(CoreError::not_found(Enrollment::NAME, key)),
        }
    }

    async fn delete_by_id(&self, id: &EnrollmentId, _ctx: &AuditContext) -> Result<bool, CoreError> {
        let result = sqlx::query("DELETE FROM enrollments WHERE user_id = $1 AND course_id = $2")
            .bind(id.user_id)
            .bind(id.course_id)
            .execute(&self.pool)
            .await
            .for_entity(Enrollment::NAME)?;
        Ok(result.rows_affected() > 0)
    }
}
