//! Repository for the `categories` table.

use async_trait::async_trait;
use enroll_core::audit::AuditContext;
use enroll_core::entity::Entity;
use enroll_core::error::CoreError;
use enroll_core::pagination::{Page, Pageable};
use enroll_core::repository::Repository;
use sqlx::{Postgres, QueryBuilder};

use super::{push_contains, push_page};
use crate::error::DbResultExt;
use crate::models::category::{Category, CategoryFilter};
use crate::DbPool;

const COLUMNS: &str = "code, name, version";

pub struct PgCategoryRepo {
    pool: DbPool,
}

impl PgCategoryRepo {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &CategoryFilter) {
    if let Some(name) = &filter.name_contains {
        qb.push(" WHERE");
        push_contains(qb, "name", name);
    }
}

#[async_trait]
impl Repository<Category> for PgCategoryRepo {
    type Filter = CategoryFilter;

    async fn find_by_id(&self, code: &String) -> Result<Option<Category>, CoreError> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE code = $1");
        sqlx::query_as::<_, Category>(&query)
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .for_entity(Category::NAME)
    }

    async fn find_all(
        &self,
        filter: &CategoryFilter,
        pageable: Pageable,
    ) -> Result<Page<Category>, CoreError> {
        let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM categories"));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY code COLLATE \"C\"");
        if let Pageable::Paged(request) = pageable {
            push_page(&mut qb, request);
        }
        let rows = qb
            .build_query_as::<Category>()
            .fetch_all(&self.pool)
            .await
            .for_entity(Category::NAME)?;

        match pageable {
            Pageable::Unpaged => Ok(Page::unpaged(rows)),
            Pageable::Paged(request) => Ok(Page::new(rows, self.count(filter).await?, request)),
        }
    }

    async fn count(&self, filter: &CategoryFilter) -> Result<u64, CoreError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM categories");
        push_filter(&mut qb, filter);
        let total: i64 = qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .for_entity(Category::NAME)?;
        Ok(total as u64)
    }

    async fn save(&self, category: Category, _ctx: &AuditContext) -> Result<Category, CoreError> {
        if category.is_new() {
            let query = format!(
                "INSERT INTO categories (code, name, version) VALUES ($1, $2, 1) RETURNING {COLUMNS}"
            );
            return sqlx::query_as::<_, Category>(&query)
                .bind(&category.code)
                .bind(&category.name)
                .fetch_one(&self.pool)
                .await
                .for_entity(Category::NAME);
        }

        let query = format!(
            "UPDATE categories SET name = $3, version = version + 1
             WHERE code = $1 AND version = $2
             RETURNING {COLUMNS}"
        );
        let saved = sqlx::query_as::<_, Category>(&query)
            .bind(&category.code)
            .bind(category.version)
            .bind(&category.name)
            .fetch_optional(&self.pool)
            .await
            .for_entity(Category::NAME)?;

        match saved {
            Some(saved) => Ok(saved),
            None if self.exists_by_id(&category.code).await? => Err(CoreError::OptimisticConflict {
                entity: Category::NAME,
                id: category.code,
                version: category.version,
            }),
            None => Err(CoreError::not_found(Category::NAME, &category.code)),
        }
    }

    async fn delete_by_id(&self, code: &String, _ctx: &AuditContext) -> Result<bool, CoreError> {
        let result = sqlx::query("DELETE FROM categories WHERE code = $1")
            .bind(code)
            .execute(&self.pool)
            .await
            .for_entity(Category::NAME)?;
        Ok(result.rows_affected() > 0)
    }
}
