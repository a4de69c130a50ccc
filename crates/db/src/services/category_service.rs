use std::ops::Deref;
use std::sync::Arc;

use enroll_core::error::CoreError;
use enroll_core::repository::Repository;
use enroll_core::service::CrudService;

use crate::mappers::CategoryMapper;
use crate::models::category::{Category, CategoryDto, CategoryFilter};

/// Categories are created and replaced whole; they have no patch form.
pub struct CategoryService<R> {
    crud: CrudService<Category, R, CategoryMapper>,
}

impl<R> Clone for CategoryService<R> {
    fn clone(&self) -> Self {
        Self {
            crud: self.crud.clone(),
        }
    }
}

impl<R> Deref for CategoryService<R> {
    type Target = CrudService<Category, R, CategoryMapper>;

    fn deref(&self) -> &Self::Target {
        &self.crud
    }
}

impl<R> CategoryService<R>
where
    R: Repository<Category, Filter = CategoryFilter>,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            crud: CrudService::new(repository, CategoryMapper),
        }
    }

    /// Every category, ordered by code.
    pub async fn find_all(&self) -> Result<Vec<CategoryDto>, CoreError> {
        self.crud
            .find_all_by_specification(&CategoryFilter::default())
            .await
    }
}
