//! Category lookup table, keyed by a natural code.

use enroll_core::entity::{DeletePolicy, Entity};
use enroll_core::mapper::Dto;
use enroll_core::repository::Specification;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::contains_ignore_case;

/// A row from the `categories` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize)]
pub struct Category {
    pub code: String,
    pub name: String,
    pub version: i32,
}

impl Entity for Category {
    type Id = String;
    const NAME: &'static str = "Category";
    const DELETE_POLICY: DeletePolicy = DeletePolicy::Hard;

    /// The code is chosen by the caller, never generated.
    fn id(&self) -> Option<String> {
        (!self.code.is_empty()).then(|| self.code.clone())
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn set_version(&mut self, version: i32) {
        self.version = version;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CategoryDto {
    #[validate(required, length(min = 1, max = 32))]
    pub code: Option<String>,
    #[validate(required, length(min = 1, max = 100))]
    pub name: Option<String>,
    #[serde(default)]
    pub version: i32,
}

impl Dto for CategoryDto {
    type Id = String;

    fn set_id(&mut self, id: String) {
        self.code = Some(id);
    }
}

#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    pub name_contains: Option<String>,
}

impl Specification<Category> for CategoryFilter {
    fn is_satisfied_by(&self, category: &Category) -> bool {
        self.name_contains
            .as_deref()
            .map_or(true, |needle| contains_ignore_case(&category.name, needle))
    }
}
