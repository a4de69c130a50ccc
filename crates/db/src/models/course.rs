//! Course entity model and DTOs.

use enroll_core::audit::AuditMetadata;
use enroll_core::entity::{DeletePolicy, Entity};
use enroll_core::mapper::Dto;
use enroll_core::patch::Patch;
use enroll_core::repository::Specification;
use enroll_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use validator::Validate;

use super::{audit_from_row, contains_ignore_case};

/// A row from the `courses` table (or a snapshot from `courses_aud`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Course {
    pub id: Option<DbId>,
    pub title: String,
    pub description: Option<String>,
    /// Foreign key into `categories.code`.
    pub category_code: Option<String>,
    pub max_enrollments: i32,
    pub version: i32,
    #[serde(flatten)]
    pub audit: AuditMetadata,
}

impl<'r> FromRow<'r, PgRow> for Course {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: Some(row.try_get("id")?),
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            category_code: row.try_get("category_code")?,
            max_enrollments: row.try_get("max_enrollments")?,
            version: row.try_get("version")?,
            audit: audit_from_row(row)?,
        })
    }
}

impl Entity for Course {
    type Id = DbId;
    const NAME: &'static str = "Course";
    const DELETE_POLICY: DeletePolicy = DeletePolicy::Hard;

    fn id(&self) -> Option<DbId> {
        self.id
    }

    fn assign_id(&mut self, id: DbId) {
        self.id = Some(id);
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn set_version(&mut self, version: i32) {
        self.version = version;
    }

    fn audit_metadata_mut(&mut self) -> Option<&mut AuditMetadata> {
        Some(&mut self.audit)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct CourseDto {
    #[serde(default)]
    pub id: Option<DbId>,
    #[validate(required, length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 32))]
    pub category_code: Option<String>,
    #[validate(required, range(min = 1, max = 1000))]
    pub max_enrollments: Option<i32>,
    #[serde(default)]
    pub version: i32,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub modified_at: Option<Timestamp>,
}

impl Dto for CourseDto {
    type Id = DbId;

    fn set_id(&mut self, id: DbId) {
        self.id = Some(id);
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CoursePatch {
    #[serde(default)]
    pub title: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
    #[serde(default)]
    pub category_code: Patch<String>,
    #[serde(default)]
    pub max_enrollments: Patch<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct CourseFilter {
    pub title_contains: Option<String>,
    pub category_code: Option<String>,
}

impl CourseFilter {
    pub fn in_category(code: impl Into<String>) -> Self {
        Self {
            category_code: Some(code.into()),
            ..Self::default()
        }
    }
}

impl Specification<Course> for CourseFilter {
    fn is_satisfied_by(&self, course: &Course) -> bool {
        let title_ok = self
            .title_contains
            .as_deref()
            .map_or(true, |needle| contains_ignore_case(&course.title, needle));
        let category_ok = self
            .category_code
            .as_deref()
            .map_or(true, |code| course.category_code.as_deref() == Some(code));
        title_ok && category_ok
    }
}
