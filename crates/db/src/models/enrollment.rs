//! Enrollment of a user in a course, keyed by the (user, course) pair.

use std::fmt;

use enroll_core::entity::{DeletePolicy, Entity};
use enroll_core::mapper::Dto;
use enroll_core::patch::Patch;
use enroll_core::repository::Specification;
use enroll_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError, ValidationErrors};

/// Lifecycle of an enrollment. Maps to the `enrollment_status` Postgres enum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "enrollment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    #[default]
    Active,
    Completed,
    Withdrawn,
}

/// Composite key of the `enrollments` table. Orders by user, then course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EnrollmentId {
    pub user_id: DbId,
    pub course_id: DbId,
}

impl EnrollmentId {
    pub fn new(user_id: DbId, course_id: DbId) -> Self {
        Self { user_id, course_id }
    }
}

impl fmt::Display for EnrollmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.user_id, self.course_id)
    }
}

/// A row from the `enrollments` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize)]
pub struct Enrollment {
    pub user_id: DbId,
    pub course_id: DbId,
    pub status: EnrollmentStatus,
    /// Final grade in percent, set once the course is completed.
    pub grade: Option<i16>,
    pub deleted: bool,
    pub version: i32,
    pub created_at: Option<Timestamp>,
}

impl Enrollment {
    pub fn key(&self) -> EnrollmentId {
        EnrollmentId::new(self.user_id, self.course_id)
    }
}

impl Entity for Enrollment {
    type Id = EnrollmentId;
    const NAME: &'static str = "Enrollment";
    const DELETE_POLICY: DeletePolicy = DeletePolicy::Soft;

    fn id(&self) -> Option<EnrollmentId> {
        (self.user_id != 0 && self.course_id != 0).then(|| self.key())
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn set_version(&mut self, version: i32) {
        self.version = version;
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn set_deleted(&mut self, deleted: bool) {
        self.deleted = deleted;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct EnrollmentDto {
    #[validate(required, range(min = 1))]
    pub user_id: Option<DbId>,
    #[validate(required, range(min = 1))]
    pub course_id: Option<DbId>,
    /// Defaults to [`EnrollmentStatus::Active`] when omitted.
    #[serde(default)]
    pub status: Option<EnrollmentStatus>,
    #[validate(range(min = 0, max = 100))]
    pub grade: Option<i16>,
    #[serde(default)]
    pub version: i32,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

impl Dto for EnrollmentDto {
    type Id = EnrollmentId;

    fn set_id(&mut self, id: EnrollmentId) {
        self.user_id = Some(id.user_id);
        self.course_id = Some(id.course_id);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnrollmentPatch {
    #[serde(default)]
    pub status: Patch<EnrollmentStatus>,
    #[serde(default)]
    pub grade: Patch<i16>,
}

impl Validate for EnrollmentPatch {
    /// `status` has no null state; clearing it is rejected instead of
    /// falling back to [`EnrollmentStatus::Active`].
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.status.is_null() {
            errors.add("status", ValidationError::new("required"));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnrollmentFilter {
    pub user_id: Option<DbId>,
    pub course_id: Option<DbId>,
    pub status: Option<EnrollmentStatus>,
    pub include_deleted: bool,
}

impl Specification<Enrollment> for EnrollmentFilter {
    fn is_satisfied_by(&self, enrollment: &Enrollment) -> bool {
        (self.include_deleted || !enrollment.deleted)
            && self.user_id.map_or(true, |id| enrollment.user_id == id)
            && self.course_id.map_or(true, |id| enrollment.course_id == id)
            && self.status.map_or(true, |s| enrollment.status == s)
    }
}
