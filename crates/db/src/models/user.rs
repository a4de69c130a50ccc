//! User entity model and DTOs.

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

/// A row from the `users` table (or a snapshot from `users_aud`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct User {
    pub id: Option<DbId>,
    /// Subject identifier issued by the identity provider.
    pub external_id: String,
    pub name: String,
    pub email: Option<String>,
    pub deleted: bool,
    pub version: i32,
    #[serde(flatten)]
    pub audit: AuditMetadata,
}

impl<'r> FromRow<'r, PgRow> for User {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: Some(row.try_get("id")?),
            external_id: row.try_get("external_id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            deleted: row.try_get("deleted")?,
            version: row.try_get("version")?,
            audit: audit_from_row(row)?,
        })
    }
}

impl Entity for User {
    type Id = DbId;
    const NAME: &'static str = "User";
    const DELETE_POLICY: DeletePolicy = DeletePolicy::Soft;

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

    fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn set_deleted(&mut self, deleted: bool) {
        self.deleted = deleted;
    }

    fn audit_metadata_mut(&mut self) -> Option<&mut AuditMetadata> {
        Some(&mut self.audit)
    }
}

/// External representation of a user, used for create, update and reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct UserDto {
    #[serde(default)]
    pub id: Option<DbId>,
    #[validate(required, length(min = 1, max = 255))]
    pub external_id: Option<String>,
    #[validate(required, length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default)]
    pub version: i32,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub modified_at: Option<Timestamp>,
}

impl Dto for UserDto {
    type Id = DbId;

    fn set_id(&mut self, id: DbId) {
        self.id = Some(id);
    }
}

/// Partial update. The external id is owned by the identity provider and
/// cannot be patched.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UserPatch {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub email: Patch<String>,
}

/// Query filter for users. Soft-deleted users are excluded unless
/// `include_deleted` is set.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub name_contains: Option<String>,
    pub external_id: Option<String>,
    pub include_deleted: bool,
}

impl UserFilter {
    pub fn by_external_id(external_id: impl Into<String>) -> Self {
        Self {
            external_id: Some(external_id.into()),
            ..Self::default()
        }
    }

    pub fn including_deleted() -> Self {
        Self {
            include_deleted: true,
            ..Self::default()
        }
    }
}

impl Specification<User> for UserFilter {
    fn is_satisfied_by(&self, user: &User) -> bool {
        if user.deleted && !self.include_deleted {
            return false;
        }
        if let Some(needle) = &self.name_contains {
            if !contains_ignore_case(&user.name, needle) {
                return false;
            }
        }
        if let Some(external_id) = &self.external_id {
            if &user.external_id != external_id {
                return false;
            }
        }
        true
    }
}
