//! Who is writing, and the created/modified stamps written on their behalf.

use serde::Serialize;

use crate::types::{DbId, Timestamp};

/// Per-request write context handed to every repository write.
///
/// `author` ends up in `created_by` / `modified_by` columns and on the
/// revision row. It is `None` for unauthenticated or system writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditContext {
    pub author: Option<DbId>,
}

impl AuditContext {
    pub fn new(author: Option<DbId>) -> Self {
        Self { author }
    }

    /// A write with no attributable author.
    pub fn anonymous() -> Self {
        Self { author: None }
    }

    pub fn for_user(user_id: DbId) -> Self {
        Self {
            author: Some(user_id),
        }
    }
}

/// Creation and last-modification stamps carried by audited entities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditMetadata {
    pub created_by: Option<DbId>,
    pub created_at: Option<Timestamp>,
    pub modified_by: Option<DbId>,
    pub modified_at: Option<Timestamp>,
}

impl AuditMetadata {
    /// Stamp a first insert: both created and modified fields are set.
    pub fn mark_created(&mut self, ctx: &AuditContext, now: Timestamp) {
        self.created_by = ctx.author;
        self.created_at = Some(now);
        self.mark_modified(ctx, now);
    }

    /// Stamp a subsequent write. Creation fields are left untouched.
    pub fn mark_modified(&mut self, ctx: &AuditContext, now: Timestamp) {
        self.modified_by = ctx.author;
        self.modified_at = Some(now);
    }
}
