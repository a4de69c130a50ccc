//! Entity contracts: identity, optimistic-lock version, delete policy.

use std::fmt::{Debug, Display};
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::audit::AuditMetadata;

/// Bounds every entity key satisfies: generated numeric ids, natural
/// string keys and composite key structs alike.
pub trait EntityId:
    Clone + Debug + Display + Eq + Ord + Hash + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> EntityId for T where
    T: Clone + Debug + Display + Eq + Ord + Hash + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// How `delete_by_id` treats an entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    /// The row is physically removed.
    Hard,
    /// The row is kept and its `deleted` flag set.
    Soft,
}

/// A persisted record.
///
/// `Default` stands in for a no-arg constructor: the generic service builds
/// a blank instance and lets the mapper fill it.
pub trait Entity: Clone + Default + Debug + Send + Sync + 'static {
    type Id: EntityId;

    /// Human-readable type name used in errors and logs.
    const NAME: &'static str;

    const DELETE_POLICY: DeletePolicy;

    /// `None` until a generated key has been assigned by the store.
    fn id(&self) -> Option<Self::Id>;

    /// Assigns a store-generated key. Natural and composite keys ignore it.
    fn assign_id(&mut self, _id: Self::Id) {}

    /// Optimistic-lock counter. `0` means the entity was never persisted.
    fn version(&self) -> i32;

    /// Only repositories call this, after a successful write.
    fn set_version(&mut self, version: i32);

    fn is_new(&self) -> bool {
        self.version() == 0
    }

    /// Always `false` for [`DeletePolicy::Hard`] entities.
    fn is_deleted(&self) -> bool {
        false
    }

    /// No-op for [`DeletePolicy::Hard`] entities.
    fn set_deleted(&mut self, _deleted: bool) {}

    /// Created/modified stamps, for entities that carry them.
    fn audit_metadata_mut(&mut self) -> Option<&mut AuditMetadata> {
        None
    }

    fn supports_soft_delete() -> bool {
        Self::DELETE_POLICY == DeletePolicy::Soft
    }
}
