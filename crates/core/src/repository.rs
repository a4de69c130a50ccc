//! Storage abstraction the generic services are written against.
//!
//! Implementations: the PostgreSQL repositories and the in-memory
//! repository in `enroll-db`.

use async_trait::async_trait;

use crate::audit::AuditContext;
use crate::entity::Entity;
use crate::error::CoreError;
use crate::pagination::{Page, Pageable};

/// A filter over entities of type `E`.
///
/// The in-memory repository evaluates it directly; SQL repositories turn
/// the same filter into a `WHERE` clause.
pub trait Specification<E>: Send + Sync {
    fn is_satisfied_by(&self, entity: &E) -> bool;
}

/// Persistence operations for one entity type.
///
/// Read methods return soft-deleted rows unless the filter excludes them;
/// deciding what "deleted" means to a caller is the service's job.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    type Filter: Specification<E>;

    /// Load by key, soft-deleted rows included.
    async fn find_by_id(&self, id: &E::Id) -> Result<Option<E>, CoreError>;

    async fn exists_by_id(&self, id: &E::Id) -> Result<bool, CoreError> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    async fn find_all(&self, filter: &Self::Filter, pageable: Pageable)
        -> Result<Page<E>, CoreError>;

    async fn count(&self, filter: &Self::Filter) -> Result<u64, CoreError>;

    /// Insert when [`Entity::is_new`], otherwise update guarded by the
    /// entity's version.
    ///
    /// Returns the stored entity with its id and new version. A stale
    /// version fails with [`CoreError::OptimisticConflict`]; a vanished row
    /// fails with [`CoreError::NotFound`].
    async fn save(&self, entity: E, ctx: &AuditContext) -> Result<E, CoreError>;

    /// Physically remove a row. Returns `true` if a row was removed.
    async fn delete_by_id(&self, id: &E::Id, ctx: &AuditContext) -> Result<bool, CoreError>;
}
