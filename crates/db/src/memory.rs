//! In-memory [`Repository`] with the same versioning, audit and revision
//! semantics as the PostgreSQL repositories.
//!
//! Rows are kept sorted by key, the same `ORDER BY` the SQL repositories
//! page with.

use std::marker::PhantomData;

use async_trait::async_trait;
use enroll_core::audit::AuditContext;
use enroll_core::entity::Entity;
use enroll_core::error::CoreError;
use enroll_core::pagination::{Page, Pageable};
use enroll_core::repository::{Repository, Specification};
use enroll_core::revision::{RevisionKind, RevisionMetadata, RevisionReader};
use enroll_core::types::{DbId, RevisionNumber};
use tokio::sync::RwLock;

struct Snapshot<E> {
    number: RevisionNumber,
    kind: RevisionKind,
    entity: E,
}

struct Store<E> {
    rows: Vec<E>,
    next_id: DbId,
    revisions: Vec<RevisionMetadata>,
    snapshots: Vec<Snapshot<E>>,
}

impl<E: Entity> Store<E> {
    fn position(&self, id: &E::Id) -> Option<usize> {
        self.rows.iter().position(|row| row.id().as_ref() == Some(id))
    }

    fn record(&mut self, audited: bool, kind: RevisionKind, entity: &E, ctx: &AuditContext) {
        if !audited {
            return;
        }
        let number = self.revisions.len() as RevisionNumber + 1;
        self.revisions.push(RevisionMetadata {
            number,
            timestamp: chrono::Utc::now(),
            author: ctx.author,
        });
        self.snapshots.push(Snapshot {
            number,
            kind,
            entity: entity.clone(),
        });
    }
}

/// A repository backed by a key-sorted `Vec` behind a [`RwLock`].
pub struct InMemoryRepository<E: Entity, F> {
    store: RwLock<Store<E>>,
    generate: Option<fn(DbId) -> E::Id>,
    audited: bool,
    _filter: PhantomData<fn() -> F>,
}

impl<E: Entity, F> InMemoryRepository<E, F> {
    /// Repository for entities whose key is supplied by the caller.
    pub fn new() -> Self {
        Self {
            store: RwLock::new(Store {
                rows: Vec::new(),
                next_id: 1,
                revisions: Vec::new(),
                snapshots: Vec::new(),
            }),
            generate: None,
            audited: false,
            _filter: PhantomData,
        }
    }

    /// Record a revision for every write, readable through [`RevisionReader`].
    pub fn audited(mut self) -> Self {
        self.audited = true;
        self
    }

    /// Number of stored rows, soft-deleted ones included.
    pub async fn len(&self) -> usize {
        self.store.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<E: Entity<Id = DbId>, F> InMemoryRepository<E, F> {
    /// Repository that assigns ids `1, 2, 3, ...` on insert.
    pub fn with_sequence() -> Self {
        let identity: fn(DbId) -> DbId = |n| n;
        Self {
            generate: Some(identity),
            ..Self::new()
        }
    }
}

impl<E: Entity, F> Default for InMemoryRepository<E, F> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E, F> Repository<E> for InMemoryRepository<E, F>
where
    E: Entity,
    F: Specification<E> + 'static,
{
    type Filter = F;

    async fn find_by_id(&self, id: &E::Id) -> Result<Option<E>, CoreError> {
        let store = self.store.read().await;
        Ok(store.position(id).map(|i| store.rows[i].clone()))
    }

    async fn find_all(&self, filter: &F, pageable: Pageable) -> Result<Page<E>, CoreError> {
        let store = self.store.read().await;
        let matching: Vec<E> = store
            .rows
            .iter()
            .filter(|row| filter.is_satisfied_by(row))
            .cloned()
            .collect();
        Ok(Page::from_slice(matching, pageable))
    }

    async fn count(&self, filter: &F) -> Result<u64, CoreError> {
        let store = self.store.read().await;
        Ok(store.rows.iter().filter(|row| filter.is_satisfied_by(row)).count() as u64)
    }

    async fn save(&self, mut entity: E, ctx: &AuditContext) -> Result<E, CoreError> {
        let mut store = self.store.write().await;
        let now = chrono::Utc::now();

        if entity.is_new() {
            if let Some(generate) = self.generate {
                entity.assign_id(generate(store.next_id));
                store.next_id += 1;
            }
            let id = entity.id().ok_or_else(|| {
                CoreError::InvalidArgument(format!("{} requires an id before insert", E::NAME))
            })?;
            if store.position(&id).is_some() {
                return Err(CoreError::Conflict(format!(
                    "{} with id {id} already exists",
                    E::NAME
                )));
            }
            entity.set_version(1);
            if let Some(audit) = entity.audit_metadata_mut() {
                audit.mark_created(ctx, now);
            }
            let at = store.rows.partition_point(|row| row.id() < Some(id.clone()));
            store.rows.insert(at, entity.clone());
            store.record(self.audited, RevisionKind::Add, &entity, ctx);
            tracing::debug!(entity = E::NAME, %id, "Inserted");
            return Ok(entity);
        }

        let id = entity
            .id()
            .ok_or_else(|| CoreError::InvalidArgument(format!("{} has no id", E::NAME)))?;
        let index = store
            .position(&id)
            .ok_or_else(|| CoreError::not_found(E::NAME, &id))?;
        if store.rows[index].version() != entity.version() {
            return Err(CoreError::OptimisticConflict {
                entity: E::NAME,
                id: id.to_string(),
                version: entity.version(),
            });
        }

        entity.set_version(entity.version() + 1);
        if let Some(audit) = entity.audit_metadata_mut() {
            audit.mark_modified(ctx, now);
        }
        store.rows[index] = entity.clone();
        store.record(self.audited, RevisionKind::Mod, &entity, ctx);
        tracing::debug!(entity = E::NAME, %id, version = entity.version(), "Updated");
        Ok(entity)
    }

    async fn delete_by_id(&self, id: &E::Id, ctx: &AuditContext) -> Result<bool, CoreError> {
        let mut store = self.store.write().await;
        let Some(index) = store.position(id) else {
            return Ok(false);
        };
        let removed = store.rows.remove(index);
        store.record(self.audited, RevisionKind::Del, &removed, ctx);
        tracing::debug!(entity = E::NAME, %id, "Removed");
        Ok(true)
    }
}

#[async_trait]
impl<E, F> RevisionReader<E> for InMemoryRepository<E, F>
where
    E: Entity,
    F: 'static,
{
    async fn revision_numbers(&self, id: &E::Id) -> Result<Vec<RevisionNumber>, CoreError> {
        let store = self.store.read().await;
        Ok(store
            .snapshots
            .iter()
            .filter(|s| s.entity.id().as_ref() == Some(id))
            .map(|s| s.number)
            .collect())
    }

    async fn find_at_revision(
        &self,
        id: &E::Id,
        number: RevisionNumber,
    ) -> Result<Option<(E, RevisionKind)>, CoreError> {
        let store = self.store.read().await;
        let latest = store
            .snapshots
            .iter()
            .filter(|s| s.number <= number && s.entity.id().as_ref() == Some(id))
            .last();
        Ok(match latest {
            Some(s) if s.kind == RevisionKind::Del && s.number < number => None,
            Some(s) => Some((s.entity.clone(), s.kind)),
            None => None,
        })
    }

    async fn revision_metadata(
        &self,
        number: RevisionNumber,
    ) -> Result<Option<RevisionMetadata>, CoreError> {
        let store = self.store.read().await;
        Ok(store.revisions.iter().find(|r| r.number == number).cloned())
    }
}
