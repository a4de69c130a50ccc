//! Read access to entity change history.
//!
//! Every insert, update and delete of an audited entity appends a revision:
//! one `revinfo` row (number, timestamp, author) plus a snapshot of the
//! entity in its `<table>_aud` table. Revisions are never modified.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::entity::Entity;
use crate::error::CoreError;
use crate::pagination::{Page, PageRequest};
use crate::types::{DbId, RevisionNumber, Timestamp};

/// What happened to the entity in a revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RevisionKind {
    Add,
    Mod,
    Del,
}

impl RevisionKind {
    /// Code stored in the `revtype` column.
    pub fn code(self) -> i16 {
        match self {
            RevisionKind::Add => 0,
            RevisionKind::Mod => 1,
            RevisionKind::Del => 2,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(RevisionKind::Add),
            1 => Some(RevisionKind::Mod),
            2 => Some(RevisionKind::Del),
            _ => None,
        }
    }
}

/// The `revinfo` row shared by every entity changed in one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevisionMetadata {
    pub number: RevisionNumber,
    pub timestamp: Timestamp,
    pub author: Option<DbId>,
}

/// An entity snapshot at one revision.
///
/// For [`RevisionKind::Del`] the snapshot is the last state before removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Revision<T> {
    pub metadata: RevisionMetadata,
    pub kind: RevisionKind,
    pub entity: T,
}

impl<T> Revision<T> {
    pub fn number(&self) -> RevisionNumber {
        self.metadata.number
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Revision<U> {
        Revision {
            metadata: self.metadata,
            kind: self.kind,
            entity: f(self.entity),
        }
    }
}

/// Storage-side history queries for one audited entity type.
#[async_trait]
pub trait RevisionReader<E: Entity>: Send + Sync {
    /// Revision numbers touching `id`, ascending.
    async fn revision_numbers(&self, id: &E::Id) -> Result<Vec<RevisionNumber>, CoreError>;

    /// Entity state recorded at or before `number`.
    async fn find_at_revision(
        &self,
        id: &E::Id,
        number: RevisionNumber,
    ) -> Result<Option<(E, RevisionKind)>, CoreError>;

    async fn revision_metadata(
        &self,
        number: RevisionNumber,
    ) -> Result<Option<RevisionMetadata>, CoreError>;
}

/// Pages through revisions of one entity type. All reads, no writes.
pub struct RevisionService<E, R> {
    reader: Arc<R>,
    _entity: PhantomData<fn() -> E>,
}

impl<E, R> Clone for RevisionService<E, R> {
    fn clone(&self) -> Self {
        Self {
            reader: Arc::clone(&self.reader),
            _entity: PhantomData,
        }
    }
}

impl<E, R> RevisionService<E, R>
where
    E: Entity,
    R: RevisionReader<E>,
{
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            reader,
            _entity: PhantomData,
        }
    }

    /// One page of revisions, oldest first. `total` is the number of
    /// revisions of the entity, also when the page is past the end.
    pub async fn find_revisions(
        &self,
        id: &E::Id,
        request: PageRequest,
    ) -> Result<Page<Revision<E>>, CoreError> {
        let numbers = self.reader.revision_numbers(id).await?;
        let total = numbers.len() as u64;

        let start = request.offset();
        if start >= numbers.len() {
            return Ok(Page::empty(total, request));
        }
        let end = start.saturating_add(request.size).min(numbers.len());

        let mut items = Vec::with_capacity(end - start);
        for &number in &numbers[start..end] {
            items.push(self.load(id, number).await?);
        }
        Ok(Page::new(items, total, request))
    }

    /// Point lookup. Any failure, including a missing revision, is `None`.
    pub async fn find_revision(&self, id: &E::Id, number: RevisionNumber) -> Option<Revision<E>> {
        match self.load(id, number).await {
            Ok(revision) => Some(revision),
            Err(err) => {
                tracing::debug!(entity = E::NAME, %id, revision = number, error = %err, "Revision lookup failed");
                None
            }
        }
    }

    /// The most recent revision of `id`, if it has any.
    pub async fn find_last_change_revision(
        &self,
        id: &E::Id,
    ) -> Result<Option<Revision<E>>, CoreError> {
        let numbers = self.reader.revision_numbers(id).await?;
        match numbers.last() {
            Some(&last) => Ok(Some(self.load(id, last).await?)),
            None => Ok(None),
        }
    }

    async fn load(&self, id: &E::Id, number: RevisionNumber) -> Result<Revision<E>, CoreError> {
        let (entity, kind) = self
            .reader
            .find_at_revision(id, number)
            .await?
            .ok_or_else(|| CoreError::not_found(E::NAME, format!("{id}@{number}")))?;
        let metadata = self
            .reader
            .revision_metadata(number)
            .await?
            .ok_or_else(|| CoreError::not_found("Revision", number))?;
        Ok(Revision {
            metadata,
            kind,
            entity,
        })
    }
}
