//! Entity ↔ DTO conversion contracts.

use validator::{Validate, ValidationErrors};

use crate::entity::Entity;

/// External representation of an entity.
pub trait Dto: Validate + Clone + Send + Sync + 'static {
    type Id;

    /// Overwrite the id before a full update so the path id wins over
    /// whatever the payload carried.
    fn set_id(&mut self, id: Self::Id);
}

/// Patch payload type for entities that cannot be patched.
///
/// Uninhabited, so `CrudService::patch` cannot be called for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoPatch {}

impl Validate for NoPatch {
    fn validate(&self) -> Result<(), ValidationErrors> {
        match *self {}
    }
}

/// Converts between an entity, its DTO and its patch DTO.
///
/// Relationship fields are carried as foreign identifiers in both
/// directions; a mapper never loads a referenced row.
pub trait Mapper<E: Entity>: Send + Sync {
    type Dto: Dto<Id = E::Id>;
    type PatchDto: Validate + Send;

    /// Full projection, version and audit stamps included.
    fn map(&self, entity: &E) -> Self::Dto;

    /// Overwrite every mapped field of `entity` from `dto`.
    ///
    /// Must not touch the version: the repository's counter is the only
    /// source of truth for it.
    fn update(&self, dto: &Self::Dto, entity: &mut E);

    /// Overwrite only the fields present in `patch`.
    fn patch(&self, patch: Self::PatchDto, entity: &mut E);
}
