//! Generic CRUD service over a repository and a mapper.
//!
//! One instance is built per entity type:
//!
//! ```ignore
//! let courses = CrudService::new(Arc::new(PgCourseRepo::new(pool)), CourseMapper);
//! let saved = courses.save(dto, &AuditContext::for_user(user_id)).await?;
//! ```
//!
//! Validation, soft-delete handling and DTO mapping happen here. Version
//! checks happen in the repository, which fails the write with
//! [`CoreError::OptimisticConflict`] when another writer got there first.
//! Nothing in this layer retries.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::audit::AuditContext;
use crate::entity::Entity;
use crate::error::CoreError;
use crate::mapper::{Dto, Mapper};
use crate::pagination::{Page, PageRequest, Pageable};
use crate::repository::Repository;
use crate::validation;

pub struct CrudService<E, R, M> {
    repository: Arc<R>,
    mapper: M,
    _entity: PhantomData<fn() -> E>,
}

impl<E, R, M> Clone for CrudService<E, R, M>
where
    M: Clone,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            mapper: self.mapper.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E, R, M> CrudService<E, R, M>
where
    E: Entity,
    R: Repository<E>,
    M: Mapper<E>,
{
    pub fn new(repository: Arc<R>, mapper: M) -> Self {
        Self {
            repository,
            mapper,
            _entity: PhantomData,
        }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub fn mapper(&self) -> &M {
        &self.mapper
    }

    /// Validate, build a fresh entity from `dto`, persist it.
    pub async fn save(&self, dto: M::Dto, ctx: &AuditContext) -> Result<M::Dto, CoreError> {
        validation::validate(&dto)?;

        let mut entity = E::default();
        self.mapper.update(&dto, &mut entity);
        if E::supports_soft_delete() {
            entity.set_deleted(false);
        }

        let saved = self.repository.save(entity, ctx).await?;
        tracing::info!(entity = E::NAME, id = ?saved.id(), author = ?ctx.author, "Entity created");
        Ok(self.mapper.map(&saved))
    }

    /// Command-path lookup: the entity must exist and not be soft-deleted.
    pub async fn get_by_id(&self, id: &E::Id) -> Result<M::Dto, CoreError> {
        let entity = self.load(id).await?;
        if entity.is_deleted() {
            return Err(CoreError::not_found(E::NAME, id));
        }
        Ok(self.mapper.map(&entity))
    }

    /// Query-path lookup: absent and soft-deleted entities are `None`.
    pub async fn find_by_id(&self, id: &E::Id) -> Result<Option<M::Dto>, CoreError> {
        let found = self.repository.find_by_id(id).await?;
        tracing::debug!(entity = E::NAME, %id, found = found.is_some(), "Find by id");
        Ok(found
            .filter(|entity| !entity.is_deleted())
            .map(|entity| self.mapper.map(&entity)))
    }

    pub async fn find_by_specification(
        &self,
        filter: &R::Filter,
        request: PageRequest,
    ) -> Result<Page<M::Dto>, CoreError> {
        self.find_page(filter, Pageable::Paged(request)).await
    }

    /// Unpaged variant of [`Self::find_by_specification`].
    pub async fn find_all_by_specification(
        &self,
        filter: &R::Filter,
    ) -> Result<Vec<M::Dto>, CoreError> {
        Ok(self.find_page(filter, Pageable::Unpaged).await?.into_items())
    }

    pub async fn count_by_specification(&self, filter: &R::Filter) -> Result<u64, CoreError> {
        self.repository.count(filter).await
    }

    /// Replace every mapped field of the entity `id` with `dto`.
    ///
    /// `id` is optional only so that a missing path id is reported as
    /// [`CoreError::InvalidArgument`] instead of being silently generated.
    pub async fn update(
        &self,
        id: Option<E::Id>,
        mut dto: M::Dto,
        ctx: &AuditContext,
    ) -> Result<M::Dto, CoreError> {
        let id = id.ok_or_else(|| {
            CoreError::InvalidArgument(format!("ID for update of {} cannot be null", E::NAME))
        })?;
        validation::validate(&dto)?;

        let mut entity = self.load(&id).await?;
        ensure_not_deleted(&entity, &id)?;

        dto.set_id(id.clone());
        self.mapper.update(&dto, &mut entity);
        entity.set_deleted(false);

        let saved = self.repository.save(entity, ctx).await?;
        tracing::info!(entity = E::NAME, %id, version = saved.version(), "Entity updated");
        Ok(self.mapper.map(&saved))
    }

    /// Apply only the fields present in `patch`, then re-validate.
    ///
    /// The patch payload is validated on its own first, so rules about
    /// which fields may be cleared hold even when the field's default
    /// value would pass the DTO rules.
    pub async fn patch(
        &self,
        id: &E::Id,
        patch: M::PatchDto,
        ctx: &AuditContext,
    ) -> Result<M::Dto, CoreError> {
        validation::validate(&patch)?;
        let mut entity = self.load(id).await?;
        ensure_not_deleted(&entity, id)?;

        self.mapper.patch(patch, &mut entity);
        validation::validate(&self.mapper.map(&entity))?;
        entity.set_deleted(false);

        let saved = self.repository.save(entity, ctx).await?;
        tracing::info!(entity = E::NAME, %id, version = saved.version(), "Entity patched");
        Ok(self.mapper.map(&saved))
    }

    /// Soft-delete or physically remove, per [`Entity::DELETE_POLICY`].
    pub async fn delete_by_id(&self, id: &E::Id, ctx: &AuditContext) -> Result<(), CoreError> {
        let mut entity = self.load(id).await?;

        if E::supports_soft_delete() {
            if entity.is_deleted() {
                tracing::debug!(entity = E::NAME, %id, "Already soft-deleted");
                return Ok(());
            }
            entity.set_deleted(true);
            self.repository.save(entity, ctx).await?;
            tracing::info!(entity = E::NAME, %id, "Entity soft-deleted");
        } else {
            if !self.repository.delete_by_id(id, ctx).await? {
                return Err(CoreError::not_found(E::NAME, id));
            }
            tracing::info!(entity = E::NAME, %id, "Entity deleted");
        }
        Ok(())
    }

    async fn find_page(
        &self,
        filter: &R::Filter,
        pageable: Pageable,
    ) -> Result<Page<M::Dto>, CoreError> {
        let page = self.repository.find_all(filter, pageable).await?;
        Ok(page.map(|entity| self.mapper.map(&entity)))
    }

    async fn load(&self, id: &E::Id) -> Result<E, CoreError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found(E::NAME, id))
    }
}

fn ensure_not_deleted<E: Entity>(entity: &E, id: &E::Id) -> Result<(), CoreError> {
    if entity.is_deleted() {
        return Err(CoreError::IllegalState(format!(
            "Cannot update a deleted {} with id {id}",
            E::NAME
        )));
    }
    Ok(())
}
