use std::ops::Deref;
use std::sync::Arc;

use enroll_core::error::CoreError;
use enroll_core::mapper::Mapper;
use enroll_core::pagination::{Page, PageRequest, Pageable};
use enroll_core::repository::Repository;
use enroll_core::revision::{Revision, RevisionReader, RevisionService};
use enroll_core::service::CrudService;
use enroll_core::types::{DbId, RevisionNumber};

use crate::mappers::UserMapper;
use crate::models::user::{User, UserDto, UserFilter};

/// Users: CRUD, lookup by identity-provider subject, and change history.
pub struct UserService<R> {
    crud: CrudService<User, R, UserMapper>,
    revisions: RevisionService<User, R>,
}

impl<R> Clone for UserService<R> {
    fn clone(&self) -> Self {
        Self {
            crud: self.crud.clone(),
            revisions: self.revisions.clone(),
        }
    }
}

impl<R> Deref for UserService<R> {
    type Target = CrudService<User, R, UserMapper>;

    fn deref(&self) -> &Self::Target {
        &self.crud
    }
}

impl<R> UserService<R>
where
    R: Repository<User, Filter = UserFilter> + RevisionReader<User>,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            crud: CrudService::new(Arc::clone(&repository), UserMapper),
            revisions: RevisionService::new(repository),
        }
    }

    /// Active users, ordered by id.
    pub async fn find_all(&self, request: PageRequest) -> Result<Page<UserDto>, CoreError> {
        self.crud
            .find_by_specification(&UserFilter::default(), request)
            .await
    }

    /// Look up an active user by the subject the identity provider issued.
    pub async fn find_by_external_id(&self, external_id: &str) -> Result<Option<UserDto>, CoreError> {
        let page = self
            .crud
            .repository()
            .find_all(&UserFilter::by_external_id(external_id), Pageable::Unpaged)
            .await?;
        Ok(page
            .into_items()
            .first()
            .map(|user| self.crud.mapper().map(user)))
    }

    pub async fn find_id_by_external_id(&self, external_id: &str) -> Result<Option<DbId>, CoreError> {
        Ok(self
            .find_by_external_id(external_id)
            .await?
            .and_then(|user| user.id))
    }

    /// `None` when no user with `id` was ever stored.
    pub async fn find_user_revisions(
        &self,
        id: DbId,
        request: PageRequest,
    ) -> Result<Option<Page<Revision<UserDto>>>, CoreError> {
        if !self.crud.repository().exists_by_id(&id).await? {
            tracing::debug!(user_id = id, "Revisions requested for unknown user");
            return Ok(None);
        }
        let page = self.revisions.find_revisions(&id, request).await?;
        Ok(Some(page.map(|revision| self.to_dto(revision))))
    }

    pub async fn find_user_revision(&self, id: DbId, number: RevisionNumber) -> Option<Revision<UserDto>> {
        self.revisions
            .find_revision(&id, number)
            .await
            .map(|revision| self.to_dto(revision))
    }

    pub async fn find_last_change_revision(
        &self,
        id: DbId,
    ) -> Result<Option<Revision<UserDto>>, CoreError> {
        Ok(self
            .revisions
            .find_last_change_revision(&id)
            .await?
            .map(|revision| self.to_dto(revision)))
    }

    fn to_dto(&self, revision: Revision<User>) -> Revision<UserDto> {
        revision.map(|user| self.crud.mapper().map(&user))
    }
}
