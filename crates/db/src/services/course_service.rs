use std::ops::Deref;
use std::sync::Arc;

use enroll_core::error::CoreError;
use enroll_core::mapper::Mapper;
use enroll_core::pagination::{Page, PageRequest};
use enroll_core::repository::Repository;
use enroll_core::revision::{Revision, RevisionReader, RevisionService};
use enroll_core::service::CrudService;
use enroll_core::types::{DbId, RevisionNumber};

use crate::mappers::CourseMapper;
use crate::models::course::{Course, CourseDto, CourseFilter};

pub struct CourseService<R> {
    crud: CrudService<Course, R, CourseMapper>,
    revisions: RevisionService<Course, R>,
}

impl<R> Clone for CourseService<R> {
    fn clone(&self) -> Self {
        Self {
            crud: self.crud.clone(),
            revisions: self.revisions.clone(),
        }
    }
}

impl<R> Deref for CourseService<R> {
    type Target = CrudService<Course, R, CourseMapper>;

    fn deref(&self) -> &Self::Target {
        &self.crud
    }
}

impl<R> CourseService<R>
where
    R: Repository<Course, Filter = CourseFilter> + RevisionReader<Course>,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            crud: CrudService::new(Arc::clone(&repository), CourseMapper),
            revisions: RevisionService::new(repository),
        }
    }

    pub async fn find_by_category(
        &self,
        category_code: &str,
        request: PageRequest,
    ) -> Result<Page<CourseDto>, CoreError> {
        self.crud
            .find_by_specification(&CourseFilter::in_category(category_code), request)
            .await
    }

    /// History of a course, including revisions recorded after its deletion.
    pub async fn find_course_revisions(
        &self,
        id: DbId,
        request: PageRequest,
    ) -> Result<Page<Revision<CourseDto>>, CoreError> {
        let page = self.revisions.find_revisions(&id, request).await?;
        Ok(page.map(|revision| revision.map(|course| self.crud.mapper().map(&course))))
    }

    pub async fn find_course_revision(
        &self,
        id: DbId,
        number: RevisionNumber,
    ) -> Option<Revision<CourseDto>> {
        let revision = self.revisions.find_revision(&id, number).await?;
        Some(revision.map(|course| self.crud.mapper().map(&course)))
    }
}
