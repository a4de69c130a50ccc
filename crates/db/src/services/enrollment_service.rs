use std::ops::Deref;
use std::sync::Arc;

use enroll_core::error::CoreError;
use enroll_core::pagination::{Page, PageRequest};
use enroll_core::repository::Repository;
use enroll_core::service::CrudService;
use enroll_core::types::DbId;

use crate::mappers::EnrollmentMapper;
use crate::models::enrollment::{Enrollment, EnrollmentDto, EnrollmentFilter};

pub struct EnrollmentService<R> {
    crud: CrudService<Enrollment, R, EnrollmentMapper>,
}

impl<R> Clone for EnrollmentService<R> {
    fn clone(&self) -> Self {
        Self {
            crud: self.crud.clone(),
        }
    }
}

impl<R> Deref for EnrollmentService<R> {
    type Target = CrudService<Enrollment, R, EnrollmentMapper>;

    fn deref(&self) -> &Self::Target {
        &self.crud
    }
}

impl<R> EnrollmentService<R>
where
    R: Repository<Enrollment, Filter = EnrollmentFilter>,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            crud: CrudService::new(repository, EnrollmentMapper),
        }
    }

    /// Active enrollments of one user.
    pub async fn find_by_user(
        &self,
        user_id: DbId,
        request: PageRequest,
    ) -> Result<Page<EnrollmentDto>, CoreError> {
        let filter = EnrollmentFilter {
            user_id: Some(user_id),
            ..EnrollmentFilter::default()
        };
        self.crud.find_by_specification(&filter, request).await
    }

    /// Active enrollments in one course.
    pub async fn find_by_course(
        &self,
        course_id: DbId,
        request: PageRequest,
    ) -> Result<Page<EnrollmentDto>, CoreError> {
        let filter = EnrollmentFilter {
            course_id: Some(course_id),
            ..EnrollmentFilter::default()
        };
        self.crud.find_by_specification(&filter, request).await
    }
}
