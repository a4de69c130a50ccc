//! Per-entity services.
//!
//! Each wraps a [`CrudService`](enroll_core::service::CrudService) and
//! dereferences to it, adding entity-specific queries and history access.

mod category_service;
mod course_service;
mod enrollment_service;
mod user_service;

pub use category_service::CategoryService;
pub use course_service::CourseService;
pub use enrollment_service::EnrollmentService;
pub use user_service::UserService;
