//! Stateless entity/DTO mappers, one per entity.

mod category;
mod course;
mod enrollment;
mod user;

pub use category::CategoryMapper;
pub use course::CourseMapper;
pub use enrollment::EnrollmentMapper;
pub use user::UserMapper;
