//! Shared fixtures for the `enroll-db` integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use enroll_db::memory::InMemoryRepository;
use enroll_db::models::category::{Category, CategoryDto, CategoryFilter};
use enroll_db::models::course::{Course, CourseDto, CourseFilter};
use enroll_db::models::enrollment::{Enrollment, EnrollmentDto, EnrollmentFilter};
use enroll_db::models::user::{User, UserDto, UserFilter};
use enroll_db::services::{CategoryService, CourseService, EnrollmentService, UserService};
use tracing_subscriber::EnvFilter;

pub type MemUsers = InMemoryRepository<User, UserFilter>;
pub type MemCourses = InMemoryRepository<Course, CourseFilter>;
pub type MemCategories = InMemoryRepository<Category, CategoryFilter>;
pub type MemEnrollments = InMemoryRepository<Enrollment, EnrollmentFilter>;

/// Route `tracing` output to the test harness. `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn user_service() -> UserService<MemUsers> {
    init_tracing();
    UserService::new(Arc::new(MemUsers::with_sequence().audited()))
}

pub fn course_service() -> CourseService<MemCourses> {
    init_tracing();
    CourseService::new(Arc::new(MemCourses::with_sequence().audited()))
}

pub fn category_service() -> CategoryService<MemCategories> {
    init_tracing();
    CategoryService::new(Arc::new(MemCategories::new()))
}

pub fn enrollment_service() -> EnrollmentService<MemEnrollments> {
    init_tracing();
    EnrollmentService::new(Arc::new(MemEnrollments::new()))
}

// ---------------------------------------------------------------------------
// DTO builders
// ---------------------------------------------------------------------------

pub fn new_user(external_id: &str, name: &str) -> UserDto {
    UserDto {
        external_id: Some(external_id.to_string()),
        name: Some(name.to_string()),
        email: Some(format!("{external_id}@example.com")),
        ..UserDto::default()
    }
}

pub fn new_course(title: &str, capacity: i32) -> CourseDto {
    CourseDto {
        title: Some(title.to_string()),
        description: Some(format!("{title} from scratch")),
        max_enrollments: Some(capacity),
        ..CourseDto::default()
    }
}

pub fn new_category(code: &str, name: &str) -> CategoryDto {
    CategoryDto {
        code: Some(code.to_string()),
        name: Some(name.to_string()),
        version: 0,
    }
}

pub fn new_enrollment(user_id: i64, course_id: i64) -> EnrollmentDto {
    EnrollmentDto {
        user_id: Some(user_id),
        course_id: Some(course_id),
        ..EnrollmentDto::default()
    }
}
