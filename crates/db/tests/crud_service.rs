//! Generic CRUD service behaviour, exercised through the concrete entity
//! services over the in-memory repository.
//!
//! Covers:
//! - save / find round trip, id and version assignment
//! - optimistic locking on stale writes
//! - full update and tri-state patch semantics
//! - soft delete versus hard delete
//! - validation reporting every violation at once

mod common;

use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use async_trait::async_trait;
use common::*;
use enroll_core::audit::AuditContext;
use enroll_core::error::CoreError;
use enroll_core::pagination::{Page, PageRequest, Pageable};
use enroll_core::patch::Patch;
use enroll_core::repository::Repository;
use enroll_core::service::CrudService;
use enroll_core::types::DbId;
use enroll_db::mappers::CourseMapper;
use enroll_db::models::course::{Course, CourseFilter, CoursePatch};
use enroll_db::models::enrollment::{EnrollmentFilter, EnrollmentId, EnrollmentPatch, EnrollmentStatus};
use enroll_db::models::user::{UserFilter, UserPatch};

fn admin() -> AuditContext {
    AuditContext::for_user(1)
}

// ---------------------------------------------------------------------------
// Test: save then find returns the stored state with a fresh id and version 1
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_save_then_find_round_trips() {
    let courses = course_service();
    let input = new_course("Rust", 30);

    let saved = courses.save(input.clone(), &admin()).await.unwrap();
    assert_eq!(saved.id, Some(1));
    assert_eq!(saved.version, 1);

    let found = courses.find_by_id(&1).await.unwrap().expect("course should exist");
    assert_eq!(found.title, input.title);
    assert_eq!(found.description, input.description);
    assert_eq!(found.max_enrollments, input.max_enrollments);
    assert_eq!(found.version, 1);
    assert!(found.created_at.is_some());
}

#[tokio::test]
async fn test_save_ignores_client_supplied_id_and_version() {
    let courses = course_service();
    let mut input = new_course("Rust", 30);
    input.id = Some(42);
    input.version = 7;

    let saved = courses.save(input, &admin()).await.unwrap();
    assert_eq!(saved.id, Some(1));
    assert_eq!(saved.version, 1);
}

// ---------------------------------------------------------------------------
// Test: validation collects every violation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_save_reports_all_violations() {
    let courses = course_service();
    let err = courses
        .save(new_course("", 0), &admin())
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Validation(failure) => {
        assert_eq!(failure.len(), 2);
        assert!(failure.has_field("title"));
        assert!(failure.has_field("max_enrollments"));
    });
    assert_eq!(courses.count_by_specification(&CourseFilter::default()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_missing_required_field_is_reported_as_null() {
    let users = user_service();
    let mut input = new_user("kc-1", "Ada");
    input.name = None;

    let err = users.save(input, &admin()).await.unwrap_err();
    assert_matches!(err, CoreError::Validation(failure) => {
        let violation = &failure.violations()[0];
        assert_eq!(violation.pointer(), "/name");
        assert_eq!(violation.code, "required");
        assert_eq!(violation.message, "must not be null");
    });
}

// ---------------------------------------------------------------------------
// Test: a write based on a stale read fails with OptimisticConflict
// ---------------------------------------------------------------------------

/// Serves `find_by_id` from a snapshot taken earlier, as a second request
/// that loaded the row before a concurrent write would.
struct StaleReads {
    inner: MemCourses,
    pinned: Mutex<Option<Course>>,
}

impl StaleReads {
    async fn pin(&self, id: DbId) {
        let snapshot = self.inner.find_by_id(&id).await.unwrap();
        *self.pinned.lock().unwrap() = snapshot;
    }
}

#[async_trait]
impl Repository<Course> for StaleReads {
    type Filter = CourseFilter;

    async fn find_by_id(&self, id: &DbId) -> Result<Option<Course>, CoreError> {
        let pinned = self.pinned.lock().unwrap().clone();
        match pinned {
            Some(course) => Ok(Some(course)),
            None => self.inner.find_by_id(id).await,
        }
    }

    async fn find_all(&self, filter: &CourseFilter, pageable: Pageable) -> Result<Page<Course>, CoreError> {
        self.inner.find_all(filter, pageable).await
    }

    async fn count(&self, filter: &CourseFilter) -> Result<u64, CoreError> {
        self.inner.count(filter).await
    }

    async fn save(&self, course: Course, ctx: &AuditContext) -> Result<Course, CoreError> {
        self.inner.save(course, ctx).await
    }

    async fn delete_by_id(&self, id: &DbId, ctx: &AuditContext) -> Result<bool, CoreError> {
        self.inner.delete_by_id(id, ctx).await
    }
}

#[tokio::test]
async fn test_update_with_stale_version_conflicts() {
    init_tracing();
    let repo = Arc::new(StaleReads {
        inner: MemCourses::with_sequence(),
        pinned: Mutex::new(None),
    });
    let courses = CrudService::new(Arc::clone(&repo), CourseMapper);

    let saved = courses.save(new_course("Rust", 30), &admin()).await.unwrap();
    let id = saved.id.unwrap();
    repo.pin(id).await;

    // A concurrent writer moves the row to version 2.
    let mut current = repo.inner.find_by_id(&id).await.unwrap().unwrap();
    current.title = "Rust, second edition".into();
    repo.inner.save(current, &admin()).await.unwrap();

    let err = courses
        .update(Some(id), new_course("Rust (stale)", 30), &admin())
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::OptimisticConflict { entity: "Course", version: 1, .. });

    let stored = repo.inner.find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Rust, second edition");
}

// ---------------------------------------------------------------------------
// Test: full update
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_update_replaces_fields_and_bumps_version() {
    let courses = course_service();
    let saved = courses.save(new_course("Rust", 30), &admin()).await.unwrap();

    let mut replacement = new_course("Advanced Rust", 12);
    replacement.description = None;
    replacement.id = Some(999);

    let updated = courses
        .update(saved.id, replacement, &AuditContext::for_user(2))
        .await
        .unwrap();
    assert_eq!(updated.id, saved.id);
    assert_eq!(updated.title.as_deref(), Some("Advanced Rust"));
    assert_eq!(updated.description, None);
    assert_eq!(updated.max_enrollments, Some(12));
    assert_eq!(updated.version, 2);
    assert_eq!(updated.created_at, saved.created_at);
}

#[tokio::test]
async fn test_update_without_id_is_invalid_argument() {
    let courses = course_service();
    let err = courses
        .update(None, new_course("Rust", 30), &admin())
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::InvalidArgument(msg) => {
        assert_eq!(msg, "ID for update of Course cannot be null");
    });
}

#[tokio::test]
async fn test_update_of_missing_entity_is_not_found() {
    let courses = course_service();
    let err = courses
        .update(Some(404), new_course("Rust", 30), &admin())
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::NotFound { entity: "Course", id } => assert_eq!(id, "404"));
}

// ---------------------------------------------------------------------------
// Test: patch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_empty_patch_only_bumps_version() {
    let courses = course_service();
    let saved = courses.save(new_course("Rust", 30), &admin()).await.unwrap();
    let id = saved.id.unwrap();

    let patched = courses
        .patch(&id, CoursePatch::default(), &admin())
        .await
        .unwrap();

    assert_eq!(patched.version, saved.version + 1);
    assert_eq!(patched.id, saved.id);
    assert_eq!(patched.title, saved.title);
    assert_eq!(patched.description, saved.description);
    assert_eq!(patched.category_code, saved.category_code);
    assert_eq!(patched.max_enrollments, saved.max_enrollments);
    assert_eq!(patched.created_at, saved.created_at);
}

#[tokio::test]
async fn test_patch_null_clears_optional_field() {
    let courses = course_service();
    let saved = courses.save(new_course("Rust", 30), &admin()).await.unwrap();

    let patched = courses
        .patch(
            &saved.id.unwrap(),
            CoursePatch {
                description: Patch::Null,
                max_enrollments: Patch::Value(50),
                ..CoursePatch::default()
            },
            &admin(),
        )
        .await
        .unwrap();
    assert_eq!(patched.description, None);
    assert_eq!(patched.max_enrollments, Some(50));
    assert_eq!(patched.title, saved.title);
}

#[tokio::test]
async fn test_patch_null_on_required_field_fails_validation() {
    let users = user_service();
    let saved = users.save(new_user("kc-1", "Ada"), &admin()).await.unwrap();
    let id = saved.id.unwrap();

    let err = users
        .patch(
            &id,
            UserPatch {
                name: Patch::Null,
                ..UserPatch::default()
            },
            &admin(),
        )
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Validation(failure) => assert!(failure.has_field("name")));

    let unchanged = users.get_by_id(&id).await.unwrap();
    assert_eq!(unchanged.name.as_deref(), Some("Ada"));
    assert_eq!(unchanged.version, 1);
}

#[tokio::test]
async fn test_patch_from_json_distinguishes_null_and_absent() {
    let users = user_service();
    let saved = users.save(new_user("kc-1", "Ada"), &admin()).await.unwrap();

    let patch: UserPatch = serde_json::from_str(r#"{"email": null}"#).unwrap();
    let patched = users.patch(&saved.id.unwrap(), patch, &admin()).await.unwrap();
    assert_eq!(patched.name.as_deref(), Some("Ada"));
    assert_eq!(patched.email, None);
}

// ---------------------------------------------------------------------------
// Test: soft delete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_soft_delete_hides_entity_but_keeps_row() {
    let users = user_service();
    let saved = users.save(new_user("kc-1", "Ada"), &admin()).await.unwrap();
    let id = saved.id.unwrap();

    users.delete_by_id(&id, &admin()).await.unwrap();

    assert!(users.find_by_id(&id).await.unwrap().is_none());
    assert_matches!(
        users.get_by_id(&id).await,
        Err(CoreError::NotFound { entity: "User", .. })
    );

    let everything = users
        .find_all_by_specification(&UserFilter::including_deleted())
        .await
        .unwrap();
    assert_eq!(everything.len(), 1);
    assert_eq!(everything[0].id, Some(id));

    let active = users.find_all(PageRequest::default()).await.unwrap();
    assert!(active.items.is_empty());
    assert_eq!(active.total, 0);
}

#[tokio::test]
async fn test_soft_delete_twice_is_a_no_op() {
    let users = user_service();
    let saved = users.save(new_user("kc-1", "Ada"), &admin()).await.unwrap();
    let id = saved.id.unwrap();

    users.delete_by_id(&id, &admin()).await.unwrap();
    users.delete_by_id(&id, &admin()).await.unwrap();

    let stored = users.repository().find_by_id(&id).await.unwrap().unwrap();
    assert!(stored.deleted);
    assert_eq!(stored.version, 2);
}

#[tokio::test]
async fn test_update_and_patch_of_soft_deleted_are_illegal_state() {
    let users = user_service();
    let saved = users.save(new_user("kc-1", "Ada"), &admin()).await.unwrap();
    let id = saved.id.unwrap();
    users.delete_by_id(&id, &admin()).await.unwrap();

    let err = users
        .update(Some(id), new_user("kc-1", "Ada Lovelace"), &admin())
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::IllegalState(msg) => {
        assert_eq!(msg, format!("Cannot update a deleted User with id {id}"));
    });

    let err = users
        .patch(&id, UserPatch::default(), &admin())
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::IllegalState(_));
}

// ---------------------------------------------------------------------------
// Test: hard delete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_hard_delete_removes_row() {
    let courses = course_service();
    let saved = courses.save(new_course("Rust", 30), &admin()).await.unwrap();
    let id = saved.id.unwrap();

    courses.delete_by_id(&id, &admin()).await.unwrap();

    assert!(courses.repository().find_by_id(&id).await.unwrap().is_none());
    assert_matches!(
        courses.delete_by_id(&id, &admin()).await,
        Err(CoreError::NotFound { entity: "Course", .. })
    );
}

// ---------------------------------------------------------------------------
// Test: specification queries
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_find_by_specification_pages_matches() {
    let courses = course_service();
    for title in ["Rust", "Go", "Rust Async", "Trust & Safety", "Python"] {
        courses.save(new_course(title, 10), &admin()).await.unwrap();
    }
    let filter = CourseFilter {
        title_contains: Some("rust".into()),
        ..CourseFilter::default()
    };

    let page = courses
        .find_by_specification(&filter, PageRequest::of(1, 2))
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].title.as_deref(), Some("Trust & Safety"));
    assert_eq!(courses.count_by_specification(&filter).await.unwrap(), 3);
}

#[tokio::test]
async fn test_find_by_category() {
    let courses = course_service();
    let mut systems = new_course("Rust", 10);
    systems.category_code = Some("SYS".into());
    courses.save(systems, &admin()).await.unwrap();
    courses.save(new_course("Watercolour", 10), &admin()).await.unwrap();

    let page = courses
        .find_by_category("SYS", PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].title.as_deref(), Some("Rust"));
}

// ---------------------------------------------------------------------------
// Test: natural and composite keys
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_category_natural_key() {
    let categories = category_service();
    let saved = categories
        .save(new_category("SYS", "Systems"), &admin())
        .await
        .unwrap();
    assert_eq!(saved.code.as_deref(), Some("SYS"));
    assert_eq!(saved.version, 1);

    let err = categories
        .save(new_category("SYS", "Duplicate"), &admin())
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Conflict(_));

    let renamed = categories
        .update(Some("SYS".into()), new_category("IGNORED", "Systems Programming"), &admin())
        .await
        .unwrap();
    assert_eq!(renamed.code.as_deref(), Some("SYS"));
    assert_eq!(renamed.name.as_deref(), Some("Systems Programming"));

    categories.delete_by_id(&"SYS".to_string(), &admin()).await.unwrap();
    assert!(categories.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_categories_are_listed_by_code() {
    let categories = category_service();
    for (code, name) in [("SYS", "Systems"), ("ART", "Arts"), ("MTH", "Mathematics")] {
        categories.save(new_category(code, name), &admin()).await.unwrap();
    }

    let codes: Vec<_> = categories
        .find_all()
        .await
        .unwrap()
        .into_iter()
        .filter_map(|c| c.code)
        .collect();
    assert_eq!(codes, vec!["ART", "MTH", "SYS"]);
}

#[tokio::test]
async fn test_enrollments_page_by_user_then_course() {
    let enrollments = enrollment_service();
    for (user_id, course_id) in [(2, 10), (1, 11), (1, 10)] {
        enrollments
            .save(new_enrollment(user_id, course_id), &admin())
            .await
            .unwrap();
    }

    let page = enrollments
        .find_all_by_specification(&EnrollmentFilter::default())
        .await
        .unwrap();
    let keys: Vec<_> = page
        .iter()
        .map(|e| (e.user_id.unwrap(), e.course_id.unwrap()))
        .collect();
    assert_eq!(keys, vec![(1, 10), (1, 11), (2, 10)]);
}

#[tokio::test]
async fn test_enrollment_composite_key_and_soft_delete() {
    let enrollments = enrollment_service();
    let ctx = admin();
    enrollments.save(new_enrollment(1, 10), &ctx).await.unwrap();
    enrollments.save(new_enrollment(1, 11), &ctx).await.unwrap();
    enrollments.save(new_enrollment(2, 10), &ctx).await.unwrap();

    let key = EnrollmentId::new(1, 10);
    let completed = enrollments
        .patch(
            &key,
            EnrollmentPatch {
                status: Patch::Value(EnrollmentStatus::Completed),
                grade: Patch::Value(87),
            },
            &ctx,
        )
        .await
        .unwrap();
    assert_eq!(completed.status, Some(EnrollmentStatus::Completed));
    assert_eq!(completed.grade, Some(87));

    enrollments.delete_by_id(&EnrollmentId::new(2, 10), &ctx).await.unwrap();

    let in_course = enrollments
        .find_by_course(10, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(in_course.total, 1);
    assert_eq!(in_course.items[0].user_id, Some(1));

    let of_user = enrollments.find_by_user(1, PageRequest::default()).await.unwrap();
    assert_eq!(of_user.total, 2);
}

#[tokio::test]
async fn test_invalid_grade_patch_is_rejected() {
    let enrollments = enrollment_service();
    enrollments.save(new_enrollment(1, 10), &admin()).await.unwrap();

    let err = enrollments
        .patch(
            &EnrollmentId::new(1, 10),
            EnrollmentPatch {
                grade: Patch::Value(140),
                ..EnrollmentPatch::default()
            },
            &admin(),
        )
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Validation(failure) => assert!(failure.has_field("grade")));
}

#[tokio::test]
async fn test_patch_null_status_is_rejected() {
    let enrollments = enrollment_service();
    let key = EnrollmentId::new(1, 10);
    enrollments.save(new_enrollment(1, 10), &admin()).await.unwrap();
    enrollments
        .patch(
            &key,
            EnrollmentPatch {
                status: Patch::Value(EnrollmentStatus::Completed),
                ..EnrollmentPatch::default()
            },
            &admin(),
        )
        .await
        .unwrap();

    let err = enrollments
        .patch(
            &key,
            EnrollmentPatch {
                status: Patch::Null,
                ..EnrollmentPatch::default()
            },
            &admin(),
        )
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Validation(failure) => assert!(failure.has_field("status")));

    let unchanged = enrollments.get_by_id(&key).await.unwrap();
    assert_eq!(unchanged.status, Some(EnrollmentStatus::Completed));
    assert_eq!(unchanged.version, 2);
}

// ---------------------------------------------------------------------------
// Test: user lookups by identity-provider subject
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_find_by_external_id() {
    let users = user_service();
    users.save(new_user("kc-1", "Ada"), &admin()).await.unwrap();
    let grace = users.save(new_user("kc-2", "Grace"), &admin()).await.unwrap();

    let found = users.find_by_external_id("kc-2").await.unwrap().unwrap();
    assert_eq!(found.name.as_deref(), Some("Grace"));
    assert_eq!(users.find_id_by_external_id("kc-2").await.unwrap(), grace.id);
    assert_eq!(users.find_id_by_external_id("nobody").await.unwrap(), None);

    users.delete_by_id(&grace.id.unwrap(), &admin()).await.unwrap();
    assert_eq!(users.find_id_by_external_id("kc-2").await.unwrap(), None);
}

#[tokio::test]
async fn test_audit_stamps_follow_author() {
    let users = user_service();
    let saved = users
        .save(new_user("kc-1", "Ada"), &AuditContext::for_user(7))
        .await
        .unwrap();
    let id = saved.id.unwrap();
    users
        .patch(
            &id,
            UserPatch {
                name: Patch::Value("Ada L.".into()),
                ..UserPatch::default()
            },
            &AuditContext::for_user(8),
        )
        .await
        .unwrap();

    let stored = users.repository().find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(stored.audit.created_by, Some(7));
    assert_eq!(stored.audit.modified_by, Some(8));
}
