//! Change history through the entity services.

mod common;

use common::*;
use enroll_core::audit::AuditContext;
use enroll_core::pagination::PageRequest;
use enroll_core::patch::Patch;
use enroll_core::revision::RevisionKind;
use enroll_db::models::course::CoursePatch;
use enroll_db::models::user::UserPatch;

fn rename(name: &str) -> UserPatch {
    UserPatch {
        name: Patch::Value(name.to_string()),
        ..UserPatch::default()
    }
}

// ---------------------------------------------------------------------------
// Test: paging through five revisions two at a time
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_third_page_holds_only_fifth_revision() {
    let users = user_service();
    let ctx = AuditContext::for_user(3);
    let saved = users.save(new_user("kc-1", "v1"), &ctx).await.unwrap();
    let id = saved.id.unwrap();
    for name in ["v2", "v3", "v4", "v5"] {
        users.patch(&id, rename(name), &ctx).await.unwrap();
    }

    let page = users
        .find_user_revisions(id, PageRequest::of(2, 2))
        .await
        .unwrap()
        .expect("user exists");

    assert_eq!(page.total, 5);
    assert_eq!(page.items.len(), 1);
    let last = &page.items[0];
    assert_eq!(last.number(), 5);
    assert_eq!(last.kind, RevisionKind::Mod);
    assert_eq!(last.entity.name.as_deref(), Some("v5"));
    assert_eq!(last.metadata.author, Some(3));
}

#[tokio::test]
async fn test_first_revision_is_the_insert() {
    let users = user_service();
    let saved = users
        .save(new_user("kc-1", "Ada"), &AuditContext::anonymous())
        .await
        .unwrap();
    let id = saved.id.unwrap();
    users
        .patch(&id, rename("Ada L."), &AuditContext::for_user(id))
        .await
        .unwrap();

    let page = users
        .find_user_revisions(id, PageRequest::default())
        .await
        .unwrap()
        .unwrap();
    let kinds: Vec<_> = page.items.iter().map(|r| r.kind).collect();
    assert_eq!(kinds, vec![RevisionKind::Add, RevisionKind::Mod]);
    assert_eq!(page.items[0].metadata.author, None);
    assert_eq!(page.items[0].entity.name.as_deref(), Some("Ada"));
    assert!(!page.has_next());
}

#[tokio::test]
async fn test_revisions_of_unknown_user_are_none() {
    let users = user_service();
    let revisions = users
        .find_user_revisions(12, PageRequest::default())
        .await
        .unwrap();
    assert!(revisions.is_none());
}

#[tokio::test]
async fn test_revision_page_far_past_the_end_is_empty() {
    let users = user_service();
    let saved = users
        .save(new_user("kc-1", "Ada"), &AuditContext::for_user(3))
        .await
        .unwrap();

    let page = users
        .find_user_revisions(saved.id.unwrap(), PageRequest::of(usize::MAX / 2, 4))
        .await
        .unwrap()
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total, 1);
    assert!(!page.has_next());
}

#[tokio::test]
async fn test_soft_delete_is_recorded_as_modification() {
    let users = user_service();
    let ctx = AuditContext::for_user(1);
    let saved = users.save(new_user("kc-1", "Ada"), &ctx).await.unwrap();
    let id = saved.id.unwrap();
    users.delete_by_id(&id, &ctx).await.unwrap();

    let last = users.find_last_change_revision(id).await.unwrap().unwrap();
    assert_eq!(last.number(), 2);
    assert_eq!(last.kind, RevisionKind::Mod);

    // History stays readable after the user disappeared from queries.
    assert!(users.find_user_revisions(id, PageRequest::default()).await.unwrap().is_some());
}

#[tokio::test]
async fn test_point_lookup_and_missing_revision() {
    let users = user_service();
    let ctx = AuditContext::for_user(1);
    let saved = users.save(new_user("kc-1", "v1"), &ctx).await.unwrap();
    let id = saved.id.unwrap();
    users.patch(&id, rename("v2"), &ctx).await.unwrap();

    let first = users.find_user_revision(id, 1).await.unwrap();
    assert_eq!(first.entity.name.as_deref(), Some("v1"));
    assert_eq!(first.entity.version, 1);

    assert!(users.find_user_revision(id, 99).await.is_none());
}

// ---------------------------------------------------------------------------
// Test: hard-deleted courses keep their history
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_course_deletion_revision_keeps_last_state() {
    let courses = course_service();
    let ctx = AuditContext::for_user(1);
    let saved = courses.save(new_course("Rust", 30), &ctx).await.unwrap();
    let id = saved.id.unwrap();
    courses
        .patch(
            &id,
            CoursePatch {
                max_enrollments: Patch::Value(40),
                ..CoursePatch::default()
            },
            &ctx,
        )
        .await
        .unwrap();
    courses.delete_by_id(&id, &ctx).await.unwrap();

    let history = courses
        .find_course_revisions(id, PageRequest::default())
        .await
        .unwrap();
    let kinds: Vec<_> = history.items.iter().map(|r| r.kind).collect();
    assert_eq!(kinds, vec![RevisionKind::Add, RevisionKind::Mod, RevisionKind::Del]);
    assert_eq!(history.items[2].entity.max_enrollments, Some(40));

    let at_delete = courses.find_course_revision(id, 3).await.unwrap();
    assert_eq!(at_delete.kind, RevisionKind::Del);
}
