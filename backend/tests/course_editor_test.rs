mod common;

use std::sync::Arc;

use campus_admin::clock::FixedClock;
use campus_admin::error::AppError;
use campus_admin::models::{Course, CourseField, Identity, Semester};
use campus_admin::services::CourseEditor;
use campus_admin::store::DocumentStore;
use chrono::{TimeZone, Utc};
use common::{Call, RecordingStore, fields};
use serde_json::json;

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2025, 4, 10, 8, 30, 0).unwrap()))
}

async fn seed_course(store: &RecordingStore, semester: Semester, key: &str, code: &str) {
    store
        .inner()
        .merge_update(
            &Course::collection(semester),
            key,
            fields(json!({
                "code": code,
                "name": "Seeded",
                "teachers": ["Dr. A", ""],
                "createdAt": "2025-01-01T00:00:00.000Z"
            })),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn save_merges_persisted_rows_and_creates_drafts() {
    let store = Arc::new(RecordingStore::new());
    seed_course(&store, Semester::First, "abc123", "CSE-101").await;

    let mut editor = CourseEditor::new(store.clone(), clock(), Semester::First);
    editor.load().await;
    let draft = editor.add_blank();
    editor.edit_field(draft, CourseField::Code, "CSE-102").unwrap();
    store.clear_calls();

    let report = editor.save().await.unwrap();
    assert_eq!((report.updated, report.created, report.deleted), (1, 1, 0));

    let writes = store.writes();
    let semester_path = "courses/main/1st".to_string();
    assert_eq!(
        writes.iter().filter(|c| matches!(c, Call::Merge(p, k) if *p == semester_path && k == "abc123")).count(),
        1
    );
    assert_eq!(writes.iter().filter(|c| matches!(c, Call::Create(_))).count(), 1);
    assert_eq!(writes[0], Call::Merge("courses".to_string(), "main".to_string()));

    let stored = store.inner().list_all(&Course::collection(Semester::First), None).await.unwrap();
    let created_key = stored
        .iter()
        .map(|doc| doc.key.clone())
        .find(|key| key != "abc123")
        .expect("created document missing");
    assert_eq!(editor.courses()[1].id, Identity::Persisted(created_key));
}

#[tokio::test]
async fn deleting_a_draft_makes_no_store_calls() {
    let store = Arc::new(RecordingStore::new());
    let mut editor = CourseEditor::new(store.clone(), clock(), Semester::Third);
    editor.add_blank();
    store.clear_calls();

    editor.delete_at(0).await.unwrap();
    assert!(store.calls().is_empty());
    assert!(editor.courses().is_empty());
}

#[tokio::test]
async fn deleting_a_persisted_row_issues_one_delete() {
    let store = Arc::new(RecordingStore::new());
    seed_course(&store, Semester::Fourth, "k1", "MATH-201").await;

    let mut editor = CourseEditor::new(store.clone(), clock(), Semester::Fourth);
    editor.load().await;
    store.clear_calls();

    let removed = editor.delete_at(0).await.unwrap();
    assert_eq!(removed.code, "MATH-201");
    assert_eq!(
        store.calls(),
        vec![Call::Delete("courses/main/4th".to_string(), "k1".to_string())]
    );
    assert!(editor.courses().is_empty());
}

#[tokio::test]
async fn failed_delete_keeps_the_row() {
    let store = Arc::new(RecordingStore::new());
    seed_course(&store, Semester::Fourth, "k1", "MATH-201").await;

    let mut editor = CourseEditor::new(store.clone(), clock(), Semester::Fourth);
    editor.load().await;
    store.fail_writes_after(0);

    assert!(matches!(editor.delete_at(0).await, Err(AppError::Store(_))));
    assert_eq!(editor.courses().len(), 1);
}

#[tokio::test]
async fn partial_save_reports_progress_and_keeps_created_keys() {
    let store = Arc::new(RecordingStore::new());
    let mut editor = CourseEditor::new(store.clone(), clock(), Semester::Second);
    editor.load().await;
    editor.generate_sample();

    // root marker and the first draft succeed
    store.fail_writes_after(2);
    match editor.save().await {
        Err(AppError::PartialSave { written, total, .. }) => {
            assert_eq!(written, 2);
            assert_eq!(total, 5);
        }
        other => panic!("expected a partial save, got {:?}", other.map(|_| ())),
    }

    assert!(editor.courses()[0].id.persisted_key().is_some());
    assert!(editor.courses()[1..].iter().all(|c| c.id.is_draft()));
}

#[tokio::test]
async fn failed_load_falls_back_to_empty() {
    let store = Arc::new(RecordingStore::new());
    seed_course(&store, Semester::First, "abc123", "CSE-101").await;
    store.fail_reads(true);

    let mut editor = CourseEditor::new(store.clone(), clock(), Semester::First);
    editor.load().await;
    assert!(editor.courses().is_empty());
}
