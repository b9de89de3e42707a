use course_core::model::{ExerciseCodes, LessonId, ProgressMap, QuizId, QuizResult, QuizResults};
use storage::local_store::{DARK_MODE_KEY, PROGRESS_KEY};
use storage::repository::{KeyValueStore, Storage};
use storage::sqlite::SqliteRepository;

#[tokio::test]
async fn sqlite_kv_upserts_and_removes() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    assert_eq!(repo.get("progress").await.unwrap(), None);
    repo.set("progress", "{}").await.unwrap();
    repo.set("progress", r#"{"1":{"completed":true}}"#).await.unwrap();
    assert_eq!(
        repo.get("progress").await.unwrap().as_deref(),
        Some(r#"{"1":{"completed":true}}"#)
    );

    repo.remove("progress").await.unwrap();
    assert_eq!(repo.get("progress").await.unwrap(), None);
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.set("darkMode", "true").await.unwrap();
    repo.migrate().await.expect("second migrate");
    assert_eq!(repo.get("darkMode").await.unwrap().as_deref(), Some("true"));
}

#[tokio::test]
async fn local_store_snapshot_survives_reconnect() {
    let url = "sqlite:file:memdb_snapshot?mode=memory&cache=shared";
    // keep one pool alive so the shared in-memory database is not dropped
    let keeper = Storage::sqlite(url).await.expect("storage");

    let store = keeper.local_store();
    let mut progress = ProgressMap::new();
    progress.mark_completed(LessonId::new(10));
    progress.add_time(LessonId::new(11), 45);
    store.save_progress(&progress).await.unwrap();

    let mut quizzes = QuizResults::new();
    quizzes.insert_once(
        QuizId::new(7),
        QuizResult {
            selected_answer: 1,
            is_correct: true,
        },
    );
    store.save_quiz_results(&quizzes).await.unwrap();

    let mut codes = ExerciseCodes::default();
    codes.set(LessonId::new(11), "x = 1");
    store.save_exercise_codes(&codes).await.unwrap();
    store.save_dark_mode(true).await.unwrap();

    let reopened = Storage::sqlite(url).await.expect("reopen");
    let snapshot = reopened.local_store().load_snapshot().await;
    assert_eq!(snapshot.progress, progress);
    assert_eq!(snapshot.quiz_results, quizzes);
    assert_eq!(snapshot.exercise_codes, codes);
    assert!(snapshot.dark_mode);
}

#[tokio::test]
async fn corrupted_rows_load_as_empty() {
    let storage = Storage::sqlite("sqlite:file:memdb_corrupt?mode=memory&cache=shared")
        .await
        .expect("storage");
    storage.kv.set(PROGRESS_KEY, "][").await.unwrap();
    storage.kv.set(DARK_MODE_KEY, "{}").await.unwrap();

    let snapshot = storage.local_store().load_snapshot().await;
    assert!(snapshot.progress.is_empty());
    assert!(!snapshot.dark_mode);
}
