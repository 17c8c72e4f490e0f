use std::sync::Arc;

use lingua_core::model::{
    Catalog, KeywordId, LearningMode, RecoveryState, SessionEndReason, SessionId, StoryEntry,
    StoryId, ThemeEntry, ThemeId, UserId,
};
use lingua_core::settings::ProgressSettings;
use lingua_core::time::{fixed_clock, fixed_now};
use services::error::SessionError;
use services::events::{LearningEvent, MemoryEventSink};
use services::progress::{ProgressCache, ProgressService};
use services::sessions::SessionManager;
use storage::repository::Storage;

fn build_catalog() -> Arc<Catalog> {
    Arc::new(Catalog::new(vec![ThemeEntry {
        theme_id: ThemeId::new(1),
        stories: vec![StoryEntry {
            story_id: StoryId::new(10),
            keyword_count: 3,
        }],
    }]))
}

fn build_manager(storage: &Storage, cache: ProgressCache, sink: &MemoryEventSink) -> SessionManager {
    SessionManager::new(
        fixed_clock(),
        ProgressSettings::default(),
        storage,
        cache,
        Arc::new(sink.clone()),
    )
}

#[tokio::test]
async fn full_session_flow_updates_progress_and_log() {
    let storage = Storage::in_memory();
    let cache = ProgressCache::new();
    let sink = MemoryEventSink::new();
    let mut mgr = build_manager(&storage, cache.clone(), &sink);
    let user = UserId::new(1);

    let session = mgr
        .start_session(user, StoryId::new(10), ThemeId::new(1), LearningMode::Story)
        .await
        .unwrap();
    assert!(session.is_active());

    // A second start while one is running is a conflict.
    let err = mgr
        .start_session(user, StoryId::new(10), ThemeId::new(1), LearningMode::Story)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::AlreadyActive));

    // First correct answer masters the keyword outright (1/1 >= threshold).
    let first = mgr
        .record_answer(session.id(), KeywordId::new(1), true, 4)
        .await
        .unwrap();
    assert!(first.newly_mastered);

    let second = mgr
        .record_answer(session.id(), KeywordId::new(2), false, 6)
        .await
        .unwrap();
    assert!(!second.newly_mastered);
    assert!((second.accuracy).abs() < 1e-9);

    mgr.end_session(session.id(), SessionEndReason::Completed)
        .await
        .unwrap();
    // Ending again, or ending a stranger, is silently ignored.
    mgr.end_session(session.id(), SessionEndReason::UserExit)
        .await
        .unwrap();
    mgr.end_session(SessionId::generate(), SessionEndReason::Completed)
        .await
        .unwrap();

    let dates = storage.study_log.study_dates(user).await.unwrap();
    assert_eq!(dates.len(), 1);
    assert_eq!(
        storage
            .study_log
            .count_entries_since(user, fixed_now() - chrono::Duration::days(1))
            .await
            .unwrap(),
        1
    );

    // Snapshot is gone once the session ends cleanly.
    assert_eq!(
        mgr.recovery_state(user).await.unwrap(),
        RecoveryState::None
    );

    let events = sink.events();
    assert!(matches!(events.first(), Some(LearningEvent::SessionStarted { .. })));
    assert!(matches!(events.last(), Some(LearningEvent::SessionEnded { .. })));
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, LearningEvent::KeywordMastered { .. }))
            .count(),
        1
    );

    let progress = ProgressService::new(build_catalog(), storage.keywords.clone(), cache)
        .overall_progress(user)
        .await
        .unwrap();
    assert_eq!(progress.keywords_learned, 2);
    assert_eq!(progress.total_stories, 1);
}

#[tokio::test]
async fn interrupted_session_is_recovered_with_its_tally() {
    let storage = Storage::in_memory();
    let sink = MemoryEventSink::new();
    let mut mgr = build_manager(&storage, ProgressCache::new(), &sink);
    let user = UserId::new(1);

    let session = mgr
        .start_session(user, StoryId::new(10), ThemeId::new(1), LearningMode::Review)
        .await
        .unwrap();
    mgr.record_answer(session.id(), KeywordId::new(1), true, 4)
        .await
        .unwrap();
    mgr.record_answer(session.id(), KeywordId::new(2), true, 4)
        .await
        .unwrap();

    // App dies without end_session; the next launch gets a fresh manager
    // over the same storage.
    drop(mgr);
    let mut relaunched = build_manager(&storage, ProgressCache::new(), &sink);

    let snapshot = match relaunched.recovery_state(user).await.unwrap() {
        RecoveryState::Resumable(snap) => snap,
        other => panic!("expected resumable snapshot, got {other:?}"),
    };
    assert_eq!(snapshot.session().answered(), 2);

    let resumed = relaunched.recover_session(snapshot).await.unwrap();
    assert_eq!(resumed.id(), session.id());
    assert_eq!(resumed.correct(), 2);

    relaunched
        .record_answer(resumed.id(), KeywordId::new(3), false, 5)
        .await
        .unwrap();
    relaunched
        .end_session(resumed.id(), SessionEndReason::Completed)
        .await
        .unwrap();
    assert_eq!(
        relaunched.recovery_state(user).await.unwrap(),
        RecoveryState::None
    );
}

#[tokio::test]
async fn discarding_a_snapshot_logs_an_interrupted_entry() {
    let storage = Storage::in_memory();
    let sink = MemoryEventSink::new();
    let mut mgr = build_manager(&storage, ProgressCache::new(), &sink);
    let user = UserId::new(1);

    let session = mgr
        .start_session(user, StoryId::new(10), ThemeId::new(1), LearningMode::Story)
        .await
        .unwrap();
    mgr.record_answer(session.id(), KeywordId::new(1), true, 3)
        .await
        .unwrap();
    drop(mgr);

    let mut relaunched = build_manager(&storage, ProgressCache::new(), &sink);
    relaunched.discard_recovery(user).await.unwrap();

    assert_eq!(
        relaunched.recovery_state(user).await.unwrap(),
        RecoveryState::None
    );
    // The abandoned sitting still counts as a study day.
    let dates = storage.study_log.study_dates(user).await.unwrap();
    assert_eq!(dates.len(), 1);
}
