use chrono::Duration;
use lingua_core::model::{
    KeywordId, KeywordProgress, LearningMode, LearningSession, RecoverySnapshot, SessionEndReason,
    StoryId, ThemeId, UserId,
};
use lingua_core::settings::ProgressSettings;
use lingua_core::time::fixed_now;
use storage::repository::{
    KeywordProgressRepository, RecoveryRepository, StudyLogEntry, StudyLogRepository,
};
use storage::sqlite::SqliteRepository;

fn attempted_keyword(story: u64, keyword: u64, answers: &[bool]) -> KeywordProgress {
    let settings = ProgressSettings::default();
    let mut progress = KeywordProgress::new(KeywordId::new(keyword), StoryId::new(story));
    for &correct in answers {
        progress.record_attempt(
            correct,
            3,
            fixed_now(),
            settings.mastery_threshold(),
            settings.review_window(),
        );
    }
    progress
}

#[tokio::test]
async fn sqlite_roundtrips_keyword_progress() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_keywords?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let user = UserId::new(1);
    let progress = attempted_keyword(10, 7, &[true, false, true]);
    repo.upsert_keyword(user, &progress).await.unwrap();

    let fetched = repo
        .get_keyword(user, StoryId::new(10), KeywordId::new(7))
        .await
        .unwrap()
        .expect("record persisted");
    assert_eq!(fetched.attempts(), 3);
    assert!((fetched.accuracy() - 2.0 / 3.0).abs() < 1e-9);
    assert!(fetched.is_unlocked());
    assert!(!fetched.is_mastered());
    assert_eq!(fetched.last_reviewed_at(), progress.last_reviewed_at());

    // Upsert replaces in place rather than duplicating.
    let updated = attempted_keyword(10, 7, &[true, true, true, true, true]);
    repo.upsert_keyword(user, &updated).await.unwrap();
    let listed = repo.list_for_story(user, StoryId::new(10)).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].is_mastered());
}

#[tokio::test]
async fn sqlite_scopes_listings_by_user_and_story() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_scoping?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    for (user, story, keyword) in [(1_u64, 10_u64, 1_u64), (1, 10, 2), (1, 11, 3), (2, 10, 9)] {
        repo.upsert_keyword(UserId::new(user), &attempted_keyword(story, keyword, &[true]))
            .await
            .unwrap();
    }

    let story = repo
        .list_for_story(UserId::new(1), StoryId::new(10))
        .await
        .unwrap();
    assert_eq!(story.len(), 2);
    assert_eq!(story[0].keyword_id(), KeywordId::new(1));

    let all = repo.list_for_user(UserId::new(1)).await.unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn sqlite_snapshot_overwrites_and_clears() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_recovery?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let user = UserId::new(1);
    let mut session = LearningSession::start(
        user,
        StoryId::new(10),
        ThemeId::new(2),
        LearningMode::Review,
        fixed_now(),
    );
    repo.save_snapshot(&RecoverySnapshot::capture(&session, fixed_now()))
        .await
        .unwrap();

    session.note_answer(true);
    let later = fixed_now() + Duration::minutes(2);
    repo.save_snapshot(&RecoverySnapshot::capture(&session, later))
        .await
        .unwrap();

    let loaded = repo
        .load_snapshot(user)
        .await
        .unwrap()
        .expect("snapshot persisted");
    assert_eq!(loaded.saved_at(), later);
    assert_eq!(loaded.session().answered(), 1);
    assert_eq!(loaded.session().mode(), LearningMode::Review);
    assert!(loaded.can_recover());
    assert!(loaded.session().is_active());

    repo.clear_snapshot(user).await.unwrap();
    assert!(repo.load_snapshot(user).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_study_log_supports_streak_queries() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_studylog?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let user = UserId::new(1);
    for days_ago in [0_i64, 0, 1, 4] {
        let ended_at = fixed_now() - Duration::days(days_ago);
        let session = LearningSession::start(
            user,
            StoryId::new(10),
            ThemeId::new(1),
            LearningMode::Story,
            ended_at - Duration::minutes(10),
        );
        let entry = StudyLogEntry {
            id: None,
            user_id: user,
            session_id: session.id(),
            story_id: session.story_id(),
            theme_id: session.theme_id(),
            reason: SessionEndReason::Completed,
            started_at: session.started_at(),
            ended_at,
            answered: 6,
            correct: 5,
        };
        let id = repo.append_entry(&entry).await.unwrap();
        assert!(id > 0);
    }

    let dates = repo.study_dates(user).await.unwrap();
    assert_eq!(dates.len(), 3);
    assert!(dates[0] > dates[1]);

    let recent = repo
        .count_entries_since(user, fixed_now() - Duration::days(2))
        .await
        .unwrap();
    assert_eq!(recent, 3);

    // Other users do not bleed into the counts.
    let other = repo.study_dates(UserId::new(2)).await.unwrap();
    assert!(other.is_empty());
}
