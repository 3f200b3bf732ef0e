//! Analysis and cut job integration tests against fake collaborators

mod helpers;

use csync_common::events::{JobEvent, JobNotification};
use csync_common::models::{JobKind, JobStatus, RawTagMap, RoutineType};
use csync_cut::audio::decode_audio_bytes;
use csync_cut::db::songs;
use csync_cut::error::{Collaborator, CutError};
use csync_cut::workflow::{run_analysis, run_cut};
use helpers::*;
use std::sync::Arc;

#[tokio::test]
async fn test_analysis_job_persists_result() {
    let h = TestHarness::new().await;
    let song_id = h.song_with_original().await;
    let mut events = h.event_bus.subscribe();

    let analysis = run_analysis(&h.ctx, song_id).await.unwrap();
    assert_eq!(analysis, fixture_analysis());
    assert_eq!(h.analyzer.call_count(), 1);

    let song = songs::require_song(&h.db, song_id).await.unwrap();
    assert_eq!(song.analysis_status, JobStatus::Ready);
    assert_eq!(song.analysis, Some(fixture_analysis()));
    assert_eq!(song.bpm, Some(120.0));
    assert_eq!(song.original_duration_ms, Some(80_000));
    assert_eq!(song.cut_status, JobStatus::Idle);

    assert_eq!(
        h.notifier.sent(),
        vec![JobNotification::ready(song_id, JobKind::Analysis)]
    );
    let published = events.try_recv().unwrap();
    assert_eq!(published.event, JobEvent::AnalysisComplete);
}

#[tokio::test]
async fn test_analysis_failure_marks_failed_and_notifies() {
    let mut h = TestHarness::new().await;
    h.ctx.analyzer = Arc::new(FakeAnalyzer::failing());
    let song_id = h.song_with_original().await;

    let err = run_analysis(&h.ctx, song_id).await.unwrap_err();
    assert!(matches!(
        err,
        CutError::Collaborator {
            collaborator: Collaborator::Analysis,
            ..
        }
    ));

    let song = songs::require_song(&h.db, song_id).await.unwrap();
    assert_eq!(song.analysis_status, JobStatus::Failed);
    assert!(song.analysis.is_none());

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].payload.status, JobStatus::Failed);
    let message = sent[0].payload.error.clone().unwrap();
    assert!(message.contains("analysis service unavailable"), "{}", message);
}

#[tokio::test]
async fn test_missing_original_is_object_store_error() {
    let h = TestHarness::new().await;
    let song_id = create_song(&h.db, "user-1/project-1/missing.wav").await;

    let err = run_analysis(&h.ctx, song_id).await.unwrap_err();
    assert!(matches!(
        err,
        CutError::Collaborator {
            collaborator: Collaborator::ObjectStore,
            ..
        }
    ));
    assert_eq!(h.analyzer.call_count(), 0);
}

async fn analyzed_song_with_target(h: &TestHarness, target_ms: u64) -> uuid::Uuid {
    let song_id = h.song_with_original().await;
    run_analysis(&h.ctx, song_id).await.unwrap();
    songs::set_target(&h.db, song_id, Some(RoutineType::Custom), target_ms)
        .await
        .unwrap();
    song_id
}

#[tokio::test]
async fn test_cut_job_uploads_and_persists() {
    let h = TestHarness::new().await;
    let song_id = analyzed_song_with_target(&h, 60_000).await;

    let metadata = run_cut(&h.ctx, song_id).await.unwrap();
    assert_eq!(metadata.sections_used, vec!["intro", "verse", "chorus"]);
    assert_eq!(metadata.crossfade_ms, 1000);
    assert_eq!(metadata.tempo_adjustment_pct, 0.0);
    assert_eq!(metadata.final_duration_ms, 60_000);

    let song = songs::require_song(&h.db, song_id).await.unwrap();
    let expected_path = format!("user-1/project-1/cuts/{}.mp3", song_id);
    assert_eq!(song.cut_status, JobStatus::Ready);
    assert_eq!(song.cut_storage_path.as_deref(), Some(expected_path.as_str()));
    assert_eq!(song.cut_duration_ms, Some(60_000));
    assert_eq!(song.cut_metadata, Some(metadata));

    assert_eq!(h.store.content_type(&expected_path).as_deref(), Some("audio/mpeg"));
    let uploaded = h.store.get(&expected_path).unwrap();
    let decoded = decode_audio_bytes(uploaded, Some("wav")).unwrap();
    assert_eq!(decoded.duration_ms(), 60_000);

    let sent = h.notifier.sent();
    assert_eq!(sent.last(), Some(&JobNotification::ready(song_id, JobKind::Cut)));
}

#[tokio::test]
async fn test_cut_stretches_within_band() {
    let h = TestHarness::new().await;
    let song_id = analyzed_song_with_target(&h, 66_000).await;

    let metadata = run_cut(&h.ctx, song_id).await.unwrap();
    assert_eq!(metadata.tempo_adjustment_pct, -2.9);
    assert_eq!(metadata.final_duration_ms, 66_000);
}

#[tokio::test]
async fn test_cut_without_target_fails() {
    let h = TestHarness::new().await;
    let song_id = h.song_with_original().await;
    run_analysis(&h.ctx, song_id).await.unwrap();

    let err = run_cut(&h.ctx, song_id).await.unwrap_err();
    assert!(matches!(err, CutError::MissingTargetDuration(id) if id == song_id));

    let song = songs::require_song(&h.db, song_id).await.unwrap();
    assert_eq!(song.cut_status, JobStatus::Failed);
    assert_eq!(song.analysis_status, JobStatus::Ready);

    let last = h.notifier.sent().pop().unwrap();
    assert_eq!(last.event, JobEvent::CutComplete);
    assert_eq!(last.payload.status, JobStatus::Failed);
}

#[tokio::test]
async fn test_cut_without_analysis_fails() {
    let h = TestHarness::new().await;
    let song_id = h.song_with_original().await;
    songs::set_target(&h.db, song_id, Some(RoutineType::Solo), 150_000)
        .await
        .unwrap();

    let err = run_cut(&h.ctx, song_id).await.unwrap_err();
    assert!(matches!(err, CutError::MissingAnalysis(_)));
}

#[tokio::test]
async fn test_failed_rerun_keeps_previous_cut() {
    let h = TestHarness::new().await;
    let song_id = analyzed_song_with_target(&h, 60_000).await;
    let first = run_cut(&h.ctx, song_id).await.unwrap();

    let mut failing = h.ctx.clone();
    failing.normalizer = Arc::new(FailingNormalizer);
    let err = run_cut(&failing, song_id).await.unwrap_err();
    assert!(matches!(
        err,
        CutError::Collaborator {
            collaborator: Collaborator::Normalizer,
            ..
        }
    ));

    let song = songs::require_song(&h.db, song_id).await.unwrap();
    assert_eq!(song.cut_status, JobStatus::Failed);
    assert_eq!(song.cut_metadata, Some(first));
    assert!(song.cut_storage_path.is_some());

    let last = h.notifier.sent().pop().unwrap();
    assert_eq!(
        last.payload.error.as_deref(),
        Some("normalizer failed: loudnorm exited with status 1")
    );
}

#[tokio::test]
async fn test_empty_cut_is_not_persisted() {
    let h = TestHarness::new().await;
    let song_id = analyzed_song_with_target(&h, 60_000).await;
    let first = run_cut(&h.ctx, song_id).await.unwrap();
    let path = songs::require_song(&h.db, song_id)
        .await
        .unwrap()
        .cut_storage_path
        .unwrap();
    let first_upload = h.store.get(&path);
    assert!(first_upload.is_some());

    // Re-analysis with a single downbeat: every section snaps to 0 ms
    let mut analysis = fixture_analysis();
    analysis.downbeats = vec![0.0];
    songs::complete_analysis(&h.db, song_id, &analysis, 80_000)
        .await
        .unwrap();

    let err = run_cut(&h.ctx, song_id).await.unwrap_err();
    assert!(matches!(err, CutError::EmptySelection));

    let song = songs::require_song(&h.db, song_id).await.unwrap();
    assert_eq!(song.cut_status, JobStatus::Failed);
    assert_eq!(song.cut_metadata, Some(first));
    assert_eq!(song.cut_storage_path, Some(path.clone()));
    assert_eq!(h.store.get(&path), first_upload);

    let last = h.notifier.sent().pop().unwrap();
    assert_eq!(last.payload.status, JobStatus::Failed);
    assert_eq!(
        last.payload.error.as_deref(),
        Some("Cannot assemble an empty selection")
    );
}

#[tokio::test]
async fn test_tags_shape_the_cut() {
    let h = TestHarness::new().await;
    let song_id = analyzed_song_with_target(&h, 60_000).await;

    let mut tags = RawTagMap::new();
    tags.insert("outro1".to_string(), "OPEN".to_string());
    tags.insert("intro1".to_string(), "FINALE".to_string());
    tags.insert("verse1".to_string(), "SKIP".to_string());
    // Written by another client; ignored
    tags.insert("chorus1".to_string(), "maybe".to_string());
    songs::set_section_tags(&h.db, song_id, &tags).await.unwrap();

    let metadata = run_cut(&h.ctx, song_id).await.unwrap();
    assert_eq!(metadata.sections_used, vec!["outro", "chorus", "intro"]);
}

#[tokio::test]
async fn test_all_sections_skipped_fails() {
    let h = TestHarness::new().await;
    let song_id = analyzed_song_with_target(&h, 60_000).await;

    let tags: RawTagMap = ["intro1", "verse1", "chorus1", "outro1"]
        .into_iter()
        .map(|name| (name.to_string(), "SKIP".to_string()))
        .collect();
    songs::set_section_tags(&h.db, song_id, &tags).await.unwrap();

    let err = run_cut(&h.ctx, song_id).await.unwrap_err();
    assert!(matches!(err, CutError::NoSectionsSelected));
    assert_eq!(h.store.len(), 1, "nothing uploaded besides the original");

    let last = h.notifier.sent().pop().unwrap();
    assert_eq!(last.payload.error.as_deref(), Some("No sections selected for the cut"));
}
