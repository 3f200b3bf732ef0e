//! Test Helper Utilities
//!
//! Shared utilities for testing csync-cut: fixture audio, a temporary
//! database, and fake collaborators.

#![allow(dead_code)]

pub mod audio_generator;
pub mod db_utils;
pub mod fakes;

pub use audio_generator::{constant_wav_bytes, fixture_analysis, tone_wav_bytes};
pub use db_utils::{create_song, create_test_db};
pub use fakes::{
    FailingNormalizer, FakeAnalyzer, MemoryObjectStore, RecordingNotifier, WavEncoder,
};

use csync_common::events::EventBus;
use csync_cut::collaborators::{EventBusNotifier, FanoutNotifier, Normalizer, PassthroughNormalizer};
use csync_cut::services::CutPipeline;
use csync_cut::workflow::JobContext;
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

/// Storage path of the fixture original
pub const ORIGINAL_PATH: &str = "user-1/project-1/song.wav";

/// Job context wired to fakes, plus handles to inspect them
pub struct TestHarness {
    pub _temp_dir: TempDir,
    pub db: SqlitePool,
    pub ctx: JobContext,
    pub store: Arc<MemoryObjectStore>,
    pub analyzer: Arc<FakeAnalyzer>,
    pub notifier: Arc<RecordingNotifier>,
    pub event_bus: EventBus,
}

impl TestHarness {
    /// Harness with a passthrough normalizer and the fixture analysis
    pub async fn new() -> Self {
        Self::with_normalizer(Arc::new(PassthroughNormalizer)).await
    }

    pub async fn with_normalizer(normalizer: Arc<dyn Normalizer>) -> Self {
        let (temp_dir, db) = create_test_db().await.unwrap();
        let store = Arc::new(MemoryObjectStore::default());
        let analyzer = Arc::new(FakeAnalyzer::returning(fixture_analysis()));
        let notifier = Arc::new(RecordingNotifier::default());
        let event_bus = EventBus::new(16);

        let fanout = FanoutNotifier::default()
            .with(notifier.clone())
            .with(Arc::new(EventBusNotifier::new(event_bus.clone())));

        let ctx = JobContext {
            db: db.clone(),
            analyzer: analyzer.clone(),
            object_store: store.clone(),
            normalizer,
            encoder: Arc::new(WavEncoder),
            notifier: Arc::new(fanout),
            pipeline: Arc::new(CutPipeline::default()),
        };

        Self {
            _temp_dir: temp_dir,
            db,
            ctx,
            store,
            analyzer,
            notifier,
            event_bus,
        }
    }

    /// Register a song whose original (80 s at 1 kHz) is in the store
    pub async fn song_with_original(&self) -> Uuid {
        self.store.insert(ORIGINAL_PATH, constant_wav_bytes(80.0, 0.2));
        create_song(&self.db, ORIGINAL_PATH).await
    }
}
