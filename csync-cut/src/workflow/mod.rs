//! Per-song background jobs
//!
//! Two independent jobs exist for every song:
//! - **Analysis**: download the original, run structure analysis, persist it
//! - **Cut**: assemble, normalize, encode and upload a competition cut
//!
//! Both run inside [`JobStatusTracker::track`], which owns the
//! `idle → running → {ready, failed}` transitions and the notifications.

pub mod active;
pub mod analysis_job;
pub mod cut_job;
pub mod tracker;

pub use active::{ActiveJobGuard, ActiveJobs};
pub use analysis_job::run_analysis;
pub use cut_job::run_cut;
pub use tracker::JobStatusTracker;

use anyhow::anyhow;
use csync_common::events::EventBus;
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::collaborators::{
    AudioEncoder, CommandAnalyzer, EventBusNotifier, FanoutNotifier, FfmpegLoudnorm,
    FfmpegMp3Encoder, HttpObjectStore, LocalObjectStore, Normalizer, Notifier, ObjectStore,
    PassthroughNormalizer, StructureAnalyzer, WebhookNotifier,
};
use crate::config::{CutServiceConfig, StorageConfig};
use crate::services::CutPipeline;

/// Everything a job needs: record store, collaborators and the pipeline
#[derive(Clone)]
pub struct JobContext {
    pub db: SqlitePool,
    pub analyzer: Arc<dyn StructureAnalyzer>,
    pub object_store: Arc<dyn ObjectStore>,
    pub normalizer: Arc<dyn Normalizer>,
    pub encoder: Arc<dyn AudioEncoder>,
    pub notifier: Arc<dyn Notifier>,
    pub pipeline: Arc<CutPipeline>,
}

impl JobContext {
    /// Build the production collaborators from configuration
    ///
    /// `objects_root` is the local object store directory used when the
    /// config does not name one. Notifications go to `event_bus` and, when
    /// configured, the webhook.
    pub fn from_config(
        config: &CutServiceConfig,
        objects_root: &Path,
        db: SqlitePool,
        event_bus: EventBus,
    ) -> anyhow::Result<Self> {
        let object_store: Arc<dyn ObjectStore> = match &config.storage {
            StorageConfig::Local { path } => {
                let root = path.clone().unwrap_or_else(|| objects_root.to_path_buf());
                info!("Object store: local directory {}", root.display());
                Arc::new(LocalObjectStore::new(root))
            }
            StorageConfig::Http { base_url, bucket, .. } => {
                let api_key = config.storage_api_key().ok_or_else(|| {
                    anyhow!(
                        "HTTP object store requires an API key ({} or [storage] api_key)",
                        crate::config::STORAGE_API_KEY_ENV
                    )
                })?;
                info!("Object store: {} bucket {}", base_url, bucket);
                Arc::new(HttpObjectStore::new(base_url.clone(), bucket.clone(), api_key)?)
            }
        };

        let analyzer = CommandAnalyzer::new(
            config.analysis.command.clone(),
            config.analysis.args.clone(),
        );
        if !analyzer.is_available() {
            warn!(
                "Analysis command '{}' not found; analysis jobs will fail",
                config.analysis.command
            );
        }

        let normalizer: Arc<dyn Normalizer> = if config.normalization.enabled {
            let loudnorm = FfmpegLoudnorm::new(
                config.normalization.ffmpeg_path.clone(),
                config.normalization.target,
            );
            if !loudnorm.is_available() {
                warn!(
                    "ffmpeg not found at '{}'; cut jobs will fail at normalization",
                    config.normalization.ffmpeg_path
                );
            }
            Arc::new(loudnorm)
        } else {
            info!("Loudness normalization disabled");
            Arc::new(PassthroughNormalizer)
        };

        let encoder = FfmpegMp3Encoder::new(
            config.encoder.ffmpeg_path.clone(),
            config.encoder.bitrate_kbps,
        );

        let webhook = WebhookNotifier::new(config.webhook.url.clone(), config.webhook_secret());
        if !webhook.is_configured() {
            info!("No webhook configured; notifications stay in-process");
        }
        let notifier = FanoutNotifier::default()
            .with(Arc::new(EventBusNotifier::new(event_bus)))
            .with(Arc::new(webhook));

        Ok(Self {
            db,
            analyzer: Arc::new(analyzer),
            object_store,
            normalizer,
            encoder: Arc::new(encoder),
            notifier: Arc::new(notifier),
            pipeline: Arc::new(CutPipeline::new(config.pipeline_settings())),
        })
    }

    pub fn tracker(&self) -> JobStatusTracker {
        JobStatusTracker::new(self.db.clone(), Arc::clone(&self.notifier))
    }
}
