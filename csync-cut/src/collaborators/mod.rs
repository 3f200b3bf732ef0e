//! External collaborators of the cut pipeline
//!
//! Each collaborator is a trait so jobs can run against fakes in tests:
//! - [`StructureAnalyzer`]: audio file → sections, beats, downbeats, bpm
//! - [`ObjectStore`]: raw audio bytes by storage path
//! - [`Normalizer`]: loudness normalization of a waveform
//! - [`AudioEncoder`]: final waveform → distributable file
//! - [`Notifier`]: best-effort job notifications
//!
//! Adapters report failures as `anyhow::Error`; jobs wrap them into
//! [`crate::error::CutError::Collaborator`] with the collaborator identity.

pub mod analyzer;
pub mod encoder;
pub mod normalizer;
pub mod notifier;
pub mod object_store;

pub use analyzer::CommandAnalyzer;
pub use encoder::FfmpegMp3Encoder;
pub use normalizer::{FfmpegLoudnorm, LoudnessTarget, PassthroughNormalizer};
pub use notifier::{EventBusNotifier, FanoutNotifier, WebhookNotifier};
pub use object_store::{HttpObjectStore, LocalObjectStore};

use std::path::{Path, PathBuf};

use csync_common::events::JobNotification;
use csync_common::models::AnalysisResult;

use crate::audio::AudioBuffer;

/// Content type of uploaded cuts
pub const CUT_CONTENT_TYPE: &str = "audio/mpeg";

/// Music-structure analysis service
#[async_trait::async_trait]
pub trait StructureAnalyzer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Analyze the audio file at `audio_path`
    async fn analyze(&self, audio_path: &Path) -> anyhow::Result<AnalysisResult>;
}

/// Remote or local storage of audio objects
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    async fn download(&self, path: &str) -> anyhow::Result<Vec<u8>>;

    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> anyhow::Result<()>;
}

/// Loudness normalization
///
/// Blocking: called from the CPU-bound part of the cut job. The output keeps
/// the input sample rate and channel count.
pub trait Normalizer: Send + Sync {
    fn normalize(&self, buffer: &AudioBuffer) -> anyhow::Result<AudioBuffer>;
}

/// Final encoding of a cut (blocking)
pub trait AudioEncoder: Send + Sync {
    fn encode(&self, buffer: &AudioBuffer) -> anyhow::Result<Vec<u8>>;

    /// MIME type of the encoded bytes
    fn content_type(&self) -> &'static str {
        CUT_CONTENT_TYPE
    }
}

/// Notification sink
///
/// Fire-and-forget: implementations log delivery failures instead of
/// returning them.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &JobNotification);
}

/// Uniquely named scratch files under the system temp dir, removed on drop
pub(crate) struct TempFiles {
    pub paths: Vec<PathBuf>,
}

impl TempFiles {
    pub fn new<const N: usize>(suffixes: [&str; N]) -> Self {
        let run_id = uuid::Uuid::new_v4();
        let paths = suffixes
            .iter()
            .map(|suffix| std::env::temp_dir().join(format!("csync_{}_{}", run_id, suffix)))
            .collect();
        Self { paths }
    }
}

impl Drop for TempFiles {
    fn drop(&mut self) {
        for path in &self.paths {
            let _ = std::fs::remove_file(path);
        }
    }
}
