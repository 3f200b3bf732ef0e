//! Fake collaborators implementing the production traits

use anyhow::{anyhow, bail};
use csync_common::events::JobNotification;
use csync_common::models::AnalysisResult;
use csync_cut::audio::{wav, AudioBuffer};
use csync_cut::collaborators::{AudioEncoder, Normalizer, Notifier, ObjectStore, StructureAnalyzer};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Returns a canned analysis, or fails when built with [`FakeAnalyzer::failing`]
pub struct FakeAnalyzer {
    result: Option<AnalysisResult>,
    pub calls: AtomicUsize,
}

impl FakeAnalyzer {
    pub fn returning(result: AnalysisResult) -> Self {
        Self {
            result: Some(result),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl StructureAnalyzer for FakeAnalyzer {
    fn name(&self) -> &'static str {
        "FakeAnalyzer"
    }

    async fn analyze(&self, audio_path: &Path) -> anyhow::Result<AnalysisResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !audio_path.exists() {
            bail!("analyzer was given a missing file: {}", audio_path.display());
        }
        self.result
            .clone()
            .ok_or_else(|| anyhow!("analysis service unavailable"))
    }
}

/// In-memory object store keyed by storage path
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
}

impl MemoryObjectStore {
    pub fn insert(&self, path: &str, bytes: Vec<u8>) {
        self.objects
            .lock()
            .unwrap()
            .insert(path.to_string(), (bytes, "audio/wav".to_string()));
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(path).map(|(b, _)| b.clone())
    }

    pub fn content_type(&self, path: &str) -> Option<String> {
        self.objects.lock().unwrap().get(path).map(|(_, c)| c.clone())
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn download(&self, path: &str) -> anyhow::Result<Vec<u8>> {
        self.get(path)
            .ok_or_else(|| anyhow!("object not found: {}", path))
    }

    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> anyhow::Result<()> {
        self.objects
            .lock()
            .unwrap()
            .insert(path.to_string(), (bytes, content_type.to_string()));
        Ok(())
    }
}

/// Encodes to WAV so tests can decode the uploaded cut
pub struct WavEncoder;

impl AudioEncoder for WavEncoder {
    fn encode(&self, buffer: &AudioBuffer) -> anyhow::Result<Vec<u8>> {
        Ok(wav::encode_wav(buffer)?)
    }
}

pub struct FailingNormalizer;

impl Normalizer for FailingNormalizer {
    fn normalize(&self, _: &AudioBuffer) -> anyhow::Result<AudioBuffer> {
        bail!("loudnorm exited with status 1")
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<JobNotification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<JobNotification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &JobNotification) {
        self.sent.lock().unwrap().push(notification.clone());
    }
}
