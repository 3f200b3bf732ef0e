//! csync-cut service configuration
//!
//! Loaded from `csync-cut.toml` (see [`csync_common::config`] for file
//! location and root folder priority). Every section is optional:
//!
//! ```toml
//! port = 5740
//!
//! [logging]
//! level = "debug"
//!
//! [storage]
//! backend = "http"
//! base_url = "https://project.example.com/storage/v1"
//! bucket = "songs"
//!
//! [analysis]
//! command = "csync-analyze"
//!
//! [normalization]
//! integrated_lufs = -14.0
//!
//! [webhook]
//! url = "https://app.example.com/api/webhooks/cut"
//! ```
//!
//! Secrets resolve with ENV → TOML priority.

use csync_common::config::{load_config_or_default, LoggingConfig};
use csync_common::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::collaborators::encoder::DEFAULT_BITRATE_KBPS;
use crate::collaborators::LoudnessTarget;
use crate::services::{FadeSettings, PipelineSettings, ScoringWeights, TagPriorities, TempoPolicy};

/// Module name used for the config file (`csync-cut.toml`)
pub const MODULE_NAME: &str = "csync-cut";

pub const DEFAULT_PORT: u16 = 5740;

/// Environment variable holding the HTTP object store key
pub const STORAGE_API_KEY_ENV: &str = "CSYNC_STORAGE_API_KEY";

/// Environment variable holding the webhook shared secret
pub const WEBHOOK_SECRET_ENV: &str = "CSYNC_WEBHOOK_SECRET";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CutServiceConfig {
    pub root_folder: Option<PathBuf>,
    pub port: u16,
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub analysis: AnalysisConfig,
    pub normalization: NormalizationConfig,
    pub encoder: EncoderConfig,
    pub webhook: WebhookConfig,
    pub scoring: ScoringConfig,
    pub tempo: TempoPolicy,
    pub fades: FadeSettings,
}

impl Default for CutServiceConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            port: DEFAULT_PORT,
            logging: LoggingConfig::default(),
            storage: StorageConfig::default(),
            analysis: AnalysisConfig::default(),
            normalization: NormalizationConfig::default(),
            encoder: EncoderConfig::default(),
            webhook: WebhookConfig::default(),
            scoring: ScoringConfig::default(),
            tempo: TempoPolicy::default(),
            fades: FadeSettings::default(),
        }
    }
}

/// Object store backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Directory tree; defaults to `<root_folder>/objects`
    Local { path: Option<PathBuf> },
    /// Storage REST API
    Http {
        base_url: String,
        bucket: String,
        #[serde(default)]
        api_key: Option<String>,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Local { path: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Executable printing an analysis JSON document for the file given
    /// as its last argument
    pub command: String,
    pub args: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            command: "csync-analyze".to_string(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    pub enabled: bool,
    pub ffmpeg_path: String,
    #[serde(flatten)]
    pub target: LoudnessTarget,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ffmpeg_path: "ffmpeg".to_string(),
            target: LoudnessTarget::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub ffmpeg_path: String,
    pub bitrate_kbps: u32,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            bitrate_kbps: DEFAULT_BITRATE_KBPS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// No URL: notifications only reach the in-process event bus
    pub url: Option<String>,
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: ScoringWeights,
    pub priorities: TagPriorities,
}

impl CutServiceConfig {
    /// Load from the located config file, or defaults when there is none
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        load_config_or_default(explicit, MODULE_NAME)
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            weights: self.scoring.weights.clone(),
            priorities: self.scoring.priorities,
            tempo: self.tempo,
            fades: self.fades,
        }
    }

    /// HTTP object store key (ENV → TOML)
    pub fn storage_api_key(&self) -> Option<String> {
        let toml_value = match &self.storage {
            StorageConfig::Http { api_key, .. } => api_key.as_deref(),
            StorageConfig::Local { .. } => None,
        };
        resolve_secret("storage API key", STORAGE_API_KEY_ENV, toml_value)
    }

    /// Webhook shared secret (ENV → TOML); empty when unset
    pub fn webhook_secret(&self) -> String {
        resolve_secret("webhook secret", WEBHOOK_SECRET_ENV, self.webhook.secret.as_deref())
            .unwrap_or_default()
    }
}

/// Resolve a secret from the environment, then TOML
///
/// Blank values count as unset. Finding the secret in both places is
/// logged, since the TOML value is silently shadowed.
pub fn resolve_secret(name: &str, env_var: &str, toml_value: Option<&str>) -> Option<String> {
    let env_value = std::env::var(env_var).ok().filter(|v| is_valid_key(v));
    let toml_value = toml_value.filter(|v| is_valid_key(v));

    if env_value.is_some() && toml_value.is_some() {
        warn!(
            "{} found in both {} and TOML config. Using environment (highest priority).",
            name, env_var
        );
    }

    if let Some(value) = env_value {
        info!("{} loaded from environment variable", name);
        return Some(value);
    }

    toml_value.map(|value| {
        info!("{} loaded from TOML config", name);
        value.to_string()
    })
}

/// Non-empty, non-whitespace
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
