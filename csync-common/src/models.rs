//! Song analysis, tagging and cut models
//!
//! Value objects shared by the cut pipeline, the record store and the HTTP API.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A structural section of a song as reported by the analysis service
///
/// Sections arrive contiguous, non-overlapping and in ascending start order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Structural label ("intro", "verse", "chorus", ...)
    pub label: String,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
}

impl Section {
    pub fn new(label: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            label: label.into(),
            start,
            end,
        }
    }

    /// Section length in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Output of the music-structure analysis service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub sections: Vec<Section>,
    /// Beat timestamps in seconds
    #[serde(default)]
    pub beats: Vec<f64>,
    /// Downbeat timestamps in seconds
    #[serde(default)]
    pub downbeats: Vec<f64>,
    pub bpm: f64,
}

/// User tag attached to a named section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SectionTag {
    /// Always include
    Must,
    /// Always include, placed first
    Open,
    /// Always include, placed last
    Finale,
    /// Prefer to include
    Keep,
    /// Never include
    Skip,
}

impl SectionTag {
    /// Parse a stored tag string; unknown strings yield `None`
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "MUST" => Some(SectionTag::Must),
            "OPEN" => Some(SectionTag::Open),
            "FINALE" => Some(SectionTag::Finale),
            "KEEP" => Some(SectionTag::Keep),
            "SKIP" => Some(SectionTag::Skip),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionTag::Must => "MUST",
            SectionTag::Open => "OPEN",
            SectionTag::Finale => "FINALE",
            SectionTag::Keep => "KEEP",
            SectionTag::Skip => "SKIP",
        }
    }

    /// MUST, OPEN and FINALE sections are always part of the cut
    pub fn is_mandatory(&self) -> bool {
        matches!(self, SectionTag::Must | SectionTag::Open | SectionTag::Finale)
    }
}

/// Section name ("chorus2") to tag
pub type TagMap = HashMap<String, SectionTag>;

/// Raw tags as stored by the record store; values may be any string
pub type RawTagMap = HashMap<String, String>;

/// Convert stored tags into a [`TagMap`], dropping unknown tag strings
///
/// Returns the parsed map plus the names whose tag could not be parsed.
pub fn parse_tag_map(raw: &RawTagMap) -> (TagMap, Vec<String>) {
    let mut tags = TagMap::with_capacity(raw.len());
    let mut unknown = Vec::new();

    for (name, value) in raw {
        match SectionTag::parse(value) {
            Some(tag) => {
                tags.insert(name.clone(), tag);
            }
            None => unknown.push(name.clone()),
        }
    }
    unknown.sort();

    (tags, unknown)
}

/// Summary of one successful cut assembly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutMetadata {
    /// Labels of the sections audible in the cut, in playback order
    pub sections_used: Vec<String>,
    pub crossfade_ms: u32,
    pub tempo_adjustment_pct: f64,
    pub final_duration_ms: u64,
}

/// Status of the analysis job or the cut job of one song
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Idle,
    Running,
    Ready,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Idle => "idle",
            JobStatus::Running => "running",
            JobStatus::Ready => "ready",
            JobStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(JobStatus::Idle),
            "running" => Some(JobStatus::Running),
            "ready" => Some(JobStatus::Ready),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    /// `ready` and `failed` end a job run and trigger a notification
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Ready | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the two per-song jobs a status or notification refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Analysis,
    Cut,
}

impl JobKind {
    /// Record-store column holding this job's status
    pub fn status_column(&self) -> &'static str {
        match self {
            JobKind::Analysis => "analysis_status",
            JobKind::Cut => "cut_status",
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobKind::Analysis => f.write_str("analysis"),
            JobKind::Cut => f.write_str("cut"),
        }
    }
}

/// Competition routine categories with preset cut lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutineType {
    Solo,
    Duo,
    SmallGroup,
    LargeGroup,
    Production,
    Custom,
}

impl RoutineType {
    /// Preset target duration; `Custom` requires an explicit target
    pub fn target_duration_ms(&self) -> Option<u64> {
        match self {
            RoutineType::Solo | RoutineType::Duo => Some(150_000),
            RoutineType::SmallGroup => Some(165_000),
            RoutineType::LargeGroup => Some(180_000),
            RoutineType::Production => Some(240_000),
            RoutineType::Custom => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoutineType::Solo => "solo",
            RoutineType::Duo => "duo",
            RoutineType::SmallGroup => "small_group",
            RoutineType::LargeGroup => "large_group",
            RoutineType::Production => "production",
            RoutineType::Custom => "custom",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "solo" => Some(RoutineType::Solo),
            "duo" => Some(RoutineType::Duo),
            "small_group" => Some(RoutineType::SmallGroup),
            "large_group" => Some(RoutineType::LargeGroup),
            "production" => Some(RoutineType::Production),
            "custom" => Some(RoutineType::Custom),
            _ => None,
        }
    }
}
