//! Loudness normalization
//!
//! [`FfmpegLoudnorm`] runs ffmpeg's `loudnorm` filter in two passes:
//! 1. measurement pass (`print_format=json`, output discarded), parsed from
//!    the JSON block the filter prints on stderr
//! 2. correction pass fed with the measured values (`linear=true`), forcing
//!    the original sample rate and channel count on the output
//!
//! Audio is handed to ffmpeg as float WAV through uniquely named temp files.

use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use super::{Normalizer, TempFiles};
use crate::audio::{wav, AudioBuffer};

/// Loudness targets of the normalization filter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoudnessTarget {
    /// Integrated loudness (LUFS)
    pub integrated_lufs: f64,
    /// True peak ceiling (dBTP)
    pub true_peak_db: f64,
    /// Loudness range (LU)
    pub loudness_range: f64,
}

impl Default for LoudnessTarget {
    fn default() -> Self {
        Self {
            integrated_lufs: -14.0,
            true_peak_db: -1.0,
            loudness_range: 11.0,
        }
    }
}

impl LoudnessTarget {
    /// `I=..:TP=..:LRA=..` filter arguments
    pub fn filter_args(&self) -> String {
        format!(
            "I={}:TP={}:LRA={}",
            self.integrated_lufs, self.true_peak_db, self.loudness_range
        )
    }
}

/// Values reported by the loudnorm measurement pass
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoudnormMeasurement {
    pub input_i: String,
    pub input_tp: String,
    pub input_lra: String,
    pub input_thresh: String,
    pub target_offset: String,
}

impl LoudnormMeasurement {
    /// Silent input measures as `-inf`, which the second pass cannot use
    pub fn is_measurable(&self) -> bool {
        [&self.input_i, &self.input_tp, &self.input_lra, &self.input_thresh, &self.target_offset]
            .iter()
            .all(|v| v.trim().parse::<f64>().map_or(false, f64::is_finite))
    }
}

/// Extract the JSON report the loudnorm filter prints at the end of stderr
pub fn parse_loudnorm_report(stderr: &str) -> anyhow::Result<LoudnormMeasurement> {
    let start = stderr
        .rfind('{')
        .context("No loudnorm report in ffmpeg output")?;
    let end = stderr[start..]
        .find('}')
        .map(|i| start + i + 1)
        .context("Unterminated loudnorm report")?;

    serde_json::from_str(&stderr[start..end]).context("Malformed loudnorm report")
}

/// Two-pass ffmpeg loudnorm normalizer
pub struct FfmpegLoudnorm {
    ffmpeg_path: String,
    target: LoudnessTarget,
}

impl FfmpegLoudnorm {
    pub fn new(ffmpeg_path: impl Into<String>, target: LoudnessTarget) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            target,
        }
    }

    pub fn is_available(&self) -> bool {
        Command::new(&self.ffmpeg_path).arg("-version").output().is_ok()
    }

    fn measure(&self, input: &Path) -> anyhow::Result<LoudnormMeasurement> {
        let filter = format!("loudnorm={}:print_format=json", self.target.filter_args());
        let output = Command::new(&self.ffmpeg_path)
            .args(["-hide_banner", "-nostats", "-i"])
            .arg(input)
            .args(["-af", &filter, "-f", "null", "-"])
            .output()
            .with_context(|| format!("Failed to execute {}", self.ffmpeg_path))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            bail!(
                "loudnorm measurement exited with {:?}: {}",
                output.status.code(),
                stderr.trim()
            );
        }
        parse_loudnorm_report(&stderr)
    }

    fn correction_filter(&self, measured: &LoudnormMeasurement) -> String {
        format!(
            "loudnorm={}:measured_I={}:measured_TP={}:measured_LRA={}:measured_thresh={}:offset={}:linear=true:print_format=summary",
            self.target.filter_args(),
            measured.input_i.trim(),
            measured.input_tp.trim(),
            measured.input_lra.trim(),
            measured.input_thresh.trim(),
            measured.target_offset.trim(),
        )
    }

    fn correct(
        &self,
        input: &Path,
        output_path: &Path,
        measured: &LoudnormMeasurement,
        buffer: &AudioBuffer,
    ) -> anyhow::Result<()> {
        let output = Command::new(&self.ffmpeg_path)
            .args(["-y", "-hide_banner", "-nostats", "-i"])
            .arg(input)
            .args(["-af", &self.correction_filter(measured)])
            .args(["-ar", &buffer.sample_rate.to_string()])
            .args(["-ac", &buffer.channels.to_string()])
            .args(["-c:a", "pcm_f32le"])
            .arg(output_path)
            .output()
            .with_context(|| format!("Failed to execute {}", self.ffmpeg_path))?;

        if !output.status.success() {
            bail!(
                "loudnorm correction exited with {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

impl Normalizer for FfmpegLoudnorm {
    fn normalize(&self, buffer: &AudioBuffer) -> anyhow::Result<AudioBuffer> {
        let temp = TempFiles::new(["prenorm.wav", "norm.wav"]);
        let (input, output) = (&temp.paths[0], &temp.paths[1]);

        wav::write_wav(input, buffer)?;

        let measured = self.measure(input)?;
        if !measured.is_measurable() {
            tracing::warn!(
                input_i = %measured.input_i,
                "Loudness not measurable (silent audio?), skipping normalization"
            );
            return Ok(buffer.clone());
        }

        tracing::debug!(
            input_i = %measured.input_i,
            input_tp = %measured.input_tp,
            target = %self.target.filter_args(),
            "Loudness measured"
        );

        self.correct(input, output, &measured, buffer)?;
        let normalized = wav::read_wav(output)?;

        if normalized.sample_rate != buffer.sample_rate || normalized.channels != buffer.channels {
            bail!(
                "Normalizer changed format to {} ch @ {} Hz",
                normalized.channels,
                normalized.sample_rate
            );
        }

        Ok(normalized)
    }
}

/// Used when normalization is disabled
pub struct PassthroughNormalizer;

impl Normalizer for PassthroughNormalizer {
    fn normalize(&self, buffer: &AudioBuffer) -> anyhow::Result<AudioBuffer> {
        Ok(buffer.clone())
    }
}
