//! Structure analysis through an external command
//!
//! The configured command is run with the audio path appended as the last
//! argument and must print an analysis JSON document on stdout:
//!
//! ```json
//! {"sections": [{"label": "intro", "start": 0.0, "end": 12.4}],
//!  "beats": [0.52, 1.03], "downbeats": [0.52, 2.57], "bpm": 117.2}
//! ```

use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context};
use csync_common::models::AnalysisResult;

use super::StructureAnalyzer;

/// Runs an analysis executable per song
pub struct CommandAnalyzer {
    command: String,
    args: Vec<String>,
}

impl CommandAnalyzer {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    /// Check whether the command can be spawned
    pub fn is_available(&self) -> bool {
        Command::new(&self.command).arg("--help").output().is_ok()
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Parse analyzer stdout; timestamps are kept to milliseconds and bpm to
/// one decimal
pub fn parse_analysis_output(stdout: &str) -> anyhow::Result<AnalysisResult> {
    let mut analysis: AnalysisResult =
        serde_json::from_str(stdout.trim()).context("Analyzer output is not valid analysis JSON")?;

    for section in &mut analysis.sections {
        section.start = round_to(section.start, 3);
        section.end = round_to(section.end, 3);
    }
    analysis.beats.iter_mut().for_each(|b| *b = round_to(*b, 3));
    analysis.downbeats.iter_mut().for_each(|b| *b = round_to(*b, 3));
    analysis.bpm = round_to(analysis.bpm, 1);

    if analysis.sections.is_empty() {
        bail!("Analyzer returned no sections");
    }

    Ok(analysis)
}

#[async_trait::async_trait]
impl StructureAnalyzer for CommandAnalyzer {
    fn name(&self) -> &'static str {
        "CommandAnalyzer"
    }

    async fn analyze(&self, audio_path: &Path) -> anyhow::Result<AnalysisResult> {
        if !audio_path.exists() {
            bail!("Audio file not found: {}", audio_path.display());
        }

        tracing::debug!(
            command = %self.command,
            audio_file = %audio_path.display(),
            "Running structure analysis"
        );

        let output = tokio::task::spawn_blocking({
            let command = self.command.clone();
            let args = self.args.clone();
            let audio = audio_path.to_path_buf();

            move || Command::new(&command).args(&args).arg(&audio).output()
        })
        .await
        .context("Analysis task join error")?
        .with_context(|| format!("Failed to execute {}", self.command))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "Analysis exited with {:?}: {}",
                output.status.code(),
                stderr.trim()
            );
        }

        let analysis = parse_analysis_output(&String::from_utf8_lossy(&output.stdout))?;

        tracing::info!(
            audio_file = %audio_path.display(),
            sections = analysis.sections.len(),
            downbeats = analysis.downbeats.len(),
            bpm = analysis.bpm,
            "Structure analysis completed"
        );

        Ok(analysis)
    }
}
