//! MP3 encoding through ffmpeg/libmp3lame

use std::process::Command;

use anyhow::{bail, Context};

use super::{AudioEncoder, TempFiles};
use crate::audio::{wav, AudioBuffer};

pub const DEFAULT_BITRATE_KBPS: u32 = 320;

pub struct FfmpegMp3Encoder {
    ffmpeg_path: String,
    bitrate_kbps: u32,
}

impl FfmpegMp3Encoder {
    pub fn new(ffmpeg_path: impl Into<String>, bitrate_kbps: u32) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            bitrate_kbps,
        }
    }

    fn encode_args(&self) -> Vec<String> {
        vec![
            "-codec:a".to_string(),
            "libmp3lame".to_string(),
            "-b:a".to_string(),
            format!("{}k", self.bitrate_kbps),
        ]
    }
}

impl AudioEncoder for FfmpegMp3Encoder {
    fn encode(&self, buffer: &AudioBuffer) -> anyhow::Result<Vec<u8>> {
        let temp = TempFiles::new(["final.wav", "final.mp3"]);
        let (input, output) = (&temp.paths[0], &temp.paths[1]);

        wav::write_wav(input, buffer)?;

        let result = Command::new(&self.ffmpeg_path)
            .args(["-y", "-hide_banner", "-loglevel", "error", "-i"])
            .arg(input)
            .args(self.encode_args())
            .arg(output)
            .output()
            .with_context(|| format!("Failed to execute {}", self.ffmpeg_path))?;

        if !result.status.success() {
            bail!(
                "MP3 encoding exited with {:?}: {}",
                result.status.code(),
                String::from_utf8_lossy(&result.stderr).trim()
            );
        }

        let bytes = std::fs::read(output).context("Failed to read encoded MP3")?;
        tracing::debug!(
            bytes = bytes.len(),
            bitrate_kbps = self.bitrate_kbps,
            "Cut encoded"
        );
        Ok(bytes)
    }
}
