//! RMS energy over time ranges of a song

use csync_common::timing::seconds_to_frame_index;

use super::AudioBuffer;

/// Mono mixdown of a song used to measure section energy
#[derive(Debug, Clone)]
pub struct EnergyProfile {
    mono: Vec<f32>,
    sample_rate: u32,
}

impl EnergyProfile {
    pub fn from_buffer(buffer: &AudioBuffer) -> Self {
        Self {
            mono: buffer.mono(),
            sample_rate: buffer.sample_rate,
        }
    }

    /// Profile that reports zero energy everywhere
    pub fn silent() -> Self {
        Self {
            mono: Vec::new(),
            sample_rate: 0,
        }
    }

    /// RMS amplitude over `[start_s, end_s)`; 0.0 if the range holds no samples
    pub fn energy(&self, start_s: f64, end_s: f64) -> f64 {
        let len = self.mono.len();
        let start = seconds_to_frame_index(start_s, self.sample_rate).min(len);
        let end = seconds_to_frame_index(end_s, self.sample_rate).min(len);
        if end <= start {
            return 0.0;
        }

        let window = &self.mono[start..end];
        let sum_squares: f64 = window.iter().map(|s| (*s as f64) * (*s as f64)).sum();
        (sum_squares / window.len() as f64).sqrt()
    }
}
