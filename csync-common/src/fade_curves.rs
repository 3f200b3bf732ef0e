//! Fade curve implementations for fades and crossfades
//!
//! Gains are computed on a normalized position through the fade
//! (0.0 = start, 1.0 = end) and applied to interleaved `f32` audio.

use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;

/// Fade curve types
///
/// - Linear: constant rate of change
/// - Exponential: slow start, fast finish (natural-sounding fade-in)
/// - Logarithmic: fast start, slow finish (natural-sounding fade-out)
/// - EqualPower: sin/cos pair, constant summed power during a crossfade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeCurve {
    /// v(t) = t
    Linear,

    /// v(t) = t²
    Exponential,

    /// v(t) = (1-t)² on fade-out
    Logarithmic,

    /// v(t) = sin(t × π/2) on fade-in, cos(t × π/2) on fade-out
    EqualPower,
}

impl FadeCurve {
    /// Fade-in gain at `position` (0.0 → 1.0), rising from silence to unity
    pub fn calculate_fade_in(&self, position: f32) -> f32 {
        let t = position.clamp(0.0, 1.0);

        match self {
            FadeCurve::Linear => t,
            FadeCurve::Exponential => t * t,
            // Inverse of the quadratic fade-out shape
            FadeCurve::Logarithmic => t.sqrt(),
            FadeCurve::EqualPower => (t * FRAC_PI_2).sin(),
        }
    }

    /// Fade-out gain at `position` (0.0 → 1.0), falling from unity to silence
    pub fn calculate_fade_out(&self, position: f32) -> f32 {
        let t = position.clamp(0.0, 1.0);

        match self {
            FadeCurve::Linear => 1.0 - t,
            FadeCurve::Exponential | FadeCurve::Logarithmic => {
                let inv = 1.0 - t;
                inv * inv
            }
            FadeCurve::EqualPower => (t * FRAC_PI_2).cos(),
        }
    }

    /// Gains for the outgoing and incoming signal at `position` through a crossfade
    ///
    /// For `EqualPower` the squared gains always sum to 1.0.
    pub fn crossfade_gains(&self, position: f32) -> (f32, f32) {
        (self.calculate_fade_out(position), self.calculate_fade_in(position))
    }

    /// Apply a fade-in over the first `fade_frames` frames of an interleaved buffer
    ///
    /// The fade is clamped to the buffer length. Frame 0 is fully silent.
    pub fn apply_fade_in(&self, samples: &mut [f32], channels: usize, fade_frames: usize) {
        if channels == 0 {
            return;
        }
        let total_frames = samples.len() / channels;
        let fade_frames = fade_frames.min(total_frames);
        if fade_frames == 0 {
            return;
        }

        for (frame_idx, frame) in samples
            .chunks_exact_mut(channels)
            .take(fade_frames)
            .enumerate()
        {
            let gain = self.calculate_fade_in(frame_idx as f32 / fade_frames as f32);
            frame.iter_mut().for_each(|s| *s *= gain);
        }
    }

    /// Apply a fade-out over the last `fade_frames` frames of an interleaved buffer
    ///
    /// The fade is clamped to the buffer length. The final frame reaches silence.
    pub fn apply_fade_out(&self, samples: &mut [f32], channels: usize, fade_frames: usize) {
        if channels == 0 {
            return;
        }
        let total_frames = samples.len() / channels;
        let fade_frames = fade_frames.min(total_frames);
        if fade_frames == 0 {
            return;
        }

        let fade_start = total_frames - fade_frames;
        let denominator = (fade_frames.max(2) - 1) as f32;
        for (offset, frame) in samples[fade_start * channels..total_frames * channels]
            .chunks_exact_mut(channels)
            .enumerate()
        {
            let gain = self.calculate_fade_out(offset as f32 / denominator);
            frame.iter_mut().for_each(|s| *s *= gain);
        }
    }

    /// Parse curve from its configuration string
    ///
    /// Accepts 'linear', 'exponential', 'logarithmic', and
    /// 'equal_power' / 'equalpower' (case insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "linear" => Some(FadeCurve::Linear),
            "exponential" => Some(FadeCurve::Exponential),
            "logarithmic" => Some(FadeCurve::Logarithmic),
            "equal_power" | "equalpower" => Some(FadeCurve::EqualPower),
            _ => None,
        }
    }

    /// Canonical configuration string
    pub fn as_str(&self) -> &'static str {
        match self {
            FadeCurve::Linear => "linear",
            FadeCurve::Exponential => "exponential",
            FadeCurve::Logarithmic => "logarithmic",
            FadeCurve::EqualPower => "equal_power",
        }
    }

    pub fn all_variants() -> &'static [FadeCurve] {
        &[
            FadeCurve::Linear,
            FadeCurve::Exponential,
            FadeCurve::Logarithmic,
            FadeCurve::EqualPower,
        ]
    }
}

impl std::fmt::Display for FadeCurve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
