//! Bounded tempo correction toward the target duration
//!
//! `ratio = target_ms / current_ms` selects one of three branches:
//!
//! | ratio                                  | action                              |
//! |----------------------------------------|-------------------------------------|
//! | within [0.95, 1.05], off 1.0 by > 0.5% | pitch-preserving speed 1/ratio      |
//! | below 0.95 (too long)                  | truncate to target, 1500 ms fade    |
//! | above 1.05 (too short), or ~1.0        | accept unchanged                    |
//!
//! Stretching beyond 5% is audible, so under-length output is preferred.

use csync_common::timing::{format_duration_ms, ms_to_frames};
use csync_common::FadeCurve;
use serde::{Deserialize, Serialize};

use crate::audio::{time_stretch, AudioBuffer};
use crate::error::{CutError, CutResult};

/// Thresholds of the tempo correction policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TempoPolicy {
    /// Largest allowed |ratio - 1| for stretching
    pub max_stretch_deviation: f64,
    /// |ratio - 1| at or below this is left alone
    pub min_correction: f64,
    /// Fade applied after truncating an over-long cut
    pub trim_fade_out_ms: u64,
}

impl Default for TempoPolicy {
    fn default() -> Self {
        Self {
            max_stretch_deviation: 0.05,
            min_correction: 0.005,
            trim_fade_out_ms: 1500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TempoDecision {
    Stretch { ratio: f64 },
    TrimAndFade { ratio: f64 },
    Accept { ratio: f64 },
}

impl TempoPolicy {
    pub fn decide(&self, current_ms: u64, target_ms: u64) -> TempoDecision {
        if current_ms == 0 {
            return TempoDecision::Accept { ratio: 1.0 };
        }
        let ratio = target_ms as f64 / current_ms as f64;
        let lower = 1.0 - self.max_stretch_deviation;
        let upper = 1.0 + self.max_stretch_deviation;

        if (lower..=upper).contains(&ratio) {
            if (ratio - 1.0).abs() > self.min_correction {
                TempoDecision::Stretch { ratio }
            } else {
                TempoDecision::Accept { ratio }
            }
        } else if ratio < lower {
            TempoDecision::TrimAndFade { ratio }
        } else {
            TempoDecision::Accept { ratio }
        }
    }
}

/// Result of [`TempoAdjuster::adjust`]
#[derive(Debug, Clone)]
pub struct TempoAdjustment {
    pub buffer: AudioBuffer,
    pub decision: TempoDecision,
    /// Signed stretch percentage, one decimal; 0.0 unless stretched
    pub tempo_adjustment_pct: f64,
}

#[derive(Debug, Clone)]
pub struct TempoAdjuster {
    policy: TempoPolicy,
    trim_fade_curve: FadeCurve,
}

impl Default for TempoAdjuster {
    fn default() -> Self {
        Self::new(TempoPolicy::default())
    }
}

impl TempoAdjuster {
    pub fn new(policy: TempoPolicy) -> Self {
        Self {
            policy,
            trim_fade_curve: FadeCurve::Logarithmic,
        }
    }

    pub fn adjust(&self, mut buffer: AudioBuffer, target_ms: u64) -> CutResult<TempoAdjustment> {
        if buffer.is_empty() {
            return Err(CutError::EmptySelection);
        }
        let current_ms = buffer.duration_ms();
        let decision = self.policy.decide(current_ms, target_ms);

        tracing::debug!(
            current = %format_duration_ms(current_ms),
            target = %format_duration_ms(target_ms),
            decision = ?decision,
            "Tempo decision"
        );

        let tempo_adjustment_pct = match decision {
            TempoDecision::Stretch { ratio } => {
                // Playback speed 1/ratio, i.e. duration scaled by ratio
                buffer = time_stretch(&buffer, ratio)?;
                ((ratio - 1.0) * 1000.0).round() / 10.0
            }
            TempoDecision::TrimAndFade { .. } => {
                buffer.truncate_ms(target_ms);
                self.trim_fade_curve.apply_fade_out(
                    &mut buffer.samples,
                    buffer.channels,
                    ms_to_frames(self.policy.trim_fade_out_ms, buffer.sample_rate),
                );
                0.0
            }
            TempoDecision::Accept { .. } => 0.0,
        };

        Ok(TempoAdjustment {
            buffer,
            decision,
            tempo_adjustment_pct,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(ms: usize) -> AudioBuffer {
        let samples = (0..ms * 2)
            .map(|i| ((i / 2) as f32 * 0.3).sin() * 0.5)
            .collect();
        AudioBuffer::new(samples, 1000, 2)
    }

    #[test]
    fn test_decision_branches() {
        let policy = TempoPolicy::default();
        assert!(matches!(policy.decide(100_000, 102_000), TempoDecision::Stretch { .. }));
        assert!(matches!(policy.decide(100_000, 95_000), TempoDecision::Stretch { .. }));
        assert!(matches!(policy.decide(100_000, 80_000), TempoDecision::TrimAndFade { .. }));
        assert!(matches!(policy.decide(100_000, 120_000), TempoDecision::Accept { .. }));
        assert!(matches!(policy.decide(100_000, 100_400), TempoDecision::Accept { .. }));
        assert!(matches!(policy.decide(0, 60_000), TempoDecision::Accept { .. }));
    }

    #[test]
    fn test_empty_cut_is_rejected() {
        let result = TempoAdjuster::default().adjust(AudioBuffer::new(Vec::new(), 1000, 2), 60_000);
        assert!(matches!(result, Err(CutError::EmptySelection)));
    }

    #[test]
    fn test_stretch_branch() {
        let adjusted = TempoAdjuster::default().adjust(tone(10_000), 10_200).unwrap();

        assert!(matches!(adjusted.decision, TempoDecision::Stretch { .. }));
        assert_eq!(adjusted.tempo_adjustment_pct, 2.0);
        assert_eq!(adjusted.buffer.duration_ms(), 10_200);
        assert_eq!(adjusted.buffer.channels, 2);
    }

    #[test]
    fn test_compress_reports_negative_pct() {
        let adjusted = TempoAdjuster::default().adjust(tone(10_000), 9_700).unwrap();
        assert_eq!(adjusted.tempo_adjustment_pct, -3.0);
        assert_eq!(adjusted.buffer.duration_ms(), 9_700);
    }

    #[test]
    fn test_trim_branch() {
        let adjusted = TempoAdjuster::default().adjust(tone(10_000), 8_000).unwrap();

        assert!(matches!(adjusted.decision, TempoDecision::TrimAndFade { .. }));
        assert_eq!(adjusted.tempo_adjustment_pct, 0.0);
        assert_eq!(adjusted.buffer.duration_ms(), 8_000);
        // Final frame faded to silence
        let last = adjusted.buffer.samples.len() - 1;
        assert!(adjusted.buffer.samples[last].abs() < 1e-6);
        // Audio before the fade window is untouched
        assert_eq!(adjusted.buffer.samples[2 * 6_000], tone(10_000).samples[2 * 6_000]);
    }

    #[test]
    fn test_accept_branch_leaves_audio_unchanged() {
        let input = tone(10_000);
        let adjusted = TempoAdjuster::default().adjust(input.clone(), 12_000).unwrap();

        assert!(matches!(adjusted.decision, TempoDecision::Accept { .. }));
        assert_eq!(adjusted.tempo_adjustment_pct, 0.0);
        assert_eq!(adjusted.buffer, input);
    }
}
