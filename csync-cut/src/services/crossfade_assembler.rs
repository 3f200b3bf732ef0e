//! Sequencing of snapped spans with equal-power crossfades
//!
//! Each join overlaps the trailing `crossfade_ms` of the assembled audio
//! with the leading `crossfade_ms` of the next span, so the result is
//! `sum(span durations) - (n - 1) * crossfade_ms` long. A join whose spans
//! are shorter than the crossfade is clamped to the shorter span.

use csync_common::timing::ms_to_frames;
use csync_common::FadeCurve;

use crate::audio::AudioBuffer;
use crate::error::{CutError, CutResult};

pub const MIN_CROSSFADE_MS: u32 = 300;
pub const MAX_CROSSFADE_MS: u32 = 2000;

/// Two beats at `bpm`, clamped to [300, 2000] ms
///
/// A non-positive or non-finite bpm gets the maximum crossfade.
pub fn crossfade_ms_for_bpm(bpm: f64) -> u32 {
    if !bpm.is_finite() || bpm <= 0.0 {
        return MAX_CROSSFADE_MS;
    }
    let two_beats = (2.0 * 60_000.0 / bpm).round();
    two_beats.clamp(MIN_CROSSFADE_MS as f64, MAX_CROSSFADE_MS as f64) as u32
}

#[derive(Debug, Clone)]
pub struct CrossfadeAssembler {
    curve: FadeCurve,
}

impl Default for CrossfadeAssembler {
    fn default() -> Self {
        Self {
            curve: FadeCurve::EqualPower,
        }
    }
}

impl CrossfadeAssembler {
    pub fn with_curve(curve: FadeCurve) -> Self {
        Self { curve }
    }

    pub fn assemble(&self, spans: &[AudioBuffer], crossfade_ms: u32) -> CutResult<AudioBuffer> {
        let (first, rest) = spans.split_first().ok_or(CutError::EmptySelection)?;

        let channels = first.channels;
        let sample_rate = first.sample_rate;
        let fade_frames = ms_to_frames(crossfade_ms as u64, sample_rate);

        let mut result = first.clone();

        for (join, span) in rest.iter().enumerate() {
            if span.channels != channels || span.sample_rate != sample_rate {
                return Err(CutError::UnexpectedAudioFormat(format!(
                    "Span {} is {} ch @ {} Hz, expected {} ch @ {} Hz",
                    join + 1,
                    span.channels,
                    span.sample_rate,
                    channels,
                    sample_rate
                )));
            }

            let overlap = fade_frames.min(result.frames()).min(span.frames());
            if overlap < fade_frames {
                tracing::warn!(
                    join = join + 1,
                    crossfade_frames = fade_frames,
                    clamped_frames = overlap,
                    "Span shorter than crossfade, clamping overlap"
                );
            }

            let overlap_start = (result.frames() - overlap) * channels;
            let tail = &mut result.samples[overlap_start..];
            for (i, (out_frame, in_frame)) in tail
                .chunks_exact_mut(channels)
                .zip(span.samples.chunks_exact(channels))
                .enumerate()
            {
                let (out_gain, in_gain) = self.curve.crossfade_gains(i as f32 / overlap as f32);
                for (out, incoming) in out_frame.iter_mut().zip(in_frame) {
                    *out = *out * out_gain + *incoming * in_gain;
                }
            }

            result
                .samples
                .extend_from_slice(&span.samples[overlap * channels..]);
        }

        tracing::debug!(
            spans = spans.len(),
            crossfade_ms = crossfade_ms,
            assembled_ms = result.duration_ms(),
            "Spans assembled"
        );

        Ok(result)
    }
}
