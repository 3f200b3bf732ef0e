//! Final fade-in / fade-out
//!
//! Always applied to the normalized cut, even when the tempo step already
//! faded a truncated tail; the fades compose.

use csync_common::timing::ms_to_frames;
use csync_common::FadeCurve;
use serde::{Deserialize, Serialize};

use crate::audio::AudioBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FadeSettings {
    pub fade_in_ms: u64,
    pub fade_out_ms: u64,
    pub fade_in_curve: FadeCurve,
    pub fade_out_curve: FadeCurve,
}

impl Default for FadeSettings {
    fn default() -> Self {
        Self {
            fade_in_ms: 500,
            fade_out_ms: 1500,
            fade_in_curve: FadeCurve::Exponential,
            fade_out_curve: FadeCurve::Logarithmic,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FadeFinisher {
    settings: FadeSettings,
}

impl FadeFinisher {
    pub fn new(settings: FadeSettings) -> Self {
        Self { settings }
    }

    pub fn finish(&self, buffer: &mut AudioBuffer) {
        let channels = buffer.channels;
        let rate = buffer.sample_rate;
        self.settings.fade_in_curve.apply_fade_in(
            &mut buffer.samples,
            channels,
            ms_to_frames(self.settings.fade_in_ms, rate),
        );
        self.settings.fade_out_curve.apply_fade_out(
            &mut buffer.samples,
            channels,
            ms_to_frames(self.settings.fade_out_ms, rate),
        );
    }
}
