//! Millisecond / frame timing helpers
//!
//! ChoreoSync uses three time representations:
//!
//! 1. **Seconds (f64)**: analysis output (section bounds, beats, downbeats)
//! 2. **Milliseconds (u64)**: targets, crossfade lengths, cut metadata
//! 3. **Frames (usize)**: positions inside an interleaved audio buffer
//!    (one frame = one sample per channel)
//!
//! ```text
//! analysis (s) ──seconds_to_ms──▶ snapping (ms) ──ms_to_frames──▶ buffer
//!                                                                  │
//! metadata (ms) ◀─────────────────frames_to_ms─────────────────────┘
//! ```
//!
//! Frame conversions round to the nearest frame so that a duration converted
//! to frames and back lands on the same millisecond for every sample rate of
//! at least 1 kHz.
//!
//! # Examples
//!
//! ```rust
//! use csync_common::timing::*;
//!
//! assert_eq!(ms_to_frames(1000, 44100), 44_100);
//! assert_eq!(frames_to_ms(22_050, 44100), 500);
//! assert_eq!(format_duration_ms(150_000), "2:30");
//! ```

/// Convert a millisecond duration or position to frames at `sample_rate`
pub fn ms_to_frames(milliseconds: u64, sample_rate: u32) -> usize {
    ((milliseconds as f64 * sample_rate as f64) / 1000.0).round() as usize
}

/// Convert a frame count to milliseconds at `sample_rate` (rounded)
pub fn frames_to_ms(frames: usize, sample_rate: u32) -> u64 {
    if sample_rate == 0 {
        return 0;
    }
    ((frames as f64 * 1000.0) / sample_rate as f64).round() as u64
}

/// Convert seconds to milliseconds (unrounded)
pub fn seconds_to_ms(seconds: f64) -> f64 {
    seconds * 1000.0
}

/// Convert a seconds position to a frame index, truncating toward zero
///
/// Negative positions map to frame 0.
pub fn seconds_to_frame_index(seconds: f64, sample_rate: u32) -> usize {
    if seconds <= 0.0 {
        return 0;
    }
    (seconds * sample_rate as f64) as usize
}

/// Format a duration as `M:SS` using rounded whole seconds
pub fn format_duration_ms(milliseconds: u64) -> String {
    let total_seconds = (milliseconds as f64 / 1000.0).round() as u64;
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ms_frame_round_trip() {
        for rate in [8000, 22050, 44100, 48000, 96000] {
            for ms in [0u64, 1, 7, 333, 1500, 60_000, 239_999] {
                let frames = ms_to_frames(ms, rate);
                assert_eq!(frames_to_ms(frames, rate), ms, "rate {} ms {}", rate, ms);
            }
        }
    }

    #[test]
    fn test_frames_to_ms_zero_rate() {
        assert_eq!(frames_to_ms(1000, 0), 0);
    }

    #[test]
    fn test_seconds_to_frame_index() {
        assert_eq!(seconds_to_frame_index(1.5, 1000), 1500);
        assert_eq!(seconds_to_frame_index(-3.0, 44100), 0);
        assert_eq!(seconds_to_frame_index(0.00001, 44100), 0);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration_ms(0), "0:00");
        assert_eq!(format_duration_ms(59_400), "0:59");
        assert_eq!(format_duration_ms(59_600), "1:00");
        assert_eq!(format_duration_ms(165_000), "2:45");
        assert_eq!(format_duration_ms(240_000), "4:00");
    }
}
