//! Downbeat alignment of cut points

use csync_common::timing::seconds_to_ms;

/// Snap a millisecond position to the nearest downbeat (seconds)
///
/// Returns the downbeat in whole milliseconds (truncated). Exact ties go to
/// the earlier downbeat. With no downbeats the position is returned rounded.
pub fn snap_to_downbeat(position_ms: f64, downbeats: &[f64]) -> u64 {
    let position_s = position_ms / 1000.0;

    downbeats
        .iter()
        .copied()
        .min_by(|a, b| (a - position_s).abs().total_cmp(&(b - position_s).abs()))
        .map(|closest| seconds_to_ms(closest).max(0.0) as u64)
        .unwrap_or_else(|| position_ms.max(0.0).round() as u64)
}
