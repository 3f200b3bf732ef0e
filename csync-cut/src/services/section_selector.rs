//! Greedy section selection toward a target duration
//!
//! This is a greedy-by-score heuristic, not an optimal subset-sum solver:
//! 1. MUST, OPEN and FINALE sections are always selected
//! 2. SKIP sections are never selected
//! 3. Remaining sections are taken by descending score (ties keep song
//!    order) until the selected duration reaches the target; the section
//!    that crosses the target is included whole
//! 4. A shortfall is accepted when candidates run out
//!
//! Playback order: OPEN sections, then the rest in song order, then FINALE
//! sections.

use csync_common::models::SectionTag;

use super::section_scorer::ScoredSection;
use crate::error::{CutError, CutResult};

pub fn select_sections(scored: &[ScoredSection], target_seconds: f64) -> CutResult<Vec<ScoredSection>> {
    let mut selected = vec![false; scored.len()];
    let mut selected_duration = 0.0;

    for (i, section) in scored.iter().enumerate() {
        if section.tag.map_or(false, |t| t.is_mandatory()) {
            selected[i] = true;
            selected_duration += section.duration;
        }
    }

    let mut candidates: Vec<usize> = (0..scored.len())
        .filter(|&i| !selected[i] && scored[i].tag != Some(SectionTag::Skip))
        .collect();
    // sort_by is stable: equal scores keep song order
    candidates.sort_by(|&a, &b| scored[b].score.total_cmp(&scored[a].score));

    for i in candidates {
        if selected_duration >= target_seconds {
            break;
        }
        selected[i] = true;
        selected_duration += scored[i].duration;
    }

    let picked = || {
        scored
            .iter()
            .zip(&selected)
            .filter(|(_, keep)| **keep)
            .map(|(section, _)| section)
    };
    let opening = picked().filter(|s| s.tag == Some(SectionTag::Open));
    let middle = picked().filter(|s| !matches!(s.tag, Some(SectionTag::Open | SectionTag::Finale)));
    let finale = picked().filter(|s| s.tag == Some(SectionTag::Finale));

    let ordered: Vec<ScoredSection> = opening.chain(middle).chain(finale).cloned().collect();

    if ordered.is_empty() {
        return Err(CutError::NoSectionsSelected);
    }

    tracing::debug!(
        selected = ?ordered.iter().map(|s| s.name()).collect::<Vec<_>>(),
        selected_seconds = selected_duration,
        target_seconds = target_seconds,
        "Sections selected"
    );

    Ok(ordered)
}
