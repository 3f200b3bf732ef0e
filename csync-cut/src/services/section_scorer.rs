//! Section desirability scoring
//!
//! Additive score per section:
//! - type weight by label (unknown labels get the default weight)
//! - `energy * energy_multiplier` (RMS amplitude over the section)
//! - opening bonus for the first section
//! - chorus bonus for the first and the last chorus (applied at most once,
//!   so a lone chorus receives it once)
//! - tag priority when the section is tagged

use std::collections::HashMap;

use csync_common::models::{SectionTag, TagMap};
use serde::{Deserialize, Serialize};

use super::section_namer::NamedSection;

/// Label weights and positional bonuses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub type_weights: HashMap<String, f64>,
    pub default_weight: f64,
    pub energy_multiplier: f64,
    pub opening_bonus: f64,
    pub chorus_position_bonus: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        let type_weights = [
            ("chorus", 10.0),
            ("bridge", 6.0),
            ("verse", 5.0),
            ("instrumental", 4.0),
            ("intro", 2.0),
            ("outro", 2.0),
        ]
        .into_iter()
        .map(|(label, weight)| (label.to_string(), weight))
        .collect();

        Self {
            type_weights,
            default_weight: 3.0,
            energy_multiplier: 20.0,
            opening_bonus: 3.0,
            chorus_position_bonus: 4.0,
        }
    }
}

impl ScoringWeights {
    pub fn type_weight(&self, label: &str) -> f64 {
        self.type_weights
            .get(label)
            .copied()
            .unwrap_or(self.default_weight)
    }
}

/// Score added for each tag
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagPriorities {
    pub must: f64,
    pub open: f64,
    pub finale: f64,
    pub keep: f64,
    pub skip: f64,
}

impl Default for TagPriorities {
    fn default() -> Self {
        Self {
            must: 100.0,
            open: 90.0,
            finale: 90.0,
            keep: 50.0,
            skip: -1000.0,
        }
    }
}

impl TagPriorities {
    pub fn priority(&self, tag: SectionTag) -> f64 {
        match tag {
            SectionTag::Must => self.must,
            SectionTag::Open => self.open,
            SectionTag::Finale => self.finale,
            SectionTag::Keep => self.keep,
            SectionTag::Skip => self.skip,
        }
    }
}

/// A named section with its score, duration (seconds) and tag
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSection {
    pub section: NamedSection,
    pub score: f64,
    pub duration: f64,
    pub tag: Option<SectionTag>,
}

impl ScoredSection {
    pub fn name(&self) -> &str {
        &self.section.name
    }

    pub fn label(&self) -> &str {
        &self.section.label
    }
}

#[derive(Debug, Clone, Default)]
pub struct SectionScorer {
    weights: ScoringWeights,
    priorities: TagPriorities,
}

impl SectionScorer {
    pub fn new(weights: ScoringWeights, priorities: TagPriorities) -> Self {
        Self {
            weights,
            priorities,
        }
    }

    /// Score the section at `index` of `sections`
    ///
    /// `energy(start_s, end_s)` returns the RMS amplitude of the interval.
    pub fn score<E>(
        &self,
        index: usize,
        sections: &[NamedSection],
        tags: &TagMap,
        energy: &E,
    ) -> ScoredSection
    where
        E: Fn(f64, f64) -> f64,
    {
        let section = &sections[index];
        let tag = tags.get(&section.name).copied();

        let mut score = self.weights.type_weight(&section.label);
        score += energy(section.start, section.end) * self.weights.energy_multiplier;

        if index == 0 {
            score += self.weights.opening_bonus;
        }

        if section.label == "chorus" {
            let first = sections.iter().position(|s| s.label == "chorus");
            let last = sections.iter().rposition(|s| s.label == "chorus");
            if first == Some(index) || last == Some(index) {
                score += self.weights.chorus_position_bonus;
            }
        }

        if let Some(tag) = tag {
            score += self.priorities.priority(tag);
        }

        ScoredSection {
            section: section.clone(),
            score,
            duration: section.duration(),
            tag,
        }
    }

    /// Score every section in order
    pub fn score_all<E>(&self, sections: &[NamedSection], tags: &TagMap, energy: E) -> Vec<ScoredSection>
    where
        E: Fn(f64, f64) -> f64,
    {
        (0..sections.len())
            .map(|index| self.score(index, sections, tags, &energy))
            .collect()
    }
}
