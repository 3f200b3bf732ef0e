//! Stable, tag-addressable section names
//!
//! The n-th section carrying a label is named `{label}{n}` (1-based, input
//! order), so the second chorus is "chorus2". Tags refer to these names.

use std::collections::HashMap;

use csync_common::models::Section;

/// A section plus its tag-addressable name
#[derive(Debug, Clone, PartialEq)]
pub struct NamedSection {
    pub name: String,
    pub label: String,
    /// Start in seconds
    pub start: f64,
    /// End in seconds
    pub end: f64,
}

impl NamedSection {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Name `sections`, preserving order
pub fn name_sections(sections: &[Section]) -> Vec<NamedSection> {
    let mut label_counts: HashMap<&str, usize> = HashMap::new();

    sections
        .iter()
        .map(|section| {
            let count = label_counts.entry(section.label.as_str()).or_insert(0);
            *count += 1;
            NamedSection {
                name: format!("{}{}", section.label, count),
                label: section.label.clone(),
                start: section.start,
                end: section.end,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_per_label() {
        let sections = vec![
            Section::new("intro", 0.0, 8.0),
            Section::new("verse", 8.0, 30.0),
            Section::new("chorus", 30.0, 50.0),
            Section::new("verse", 50.0, 70.0),
            Section::new("chorus", 70.0, 90.0),
        ];

        let names: Vec<String> = name_sections(&sections).into_iter().map(|s| s.name).collect();

        assert_eq!(names, vec!["intro1", "verse1", "chorus1", "verse2", "chorus2"]);
    }

    #[test]
    fn test_names_are_deterministic() {
        let sections = vec![Section::new("chorus", 0.0, 1.0), Section::new("chorus", 1.0, 2.0)];
        assert_eq!(name_sections(&sections), name_sections(&sections));
    }

    #[test]
    fn test_empty_input() {
        assert!(name_sections(&[]).is_empty());
    }
}
