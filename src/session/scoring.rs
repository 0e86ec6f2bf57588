//! Checklist scoring
//!
//! Turns checked-item state into per-phase and overall percentages.
//! Scoring is structural only: it counts ticked boxes, nothing more.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::scenario::ScenarioDefinition;
use crate::session::state::ItemKey;

/// Score for a single phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseScore {
    /// Zero-based phase index
    pub phase: usize,
    /// Phase name
    pub name: String,
    /// Items checked
    pub checked: usize,
    /// Items defined
    pub total: usize,
    /// `checked / total` as a percentage, one decimal place
    pub percentage: f64,
}

/// Scores for a whole scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scorecard {
    /// One entry per phase, in phase order
    pub phases: Vec<PhaseScore>,
    /// Items checked across all phases
    pub checked: usize,
    /// Items defined across all phases
    pub total: usize,
    /// Overall percentage, one decimal place
    pub percentage: f64,
}

/// Aggregates checklist state into a [`Scorecard`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ChecklistScorer;

impl ChecklistScorer {
    /// Scores `checked` against `scenario`.
    ///
    /// Only entries that are `true` and whose label belongs to the phase's
    /// definition count, so `checked <= total` holds for every phase.
    /// Neither input is modified.
    #[must_use]
    pub fn score(scenario: &ScenarioDefinition, checked: &BTreeMap<ItemKey, bool>) -> Scorecard {
        let phases: Vec<PhaseScore> = scenario
            .phases
            .iter()
            .enumerate()
            .map(|(index, phase)| {
                let done = phase
                    .checklist
                    .iter()
                    .filter(|label| {
                        checked
                            .get(&ItemKey::new(index, label.as_str()))
                            .copied()
                            .unwrap_or(false)
                    })
                    .count();
                let total = phase.checklist.len();
                PhaseScore {
                    phase: index,
                    name: phase.name.clone(),
                    checked: done,
                    total,
                    percentage: percentage(done, total),
                }
            })
            .collect();

        let checked_sum = phases.iter().map(|p| p.checked).sum();
        let total_sum = phases.iter().map(|p| p.total).sum();

        Scorecard {
            phases,
            checked: checked_sum,
            total: total_sum,
            percentage: percentage(checked_sum, total_sum),
        }
    }
}

/// `part / whole` as a percentage rounded to one decimal place.
///
/// A zero `whole` yields `0.0`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    let raw = part as f64 * 100.0 / whole as f64;
    (raw * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::PhaseDefinition;

    fn two_phase() -> ScenarioDefinition {
        ScenarioDefinition::new(
            "two",
            "Two",
            vec![
                PhaseDefinition::new("History", ["a", "b", "c", "d"]),
                PhaseDefinition::new("Exam", ["e", "f"]),
            ],
        )
    }

    fn check(map: &mut BTreeMap<ItemKey, bool>, phase: usize, labels: &[&str]) {
        for label in labels {
            map.insert(ItemKey::new(phase, *label), true);
        }
    }

    #[test]
    fn five_of_six_is_83_point_3() {
        let mut checked = BTreeMap::new();
        check(&mut checked, 0, &["a", "b", "c"]);
        check(&mut checked, 1, &["e", "f"]);

        let card = ChecklistScorer::score(&two_phase(), &checked);
        assert_eq!(card.checked, 5);
        assert_eq!(card.total, 6);
        assert!((card.percentage - 83.3).abs() < f64::EPSILON);
        assert!((card.phases[0].percentage - 75.0).abs() < f64::EPSILON);
        assert!((card.phases[1].percentage - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_item_phase_scores_zero() {
        let scenario = ScenarioDefinition::new(
            "viva",
            "VIVA",
            vec![PhaseDefinition::new("VIVA", Vec::<String>::new())],
        );
        let card = ChecklistScorer::score(&scenario, &BTreeMap::new());
        assert_eq!(card.phases[0].total, 0);
        assert!(card.phases[0].percentage.abs() < f64::EPSILON);
        assert!(card.percentage.abs() < f64::EPSILON);
    }

    #[test]
    fn unchecked_and_foreign_entries_do_not_count() {
        let mut checked = BTreeMap::new();
        checked.insert(ItemKey::new(0, "a"), false);
        checked.insert(ItemKey::new(0, "not-in-phase"), true);
        checked.insert(ItemKey::new(1, "a"), true);
        checked.insert(ItemKey::new(7, "e"), true);

        let card = ChecklistScorer::score(&two_phase(), &checked);
        assert_eq!(card.checked, 0);
    }

    #[test]
    fn inputs_are_untouched() {
        let mut checked = BTreeMap::new();
        check(&mut checked, 0, &["a"]);
        let before = checked.clone();
        let scenario = two_phase();
        let _ = ChecklistScorer::score(&scenario, &checked);
        assert_eq!(checked, before);
        assert_eq!(scenario, two_phase());
    }

    #[test]
    fn percentage_rounds_to_one_decimal() {
        assert!((percentage(1, 3) - 33.3).abs() < f64::EPSILON);
        assert!((percentage(2, 3) - 66.7).abs() < f64::EPSILON);
        assert!((percentage(1, 8) - 12.5).abs() < f64::EPSILON);
        assert!(percentage(0, 0).abs() < f64::EPSILON);
    }
}
