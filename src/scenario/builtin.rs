//! Built-in stations
//!
//! Scenario YAML embedded in the binary at compile time, so `osce practice`
//! works without any scenario directory.

use std::sync::LazyLock;

/// A built-in scenario embedded in the binary.
pub struct BuiltinScenario {
    /// Identifier; must match the `id` inside the YAML.
    pub id: &'static str,

    /// Raw YAML content.
    pub yaml: &'static str,
}

static BUILTIN_SCENARIOS: LazyLock<Vec<BuiltinScenario>> = LazyLock::new(|| {
    vec![
        BuiltinScenario {
            id: "knee-pain-history",
            yaml: include_str!("../../scenarios/knee-pain-history.yaml"),
        },
        BuiltinScenario {
            id: "lower-back-pain-history",
            yaml: include_str!("../../scenarios/lower-back-pain-history.yaml"),
        },
        BuiltinScenario {
            id: "post-op-thr-exercise",
            yaml: include_str!("../../scenarios/post-op-thr-exercise.yaml"),
        },
        BuiltinScenario {
            id: "knee-examination",
            yaml: include_str!("../../scenarios/knee-examination.yaml"),
        },
    ]
});

/// Returns all built-in scenarios in registry order.
#[must_use]
pub fn builtin_scenarios() -> &'static [BuiltinScenario] {
    &BUILTIN_SCENARIOS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::loader::ScenarioLoader;
    use std::collections::HashSet;

    #[test]
    fn all_builtin_scenarios_load_cleanly() {
        let loader = ScenarioLoader::with_defaults();
        for builtin in builtin_scenarios() {
            let result = loader.load_from_str(builtin.yaml, builtin.id);
            let loaded = result.unwrap_or_else(|e| panic!("'{}' failed: {e}", builtin.id));
            assert_eq!(loaded.scenario.id, builtin.id, "id mismatch in YAML");
        }
    }

    #[test]
    fn no_duplicate_ids() {
        let ids: HashSet<&str> = builtin_scenarios().iter().map(|s| s.id).collect();
        assert_eq!(ids.len(), builtin_scenarios().len());
    }

    #[test]
    fn history_stations_are_countdowns() {
        let loader = ScenarioLoader::with_defaults();
        let builtin = builtin_scenarios()
            .iter()
            .find(|s| s.id == "knee-pain-history")
            .unwrap();
        let scenario = loader.load_from_str(builtin.yaml, builtin.id).unwrap().scenario;
        let durations: Vec<u64> = scenario
            .phases
            .iter()
            .filter_map(|p| p.duration.map(|d| d.as_secs()))
            .collect();
        assert_eq!(durations, [420, 180]);
        assert_eq!(scenario.phases[1].prompts.len(), 3);
    }
}
