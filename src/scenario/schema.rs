//! Scenario definition types
//!
//! Serde types for station scenarios. A scenario is an ordered list of
//! phases; each phase carries instructional content, optional prompts,
//! an ordered checklist and an optional countdown duration. Definitions
//! are immutable once loaded and shared behind `Arc`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ============================================================================
// Scenario
// ============================================================================

/// A complete station scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioDefinition {
    /// Stable identifier (kebab-case, e.g. `knee-pain-history`)
    pub id: String,

    /// Display title
    pub title: String,

    /// Patient vignette or station brief
    #[serde(default)]
    pub description: String,

    /// Free-form grouping used by listings (e.g. `msk`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Advisory overall time target. Reported when exceeded, never enforced.
    #[serde(
        default,
        with = "duration_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub target_time: Option<Duration>,

    /// Sample model answer shown after the station ends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_answer: Option<String>,

    /// Case analysis: what the vignette implies and why it matters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,

    /// Ordered phases
    #[serde(default)]
    pub phases: Vec<PhaseDefinition>,
}

impl ScenarioDefinition {
    /// Creates a scenario with no description, category or target time.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        phases: Vec<PhaseDefinition>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            category: None,
            target_time: None,
            model_answer: None,
            analysis: None,
            phases,
        }
    }

    /// Returns the phase at `index`, if any.
    #[must_use]
    pub fn phase(&self, index: usize) -> Option<&PhaseDefinition> {
        self.phases.get(index)
    }

    /// Number of phases.
    #[must_use]
    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    /// Total number of checklist items across all phases.
    #[must_use]
    pub fn total_items(&self) -> usize {
        self.phases.iter().map(|p| p.checklist.len()).sum()
    }
}

// ============================================================================
// Phase
// ============================================================================

/// One timed segment of a station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhaseDefinition {
    /// Phase name shown to the candidate
    pub name: String,

    /// Instructions or findings for this phase
    #[serde(default)]
    pub content: String,

    /// Questions put to the candidate (VIVA, functional questions)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prompts: Vec<String>,

    /// Expected actions, in display order. Labels are unique within a phase.
    #[serde(default)]
    pub checklist: Vec<String>,

    /// Countdown length. `None` runs the phase as an open stopwatch.
    #[serde(
        default,
        with = "duration_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<Duration>,
}

impl PhaseDefinition {
    /// Creates an open-ended phase with the given checklist.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, checklist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            content: String::new(),
            prompts: Vec::new(),
            checklist: checklist.into_iter().map(Into::into).collect(),
            duration: None,
        }
    }

    /// Turns this phase into a countdown of the given length.
    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Sets the questions asked during the phase.
    #[must_use]
    pub fn with_prompts<I, S>(mut self, prompts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prompts = prompts.into_iter().map(Into::into).collect();
        self
    }

    /// Returns `true` if `label` is one of this phase's checklist items.
    #[must_use]
    pub fn has_item(&self, label: &str) -> bool {
        self.checklist.iter().any(|item| item == label)
    }

    /// Returns the checklist label at `index`, if any.
    #[must_use]
    pub fn item(&self, index: usize) -> Option<&str> {
        self.checklist.get(index).map(String::as_str)
    }
}

// ============================================================================
// Duration (de)serialization
// ============================================================================

/// Human-readable durations (`"7m"`, `"90s"`, `"1h 30m"`) via `humantime`.
mod duration_opt {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(d) => serializer.serialize_str(&humantime::format_duration(*d).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| {
            humantime::parse_duration(s.trim())
                .map_err(|e| serde::de::Error::custom(format!("invalid duration '{s}': {e}")))
        })
        .transpose()
    }
}
