//! Session result records
//!
//! A [`SessionResult`] is built once, when a session reaches its terminal
//! state, and is never modified afterwards. It owns copies of everything
//! it reports, so it shares no storage with the session that produced it.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::state::UserId;
use crate::session::timer::format_clock;

/// Immutable, scored record of one completed station attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    /// Unique id of the attempt
    pub session_id: Uuid,
    /// Candidate identity
    pub user_id: UserId,
    /// Scenario identifier
    pub scenario_id: String,
    /// Scenario title at the time of the attempt
    pub scenario_title: String,
    /// When the candidate pressed start
    pub started_at: DateTime<Utc>,
    /// When the session reached its terminal state
    pub completed_at: DateTime<Utc>,
    /// Sum of all per-phase elapsed times
    #[serde(rename = "total_elapsed_ms", with = "duration_ms")]
    pub total_elapsed: Duration,
    /// Candidate ended the station before the final phase
    pub ended_early: bool,
    /// Total time exceeded the scenario's advisory target
    pub over_target: bool,
    /// Per-phase breakdown, in phase order
    pub phases: Vec<PhaseRecord>,
    /// Items checked across all phases
    pub checked_items: usize,
    /// Items defined across all phases
    pub total_items: usize,
    /// Overall percentage, one decimal place
    pub percentage: f64,
}

impl SessionResult {
    /// `checked/total (pct%)`, e.g. `5/6 (83.3%)`.
    #[must_use]
    pub fn score_line(&self) -> String {
        format!(
            "{}/{} ({:.1}%)",
            self.checked_items, self.total_items, self.percentage
        )
    }

    /// Total time as `MM:SS`.
    #[must_use]
    pub fn time_taken(&self) -> String {
        format_clock(self.total_elapsed)
    }
}

/// Outcome of one phase within a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseRecord {
    /// Zero-based phase index
    pub index: usize,
    /// Phase name
    pub name: String,
    /// Time spent in the phase, summed over every visit
    #[serde(rename = "elapsed_ms", with = "duration_ms")]
    pub elapsed: Duration,
    /// Items checked
    pub checked: usize,
    /// Items defined
    pub total: usize,
    /// Phase percentage, one decimal place
    pub percentage: f64,
    /// Candidate's notes, verbatim
    pub notes: String,
    /// Answers to the phase's prompts, in prompt order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub answers: Vec<PromptAnswer>,
    /// Every checklist item in definition order with its final state
    pub checklist: Vec<ChecklistEntry>,
}

/// Final state of one checklist item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistEntry {
    /// Label as defined in the scenario
    pub label: String,
    /// Whether it was checked at completion
    pub checked: bool,
}

/// A prompt and the candidate's answer to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptAnswer {
    /// Prompt text as defined in the scenario
    pub prompt: String,
    /// Candidate's answer; empty if left blank
    pub answer: String,
}

/// Durations as integer milliseconds.
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
