//! Session state types
//!
//! Small value types shared by the engine, the scorer and the result
//! record: typed checklist keys, the session status, user identity and
//! transition records.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::scenario::PhaseDefinition;
use crate::session::timer::TimerReading;

/// Opaque identity of an authenticated candidate.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Creates a new `UserId` from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// The raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key of one checklist entry: which phase, which label.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ItemKey {
    /// Zero-based phase index
    pub phase: usize,
    /// Checklist label as written in the phase definition
    pub label: String,
}

impl ItemKey {
    /// Creates a key for `label` in `phase`.
    #[must_use]
    pub fn new(phase: usize, label: impl Into<String>) -> Self {
        Self {
            phase,
            label: label.into(),
        }
    }
}

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Created but `start()` not yet called.
    NotStarted,
    /// Running; `phase` is the active phase index.
    Active {
        /// Zero-based index of the active phase
        phase: usize,
    },
    /// All phases left; the result has been computed.
    Terminal,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not started"),
            Self::Active { phase } => write!(f, "active in phase {phase}"),
            Self::Terminal => write!(f, "complete"),
        }
    }
}

/// Why a phase transition happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionReason {
    /// Candidate moved on.
    Manual,
    /// Candidate went back a phase.
    Retreat,
    /// Countdown ran out and the host polled.
    Timeout,
    /// Candidate ended the station early.
    Finish,
}

impl fmt::Display for TransitionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => write!(f, "manual"),
            Self::Retreat => write!(f, "retreat"),
            Self::Timeout => write!(f, "timeout"),
            Self::Finish => write!(f, "finish"),
        }
    }
}

/// Record of one phase transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseTransition {
    /// Phase index that was left
    pub from: usize,
    /// Phase index entered; equal to the phase count when the session ended
    pub to: usize,
    /// What caused the transition
    pub reason: TransitionReason,
    /// Total time banked for `from` at the moment it was left
    pub from_elapsed: Duration,
    /// Whether this transition ended the session
    pub terminal: bool,
}

/// Read-only view of one phase for display.
#[derive(Debug, Clone)]
pub struct PhaseView<'a> {
    /// Zero-based phase index
    pub index: usize,
    /// The phase definition
    pub definition: &'a PhaseDefinition,
    /// Checklist labels with their checked state, in definition order
    pub items: Vec<(&'a str, bool)>,
    /// Candidate's notes for the phase
    pub notes: &'a str,
    /// Prompts with the candidate's current answers, in prompt order
    pub answers: Vec<(&'a str, &'a str)>,
    /// Timer reading; live for the active phase, frozen otherwise
    pub timer: TimerReading,
    /// Whether the phase can be edited right now
    pub editable: bool,
}

impl PhaseView<'_> {
    /// Number of checked items.
    #[must_use]
    pub fn checked_count(&self) -> usize {
        self.items.iter().filter(|(_, checked)| *checked).count()
    }
}
