//! Station session engine
//!
//! Everything needed to run one timed attempt at a station: the
//! [`StationSession`] state machine, its phase timers and clock seam, the
//! checklist scorer, and the immutable [`SessionResult`] it produces.

pub mod clock;
pub mod engine;
pub mod result;
pub mod scoring;
pub mod state;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::StationSession;
pub use result::{ChecklistEntry, PhaseRecord, PromptAnswer, SessionResult};
pub use scoring::{ChecklistScorer, PhaseScore, Scorecard};
pub use state::{ItemKey, PhaseTransition, PhaseView, SessionStatus, TransitionReason, UserId};
pub use timer::{PhaseTimer, TimerMode, TimerReading, format_clock};

#[cfg(test)]
pub(crate) mod testing {
    use std::time::Duration;

    use chrono::Utc;
    use uuid::Uuid;

    use super::{ChecklistEntry, PhaseRecord, SessionResult, UserId};

    /// A one-phase, half-scored result for store tests.
    pub fn sample_result(user: &str, scenario_id: &str) -> SessionResult {
        let now = Utc::now();
        SessionResult {
            session_id: Uuid::new_v4(),
            user_id: UserId::new(user),
            scenario_id: scenario_id.to_string(),
            scenario_title: format!("Scenario {scenario_id}"),
            started_at: now,
            completed_at: now,
            total_elapsed: Duration::from_secs(300),
            ended_early: false,
            over_target: false,
            phases: vec![PhaseRecord {
                index: 0,
                name: "History".into(),
                elapsed: Duration::from_secs(300),
                checked: 1,
                total: 2,
                percentage: 50.0,
                notes: String::new(),
                answers: Vec::new(),
                checklist: vec![
                    ChecklistEntry {
                        label: "Introduces self".into(),
                        checked: true,
                    },
                    ChecklistEntry {
                        label: "Confirms identity".into(),
                        checked: false,
                    },
                ],
            }],
            checked_items: 1,
            total_items: 2,
            percentage: 50.0,
        }
    }
}
