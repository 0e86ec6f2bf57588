//! Station session engine
//!
//! [`StationSession`] is the state machine for one candidate's attempt at
//! one station: `NotStarted → Active(phase) → Terminal`. It owns the
//! checklist, notes and per-phase timing for the attempt and produces the
//! [`SessionResult`] when the last phase is left.
//!
//! The engine is synchronous and purely reactive. It reads its [`Clock`]
//! once per call and never changes state on its own; countdown expiry is
//! acted on only when the host calls [`StationSession::poll`].

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{OsceError, SessionError};
use crate::scenario::{PhaseDefinition, ScenarioDefinition};
use crate::session::clock::{Clock, SystemClock};
use crate::session::result::{ChecklistEntry, PhaseRecord, PromptAnswer, SessionResult};
use crate::session::scoring::{ChecklistScorer, Scorecard};
use crate::session::state::{
    ItemKey, PhaseTransition, PhaseView, SessionStatus, TransitionReason, UserId,
};
use crate::session::timer::{PhaseTimer, TimerMode, TimerReading};
use crate::store::ResultStore;

/// Minimum normalized similarity for a "did you mean" checklist hint.
const SUGGESTION_THRESHOLD: f64 = 0.6;

/// One candidate's attempt at one station.
///
/// Not internally synchronized: the caller (a single candidate's UI
/// session) issues one call at a time.
pub struct StationSession {
    id: Uuid,
    user: UserId,
    scenario: Arc<ScenarioDefinition>,
    clock: Arc<dyn Clock>,
    status: SessionStatus,
    /// Live timer for the active phase
    timer: Option<PhaseTimer>,
    started_at: Option<DateTime<Utc>>,
    checked: BTreeMap<ItemKey, bool>,
    notes: BTreeMap<usize, String>,
    /// Answers keyed by `(phase, prompt)`
    answers: BTreeMap<(usize, usize), String>,
    /// Highest phase index entered so far
    furthest: usize,
    /// Frozen time per phase. Holds every index below the active one, plus
    /// any later phase the candidate left by retreating.
    elapsed: BTreeMap<usize, Duration>,
    ended_early: bool,
    result: Option<SessionResult>,
    saved: bool,
}

impl StationSession {
    /// Creates a session that has not started yet.
    #[must_use]
    pub fn new(user: UserId, scenario: Arc<ScenarioDefinition>, clock: Arc<dyn Clock>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user,
            scenario,
            clock,
            status: SessionStatus::NotStarted,
            timer: None,
            started_at: None,
            checked: BTreeMap::new(),
            notes: BTreeMap::new(),
            answers: BTreeMap::new(),
            furthest: 0,
            elapsed: BTreeMap::new(),
            ended_early: false,
            result: None,
            saved: false,
        }
    }

    /// Creates a session timed by the system clock.
    #[must_use]
    pub fn with_system_clock(user: UserId, scenario: Arc<ScenarioDefinition>) -> Self {
        Self::new(user, scenario, Arc::new(SystemClock))
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Starts the first phase.
    ///
    /// # Errors
    ///
    /// - [`SessionError::InvalidTransition`] if already started
    /// - [`SessionError::EmptyScenario`] if the scenario has no phases
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.status != SessionStatus::NotStarted {
            return Err(self.invalid("start"));
        }
        if self.scenario.phases.is_empty() {
            return Err(SessionError::EmptyScenario {
                scenario_id: self.scenario.id.clone(),
            });
        }

        let now = self.clock.now();
        self.started_at = Some(self.clock.wall());
        self.enter_phase(0, now);

        info!(
            session = %self.id,
            user = %self.user,
            scenario = %self.scenario.id,
            phases = self.scenario.phase_count(),
            "session started"
        );
        Ok(())
    }

    /// Checks or unchecks a checklist item in the active phase.
    ///
    /// Repeating a call with the same arguments changes nothing.
    ///
    /// # Errors
    ///
    /// - [`SessionError::InvalidTransition`] unless the session is active
    /// - [`SessionError::PhaseMismatch`] if `phase` is not the active phase
    /// - [`SessionError::UnknownItem`] if `label` is not in that phase
    pub fn toggle_item(
        &mut self,
        phase: usize,
        label: &str,
        checked: bool,
    ) -> Result<(), SessionError> {
        let definition = self.editable_phase(phase, "toggle a checklist item")?;
        if !definition.has_item(label) {
            return Err(SessionError::UnknownItem {
                phase,
                label: label.to_string(),
                suggestion: suggest_item(definition, label),
            });
        }

        self.checked.insert(ItemKey::new(phase, label), checked);
        debug!(session = %self.id, phase, label, checked, "checklist item set");
        Ok(())
    }

    /// Replaces the notes for the active phase.
    ///
    /// # Errors
    ///
    /// - [`SessionError::InvalidTransition`] unless the session is active
    /// - [`SessionError::PhaseMismatch`] if `phase` is not the active phase
    pub fn set_notes(&mut self, phase: usize, text: impl Into<String>) -> Result<(), SessionError> {
        self.editable_phase(phase, "edit notes")?;
        let text = text.into();
        debug!(session = %self.id, phase, chars = text.chars().count(), "notes updated");
        self.notes.insert(phase, text);
        Ok(())
    }

    /// Replaces the answer to prompt `prompt` of the active phase.
    ///
    /// # Errors
    ///
    /// - [`SessionError::InvalidTransition`] unless the session is active
    /// - [`SessionError::PhaseMismatch`] if `phase` is not the active phase
    /// - [`SessionError::UnknownPrompt`] if the phase has no such prompt
    pub fn set_answer(
        &mut self,
        phase: usize,
        prompt: usize,
        text: impl Into<String>,
    ) -> Result<(), SessionError> {
        let count = self.editable_phase(phase, "answer a prompt")?.prompts.len();
        if prompt >= count {
            return Err(SessionError::UnknownPrompt {
                phase,
                prompt,
                count,
            });
        }
        let text = text.into();
        debug!(session = %self.id, phase, prompt, chars = text.chars().count(), "answer updated");
        self.answers.insert((phase, prompt), text);
        Ok(())
    }

    /// Leaves the active phase and enters the next one, or ends the session
    /// after the last phase.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidTransition`] unless the session is active.
    pub fn advance(&mut self) -> Result<PhaseTransition, SessionError> {
        let now = self.clock.now();
        self.advance_at(now, TransitionReason::Manual)
    }

    /// Goes back to the previous phase, resuming its clock from the time
    /// already spent there.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidTransition`] unless the session is
    /// active in a phase other than the first.
    pub fn retreat(&mut self) -> Result<PhaseTransition, SessionError> {
        let current = self.require_active("retreat")?;
        if current == 0 {
            return Err(SessionError::InvalidTransition {
                operation: "retreat",
                state: "in the first phase".to_string(),
            });
        }

        let now = self.clock.now();
        let from_elapsed = self.leave_phase(current, now);
        self.enter_phase(current - 1, now);

        let transition = PhaseTransition {
            from: current,
            to: current - 1,
            reason: TransitionReason::Retreat,
            from_elapsed,
            terminal: false,
        };
        self.log_transition(&transition);
        Ok(transition)
    }

    /// Ends the session from any active phase.
    ///
    /// Every remaining phase is left at the same instant, so phases never
    /// visited record zero time and zero checked items. The result counts
    /// as ended early only if the final phase was never reached.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidTransition`] unless the session is active.
    pub fn finish(&mut self) -> Result<Vec<PhaseTransition>, SessionError> {
        let current = self.require_active("finish")?;
        let now = self.clock.now();
        self.ended_early = self.furthest + 1 < self.scenario.phase_count();

        let mut transitions = Vec::with_capacity(self.scenario.phase_count() - current);
        loop {
            let transition = self.advance_at(now, TransitionReason::Finish)?;
            let terminal = transition.terminal;
            transitions.push(transition);
            if terminal {
                return Ok(transitions);
            }
        }
    }

    /// Advances the session if the active phase's countdown has run out.
    ///
    /// Meant to be called by the host on every render or tick. Does
    /// nothing for stopwatch phases or inactive sessions.
    pub fn poll(&mut self) -> Option<PhaseTransition> {
        let now = self.clock.now();
        let expired = self.timer.is_some_and(|t| t.is_expired(now));
        if !expired {
            return None;
        }
        self.advance_at(now, TransitionReason::Timeout).ok()
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Hands the completed result to `store`.
    ///
    /// The result stays in the session whatever happens, so a failed save
    /// can be retried. Once a save succeeds, further calls are no-ops.
    ///
    /// # Errors
    ///
    /// - [`SessionError::InvalidTransition`] if the session has not ended
    /// - the store's error if the append fails
    pub async fn persist(&mut self, store: &dyn ResultStore) -> Result<(), OsceError> {
        let Some(result) = &self.result else {
            return Err(self.invalid("save a result").into());
        };
        if self.saved {
            debug!(session = %self.id, "result already saved");
            return Ok(());
        }

        match store.append(&self.user, result.clone()).await {
            Ok(()) => {
                self.saved = true;
                info!(session = %self.id, user = %self.user, "result saved");
                Ok(())
            }
            Err(e) => {
                warn!(session = %self.id, user = %self.user, error = %e, "result save failed; result retained");
                Err(e.into())
            }
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Unique id of this attempt.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Candidate identity.
    #[must_use]
    pub const fn user(&self) -> &UserId {
        &self.user
    }

    /// The scenario being run.
    #[must_use]
    pub fn scenario(&self) -> &ScenarioDefinition {
        &self.scenario
    }

    /// Lifecycle status.
    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        self.status
    }

    /// Current phase index: `0` before start, the phase count once ended.
    #[must_use]
    pub fn phase_index(&self) -> usize {
        match self.status {
            SessionStatus::NotStarted => 0,
            SessionStatus::Active { phase } => phase,
            SessionStatus::Terminal => self.scenario.phase_count(),
        }
    }

    /// The active phase index, if the session is running.
    #[must_use]
    pub const fn active_phase(&self) -> Option<usize> {
        match self.status {
            SessionStatus::Active { phase } => Some(phase),
            _ => None,
        }
    }

    /// Whether the session has ended.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status == SessionStatus::Terminal
    }

    /// Live timer value for the active phase.
    #[must_use]
    pub fn timer(&self) -> Option<TimerReading> {
        self.timer.map(|t| t.reading(self.clock.now()))
    }

    /// Time spent in `phase` so far: live for the active phase, frozen
    /// for phases already left, `None` for phases never left.
    #[must_use]
    pub fn phase_elapsed(&self, phase: usize) -> Option<Duration> {
        if self.active_phase() == Some(phase) {
            return self.timer.map(|t| t.elapsed(self.clock.now()));
        }
        self.elapsed.get(&phase).copied()
    }

    /// Whether `label` in `phase` is currently checked.
    #[must_use]
    pub fn is_checked(&self, phase: usize, label: &str) -> bool {
        self.checked
            .get(&ItemKey::new(phase, label))
            .copied()
            .unwrap_or(false)
    }

    /// Number of checked items in `phase`.
    #[must_use]
    pub fn checked_count(&self, phase: usize) -> usize {
        self.checked
            .iter()
            .filter(|(key, checked)| key.phase == phase && **checked)
            .count()
    }

    /// Every checklist entry touched so far, including unchecked ones.
    #[must_use]
    pub const fn checklist(&self) -> &BTreeMap<ItemKey, bool> {
        &self.checked
    }

    /// Notes for `phase` (empty if none).
    #[must_use]
    pub fn notes(&self, phase: usize) -> &str {
        self.notes.get(&phase).map_or("", String::as_str)
    }

    /// Answer to `prompt` in `phase` (empty if none).
    #[must_use]
    pub fn answer(&self, phase: usize, prompt: usize) -> &str {
        self.answers.get(&(phase, prompt)).map_or("", String::as_str)
    }

    /// Notes for every phase that has any.
    #[must_use]
    pub const fn all_notes(&self) -> &BTreeMap<usize, String> {
        &self.notes
    }

    /// Display view of `phase`, or `None` if out of range.
    #[must_use]
    pub fn phase_view(&self, phase: usize) -> Option<PhaseView<'_>> {
        let definition = self.scenario.phase(phase)?;
        let editable = self.active_phase() == Some(phase);
        let timer = if editable {
            self.timer()?
        } else {
            let elapsed = self.elapsed.get(&phase).copied().unwrap_or_default();
            TimerReading {
                elapsed,
                remaining: definition.duration.map(|d| d.saturating_sub(elapsed)),
            }
        };

        Some(PhaseView {
            index: phase,
            definition,
            items: definition
                .checklist
                .iter()
                .map(|label| (label.as_str(), self.is_checked(phase, label)))
                .collect(),
            notes: self.notes(phase),
            answers: definition
                .prompts
                .iter()
                .enumerate()
                .map(|(i, prompt)| (prompt.as_str(), self.answer(phase, i)))
                .collect(),
            timer,
            editable,
        })
    }

    /// Live score over the current checklist state.
    #[must_use]
    pub fn scorecard(&self) -> Scorecard {
        ChecklistScorer::score(&self.scenario, &self.checked)
    }

    /// The completed result, once the session has ended.
    #[must_use]
    pub const fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    /// Whether the result has been handed to a store successfully.
    #[must_use]
    pub const fn is_saved(&self) -> bool {
        self.saved
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn advance_at(
        &mut self,
        now: Instant,
        reason: TransitionReason,
    ) -> Result<PhaseTransition, SessionError> {
        let current = self.require_active("advance")?;
        let from_elapsed = self.leave_phase(current, now);

        let next = current + 1;
        let terminal = next == self.scenario.phase_count();
        if terminal {
            self.status = SessionStatus::Terminal;
            self.result = Some(self.build_result());
        } else {
            self.enter_phase(next, now);
        }

        let transition = PhaseTransition {
            from: current,
            to: next,
            reason,
            from_elapsed,
            terminal,
        };
        self.log_transition(&transition);
        Ok(transition)
    }

    /// Makes `index` active, resuming any time banked for it.
    fn enter_phase(&mut self, index: usize, now: Instant) {
        let baseline = self.elapsed.remove(&index).unwrap_or_default();
        let mode = TimerMode::from_duration(self.scenario.phases[index].duration);
        self.timer = Some(PhaseTimer::resume(mode, now, baseline));
        self.status = SessionStatus::Active { phase: index };
        self.furthest = self.furthest.max(index);
    }

    /// Freezes the active phase's time and stops its timer.
    fn leave_phase(&mut self, index: usize, now: Instant) -> Duration {
        let spent = self.timer.take().map_or(Duration::ZERO, |t| t.elapsed(now));
        self.elapsed.insert(index, spent);
        spent
    }

    fn require_active(&self, operation: &'static str) -> Result<usize, SessionError> {
        self.active_phase().ok_or_else(|| self.invalid(operation))
    }

    fn editable_phase(
        &self,
        phase: usize,
        operation: &'static str,
    ) -> Result<&PhaseDefinition, SessionError> {
        let current = self.require_active(operation)?;
        if phase != current {
            return Err(SessionError::PhaseMismatch {
                requested: phase,
                current,
            });
        }
        Ok(&self.scenario.phases[current])
    }

    fn invalid(&self, operation: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            operation,
            state: self.status.to_string(),
        }
    }

    fn build_result(&self) -> SessionResult {
        let card = self.scorecard();
        let phases: Vec<PhaseRecord> = self
            .scenario
            .phases
            .iter()
            .zip(card.phases)
            .map(|(definition, score)| PhaseRecord {
                index: score.phase,
                name: score.name,
                elapsed: self.elapsed.get(&score.phase).copied().unwrap_or_default(),
                checked: score.checked,
                total: score.total,
                percentage: score.percentage,
                notes: self.notes(score.phase).to_string(),
                answers: definition
                    .prompts
                    .iter()
                    .enumerate()
                    .map(|(i, prompt)| PromptAnswer {
                        prompt: prompt.clone(),
                        answer: self.answer(score.phase, i).to_string(),
                    })
                    .collect(),
                checklist: definition
                    .checklist
                    .iter()
                    .map(|label| ChecklistEntry {
                        label: label.clone(),
                        checked: self.is_checked(score.phase, label),
                    })
                    .collect(),
            })
            .collect();

        let total_elapsed: Duration = phases.iter().map(|p| p.elapsed).sum();
        let completed_at = self.clock.wall();

        SessionResult {
            session_id: self.id,
            user_id: self.user.clone(),
            scenario_id: self.scenario.id.clone(),
            scenario_title: self.scenario.title.clone(),
            started_at: self.started_at.unwrap_or(completed_at),
            completed_at,
            total_elapsed,
            ended_early: self.ended_early,
            over_target: self.scenario.target_time.is_some_and(|t| total_elapsed > t),
            phases,
            checked_items: card.checked,
            total_items: card.total,
            percentage: card.percentage,
        }
    }

    fn log_transition(&self, transition: &PhaseTransition) {
        info!(
            session = %self.id,
            from = transition.from,
            to = transition.to,
            reason = %transition.reason,
            elapsed_ms = u64::try_from(transition.from_elapsed.as_millis()).unwrap_or(u64::MAX),
            terminal = transition.terminal,
            "phase transition"
        );
    }
}

impl std::fmt::Debug for StationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StationSession")
            .field("id", &self.id)
            .field("user", &self.user)
            .field("scenario", &self.scenario.id)
            .field("status", &self.status)
            .field("furthest", &self.furthest)
            .field("saved", &self.saved)
            .finish_non_exhaustive()
    }
}

/// Closest checklist label to `input` in `phase`, if reasonably close.
fn suggest_item(phase: &PhaseDefinition, input: &str) -> Option<String> {
    phase
        .checklist
        .iter()
        .map(|label| {
            (
                label,
                strsim::normalized_damerau_levenshtein(&input.to_lowercase(), &label.to_lowercase()),
            )
        })
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(label, _)| label.clone())
}
