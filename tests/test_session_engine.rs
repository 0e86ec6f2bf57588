//! End-to-end behaviour of a station session through the public API.

use std::sync::Arc;
use std::time::Duration;

use osce_station::error::SessionError;
use osce_station::scenario::{ScenarioCatalog, ScenarioLoader, ScenarioRepository};
use osce_station::session::{
    ManualClock, SessionStatus, StationSession, TransitionReason, UserId,
};
use osce_station::store::{MemoryResultStore, ResultStore};

const MIN: Duration = Duration::from_secs(60);

fn catalog() -> ScenarioCatalog {
    ScenarioCatalog::builtin(&ScenarioLoader::with_defaults()).unwrap()
}

fn fixture_session(name: &str) -> (StationSession, Arc<ManualClock>) {
    let path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/stations")
        .join(name);
    let loaded = ScenarioLoader::with_defaults().load(&path).unwrap();
    let clock = Arc::new(ManualClock::new());
    let session = StationSession::new(UserId::new("candidate-1"), loaded.scenario, clock.clone());
    (session, clock)
}

// ============================================================================
// Scoring
// ============================================================================

#[test]
fn two_phase_station_scores_five_of_six() {
    let (mut s, _) = fixture_session("two_phase.yaml");
    s.start().unwrap();
    for label in ["Introduces self", "Confirms identity", "Onset"] {
        s.toggle_item(0, label, true).unwrap();
    }
    s.advance().unwrap();
    s.toggle_item(1, "Look", true).unwrap();
    s.toggle_item(1, "Feel", true).unwrap();
    let last = s.advance().unwrap();

    assert!(last.terminal);
    assert_eq!(s.status(), SessionStatus::Terminal);
    let result = s.result().unwrap();
    assert_eq!(result.score_line(), "5/6 (83.3%)");
    assert!((result.phases[0].percentage - 75.0).abs() < f64::EPSILON);
    assert!((result.phases[1].percentage - 100.0).abs() < f64::EPSILON);
}

#[test]
fn discussion_only_phase_scores_zero() {
    let (mut s, _) = fixture_session("countdown.yaml");
    s.start().unwrap();
    s.toggle_item(0, "Onset and duration", true).unwrap();
    s.finish().unwrap();

    let result = s.result().unwrap();
    assert_eq!(result.phases[1].total, 0);
    assert!(result.phases[1].percentage.abs() < f64::EPSILON);
    assert!((result.percentage - 100.0).abs() < f64::EPSILON);
}

// ============================================================================
// Errors leave state untouched
// ============================================================================

#[test]
fn unknown_item_is_rejected_without_side_effects() {
    let (mut s, _) = fixture_session("two_phase.yaml");
    s.start().unwrap();
    s.toggle_item(0, "Onset", true).unwrap();
    let before = s.scorecard();

    let err = s.toggle_item(0, "nonexistent", true).unwrap_err();
    assert!(matches!(err, SessionError::UnknownItem { .. }));
    assert_eq!(s.scorecard(), before);
    assert_eq!(s.status(), SessionStatus::Active { phase: 0 });
}

#[test]
fn advance_before_start_is_rejected() {
    let (mut s, _) = fixture_session("two_phase.yaml");
    assert!(matches!(
        s.advance(),
        Err(SessionError::InvalidTransition { .. })
    ));
    assert_eq!(s.status(), SessionStatus::NotStarted);
}

// ============================================================================
// Timing
// ============================================================================

#[test]
fn retreat_resumes_rather_than_resets() {
    let (mut s, clock) = fixture_session("two_phase.yaml");
    s.start().unwrap();
    clock.advance(3 * MIN);
    s.advance().unwrap();
    clock.advance(MIN);
    s.retreat().unwrap();
    clock.advance(MIN);
    let t = s.advance().unwrap();

    assert_eq!(t.from_elapsed, 4 * MIN);
    assert_eq!(s.phase_elapsed(0), Some(4 * MIN));
}

#[test]
fn countdown_phases_auto_advance_on_poll() {
    let (mut s, clock) = fixture_session("countdown.yaml");
    s.start().unwrap();

    clock.advance(7 * MIN);
    let t = s.poll().unwrap();
    assert_eq!(t.reason, TransitionReason::Timeout);
    assert_eq!(s.active_phase(), Some(1));

    clock.advance(3 * MIN);
    assert!(s.poll().unwrap().terminal);

    let result = s.result().unwrap();
    assert_eq!(result.total_elapsed, 10 * MIN);
    assert!(result.over_target);
    assert!(!result.ended_early);
}

#[test]
fn phase_view_reports_frozen_time_for_left_phases() {
    let (mut s, clock) = fixture_session("countdown.yaml");
    s.start().unwrap();
    clock.advance(2 * MIN);
    s.advance().unwrap();
    clock.advance(MIN);

    let left = s.phase_view(0).unwrap();
    assert!(!left.editable);
    assert_eq!(left.timer.elapsed, 2 * MIN);
    assert_eq!(left.timer.remaining, Some(5 * MIN));

    let active = s.phase_view(1).unwrap();
    assert!(active.editable);
    assert_eq!(active.timer.to_string(), "02:00");
    assert!(s.phase_view(2).is_none());
}

// ============================================================================
// Built-in stations
// ============================================================================

#[tokio::test]
async fn every_builtin_station_runs_to_a_saved_result() {
    let catalog = catalog();
    let store = MemoryResultStore::new();
    let user = UserId::new("candidate-1");

    for scenario in catalog.list() {
        let mut s = StationSession::new(user.clone(), scenario.clone(), Arc::new(ManualClock::new()));
        s.start().unwrap();
        let first = &scenario.phases[0];
        if let Some(label) = first.checklist.first() {
            s.toggle_item(0, label, true).unwrap();
        }
        for _ in 0..scenario.phase_count() {
            s.advance().unwrap();
        }
        assert!(s.is_terminal(), "{} did not terminate", scenario.id);
        s.persist(&store).await.unwrap();
    }

    let history = store.list(&user).await.unwrap();
    assert_eq!(history.len(), catalog.len());
    assert!(history.iter().all(|r| r.checked_items == 1));
}

#[test]
fn exercise_teaching_station_reports_target_overrun() {
    let scenario = catalog().get("post-op-thr-exercise").unwrap();
    let clock = Arc::new(ManualClock::new());
    let mut s = StationSession::new(UserId::new("candidate-1"), scenario, clock.clone());
    s.start().unwrap();
    clock.advance(9 * MIN);
    s.finish().unwrap();

    let result = s.result().unwrap();
    assert!(result.over_target);
    assert_eq!(result.time_taken(), "09:00");
}
