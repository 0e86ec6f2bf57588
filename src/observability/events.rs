//! Session event stream.
//!
//! Typed events written as JSON lines, each stamped with a sequence number
//! so consumers can detect gaps and order lines from a shared file.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::session::{PhaseTransition, SessionResult, StationSession, TransitionReason};

// ---------------------------------------------------------------------------
// Event variants
// ---------------------------------------------------------------------------

/// Something that happened during a practice run.
///
/// Serialized with a `"type"` tag naming the variant.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// The candidate pressed start.
    SessionStarted {
        timestamp: DateTime<Utc>,
        session_id: Uuid,
        user_id: String,
        scenario_id: String,
        phase_count: usize,
    },

    /// A phase became active, either going forward or back.
    PhaseEntered {
        timestamp: DateTime<Utc>,
        session_id: Uuid,
        phase_index: usize,
        phase_name: String,
    },

    /// A phase was left and its time banked.
    PhaseCompleted {
        timestamp: DateTime<Utc>,
        session_id: Uuid,
        phase_index: usize,
        phase_name: String,
        reason: TransitionReason,
        elapsed_ms: u64,
        checked: usize,
        total: usize,
    },

    /// The last phase was left and the result computed.
    SessionCompleted {
        timestamp: DateTime<Utc>,
        session_id: Uuid,
        checked_items: usize,
        total_items: usize,
        percentage: f64,
        total_elapsed_ms: u64,
        ended_early: bool,
        over_target: bool,
    },

    /// The result reached the store.
    ResultSaved {
        timestamp: DateTime<Utc>,
        session_id: Uuid,
        user_id: String,
    },

    /// The store refused the result; it is still held in memory.
    SaveFailed {
        timestamp: DateTime<Utc>,
        session_id: Uuid,
        error: String,
    },
}

impl Event {
    /// Events describing `transition`, which `session` has just made.
    ///
    /// Always a `PhaseCompleted`, followed by either `PhaseEntered` or, for
    /// the final transition, `SessionCompleted`.
    #[must_use]
    pub fn for_transition(session: &StationSession, transition: &PhaseTransition) -> Vec<Self> {
        let timestamp = Utc::now();
        let session_id = session.id();
        let scenario = session.scenario();
        let phase_name = |i: usize| scenario.phase(i).map(|p| p.name.clone()).unwrap_or_default();

        let mut events = vec![Self::PhaseCompleted {
            timestamp,
            session_id,
            phase_index: transition.from,
            phase_name: phase_name(transition.from),
            reason: transition.reason,
            elapsed_ms: millis(transition.from_elapsed),
            checked: session.checked_count(transition.from),
            total: scenario.phase(transition.from).map_or(0, |p| p.checklist.len()),
        }];

        if transition.terminal {
            if let Some(result) = session.result() {
                events.push(Self::completed(result));
            }
        } else {
            events.push(Self::PhaseEntered {
                timestamp,
                session_id,
                phase_index: transition.to,
                phase_name: phase_name(transition.to),
            });
        }
        events
    }

    /// `SessionCompleted` for a finished result.
    #[must_use]
    pub fn completed(result: &SessionResult) -> Self {
        Self::SessionCompleted {
            timestamp: result.completed_at,
            session_id: result.session_id,
            checked_items: result.checked_items,
            total_items: result.total_items,
            percentage: result.percentage,
            total_elapsed_ms: millis(result.total_elapsed),
            ended_early: result.ended_early,
            over_target: result.over_target,
        }
    }
}

fn millis(d: std::time::Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct EventEnvelope {
    sequence: u64,
    #[serde(flatten)]
    event: Event,
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// Buffered, thread-safe JSONL writer.
///
/// Write failures are dropped: a broken event sink must not end a
/// candidate's session.
pub struct EventEmitter {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Emitter writing to `writer`.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
        }
    }

    /// Emitter that discards everything.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Emitter writing to a new file at `path`, truncating any existing one.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Writes `event` as one line and flushes.
    pub fn emit(&self, event: Event) {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = EventEnvelope { sequence, event };

        if let Ok(mut w) = self.writer.lock()
            && let Ok(line) = serde_json::to_string(&envelope)
        {
            let _ = writeln!(w, "{line}");
            let _ = w.flush();
        }
    }

    /// Emits each event in order.
    pub fn emit_all(&self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            self.emit(event);
        }
    }

    /// Number of events emitted so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex as StdMutex};
    use std::time::Duration;

    use super::*;
    use crate::scenario::{PhaseDefinition, ScenarioDefinition};
    use crate::session::{ManualClock, UserId};

    #[derive(Clone)]
    struct TestWriter(Arc<StdMutex<Vec<u8>>>);

    impl TestWriter {
        fn new() -> Self {
            Self(Arc::new(StdMutex::new(Vec::new())))
        }

        fn lines(&self) -> Vec<serde_json::Value> {
            let buf = self.0.lock().unwrap();
            String::from_utf8_lossy(&buf)
                .lines()
                .map(|l| serde_json::from_str(l).unwrap())
                .collect()
        }
    }

    impl Write for TestWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn session() -> (StationSession, Arc<ManualClock>) {
        let scenario = Arc::new(ScenarioDefinition::new(
            "s",
            "S",
            vec![
                PhaseDefinition::new("History", ["a", "b"]),
                PhaseDefinition::new("VIVA", Vec::<String>::new()),
            ],
        ));
        let clock = Arc::new(ManualClock::new());
        let s = StationSession::new(UserId::new("alice"), scenario, clock.clone());
        (s, clock)
    }

    #[test]
    fn lines_carry_sequence_and_type() {
        let tw = TestWriter::new();
        let emitter = EventEmitter::new(Box::new(tw.clone()));
        emitter.emit(Event::ResultSaved {
            timestamp: Utc::now(),
            session_id: Uuid::nil(),
            user_id: "alice".into(),
        });
        emitter.emit(Event::SaveFailed {
            timestamp: Utc::now(),
            session_id: Uuid::nil(),
            error: "disk full".into(),
        });

        let lines = tw.lines();
        assert_eq!(emitter.event_count(), 2);
        assert_eq!(lines[0]["sequence"], 0);
        assert_eq!(lines[0]["type"], "ResultSaved");
        assert_eq!(lines[1]["sequence"], 1);
        assert_eq!(lines[1]["error"], "disk full");
        assert!(lines[1].get("event").is_none());
    }

    #[test]
    fn forward_transition_completes_then_enters() {
        let (mut s, clock) = session();
        s.start().unwrap();
        s.toggle_item(0, "a", true).unwrap();
        clock.advance(Duration::from_secs(5));
        let t = s.advance().unwrap();

        let events = Event::for_transition(&s, &t);
        let json: Vec<_> = events
            .iter()
            .map(|e| serde_json::to_value(e).unwrap())
            .collect();
        assert_eq!(json.len(), 2);
        assert_eq!(json[0]["type"], "PhaseCompleted");
        assert_eq!(json[0]["elapsed_ms"], 5000);
        assert_eq!(json[0]["checked"], 1);
        assert_eq!(json[0]["reason"], "manual");
        assert_eq!(json[1]["type"], "PhaseEntered");
        assert_eq!(json[1]["phase_name"], "VIVA");
    }

    #[test]
    fn final_transition_reports_completion() {
        let (mut s, _) = session();
        s.start().unwrap();
        let transitions = s.finish().unwrap();
        let last = transitions.last().unwrap();

        let events = Event::for_transition(&s, last);
        let json = serde_json::to_value(events.last().unwrap()).unwrap();
        assert_eq!(json["type"], "SessionCompleted");
        assert_eq!(json["total_items"], 2);
        assert_eq!(json["ended_early"], true);
    }

    #[test]
    fn noop_counts_but_discards() {
        let emitter = EventEmitter::noop();
        emitter.emit_all([Event::ResultSaved {
            timestamp: Utc::now(),
            session_id: Uuid::nil(),
            user_id: "x".into(),
        }]);
        assert_eq!(emitter.event_count(), 1);
    }
}
