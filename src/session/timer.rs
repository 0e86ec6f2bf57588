//! Phase timing
//!
//! A [`PhaseTimer`] is pure arithmetic over three values: the instant the
//! phase (re)started, the time already banked in earlier visits to the
//! same phase, and an optional countdown length. It never reads a clock
//! itself; callers pass `now` in.

use std::fmt;
use std::time::{Duration, Instant};

/// How a phase's clock is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    /// Open-ended; shows time spent.
    Stopwatch,
    /// Fixed length; shows time left and expires at zero.
    Countdown(Duration),
}

impl TimerMode {
    /// Countdown if a duration is given, stopwatch otherwise.
    #[must_use]
    pub const fn from_duration(duration: Option<Duration>) -> Self {
        match duration {
            Some(d) => Self::Countdown(d),
            None => Self::Stopwatch,
        }
    }
}

/// Timing state of the active phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTimer {
    mode: TimerMode,
    started_at: Instant,
    baseline: Duration,
}

impl PhaseTimer {
    /// Starts timing at `started_at`, resuming from `baseline` already spent.
    #[must_use]
    pub const fn resume(mode: TimerMode, started_at: Instant, baseline: Duration) -> Self {
        Self {
            mode,
            started_at,
            baseline,
        }
    }

    /// Total time spent in the phase as of `now`.
    ///
    /// Saturates rather than going negative if `now` precedes the start.
    #[must_use]
    pub fn elapsed(&self, now: Instant) -> Duration {
        self.baseline
            .saturating_add(now.saturating_duration_since(self.started_at))
    }

    /// Time left on a countdown, clamped at zero. `None` for stopwatches.
    #[must_use]
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        match self.mode {
            TimerMode::Countdown(limit) => Some(limit.saturating_sub(self.elapsed(now))),
            TimerMode::Stopwatch => None,
        }
    }

    /// Whether a countdown has run out. Stopwatches never expire.
    #[must_use]
    pub fn is_expired(&self, now: Instant) -> bool {
        self.remaining(now).is_some_and(|r| r.is_zero())
    }

    /// Snapshot for display.
    #[must_use]
    pub fn reading(&self, now: Instant) -> TimerReading {
        TimerReading {
            elapsed: self.elapsed(now),
            remaining: self.remaining(now),
        }
    }
}

/// A point-in-time timer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerReading {
    /// Time spent in the phase.
    pub elapsed: Duration,
    /// Time left, for countdown phases.
    pub remaining: Option<Duration>,
}

impl TimerReading {
    /// The value a display should show: remaining for countdowns,
    /// elapsed for stopwatches.
    #[must_use]
    pub fn shown(&self) -> Duration {
        self.remaining.unwrap_or(self.elapsed)
    }
}

impl fmt::Display for TimerReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_clock(self.shown()))
    }
}

/// Formats a duration as `MM:SS`.
///
/// Both fields are zero-padded to two digits; minutes are not capped at 59
/// (`75:00` for an hour and a quarter). Sub-second remainders truncate.
#[must_use]
pub fn format_clock(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
