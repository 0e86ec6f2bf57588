//! `osce practice`: an interactive station on stdin/stdout.
//!
//! The driver turns line commands into engine calls and renders the
//! session after each one. A one-second ticker polls the engine so
//! countdown phases move on by themselves. Presentation concerns such as
//! the welcome banner and the auto-save choice live here, never in the
//! engine.

use std::io::Write;
use std::time::Duration;

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::cli::args::PracticeArgs;
use crate::cli::commands::load_catalog;
use crate::error::OsceError;
use crate::observability::{Event, EventEmitter};
use crate::scenario::{ScenarioDefinition, ScenarioRepository};
use crate::session::{PhaseTransition, SessionResult, StationSession, UserId, format_clock};
use crate::store::{JsonFileResultStore, ResultStore};

const HELP: &str = "\
Commands:
  check <n>     tick item n in the current phase
  uncheck <n>   untick item n
  note <text>   replace this phase's notes
  answer <n> <text>
                answer question n in this phase
  next          move to the next phase (ends the station after the last)
  back          return to the previous phase
  finish        end the station now
  status        redraw the current phase
  save          save the result (after the station ends, also with --no-save)
  help          show this list
  quit          leave";

/// Run a practice session until the candidate quits or input ends.
///
/// # Errors
///
/// Returns an error if the scenario cannot be found, stdin fails, or the
/// finished result could not be saved by the time the driver exits.
pub async fn run(args: &PracticeArgs) -> Result<(), OsceError> {
    let catalog = load_catalog(args.scenarios_dir.as_deref())?;
    let scenario = catalog.get(&args.scenario)?;

    let emitter = match &args.events_file {
        Some(path) => EventEmitter::from_file(path)?,
        None => EventEmitter::noop(),
    };

    let store = JsonFileResultStore::new(&args.data_dir);
    let session = StationSession::with_system_clock(UserId::new(args.user.as_str()), scenario);
    let mut driver = PracticeDriver::new(session, &store, &emitter, std::io::stdout(), !args.no_save);
    driver.start()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    if driver.handle(&line).await? == Flow::Quit {
                        break;
                    }
                }
                None => break,
            },
            _ = ticker.tick() => driver.tick().await?,
        }
    }

    driver.close().await?;
    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

/// A parsed driver command. Item and question numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Check(usize),
    Uncheck(usize),
    Note(String),
    Answer(usize, String),
    Next,
    Back,
    Finish,
    Status,
    Save,
    Help,
    Quit,
}

impl std::str::FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(w, r)| (w, r.trim()));

        let item = |rest: &str| {
            rest.parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| format!("'{word}' needs an item number, e.g. '{word} 2'"))
        };

        match word.to_ascii_lowercase().as_str() {
            "check" | "c" => item(rest).map(Self::Check),
            "uncheck" | "u" => item(rest).map(Self::Uncheck),
            "note" => Ok(Self::Note(rest.to_string())),
            "answer" | "a" => {
                let (number, text) = rest
                    .split_once(char::is_whitespace)
                    .map_or((rest, ""), |(n, t)| (n, t.trim()));
                number
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .map(|n| Self::Answer(n, text.to_string()))
                    .ok_or_else(|| format!("'{word}' needs a question number, e.g. '{word} 1 <text>'"))
            }
            "next" | "n" => Ok(Self::Next),
            "back" | "b" => Ok(Self::Back),
            "finish" => Ok(Self::Finish),
            "status" | "s" | "" => Ok(Self::Status),
            "save" => Ok(Self::Save),
            "help" | "?" => Ok(Self::Help),
            "quit" | "q" | "exit" => Ok(Self::Quit),
            other => Err(format!("unknown command '{other}'; type 'help'")),
        }
    }
}

/// Whether the driver loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

// ============================================================================
// Driver
// ============================================================================

/// Line-command front end over a [`StationSession`].
pub struct PracticeDriver<'a, W> {
    session: StationSession,
    store: &'a dyn ResultStore,
    emitter: &'a EventEmitter,
    out: W,
    auto_save: bool,
}

impl<'a, W: Write> PracticeDriver<'a, W> {
    /// Creates a driver. `auto_save` saves the result as soon as the
    /// station ends.
    pub fn new(
        session: StationSession,
        store: &'a dyn ResultStore,
        emitter: &'a EventEmitter,
        out: W,
        auto_save: bool,
    ) -> Self {
        Self {
            session,
            store,
            emitter,
            out,
            auto_save,
        }
    }

    /// The underlying session.
    pub const fn session(&self) -> &StationSession {
        &self.session
    }

    /// Consumes the driver, returning what was written.
    pub fn into_output(self) -> W {
        self.out
    }

    /// Shows the welcome banner and starts the first phase.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot start or output fails.
    pub fn start(&mut self) -> Result<(), OsceError> {
        self.session.start()?;
        let scenario = self.session.scenario();
        self.emitter.emit(Event::SessionStarted {
            timestamp: Utc::now(),
            session_id: self.session.id(),
            user_id: self.session.user().to_string(),
            scenario_id: scenario.id.clone(),
            phase_count: scenario.phase_count(),
        });
        self.emitter.emit(Event::PhaseEntered {
            timestamp: Utc::now(),
            session_id: self.session.id(),
            phase_index: 0,
            phase_name: scenario.phases[0].name.clone(),
        });

        writeln!(self.out, "{}", scenario.title)?;
        if !scenario.description.is_empty() {
            writeln!(self.out, "{}", scenario.description.trim_end())?;
        }
        if let Some(target) = scenario.target_time {
            writeln!(self.out, "Target time: {}", format_clock(target))?;
        }
        writeln!(self.out, "Type 'help' for commands.")?;
        self.render_phase()
    }

    /// Applies one line of input.
    ///
    /// Session and parse errors are shown to the candidate, not returned.
    ///
    /// # Errors
    ///
    /// Returns an error only if output fails.
    pub async fn handle(&mut self, line: &str) -> Result<Flow, OsceError> {
        self.tick().await?;

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(message) => {
                writeln!(self.out, "{message}")?;
                return Ok(Flow::Continue);
            }
        };

        match command {
            Command::Check(n) => self.set_item(n, true)?,
            Command::Uncheck(n) => self.set_item(n, false)?,
            Command::Note(text) => match self.session.active_phase() {
                Some(phase) => match self.session.set_notes(phase, text) {
                    Ok(()) => writeln!(self.out, "Notes saved.")?,
                    Err(e) => writeln!(self.out, "{e}")?,
                },
                None => writeln!(self.out, "The station has ended; notes are locked.")?,
            },
            Command::Answer(n, text) => self.answer(n, text)?,
            Command::Next => match self.session.advance() {
                Ok(t) => self.after_transitions(&[t]).await?,
                Err(e) => writeln!(self.out, "{e}")?,
            },
            Command::Back => match self.session.retreat() {
                Ok(t) => self.after_transitions(&[t]).await?,
                Err(e) => writeln!(self.out, "{e}")?,
            },
            Command::Finish => match self.session.finish() {
                Ok(ts) => self.after_transitions(&ts).await?,
                Err(e) => writeln!(self.out, "{e}")?,
            },
            Command::Status => {
                if self.session.is_terminal() {
                    self.render_summary()?;
                } else {
                    self.render_phase()?;
                }
            }
            Command::Save => self.save().await?,
            Command::Help => writeln!(self.out, "{HELP}")?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Lets an expired countdown move the session on.
    ///
    /// # Errors
    ///
    /// Returns an error only if output fails.
    pub async fn tick(&mut self) -> Result<(), OsceError> {
        if let Some(t) = self.session.poll() {
            writeln!(self.out, "Time is up.")?;
            self.after_transitions(&[t]).await?;
        }
        Ok(())
    }

    /// Final bookkeeping when the driver exits. Returns the output sink.
    ///
    /// # Errors
    ///
    /// Returns the store error if a finished result that should be saved
    /// still is not after one more attempt.
    pub async fn close(mut self) -> Result<W, OsceError> {
        if !self.session.is_terminal() {
            writeln!(self.out, "Station left unfinished; nothing was saved.")?;
            info!(session = %self.session.id(), status = %self.session.status(), "practice abandoned");
            return Ok(self.out);
        }
        if self.session.is_saved() {
            return Ok(self.out);
        }
        if self.auto_save {
            self.session.persist(self.store).await?;
            writeln!(self.out, "Result saved.")?;
        } else {
            writeln!(self.out, "Result not saved (--no-save).")?;
            info!(session = %self.session.id(), "result discarded at exit");
        }
        Ok(self.out)
    }

    fn set_item(&mut self, n: usize, checked: bool) -> Result<(), OsceError> {
        let Some(phase) = self.session.active_phase() else {
            writeln!(self.out, "The station has ended; the checklist is locked.")?;
            return Ok(());
        };
        let label = n
            .checked_sub(1)
            .and_then(|i| self.session.scenario().phases[phase].item(i))
            .map(str::to_string);
        let Some(label) = label else {
            let total = self.session.scenario().phases[phase].checklist.len();
            writeln!(self.out, "No item {n} in this phase ({total} items).")?;
            return Ok(());
        };

        match self.session.toggle_item(phase, &label, checked) {
            Ok(()) => {
                let mark = if checked { "x" } else { " " };
                let done = self.session.checked_count(phase);
                let total = self.session.scenario().phases[phase].checklist.len();
                writeln!(self.out, "[{mark}] {n}. {label}  ({done}/{total})")?;
            }
            Err(e) => writeln!(self.out, "{e}")?,
        }
        Ok(())
    }

    fn answer(&mut self, n: usize, text: String) -> Result<(), OsceError> {
        let Some(phase) = self.session.active_phase() else {
            writeln!(self.out, "The station has ended; answers are locked.")?;
            return Ok(());
        };
        let count = self.session.scenario().phases[phase].prompts.len();
        let Some(prompt) = n.checked_sub(1).filter(|i| *i < count) else {
            writeln!(self.out, "No question {n} in this phase ({count} questions).")?;
            return Ok(());
        };
        match self.session.set_answer(phase, prompt, text) {
            Ok(()) => writeln!(self.out, "Answer {n} saved.")?,
            Err(e) => writeln!(self.out, "{e}")?,
        }
        Ok(())
    }

    async fn after_transitions(&mut self, transitions: &[PhaseTransition]) -> Result<(), OsceError> {
        for t in transitions {
            self.emitter.emit_all(Event::for_transition(&self.session, t));
        }

        if self.session.is_terminal() {
            self.render_summary()?;
            if self.auto_save {
                self.save().await?;
            } else {
                writeln!(self.out, "Auto-save is off; type 'save' to keep this result.")?;
            }
        } else {
            self.render_phase()?;
        }
        Ok(())
    }

    async fn save(&mut self) -> Result<(), OsceError> {
        if !self.session.is_terminal() {
            writeln!(self.out, "Finish the station before saving.")?;
            return Ok(());
        }
        if self.session.is_saved() {
            writeln!(self.out, "Result already saved.")?;
            return Ok(());
        }

        match self.session.persist(self.store).await {
            Ok(()) => {
                self.emitter.emit(Event::ResultSaved {
                    timestamp: Utc::now(),
                    session_id: self.session.id(),
                    user_id: self.session.user().to_string(),
                });
                writeln!(self.out, "Result saved.")?;
            }
            Err(e) => {
                warn!(error = %e, "could not save result");
                self.emitter.emit(Event::SaveFailed {
                    timestamp: Utc::now(),
                    session_id: self.session.id(),
                    error: e.to_string(),
                });
                writeln!(self.out, "Could not save result: {e}")?;
                writeln!(self.out, "The result is kept; type 'save' to retry.")?;
            }
        }
        Ok(())
    }

    fn render_phase(&mut self) -> Result<(), OsceError> {
        let Some(phase) = self.session.active_phase() else {
            return Ok(());
        };
        let Some(view) = self.session.phase_view(phase) else {
            return Ok(());
        };
        let count = self.session.scenario().phase_count();
        let clock = if view.timer.remaining.is_some() {
            format!("{} remaining", view.timer)
        } else {
            format!("{} elapsed", view.timer)
        };

        writeln!(
            self.out,
            "\n== Phase {}/{count}: {} ({clock}) ==",
            view.index + 1,
            view.definition.name
        )?;
        if !view.definition.content.is_empty() {
            writeln!(self.out, "{}", view.definition.content.trim_end())?;
        }
        for (i, (prompt, answer)) in view.answers.iter().enumerate() {
            writeln!(self.out, "  Q{}. {prompt}", i + 1)?;
            if !answer.is_empty() {
                writeln!(self.out, "      > {answer}")?;
            }
        }
        for (i, (label, checked)) in view.items.iter().enumerate() {
            let mark = if *checked { "x" } else { " " };
            writeln!(self.out, "  [{mark}] {}. {label}", i + 1)?;
        }
        if !view.notes.is_empty() {
            writeln!(self.out, "Notes: {}", view.notes)?;
        }
        Ok(())
    }

    fn render_summary(&mut self) -> Result<(), OsceError> {
        let Some(result) = self.session.result() else {
            return Ok(());
        };
        let text = summary(result, self.session.scenario());
        write!(self.out, "{text}")?;
        Ok(())
    }
}

/// End-of-station report, followed by the station's model answer and
/// analysis when it has them.
#[must_use]
pub fn summary(result: &SessionResult, scenario: &ScenarioDefinition) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    let _ = writeln!(out, "\n== Station complete: {} ==", result.scenario_title);
    for phase in &result.phases {
        let _ = writeln!(
            out,
            "  {:<24}{}/{} ({:.1}%)  {}",
            phase.name,
            phase.checked,
            phase.total,
            phase.percentage,
            format_clock(phase.elapsed)
        );
        for (i, answer) in phase.answers.iter().enumerate() {
            let _ = writeln!(out, "    Q{}. {}", i + 1, answer.prompt);
            let shown = if answer.answer.is_empty() {
                "(no answer)"
            } else {
                answer.answer.as_str()
            };
            let _ = writeln!(out, "        {shown}");
        }
    }
    let _ = writeln!(out, "Score: {}", result.score_line());
    let _ = writeln!(out, "Time:  {}", result.time_taken());
    if result.ended_early {
        let _ = writeln!(out, "Ended before the final phase.");
    }
    if result.over_target {
        let _ = writeln!(out, "Over the target time for this station.");
    }
    if let Some(model) = &scenario.model_answer {
        let _ = writeln!(out, "\n-- Model answer --\n{}", model.trim_end());
    }
    if let Some(analysis) = &scenario.analysis {
        let _ = writeln!(out, "\n-- Scenario analysis --\n{}", analysis.trim_end());
    }
    out
}
