//! `osce history`: a candidate's saved results.

use std::fmt::Write as _;

use crate::cli::args::{HistoryArgs, OutputFormat};
use crate::error::OsceError;
use crate::session::{SessionResult, UserId, format_clock};
use crate::store::{JsonFileResultStore, ResultStore};

/// Print `--user`'s history, oldest first.
///
/// # Errors
///
/// Returns an error if the history file is invalid or unreadable.
pub async fn run(args: &HistoryArgs) -> Result<(), OsceError> {
    let store = JsonFileResultStore::new(&args.data_dir);
    let user = UserId::new(args.user.as_str());
    let results: Vec<SessionResult> = store
        .list(&user)
        .await?
        .into_iter()
        .filter(|r| args.scenario.as_deref().is_none_or(|id| r.scenario_id == id))
        .collect();

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
        OutputFormat::Human => print!("{}", render(&user, &results, args.detail)),
    }
    Ok(())
}

/// Attempt count and score spread over a set of results.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySummary {
    pub attempts: usize,
    pub best: f64,
    pub average: f64,
    pub latest: f64,
}

impl HistorySummary {
    /// `None` for an empty history.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn of(results: &[SessionResult]) -> Option<Self> {
        let latest = results.last()?.percentage;
        let best = results
            .iter()
            .map(|r| r.percentage)
            .fold(f64::MIN, f64::max);
        let sum: f64 = results.iter().map(|r| r.percentage).sum();
        let average = (sum / results.len() as f64 * 10.0).round() / 10.0;
        Some(Self {
            attempts: results.len(),
            best,
            average,
            latest,
        })
    }
}

/// Human-readable history listing.
#[must_use]
pub fn render(user: &UserId, results: &[SessionResult], detail: bool) -> String {
    let mut out = String::new();
    let Some(summary) = HistorySummary::of(results) else {
        let _ = writeln!(out, "No saved results for {user}.");
        return out;
    };

    let noun = if summary.attempts == 1 { "attempt" } else { "attempts" };
    let _ = writeln!(out, "History for {user} ({} {noun})\n", summary.attempts);
    for r in results {
        let mut flags = Vec::new();
        if r.ended_early {
            flags.push("ended early");
        }
        if r.over_target {
            flags.push("over target");
        }
        let _ = writeln!(
            out,
            "  {}  {:<28}{:<16}{}{}",
            r.completed_at.format("%Y-%m-%d %H:%M"),
            r.scenario_id,
            r.score_line(),
            r.time_taken(),
            if flags.is_empty() {
                String::new()
            } else {
                format!("  [{}]", flags.join(", "))
            }
        );

        if detail {
            for phase in &r.phases {
                let _ = writeln!(
                    out,
                    "      {:<24}{}/{} ({:.1}%)  {}",
                    phase.name,
                    phase.checked,
                    phase.total,
                    phase.percentage,
                    format_clock(phase.elapsed)
                );
                for entry in phase.checklist.iter().filter(|e| !e.checked) {
                    let _ = writeln!(out, "        missed: {}", entry.label);
                }
                if !phase.notes.is_empty() {
                    let _ = writeln!(out, "        notes: {}", phase.notes);
                }
                for (i, answer) in phase.answers.iter().enumerate() {
                    let _ = writeln!(out, "        Q{}: {}", i + 1, answer.prompt);
                    if !answer.answer.is_empty() {
                        let _ = writeln!(out, "          {}", answer.answer);
                    }
                }
            }
        }
    }

    let _ = writeln!(
        out,
        "\nBest {:.1}%  Average {:.1}%  Latest {:.1}%",
        summary.best, summary.average, summary.latest
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::sample_result;

    #[test]
    fn summary_of_empty_history_is_none() {
        assert!(HistorySummary::of(&[]).is_none());
    }

    #[test]
    fn summary_tracks_best_average_latest() {
        let mut a = sample_result("alice", "x");
        a.percentage = 80.0;
        let mut b = sample_result("alice", "x");
        b.percentage = 50.0;
        let mut c = sample_result("alice", "x");
        c.percentage = 65.0;

        let summary = HistorySummary::of(&[a, b, c]).unwrap();
        assert_eq!(summary.attempts, 3);
        assert!((summary.best - 80.0).abs() < f64::EPSILON);
        assert!((summary.average - 65.0).abs() < f64::EPSILON);
        assert!((summary.latest - 65.0).abs() < f64::EPSILON);
    }

    #[test]
    fn render_lists_missed_items_in_detail() {
        let user = UserId::new("alice");
        let text = render(&user, &[sample_result("alice", "knee")], true);
        assert!(text.contains("History for alice (1 attempt)\n"));
        assert!(text.contains("1/2 (50.0%)"));
        assert!(text.contains("missed: Confirms identity"));
        assert!(!text.contains("missed: Introduces self"));
    }

    #[test]
    fn render_pluralizes_attempts() {
        let user = UserId::new("alice");
        let results = [sample_result("alice", "a"), sample_result("alice", "b")];
        assert!(render(&user, &results, false).contains("History for alice (2 attempts)"));
    }

    #[test]
    fn render_empty() {
        let text = render(&UserId::new("bob"), &[], false);
        assert_eq!(text, "No saved results for bob.\n");
    }
}
