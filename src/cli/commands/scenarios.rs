//! Scenarios command handlers
//!
//! Implements `scenarios list`, `scenarios show` and `scenarios validate`.

use std::fmt::Write as _;

use crate::cli::args::{OutputFormat, ScenariosListArgs, ScenariosShowArgs, ScenariosValidateArgs};
use crate::cli::commands::load_catalog;
use crate::error::{OsceError, ScenarioError};
use crate::scenario::builtin::builtin_scenarios;
use crate::scenario::{ScenarioDefinition, ScenarioLoader, ScenarioRepository};
use crate::session::format_clock;

/// List available stations.
///
/// Groups by category in first-seen order (human) or prints a JSON array.
///
/// # Errors
///
/// Returns an error if the scenario directory cannot be loaded.
pub fn list(args: &ScenariosListArgs) -> Result<(), OsceError> {
    let catalog = load_catalog(args.scenarios_dir.as_deref())?;
    let scenarios: Vec<_> = catalog
        .list()
        .into_iter()
        .filter(|s| {
            args.category
                .as_deref()
                .is_none_or(|c| s.category.as_deref() == Some(c))
        })
        .collect();

    match args.format {
        OutputFormat::Json => {
            let entries: Vec<serde_json::Value> = scenarios
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "id": s.id,
                        "title": s.title,
                        "category": s.category,
                        "phases": s.phase_count(),
                        "items": s.total_items(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Human => {
            if scenarios.is_empty() {
                println!("No stations match the given filters.");
                return Ok(());
            }

            println!("Stations ({} available)\n", scenarios.len());

            let mut categories: Vec<Option<&str>> = Vec::new();
            for s in &scenarios {
                if !categories.contains(&s.category.as_deref()) {
                    categories.push(s.category.as_deref());
                }
            }

            for category in categories {
                println!("  {}", category.unwrap_or("uncategorized"));
                for s in scenarios
                    .iter()
                    .filter(|s| s.category.as_deref() == category)
                {
                    println!("    {:<28}{:<40}{}", s.id, s.title, phase_summary(s));
                }
                println!();
            }

            println!("Practice a station: osce practice <id> --user <name>");
            println!("View YAML:          osce scenarios show <id>");
        }
    }

    Ok(())
}

/// Print a station definition as YAML.
///
/// Built-in stations print their embedded source verbatim.
///
/// # Errors
///
/// Returns a usage error if the id is unknown.
pub fn show(args: &ScenariosShowArgs) -> Result<(), OsceError> {
    let catalog = load_catalog(args.scenarios_dir.as_deref())?;
    let scenario = catalog.get(&args.id).map_err(|e| {
        let mut message = e.to_string();
        message.push_str("\n\nAvailable stations:");
        for s in catalog.list() {
            let _ = write!(message, "\n  {:<28}{}", s.id, s.title);
        }
        message.push_str("\n\nUse 'osce scenarios list' for details.");
        OsceError::Usage(message)
    })?;

    if let Some(builtin) = builtin_scenarios().iter().find(|b| b.id == scenario.id) {
        print!("{}", builtin.yaml);
    } else {
        print!("{}", serde_yaml::to_string(scenario.as_ref())?);
    }
    Ok(())
}

/// Load and validate scenario files, reporting every file.
///
/// # Errors
///
/// Returns the first failure after all files have been checked. With
/// `--strict`, warnings count as failures.
pub fn validate(args: &ScenariosValidateArgs) -> Result<(), OsceError> {
    let loader = ScenarioLoader::with_defaults();
    let mut first_failure: Option<ScenarioError> = None;
    let mut report = Vec::with_capacity(args.files.len());

    for path in &args.files {
        tracing::info!(file = %path.display(), "validating scenario");
        let outcome = loader.load(path).and_then(|loaded| {
            if args.strict && !loaded.warnings.is_empty() {
                Err(ScenarioError::ValidationError {
                    path: path.display().to_string(),
                    errors: loaded.warnings,
                })
            } else {
                Ok(loaded)
            }
        });

        match outcome {
            Ok(loaded) => {
                let s = &loaded.scenario;
                if args.format == OutputFormat::Human {
                    println!("ok    {}: {} ({})", path.display(), s.id, phase_summary(s));
                    for warning in &loaded.warnings {
                        println!("      {warning}");
                    }
                }
                report.push(serde_json::json!({
                    "file": path.display().to_string(),
                    "valid": true,
                    "id": s.id,
                    "warnings": loaded.warnings.iter().map(ToString::to_string).collect::<Vec<_>>(),
                }));
            }
            Err(e) => {
                if args.format == OutputFormat::Human {
                    println!("FAIL  {}: {e}", path.display());
                    if let ScenarioError::ValidationError { errors, .. } = &e {
                        for issue in errors {
                            println!("      {issue}");
                        }
                    }
                }
                report.push(serde_json::json!({
                    "file": path.display().to_string(),
                    "valid": false,
                    "error": e.to_string(),
                }));
                first_failure.get_or_insert(e);
            }
        }
    }

    if args.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    first_failure.map_or(Ok(()), |e| Err(e.into()))
}

fn phase_summary(s: &ScenarioDefinition) -> String {
    let timed: Vec<String> = s
        .phases
        .iter()
        .map(|p| match p.duration {
            Some(d) => format!("{} {}", p.name, format_clock(d)),
            None => p.name.clone(),
        })
        .collect();
    format!("{} items; {}", s.total_items(), timed.join(" / "))
}
