//! CLI command dispatch and handlers
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod completions;
pub mod history;
pub mod practice;
pub mod scenarios;
pub mod version;

use std::path::Path;

use crate::cli::args::{Cli, Commands, ScenariosSubcommand};
use crate::error::OsceError;
use crate::scenario::{ScenarioCatalog, ScenarioLoader};

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub async fn dispatch(cli: Cli) -> Result<(), OsceError> {
    match cli.command {
        Commands::Scenarios(cmd) => match cmd.subcommand {
            ScenariosSubcommand::List(args) => scenarios::list(&args),
            ScenariosSubcommand::Show(args) => scenarios::show(&args),
            ScenariosSubcommand::Validate(args) => scenarios::validate(&args),
        },
        Commands::Practice(args) => practice::run(&args).await,
        Commands::History(args) => history::run(&args).await,
        Commands::Completions(args) => {
            completions::run(&args);
            Ok(())
        }
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}

/// Built-in stations plus any found in `scenarios_dir`.
///
/// # Errors
///
/// Returns an error if a scenario fails to load or an id is reused.
pub fn load_catalog(scenarios_dir: Option<&Path>) -> Result<ScenarioCatalog, OsceError> {
    let loader = ScenarioLoader::with_defaults();
    let mut catalog = ScenarioCatalog::builtin(&loader)?;
    if let Some(dir) = scenarios_dir {
        catalog.extend_from_dir(&loader, dir)?;
    }
    Ok(catalog)
}
