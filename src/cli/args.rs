//! CLI argument definitions
//!
//! All Clap derive structs for `osce` command-line parsing.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

// ============================================================================
// Root CLI
// ============================================================================

/// Timed OSCE station practice with checklist scoring.
#[derive(Parser, Debug)]
#[command(name = "osce", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress diagnostic logging.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "OSCE_COLOR")]
    pub color: ColorChoice,

    /// Emit diagnostic logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,
}

// ============================================================================
// Top-Level Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Browse and check station scenarios.
    Scenarios(ScenariosCommand),

    /// Run a timed practice session at a station.
    Practice(PracticeArgs),

    /// Show a candidate's saved results.
    History(HistoryArgs),

    /// Generate shell completion scripts.
    Completions(CompletionsArgs),

    /// Display version information.
    Version(VersionArgs),
}

// ============================================================================
// Scenarios Command
// ============================================================================

/// Scenario catalog commands.
#[derive(Args, Debug)]
pub struct ScenariosCommand {
    /// Scenarios subcommand.
    #[command(subcommand)]
    pub subcommand: ScenariosSubcommand,
}

/// Scenarios subcommands.
#[derive(Subcommand, Debug)]
pub enum ScenariosSubcommand {
    /// List available stations.
    List(ScenariosListArgs),

    /// Print a station definition as YAML.
    Show(ScenariosShowArgs),

    /// Load and validate scenario files.
    Validate(ScenariosValidateArgs),
}

/// Arguments for `scenarios list`.
#[derive(Args, Debug)]
pub struct ScenariosListArgs {
    /// Only list stations in this category.
    #[arg(long)]
    pub category: Option<String>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Extra directory of scenario YAML files.
    #[arg(long, env = "OSCE_SCENARIOS_DIR")]
    pub scenarios_dir: Option<PathBuf>,
}

/// Arguments for `scenarios show`.
#[derive(Args, Debug)]
pub struct ScenariosShowArgs {
    /// Scenario identifier.
    pub id: String,

    /// Extra directory of scenario YAML files.
    #[arg(long, env = "OSCE_SCENARIOS_DIR")]
    pub scenarios_dir: Option<PathBuf>,
}

/// Arguments for `scenarios validate`.
#[derive(Args, Debug)]
pub struct ScenariosValidateArgs {
    /// Scenario files to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Treat warnings as errors.
    #[arg(long)]
    pub strict: bool,
}

// ============================================================================
// Practice / History
// ============================================================================

/// Arguments for `practice`.
#[derive(Args, Debug)]
pub struct PracticeArgs {
    /// Scenario identifier.
    pub scenario: String,

    /// Candidate identity used to key saved results.
    #[arg(short, long, env = "OSCE_USER")]
    pub user: String,

    /// Directory holding `user_history/`.
    #[arg(long, default_value = "data", env = "OSCE_DATA_DIR")]
    pub data_dir: PathBuf,

    /// Extra directory of scenario YAML files.
    #[arg(long, env = "OSCE_SCENARIOS_DIR")]
    pub scenarios_dir: Option<PathBuf>,

    /// Write a JSONL event stream to this file.
    #[arg(long)]
    pub events_file: Option<PathBuf>,

    /// Do not save automatically when the station ends. `save` still works.
    #[arg(long)]
    pub no_save: bool,
}

/// Arguments for `history`.
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Candidate identity.
    #[arg(short, long, env = "OSCE_USER")]
    pub user: String,

    /// Directory holding `user_history/`.
    #[arg(long, default_value = "data", env = "OSCE_DATA_DIR")]
    pub data_dir: PathBuf,

    /// Only show results for this scenario.
    #[arg(long)]
    pub scenario: Option<String>,

    /// Show per-phase detail for each result.
    #[arg(long)]
    pub detail: bool,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// Completions / Version
// ============================================================================

/// Arguments for shell completion generation.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script.
    pub shell: Shell,
}

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

/// Shell type for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// `PowerShell`.
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish shell.
    Elvish,
}

// ============================================================================
// Tests
// ============================================================================
