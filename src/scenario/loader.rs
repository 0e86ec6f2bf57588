//! Scenario loader
//!
//! Loading pipeline for scenario files:
//! 1. Size check against [`ScenarioLimits`]
//! 2. UTF-8 BOM stripping
//! 3. YAML parsing into [`ScenarioDefinition`]
//! 4. Validation
//! 5. Freeze with `Arc`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{ScenarioError, ValidationIssue};
use crate::scenario::schema::ScenarioDefinition;
use crate::scenario::validation::Validator;

// ============================================================================
// Options
// ============================================================================

/// Options for the scenario loader.
#[derive(Debug, Clone, Default)]
pub struct LoaderOptions {
    /// Limits applied to every loaded scenario.
    pub limits: ScenarioLimits,
}

/// Size limits for scenario files.
///
/// Defaults can be overridden through `OSCE_MAX_*` environment variables.
#[derive(Debug, Clone)]
pub struct ScenarioLimits {
    /// Maximum number of phases per scenario.
    pub max_phases: usize,

    /// Maximum number of checklist items in a single phase.
    pub max_items_per_phase: usize,

    /// Maximum scenario file size in bytes.
    pub max_scenario_size: usize,
}

impl Default for ScenarioLimits {
    fn default() -> Self {
        Self {
            max_phases: env_or("OSCE_MAX_PHASES", 50),
            max_items_per_phase: env_or("OSCE_MAX_ITEMS_PER_PHASE", 200),
            max_scenario_size: env_or("OSCE_MAX_SCENARIO_SIZE", 1024 * 1024),
        }
    }
}

fn env_or(var: &str, default: usize) -> usize {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ============================================================================
// Loader
// ============================================================================

/// Result of loading a scenario.
#[derive(Debug)]
pub struct LoadResult {
    /// The loaded and validated scenario.
    pub scenario: Arc<ScenarioDefinition>,

    /// Warning-severity validation issues.
    pub warnings: Vec<ValidationIssue>,
}

/// Scenario loader.
#[derive(Debug, Default)]
pub struct ScenarioLoader {
    options: LoaderOptions,
}

impl ScenarioLoader {
    /// Creates a loader with the given options.
    #[must_use]
    pub const fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// Creates a loader with default options.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Loads and validates a scenario file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is larger than
    /// `max_scenario_size`, fails to parse, or fails validation.
    pub fn load(&self, path: &Path) -> Result<LoadResult, ScenarioError> {
        let metadata = std::fs::metadata(path).map_err(|_| ScenarioError::MissingFile {
            path: path.to_path_buf(),
        })?;

        self.check_size(usize::try_from(metadata.len()).unwrap_or(usize::MAX))?;

        let raw = std::fs::read_to_string(path).map_err(|_| ScenarioError::MissingFile {
            path: path.to_path_buf(),
        })?;

        self.parse(&raw, path)
    }

    /// Loads and validates a scenario from an in-memory YAML string.
    ///
    /// `origin` is used in error messages in place of a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is larger than `max_scenario_size`,
    /// fails to parse, or fails validation.
    pub fn load_from_str(&self, yaml: &str, origin: &str) -> Result<LoadResult, ScenarioError> {
        self.parse(yaml, Path::new(origin))
    }

    /// Loads every `*.yaml` / `*.yml` file in `dir`, sorted by file name.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read or any file fails
    /// to load. Loading stops at the first failing file.
    pub fn load_dir(&self, dir: &Path) -> Result<Vec<LoadResult>, ScenarioError> {
        let entries = std::fs::read_dir(dir).map_err(|_| ScenarioError::MissingFile {
            path: dir.to_path_buf(),
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|p| {
                p.is_file()
                    && p.extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
            })
            .collect();
        paths.sort();

        debug!(dir = %dir.display(), files = paths.len(), "loading scenario directory");
        paths.iter().map(|p| self.load(p)).collect()
    }

    fn check_size(&self, size: usize) -> Result<(), ScenarioError> {
        let limit = self.options.limits.max_scenario_size;
        if size > limit {
            return Err(ScenarioError::InvalidValue {
                field: "file_size".to_string(),
                value: format!("{size} bytes"),
                expected: format!("at most {limit} bytes"),
            });
        }
        Ok(())
    }

    fn parse(&self, raw: &str, path: &Path) -> Result<LoadResult, ScenarioError> {
        self.check_size(raw.len())?;
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

        let scenario: ScenarioDefinition =
            serde_yaml::from_str(raw).map_err(|e| ScenarioError::ParseError {
                path: path.to_path_buf(),
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?;

        let result = Validator::new().validate(&scenario, &self.options.limits);
        if result.has_errors() {
            return Err(ScenarioError::ValidationError {
                path: path.display().to_string(),
                errors: result.errors,
            });
        }

        for warning in &result.warnings {
            warn!(scenario = %scenario.id, path = %warning.path, "{}", warning.message);
        }

        debug!(
            scenario = %scenario.id,
            phases = scenario.phase_count(),
            items = scenario.total_items(),
            "scenario loaded"
        );

        Ok(LoadResult {
            scenario: Arc::new(scenario),
            warnings: result.warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const VALID: &str = r"
id: shoulder
title: Shoulder Examination
phases:
  - name: Inspection
    checklist: [Looked, Compared sides]
";

    #[test]
    fn load_from_str_freezes_scenario() {
        let result = ScenarioLoader::with_defaults()
            .load_from_str(VALID, "<test>")
            .unwrap();
        assert_eq!(result.scenario.id, "shoulder");
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn strips_utf8_bom() {
        let with_bom = format!("\u{feff}{VALID}");
        assert!(
            ScenarioLoader::with_defaults()
                .load_from_str(&with_bom, "<bom>")
                .is_ok()
        );
    }

    #[test]
    fn parse_error_reports_line() {
        let err = ScenarioLoader::with_defaults()
            .load_from_str("id: x\ntitle: [unclosed\n", "broken.yaml")
            .unwrap_err();
        match err {
            ScenarioError::ParseError { path, line, .. } => {
                assert_eq!(path, PathBuf::from("broken.yaml"));
                assert!(line.is_some());
            }
            other => panic!("expected ParseError, got {other:?}"),
        }
    }

    #[test]
    fn validation_failure_is_an_error() {
        let yaml = "id: empty\ntitle: Empty\nphases: []\n";
        let err = ScenarioLoader::with_defaults()
            .load_from_str(yaml, "empty.yaml")
            .unwrap_err();
        assert!(matches!(err, ScenarioError::ValidationError { .. }));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = ScenarioLoader::with_defaults()
            .load(Path::new("/nonexistent/osce/scenario.yaml"))
            .unwrap_err();
        assert!(matches!(err, ScenarioError::MissingFile { .. }));
    }

    #[test]
    fn oversized_file_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(VALID.as_bytes()).unwrap();
        let loader = ScenarioLoader::new(LoaderOptions {
            limits: ScenarioLimits {
                max_scenario_size: 10,
                ..ScenarioLimits::default()
            },
        });
        let err = loader.load(file.path()).unwrap_err();
        assert!(matches!(err, ScenarioError::InvalidValue { ref field, .. } if field == "file_size"));
    }

    #[test]
    fn oversized_string_rejected() {
        let loader = ScenarioLoader::new(LoaderOptions {
            limits: ScenarioLimits {
                max_scenario_size: 10,
                ..ScenarioLimits::default()
            },
        });
        let err = loader.load_from_str(VALID, "<inline>").unwrap_err();
        assert!(matches!(err, ScenarioError::InvalidValue { ref field, .. } if field == "file_size"));
    }

    #[test]
    fn load_dir_reads_yaml_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.yaml"), VALID.replace("shoulder", "b-station")).unwrap();
        std::fs::write(dir.path().join("a.yml"), VALID.replace("shoulder", "a-station")).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let loaded = ScenarioLoader::with_defaults().load_dir(dir.path()).unwrap();
        let ids: Vec<&str> = loaded.iter().map(|r| r.scenario.id.as_str()).collect();
        assert_eq!(ids, ["a-station", "b-station"]);
    }
}
