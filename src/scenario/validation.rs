//! Scenario validation
//!
//! Structural checks run on every loaded scenario before it is handed to
//! a session. Validation collects ALL issues rather than stopping at the
//! first, so authors see every problem in one pass.

use std::collections::HashSet;

use crate::error::{Severity, ValidationIssue};
use crate::scenario::loader::ScenarioLimits;
use crate::scenario::schema::{PhaseDefinition, ScenarioDefinition};

// ============================================================================
// Public API
// ============================================================================

/// Result of scenario validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Validation errors (prevent loading).
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Scenario validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a scenario and returns every issue found.
    pub fn validate(
        &mut self,
        scenario: &ScenarioDefinition,
        limits: &ScenarioLimits,
    ) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        self.validate_header(scenario);
        self.validate_phases(scenario, limits);

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    // ------------------------------------------------------------------------
    // Scenario header
    // ------------------------------------------------------------------------

    fn validate_header(&mut self, scenario: &ScenarioDefinition) {
        let id = scenario.id.trim();
        if id.is_empty() {
            self.error("id", "scenario id must not be empty");
        } else if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            self.error(
                "id",
                format!("scenario id '{id}' may only contain ASCII letters, digits, '-' and '_'"),
            );
        }

        if scenario.title.trim().is_empty() {
            self.error("title", "scenario title must not be empty");
        }

        if scenario.target_time.is_some_and(|t| t.is_zero()) {
            self.error("target_time", "target time must be greater than zero");
        }
    }

    // ------------------------------------------------------------------------
    // Phases
    // ------------------------------------------------------------------------

    fn validate_phases(&mut self, scenario: &ScenarioDefinition, limits: &ScenarioLimits) {
        if scenario.phases.is_empty() {
            self.error("phases", "scenario must define at least one phase");
            return;
        }

        if scenario.phases.len() > limits.max_phases {
            self.error(
                "phases",
                format!(
                    "{} phases exceeds the limit of {}",
                    scenario.phases.len(),
                    limits.max_phases
                ),
            );
        }

        let mut names = HashSet::new();
        for (index, phase) in scenario.phases.iter().enumerate() {
            let path = format!("phases[{index}]");
            if !phase.name.trim().is_empty() && !names.insert(phase.name.trim()) {
                self.warning(
                    format!("{path}.name"),
                    format!("phase name '{}' is used more than once", phase.name),
                );
            }
            self.validate_phase(&path, phase, limits);
        }

        if scenario.total_items() == 0 {
            self.warning(
                "phases",
                "no phase defines checklist items; every attempt will score 0%",
            );
        }
    }

    fn validate_phase(&mut self, path: &str, phase: &PhaseDefinition, limits: &ScenarioLimits) {
        if phase.name.trim().is_empty() {
            self.error(format!("{path}.name"), "phase name must not be empty");
        }

        if phase.duration.is_some_and(|d| d.is_zero()) {
            self.error(
                format!("{path}.duration"),
                "countdown duration must be greater than zero",
            );
        }

        if phase.checklist.len() > limits.max_items_per_phase {
            self.error(
                format!("{path}.checklist"),
                format!(
                    "{} checklist items exceeds the limit of {}",
                    phase.checklist.len(),
                    limits.max_items_per_phase
                ),
            );
        }

        let mut seen = HashSet::new();
        for (i, label) in phase.checklist.iter().enumerate() {
            let item_path = format!("{path}.checklist[{i}]");
            if label.trim().is_empty() {
                self.error(item_path, "checklist label must not be empty");
            } else if !seen.insert(label.as_str()) {
                self.error(
                    item_path,
                    format!("duplicate checklist label '{label}' within phase"),
                );
            }
        }
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationIssue {
            path: path.into(),
            message: message.into(),
            severity: Severity::Error,
        });
    }

    fn warning(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationIssue {
            path: path.into(),
            message: message.into(),
            severity: Severity::Warning,
        });
    }
}
