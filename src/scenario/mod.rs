//! Scenario definitions and loading
//!
//! Station scenarios are YAML documents: an ordered list of phases, each
//! with instructional content, a checklist of expected actions and an
//! optional countdown. This module parses, validates and serves them.

pub mod builtin;
pub mod loader;
pub mod repository;
pub mod schema;
pub mod validation;

pub use loader::{LoadResult, LoaderOptions, ScenarioLimits, ScenarioLoader};
pub use repository::{ScenarioCatalog, ScenarioRepository};
pub use schema::{PhaseDefinition, ScenarioDefinition};
pub use validation::{ValidationResult, Validator};
