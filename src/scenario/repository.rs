//! Scenario repository
//!
//! Read-only source of scenario definitions for the session engine.
//! [`ScenarioCatalog`] is the in-process implementation: built-ins first,
//! then any scenarios loaded from a directory, in insertion order.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::info;

use crate::error::ScenarioError;
use crate::scenario::builtin::builtin_scenarios;
use crate::scenario::loader::ScenarioLoader;
use crate::scenario::schema::ScenarioDefinition;

/// Supplies immutable scenario definitions.
pub trait ScenarioRepository: Send + Sync {
    /// Looks up a scenario by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::NotFound`] if no scenario has this id.
    fn get(&self, id: &str) -> Result<Arc<ScenarioDefinition>, ScenarioError>;

    /// Returns every scenario in catalog order.
    fn list(&self) -> Vec<Arc<ScenarioDefinition>>;
}

/// In-memory scenario catalog.
#[derive(Debug, Default, Clone)]
pub struct ScenarioCatalog {
    scenarios: IndexMap<String, Arc<ScenarioDefinition>>,
}

impl ScenarioCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding the built-in stations.
    ///
    /// # Errors
    ///
    /// Returns an error if an embedded scenario fails to load.
    pub fn builtin(loader: &ScenarioLoader) -> Result<Self, ScenarioError> {
        let mut catalog = Self::new();
        for builtin in builtin_scenarios() {
            let loaded = loader.load_from_str(builtin.yaml, builtin.id)?;
            catalog.insert(loaded.scenario)?;
        }
        Ok(catalog)
    }

    /// Loads every scenario file in `dir` into the catalog.
    ///
    /// Returns the number of scenarios added.
    ///
    /// # Errors
    ///
    /// Returns an error if any file fails to load or reuses an id already
    /// present in the catalog.
    pub fn extend_from_dir(
        &mut self,
        loader: &ScenarioLoader,
        dir: &Path,
    ) -> Result<usize, ScenarioError> {
        let loaded = loader.load_dir(dir)?;
        let count = loaded.len();
        for result in loaded {
            self.insert(result.scenario)?;
        }
        info!(dir = %dir.display(), count, "loaded scenarios from directory");
        Ok(count)
    }

    /// Adds a scenario.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Duplicate`] if the id is already taken.
    pub fn insert(&mut self, scenario: Arc<ScenarioDefinition>) -> Result<(), ScenarioError> {
        if self.scenarios.contains_key(&scenario.id) {
            return Err(ScenarioError::Duplicate {
                id: scenario.id.clone(),
            });
        }
        self.scenarios.insert(scenario.id.clone(), scenario);
        Ok(())
    }

    /// Number of scenarios in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Returns `true` if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Suggests a known id for a mistyped one.
    ///
    /// Returns the closest match if its Damerau-Levenshtein distance is at
    /// most 3.
    #[must_use]
    pub fn suggest(&self, input: &str) -> Option<String> {
        self.scenarios
            .keys()
            .map(|id| (id, strsim::damerau_levenshtein(input, id)))
            .filter(|(_, dist)| *dist <= 3)
            .min_by_key(|(_, dist)| *dist)
            .map(|(id, _)| id.clone())
    }
}

impl ScenarioRepository for ScenarioCatalog {
    fn get(&self, id: &str) -> Result<Arc<ScenarioDefinition>, ScenarioError> {
        self.scenarios
            .get(id)
            .cloned()
            .ok_or_else(|| ScenarioError::NotFound {
                id: id.to_string(),
                suggestion: self.suggest(id),
            })
    }

    fn list(&self) -> Vec<Arc<ScenarioDefinition>> {
        self.scenarios.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::schema::PhaseDefinition;

    fn station(id: &str) -> Arc<ScenarioDefinition> {
        Arc::new(ScenarioDefinition::new(
            id,
            id,
            vec![PhaseDefinition::new("Only", ["x"])],
        ))
    }

    #[test]
    fn builtin_catalog_lists_in_registry_order() {
        let catalog = ScenarioCatalog::builtin(&ScenarioLoader::with_defaults()).unwrap();
        let ids: Vec<String> = catalog.list().iter().map(|s| s.id.clone()).collect();
        assert_eq!(
            ids,
            [
                "knee-pain-history",
                "lower-back-pain-history",
                "post-op-thr-exercise",
                "knee-examination",
            ]
        );
    }

    #[test]
    fn get_returns_shared_definition() {
        let mut catalog = ScenarioCatalog::new();
        catalog.insert(station("a")).unwrap();
        let first = catalog.get("a").unwrap();
        let second = catalog.get("a").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn duplicate_insert_rejected() {
        let mut catalog = ScenarioCatalog::new();
        catalog.insert(station("a")).unwrap();
        let err = catalog.insert(station("a")).unwrap_err();
        assert!(matches!(err, ScenarioError::Duplicate { ref id } if id == "a"));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn unknown_id_carries_suggestion() {
        let catalog = ScenarioCatalog::builtin(&ScenarioLoader::with_defaults()).unwrap();
        let err = catalog.get("knee-examinaton").unwrap_err();
        match err {
            ScenarioError::NotFound { suggestion, .. } => {
                assert_eq!(suggestion.as_deref(), Some("knee-examination"));
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn far_off_id_has_no_suggestion() {
        let catalog = ScenarioCatalog::builtin(&ScenarioLoader::with_defaults()).unwrap();
        assert!(catalog.suggest("cardiology").is_none());
    }
}
