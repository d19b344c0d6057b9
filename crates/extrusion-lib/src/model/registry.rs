use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use super::{presets, EmpiricalModel, FormulaModel, ModelConfig};
use crate::error::{Error, Result};

/// Version-tag lookup of interchangeable formula models.
///
/// Tags are matched case-insensitively. Registering a model under an existing
/// tag replaces the previous entry.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: BTreeMap<String, Arc<dyn FormulaModel>>,
}

impl ModelRegistry {
    /// Registry with no models; useful when every version comes from a file.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry holding every built-in preset.
    pub fn builtin() -> Result<Self> {
        let mut registry = Self::empty();
        for config in presets::all() {
            registry.register_config(config)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, model: Arc<dyn FormulaModel>) {
        let key = normalize_version(model.version());
        debug!(version = %key, "registering formula model");
        self.models.insert(key, model);
    }

    /// Validate a configuration and register the resulting model.
    pub fn register_config(&mut self, config: ModelConfig) -> Result<()> {
        let model = EmpiricalModel::new(config)?;
        self.register(Arc::new(model));
        Ok(())
    }

    /// Look up a model by version tag.
    pub fn get(&self, version: &str) -> Result<&dyn FormulaModel> {
        self.models
            .get(&normalize_version(version))
            .map(|model| model.as_ref())
            .ok_or_else(|| Error::UnknownModel {
                version: version.trim().to_string(),
                available: self.versions(),
            })
    }

    pub fn contains(&self, version: &str) -> bool {
        self.models.contains_key(&normalize_version(version))
    }

    /// Registered version tags, sorted.
    pub fn versions(&self) -> Vec<String> {
        self.models.keys().cloned().collect()
    }

    /// Registered models, sorted by version tag.
    pub fn models(&self) -> impl Iterator<Item = &dyn FormulaModel> {
        self.models.values().map(|model| model.as_ref())
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Registry holding only the versions defined in a JSON array.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        let mut registry = Self::empty();
        registry.extend_from_json_reader(reader)?;
        Ok(registry)
    }

    /// Register every model from a JSON array of [`ModelConfig`] objects.
    ///
    /// Returns the number of models registered. A file that names the same
    /// version twice is rejected before anything is registered.
    pub fn extend_from_json_reader<R: Read>(&mut self, reader: R) -> Result<usize> {
        let configs: Vec<ModelConfig> = serde_json::from_reader(reader)?;

        let mut seen = BTreeSet::new();
        let mut models = Vec::with_capacity(configs.len());
        for config in configs {
            let key = normalize_version(&config.version);
            if !seen.insert(key.clone()) {
                return Err(Error::ModelConfig {
                    message: format!("model version '{key}' is defined more than once"),
                });
            }
            models.push(EmpiricalModel::new(config)?);
        }

        let count = models.len();
        for model in models {
            self.register(Arc::new(model));
        }
        Ok(count)
    }

    /// Load additional model versions from a JSON file.
    pub fn load_json_path(&mut self, path: &Path) -> Result<usize> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let file = fs::File::open(path)?;
        let count = self.extend_from_json_reader(file)?;
        info!(models = count, path = %path.display(), "loaded model definitions");
        Ok(count)
    }
}

fn normalize_version(version: &str) -> String {
    version.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn builtin_registry_lists_presets_sorted() {
        let registry = ModelRegistry::builtin().expect("presets register");
        assert_eq!(
            registry.versions(),
            vec![
                "basic",
                "calibrated",
                "energy",
                "geometry",
                "pressure",
                "process",
                "simplified"
            ]
        );
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let registry = ModelRegistry::builtin().expect("presets register");
        let model = registry.get(" Energy ").expect("energy exists");
        assert_eq!(model.version(), "energy");
    }

    #[test]
    fn unknown_version_lists_available() {
        let registry = ModelRegistry::builtin().expect("presets register");
        let err = registry.get("v9").expect_err("not registered");
        match err {
            Error::UnknownModel { version, available } => {
                assert_eq!(version, "v9");
                assert_eq!(available.len(), 7);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn json_definitions_replace_and_extend() {
        let json = r#"[
            {
                "version": "basic",
                "description": "flat",
                "water_activity": {"kind": "moisture_ratio", "divisor": 20.0},
                "stickiness": {"kind": "inverse_crisp", "crisp_max": 8.0}
            },
            {
                "version": "pilot",
                "water_activity": {"kind": "moisture_ratio", "divisor": 25.0},
                "stickiness": {"kind": "inverse_crisp", "crisp_max": 6.0}
            }
        ]"#;

        let mut registry = ModelRegistry::builtin().expect("presets register");
        let count = registry
            .extend_from_json_reader(Cursor::new(json))
            .expect("valid json");
        assert_eq!(count, 2);
        assert_eq!(registry.len(), 8);
        assert_eq!(registry.get("basic").expect("basic").description(), "flat");
        assert!(registry.contains("PILOT"));
    }

    #[test]
    fn duplicate_versions_in_one_file_are_rejected() {
        let json = r#"[
            {"version": "a", "water_activity": {"kind": "moisture_ratio", "divisor": 20.0},
             "stickiness": {"kind": "inverse_crisp", "crisp_max": 8.0}},
            {"version": "A", "water_activity": {"kind": "moisture_ratio", "divisor": 20.0},
             "stickiness": {"kind": "inverse_crisp", "crisp_max": 8.0}}
        ]"#;

        let mut registry = ModelRegistry::empty();
        let err = registry
            .extend_from_json_reader(Cursor::new(json))
            .expect_err("duplicate tag");
        assert!(matches!(err, Error::ModelConfig { .. }));
        assert!(registry.is_empty());
    }
}
