//! Resolution of the material catalog and model set for a CLI invocation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use extrusion_lib::{MaterialCatalog, ModelRegistry, SimulationEngine};

/// Environment variable pointing at a material catalog CSV.
pub const MATERIALS_ENV: &str = "EXTRUSION_MATERIALS";
/// Environment variable pointing at a JSON file of additional model versions.
pub const MODELS_ENV: &str = "EXTRUSION_MODELS";

/// Catalog and model sources chosen on the command line.
#[derive(Debug, Clone, Default)]
pub struct EngineSources {
    pub materials: Option<PathBuf>,
    pub models: Option<PathBuf>,
}

impl EngineSources {
    /// Fill unset sources from the environment.
    pub fn resolve(self) -> Self {
        Self {
            materials: self.materials.or_else(|| env_path(MATERIALS_ENV)),
            models: self.models.or_else(|| env_path(MODELS_ENV)),
        }
    }

    /// Build an engine from the resolved sources.
    ///
    /// Resolution order: explicit flag, environment variable, built-in data.
    pub fn build_engine(self) -> Result<SimulationEngine> {
        let sources = self.resolve();
        let catalog = load_catalog(sources.materials.as_deref())?;
        let registry = load_registry(sources.models.as_deref())?;
        Ok(SimulationEngine::new(catalog, registry))
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn load_catalog(path: Option<&Path>) -> Result<MaterialCatalog> {
    match path {
        Some(path) => MaterialCatalog::from_path(path)
            .with_context(|| format!("failed to load material catalog from {}", path.display())),
        None => {
            debug!("using built-in material catalog");
            MaterialCatalog::builtin()
                .cloned()
                .context("failed to parse the built-in material catalog")
        }
    }
}

fn load_registry(path: Option<&Path>) -> Result<ModelRegistry> {
    let mut registry =
        ModelRegistry::builtin().context("failed to register built-in model presets")?;
    if let Some(path) = path {
        registry
            .load_json_path(path)
            .with_context(|| format!("failed to load model definitions from {}", path.display()))?;
    }
    Ok(registry)
}
