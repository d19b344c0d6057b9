#![allow(dead_code)]

use std::path::PathBuf;

use extrusion_lib::{MaterialCatalog, ModelRegistry, SimulationEngine};

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures")
}

pub fn fixture_catalog() -> MaterialCatalog {
    let path = fixtures_dir().join("materials_v35.csv");
    MaterialCatalog::from_path(&path).expect("load fixture materials_v35.csv")
}

pub fn builtin_engine() -> SimulationEngine {
    SimulationEngine::with_builtin().expect("builtin engine")
}

pub fn fixture_engine() -> SimulationEngine {
    SimulationEngine::new(
        fixture_catalog(),
        ModelRegistry::builtin().expect("builtin models"),
    )
}
