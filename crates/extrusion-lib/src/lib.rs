//! Twin-screw extrusion simulation engine.
//!
//! This crate validates material blends and process parameters, evaluates
//! versioned empirical formula models, and provides batch evaluation and
//! run-history comparison on top. Front ends (the CLI, dashboards, report
//! generators) should only depend on the items exported here and render the
//! results themselves.
//!

#![deny(warnings)]

pub mod batch;
pub mod blend;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod history;
pub mod model;
pub mod params;
pub mod result;

pub use batch::{read_batch_rows, write_batch_csv, BatchOutcome, BatchRow, BatchRunner};
pub use blend::{Blend, BlendComponent, RawBlend};
pub use catalog::{Material, MaterialCatalog};
pub use engine::SimulationEngine;
pub use error::{Error, Result};
pub use history::{Direction, FieldDelta, HistoryDelta, HistoryTracker, SharedHistory};
pub use model::{EmpiricalModel, FormulaModel, ModelConfig, ModelRegistry};
pub use params::{ParameterRange, ProcessParameters, PARAMETER_RANGES};
pub use result::{Appearance, Color, SimulationResult, SimulationRun};
