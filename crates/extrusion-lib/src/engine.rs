//! Single-run orchestration: validate, select a model, predict.

use tracing::debug;

use crate::blend::Blend;
use crate::catalog::MaterialCatalog;
use crate::error::Result;
use crate::model::ModelRegistry;
use crate::params::ProcessParameters;
use crate::result::{SimulationResult, SimulationRun};

/// Entry point for simulation requests.
///
/// The engine owns its catalog and registry and holds no mutable state, so a
/// shared reference can serve concurrent callers.
#[derive(Debug, Clone)]
pub struct SimulationEngine {
    catalog: MaterialCatalog,
    registry: ModelRegistry,
}

impl SimulationEngine {
    pub fn new(catalog: MaterialCatalog, registry: ModelRegistry) -> Self {
        Self { catalog, registry }
    }

    /// Engine over the built-in catalog and every built-in model preset.
    pub fn with_builtin() -> Result<Self> {
        let catalog = MaterialCatalog::builtin()?.clone();
        let registry = ModelRegistry::builtin()?;
        Ok(Self::new(catalog, registry))
    }

    /// Validate the raw inputs and run the named model version.
    ///
    /// Validation fails fast in a fixed order (model version, blend, process
    /// parameters) and no prediction is computed when any check fails.
    pub fn run<I, K>(
        &self,
        raw_blend: I,
        params: &ProcessParameters,
        model_version: &str,
    ) -> Result<SimulationResult>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        Ok(self.run_recorded(raw_blend, params, model_version)?.result)
    }

    /// Like [`run`](Self::run) but keeps the validated inputs alongside the result.
    pub fn run_recorded<I, K>(
        &self,
        raw_blend: I,
        params: &ProcessParameters,
        model_version: &str,
    ) -> Result<SimulationRun>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        self.registry.get(model_version)?;
        let blend = Blend::validate(raw_blend, &self.catalog)?;
        let result = self.run_validated(&blend, params, model_version)?;
        Ok(SimulationRun {
            parameters: *params,
            blend,
            result,
        })
    }

    /// Run a model on a blend that has already been validated.
    pub fn run_validated(
        &self,
        blend: &Blend,
        params: &ProcessParameters,
        model_version: &str,
    ) -> Result<SimulationResult> {
        let model = self.registry.get(model_version)?;
        params.validate()?;

        debug!(
            version = model.version(),
            components = blend.components().len(),
            "running simulation"
        );
        Ok(model.predict(blend, params))
    }

    pub fn catalog(&self) -> &MaterialCatalog {
        &self.catalog
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::presets;

    fn engine() -> SimulationEngine {
        SimulationEngine::with_builtin().expect("builtin engine")
    }

    #[test]
    fn identical_inputs_give_identical_results() {
        let engine = engine();
        let params = ProcessParameters::default();
        for version in engine.registry().versions() {
            let first = engine
                .run([("corn", 55.0), ("rye", 25.0), ("protein", 20.0)], &params, &version)
                .expect("valid run");
            let second = engine
                .run([("protein", 20.0), ("corn", 55.0), ("rye", 25.0)], &params, &version)
                .expect("valid run");
            assert_eq!(first, second, "version {version}");
        }
    }

    #[test]
    fn unknown_model_is_reported_before_blend_errors() {
        let err = engine()
            .run([("corn", 10.0)], &ProcessParameters::default(), "v2")
            .expect_err("unknown model");
        assert!(matches!(err, Error::UnknownModel { .. }));
    }

    #[test]
    fn blend_errors_precede_parameter_errors() {
        let params = ProcessParameters {
            rpm: 50.0,
            ..ProcessParameters::default()
        };
        let err = engine()
            .run([("corn", 60.0), ("wheat", 30.0)], &params, presets::BASIC)
            .expect_err("invalid blend");
        assert!(matches!(err, Error::BlendNotNormalized { .. }));
    }

    #[test]
    fn out_of_range_parameter_names_the_field() {
        let params = ProcessParameters {
            moisture_pct: 30.0,
            ..ProcessParameters::default()
        };
        let err = engine()
            .run([("corn", 100.0)], &params, presets::BASIC)
            .expect_err("moisture too high");
        match err {
            Error::InvalidRange {
                field,
                value,
                min,
                max,
            } => {
                assert_eq!(field, "moisture_pct");
                assert_eq!((value, min, max), (30.0, 10.0, 25.0));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn energy_floor_holds_at_low_extremes() {
        let params = ProcessParameters {
            temperature_c: 60.0,
            rpm: 100.0,
            moisture_pct: 25.0,
            fat_pct: 15.0,
            screw_diameter_mm: 20.0,
            screw_length_mm: 400.0,
            feed_rate_kg_h: 5.0,
            die_diameter_mm: 1.0,
            chamber_pressure_bar: None,
        };
        let result = engine()
            .run([("protein", 100.0)], &params, presets::ENERGY)
            .expect("valid run");
        let energy = result
            .specific_energy_kwh_per_kg
            .expect("energy model populates energy");
        assert!(energy >= presets::ENERGY_FLOOR_KWH_PER_KG);
    }

    #[test]
    fn run_recorded_keeps_inputs() {
        let params = ProcessParameters::default();
        let run = engine()
            .run_recorded([("corn", 70.0), ("wheat", 30.0)], &params, presets::PROCESS)
            .expect("valid run");
        assert_eq!(run.parameters, params);
        assert_eq!(run.blend.ratio("wheat"), Some(30.0));
        assert_eq!(run.result.model_version, "process");
    }
}
