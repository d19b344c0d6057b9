//! Formula models: versioned empirical equation sets.
//!
//! This module is organized into focused submodules:
//!
//! - [`formulas`] - Swappable sub-formulas for each predicted quantity
//! - [`presets`] - The built-in model versions
//! - [`registry`] - Version-tag lookup of interchangeable models
//!
//! # Example
//!
//! ```
//! use extrusion_lib::model::{presets, EmpiricalModel, FormulaModel};
//! use extrusion_lib::{Blend, MaterialCatalog, ProcessParameters};
//!
//! let catalog = MaterialCatalog::builtin().unwrap();
//! let blend = Blend::validate([("corn", 100.0)], catalog).unwrap();
//! let model = EmpiricalModel::new(presets::basic()).unwrap();
//!
//! let result = model.predict(&blend, &ProcessParameters::default());
//! assert_eq!(result.expansion_index, 2.1);
//! ```

pub mod formulas;
pub mod presets;
pub mod registry;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::blend::Blend;
use crate::error::{Error, Result};
use crate::params::ProcessParameters;
use crate::result::{Appearance, Color, SimulationResult};

pub use formulas::{
    round_to, BlendProperties, DensityFormula, EnergyFormula, EnergyTerms, LabelThresholds,
    LinearCorrection, PressureFormula, Rounding, StickinessFormula, WaterActivityFormula,
};
pub use registry::ModelRegistry;

/// One versioned empirical equation set.
///
/// Implementations are stateless: `predict` is a pure function of its inputs
/// and must return bit-identical results for identical inputs. Inputs reach
/// `predict` already validated.
pub trait FormulaModel: fmt::Debug + Send + Sync {
    /// Version tag used to select this model.
    fn version(&self) -> &str;

    /// Short human-readable summary of the equation set.
    fn description(&self) -> &str {
        ""
    }

    fn predict(&self, blend: &Blend, params: &ProcessParameters) -> SimulationResult;
}

/// Full coefficient and sub-formula table for one model version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub expansion_correction: LinearCorrection,
    #[serde(default)]
    pub crispness_correction: LinearCorrection,
    pub water_activity: WaterActivityFormula,
    pub stickiness: StickinessFormula,
    #[serde(default)]
    pub bulk_density: Option<DensityFormula>,
    #[serde(default)]
    pub chamber_pressure: Option<PressureFormula>,
    #[serde(default)]
    pub specific_energy: Option<EnergyFormula>,
    /// Lower bound applied to specific energy (kWh/kg).
    #[serde(default)]
    pub energy_floor: f64,
    /// Clamp water activity to [0, 1] before rounding.
    #[serde(default)]
    pub clamp_water_activity: bool,
    #[serde(default)]
    pub labels: Option<LabelThresholds>,
    #[serde(default)]
    pub rounding: Rounding,
}

impl ModelConfig {
    /// Validate the configuration before it is used to build a model.
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(Error::ModelConfig {
                message: "model version must not be empty".to_string(),
            });
        }

        if !self.energy_floor.is_finite() || self.energy_floor < 0.0 {
            return Err(Error::ModelConfig {
                message: format!(
                    "energy_floor for model '{}' must be finite and non-negative, got {}",
                    self.version, self.energy_floor
                ),
            });
        }

        if let Some(labels) = self.labels {
            if !labels.expanded_above.is_finite() || !labels.golden_from_c.is_finite() {
                return Err(Error::ModelConfig {
                    message: format!("label thresholds for model '{}' must be finite", self.version),
                });
            }
        }

        formulas::validate_corrections(&self.expansion_correction, &self.crispness_correction)?;
        formulas::validate_formulas(
            &self.water_activity,
            &self.stickiness,
            self.bulk_density.as_ref(),
            self.chamber_pressure.as_ref(),
            self.specific_energy.as_ref(),
        )
    }
}

/// [`FormulaModel`] driven entirely by a [`ModelConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct EmpiricalModel {
    config: ModelConfig,
}

impl EmpiricalModel {
    pub fn new(config: ModelConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }
}

impl FormulaModel for EmpiricalModel {
    fn version(&self) -> &str {
        &self.config.version
    }

    fn description(&self) -> &str {
        &self.config.description
    }

    fn predict(&self, blend: &Blend, params: &ProcessParameters) -> SimulationResult {
        let config = &self.config;
        let rounding = config.rounding;

        let mut properties = BlendProperties {
            expansion: 0.0,
            crisp: 0.0,
        };
        let mut flavor_weights: BTreeMap<String, f64> = BTreeMap::new();
        for (material, weight) in blend.weights() {
            properties.expansion += material.expansion_coeff * weight;
            properties.crisp += material.crisp_coeff * weight;
            *flavor_weights
                .entry(material.flavor_label.clone())
                .or_insert(0.0) += weight;
        }

        let expansion = config
            .expansion_correction
            .apply(properties.expansion, params);
        let crispness = config.crispness_correction.apply(properties.crisp, params);
        let mut water_activity = config.water_activity.evaluate(params);
        if config.clamp_water_activity {
            water_activity = water_activity.clamp(0.0, 1.0);
        }
        let stickiness = config.stickiness.evaluate(&properties, params);

        let bulk_density = config
            .bulk_density
            .map(|formula| formula.evaluate(expansion, params).max(0.0));

        let chamber_pressure = params
            .chamber_pressure_bar
            .or_else(|| config.chamber_pressure.map(|formula| formula.evaluate(params)))
            .map(|pressure| pressure.max(0.0));

        let specific_energy = config.specific_energy.map(|formula| {
            formula
                .evaluate(params, chamber_pressure.unwrap_or(0.0))
                .max(config.energy_floor)
        });

        let expansion_index = round_to(expansion, rounding.indices);
        let (appearance, color) = match config.labels {
            Some(labels) => (
                Some(Appearance::classify(expansion_index, labels.expanded_above)),
                Some(Color::classify(params.temperature_c, labels.golden_from_c)),
            ),
            None => (None, None),
        };

        let flavor_profile = flavor_weights
            .into_iter()
            .map(|(label, weight)| (label, round_to(weight * 100.0, rounding.flavor)))
            .collect();

        SimulationResult {
            model_version: config.version.clone(),
            expansion_index,
            crispness_index: round_to(crispness, rounding.indices),
            water_activity: round_to(water_activity, rounding.indices),
            stickiness_index: round_to(stickiness, rounding.indices),
            bulk_density: bulk_density.map(|v| round_to(v, rounding.indices)),
            chamber_pressure_bar: chamber_pressure.map(|v| round_to(v, rounding.pressure)),
            specific_energy_kwh_per_kg: specific_energy.map(|v| round_to(v, rounding.energy)),
            flavor_profile,
            appearance,
            color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MaterialCatalog;

    fn corn_blend() -> Blend {
        let catalog = MaterialCatalog::builtin().expect("builtin catalog");
        Blend::validate([("corn", 100.0)], catalog).expect("pure corn")
    }

    #[test]
    fn basic_pure_corn_matches_closed_form() {
        let model = EmpiricalModel::new(presets::basic()).expect("valid preset");
        let result = model.predict(&corn_blend(), &ProcessParameters::default());

        // 2.0 + 40 * 0.005 - 15 * 0.01 + 5 * 0.01
        assert_eq!(result.expansion_index, 2.1);
        // 6.0 + 0 - 5 * 0.1 + 15 * 0.05
        assert_eq!(result.crispness_index, 6.25);
        // 0.6 + 0.15 - 0.14
        assert_eq!(result.water_activity, 0.61);
        // 1 + 0.5 + 1.5 - 0.6
        assert_eq!(result.stickiness_index, 2.4);
        assert_eq!(result.appearance, Some(Appearance::Expanded));
        assert_eq!(result.color, Some(Color::Golden));
        assert_eq!(result.bulk_density, None);
        assert_eq!(result.specific_energy_kwh_per_kg, None);
        assert_eq!(result.flavor_profile.get("sweet"), Some(&100.0));
    }

    #[test]
    fn pressure_override_replaces_derived_value() {
        let model = EmpiricalModel::new(presets::geometry()).expect("valid preset");
        let params = ProcessParameters {
            chamber_pressure_bar: Some(55.0),
            ..ProcessParameters::default()
        };
        let result = model.predict(&corn_blend(), &params);
        assert_eq!(result.chamber_pressure_bar, Some(55.0));
    }

    #[test]
    fn inverse_crisp_stickiness_may_go_negative() {
        let catalog = MaterialCatalog::builtin().expect("builtin catalog");
        let model = EmpiricalModel::new(presets::geometry()).expect("valid preset");
        let params = ProcessParameters::default();

        let potato = Blend::validate([("potato_starch", 100.0)], catalog).expect("pure potato");
        let half = Blend::validate([("corn", 50.0), ("potato_starch", 50.0)], catalog)
            .expect("half potato");

        assert_eq!(model.predict(&corn_blend(), &params).stickiness_index, 0.0);
        assert_eq!(model.predict(&half, &params).stickiness_index, -0.25);
        assert_eq!(model.predict(&potato, &params).stickiness_index, -0.5);
    }

    #[test]
    fn water_activity_clamp_is_opt_in() {
        let params = ProcessParameters {
            moisture_pct: 25.0,
            ..ProcessParameters::default()
        };
        let open = EmpiricalModel::new(presets::calibrated()).expect("valid preset");
        // 25 / 22
        assert_eq!(open.predict(&corn_blend(), &params).water_activity, 1.14);

        let clamped = EmpiricalModel::new(ModelConfig {
            clamp_water_activity: true,
            ..presets::calibrated()
        })
        .expect("valid config");
        assert_eq!(clamped.predict(&corn_blend(), &params).water_activity, 1.0);
    }

    #[test]
    fn negative_energy_floor_is_rejected() {
        let config = ModelConfig {
            energy_floor: -0.1,
            ..presets::energy()
        };
        assert!(matches!(
            EmpiricalModel::new(config),
            Err(Error::ModelConfig { .. })
        ));
    }

    #[test]
    fn config_round_trips_through_json() {
        let json = serde_json::to_string(&presets::calibrated()).expect("serialize");
        let parsed: ModelConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, presets::calibrated());
    }
}
