//! Built-in model versions.
//!
//! Each preset reproduces one of the empirical equation sets used on the
//! shop floor. None of them is canonical; callers always name the version.

use super::formulas::{
    DensityFormula, EnergyFormula, EnergyTerms, LabelThresholds, LinearCorrection,
    PressureFormula, Rounding, StickinessFormula, WaterActivityFormula,
};
use super::ModelConfig;

pub const BASIC: &str = "basic";
pub const ENERGY: &str = "energy";
pub const GEOMETRY: &str = "geometry";
pub const PRESSURE: &str = "pressure";
pub const CALIBRATED: &str = "calibrated";
pub const SIMPLIFIED: &str = "simplified";
pub const PROCESS: &str = "process";

/// Floor applied to specific energy by the energy-augmented preset (kWh/kg).
pub const ENERGY_FLOOR_KWH_PER_KG: f64 = 0.05;

/// Every built-in preset, in registration order.
pub fn all() -> Vec<ModelConfig> {
    vec![
        basic(),
        energy(),
        geometry(),
        pressure(),
        calibrated(),
        simplified(),
        process(),
    ]
}

fn basic_expansion_correction() -> LinearCorrection {
    LinearCorrection {
        temperature_ref: 100.0,
        temperature: 0.005,
        moisture: -0.01,
        fat: 0.01,
        ..LinearCorrection::none()
    }
}

fn basic_crispness_correction() -> LinearCorrection {
    LinearCorrection {
        rpm_ref: 300.0,
        rpm: 0.005,
        moisture: 0.05,
        fat: -0.1,
        ..LinearCorrection::none()
    }
}

fn temperature_water_activity() -> WaterActivityFormula {
    WaterActivityFormula::Linear {
        intercept: 0.6,
        moisture: 0.01,
        moisture_ref: 0.0,
        temperature: -0.001,
        fat: 0.0,
    }
}

fn process_stickiness() -> StickinessFormula {
    StickinessFormula::Process {
        intercept: 1.0,
        fat: 0.1,
        moisture: 0.1,
        rpm: -0.002,
    }
}

/// Blend-weighted base with linear process corrections, no machine outputs.
pub fn basic() -> ModelConfig {
    ModelConfig {
        version: BASIC.to_string(),
        description: "Linear process corrections on blend-weighted expansion and crispness"
            .to_string(),
        expansion_correction: basic_expansion_correction(),
        crispness_correction: basic_crispness_correction(),
        water_activity: temperature_water_activity(),
        stickiness: process_stickiness(),
        bulk_density: None,
        chamber_pressure: None,
        specific_energy: None,
        energy_floor: 0.0,
        clamp_water_activity: false,
        labels: Some(LabelThresholds {
            expanded_above: 2.0,
            golden_from_c: 140.0,
        }),
        rounding: Rounding::default(),
    }
}

/// `basic` plus a linear specific-energy estimate with a positive floor.
pub fn energy() -> ModelConfig {
    ModelConfig {
        version: ENERGY.to_string(),
        description: "Basic corrections plus linear specific energy (floored at 0.05 kWh/kg)"
            .to_string(),
        specific_energy: Some(EnergyFormula::Linear(EnergyTerms {
            intercept: 0.12,
            temperature_ref: 100.0,
            temperature: 0.0008,
            rpm_ref: 300.0,
            rpm: 0.0005,
            screw_length: 0.05 / 1000.0,
            moisture: -0.002,
            fat: -0.003,
            screw_diameter: 0.02 / 100.0,
            ..EnergyTerms::default()
        })),
        energy_floor: ENERGY_FLOOR_KWH_PER_KG,
        ..basic()
    }
}

/// Material-driven stickiness with pressure derived from feed and screw geometry.
pub fn geometry() -> ModelConfig {
    ModelConfig {
        version: GEOMETRY.to_string(),
        description: "Screw-geometry pressure, shear-heat energy, material-driven stickiness"
            .to_string(),
        expansion_correction: LinearCorrection::none(),
        crispness_correction: LinearCorrection::none(),
        water_activity: WaterActivityFormula::MoistureRatio { divisor: 25.0 },
        stickiness: StickinessFormula::InverseCrisp { crisp_max: 6.0 },
        bulk_density: Some(DensityFormula::Linear {
            intercept: 1.0,
            expansion: 0.0,
            moisture: -0.02,
            fat: -0.015,
            feed_rate: 0.0,
            die_diameter: 0.0,
        }),
        chamber_pressure: Some(PressureFormula::FeedGeometry { scale: 100_000.0 }),
        specific_energy: Some(EnergyFormula::ShearHeat {
            scale: 1_000_000.0,
            fat_factor: 0.01,
            moisture_factor: 0.01,
        }),
        energy_floor: 0.0,
        clamp_water_activity: false,
        labels: None,
        rounding: Rounding {
            pressure: 3,
            ..Rounding::default()
        },
    }
}

/// Shear-driven pressure with feed-diluted energy.
pub fn pressure() -> ModelConfig {
    ModelConfig {
        version: PRESSURE.to_string(),
        description: "Shear pressure, feed-diluted energy, material-driven stickiness"
            .to_string(),
        expansion_correction: LinearCorrection::none(),
        crispness_correction: LinearCorrection::none(),
        water_activity: WaterActivityFormula::Linear {
            intercept: 0.65,
            moisture: 0.01,
            moisture_ref: 15.0,
            temperature: 0.0,
            fat: -0.005,
        },
        stickiness: StickinessFormula::InverseCrisp { crisp_max: 10.0 },
        bulk_density: Some(DensityFormula::Linear {
            intercept: 0.7,
            expansion: -0.25,
            moisture: 0.0,
            fat: 0.0,
            feed_rate: 0.0,
            die_diameter: 0.0,
        }),
        chamber_pressure: Some(PressureFormula::Shear { coefficient: 0.1 }),
        specific_energy: Some(EnergyFormula::FeedDiluted {
            base_divisor: 100_000.0,
            feed_factor: 100.0,
            fat_factor: 0.1,
        }),
        energy_floor: 0.0,
        clamp_water_activity: false,
        labels: None,
        rounding: Rounding::default(),
    }
}

/// Operator-supplied chamber pressure feeding a linear energy estimate.
pub fn calibrated() -> ModelConfig {
    ModelConfig {
        version: CALIBRATED.to_string(),
        description: "Measured chamber pressure (80 bar fallback) feeding linear energy"
            .to_string(),
        expansion_correction: LinearCorrection::none(),
        crispness_correction: LinearCorrection::none(),
        water_activity: WaterActivityFormula::MoistureRatio { divisor: 22.0 },
        stickiness: StickinessFormula::Process {
            intercept: 3.0,
            fat: 0.1,
            moisture: -0.05,
            rpm: 0.0,
        },
        bulk_density: Some(DensityFormula::Linear {
            intercept: 1.7,
            expansion: -0.3,
            moisture: 0.0,
            fat: 0.0,
            feed_rate: 0.0,
            die_diameter: 0.0,
        }),
        chamber_pressure: Some(PressureFormula::Supplied { fallback_bar: 80.0 }),
        specific_energy: Some(EnergyFormula::Linear(EnergyTerms {
            temperature: 0.00008,
            rpm: 0.00006,
            feed_rate: 0.00012,
            chamber_pressure: 0.00004,
            ..EnergyTerms::default()
        })),
        energy_floor: 0.0,
        clamp_water_activity: false,
        labels: Some(LabelThresholds {
            expanded_above: 1.8,
            golden_from_c: 130.0,
        }),
        rounding: Rounding::default(),
    }
}

/// Thermal pressure and throughput energy with an inverse density law.
pub fn simplified() -> ModelConfig {
    ModelConfig {
        version: SIMPLIFIED.to_string(),
        description: "Inverse-expansion density, thermal pressure, throughput energy".to_string(),
        expansion_correction: LinearCorrection::none(),
        crispness_correction: LinearCorrection::none(),
        water_activity: temperature_water_activity(),
        stickiness: process_stickiness(),
        bulk_density: Some(DensityFormula::Inverse {
            numerator: 1.2,
            offset: 0.1,
        }),
        chamber_pressure: Some(PressureFormula::Thermal { scale: 10_000.0 }),
        specific_energy: Some(EnergyFormula::Throughput { scale: 10_000_000.0 }),
        energy_floor: 0.0,
        clamp_water_activity: false,
        labels: None,
        rounding: Rounding::default(),
    }
}

/// Feed- and die-sensitive corrections with linear density and pressure.
pub fn process() -> ModelConfig {
    ModelConfig {
        version: PROCESS.to_string(),
        description: "Feed-rate expansion correction, linear die/feed density and pressure"
            .to_string(),
        expansion_correction: LinearCorrection {
            feed_rate_ref: 100.0,
            feed_rate: -0.003,
            fat: 0.008,
            ..basic_expansion_correction()
        },
        crispness_correction: basic_crispness_correction(),
        water_activity: temperature_water_activity(),
        stickiness: process_stickiness(),
        bulk_density: Some(DensityFormula::Linear {
            intercept: 0.6,
            expansion: -0.1,
            moisture: 0.0,
            fat: 0.0,
            feed_rate: 0.002,
            die_diameter: -0.02,
        }),
        chamber_pressure: Some(PressureFormula::Linear {
            intercept: 2.5,
            rpm: 0.005,
            feed_rate: 0.01,
            die_diameter: -0.1,
        }),
        specific_energy: None,
        energy_floor: 0.0,
        clamp_water_activity: false,
        labels: None,
        rounding: Rounding::default(),
    }
}
