//! Simulation outputs.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::blend::Blend;
use crate::params::ProcessParameters;

/// Qualitative appearance of the extrudate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Appearance {
    Expanded,
    Dense,
}

impl Appearance {
    /// `Expanded` when the expansion index is strictly above the threshold.
    pub fn classify(expansion_index: f64, expanded_above: f64) -> Self {
        if expansion_index > expanded_above {
            Appearance::Expanded
        } else {
            Appearance::Dense
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Appearance::Expanded => "expanded",
            Appearance::Dense => "dense",
        }
    }
}

impl fmt::Display for Appearance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Qualitative surface colour of the extrudate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Golden,
    Pale,
}

impl Color {
    /// `Golden` when the barrel temperature reaches the threshold.
    pub fn classify(temperature_c: f64, golden_from_c: f64) -> Self {
        if temperature_c >= golden_from_c {
            Color::Golden
        } else {
            Color::Pale
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Color::Golden => "golden",
            Color::Pale => "pale",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Numeric result fields in display order.
pub const RESULT_FIELDS: [&str; 7] = [
    "expansion_index",
    "crispness_index",
    "water_activity",
    "stickiness_index",
    "bulk_density",
    "chamber_pressure_bar",
    "specific_energy_kwh_per_kg",
];

/// Structured prediction for one run.
///
/// Model versions differ in which optional fields they populate, so
/// consumers should treat `None` fields as "not modelled" rather than zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub model_version: String,
    pub expansion_index: f64,
    pub crispness_index: f64,
    pub water_activity: f64,
    pub stickiness_index: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bulk_density: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chamber_pressure_bar: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specific_energy_kwh_per_kg: Option<f64>,
    /// Flavour label -> percent of the blend carrying it.
    pub flavor_profile: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appearance: Option<Appearance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

impl SimulationResult {
    /// Value of a numeric field by name, `None` when the model does not populate it.
    pub fn field(&self, name: &str) -> Option<f64> {
        match name {
            "expansion_index" => Some(self.expansion_index),
            "crispness_index" => Some(self.crispness_index),
            "water_activity" => Some(self.water_activity),
            "stickiness_index" => Some(self.stickiness_index),
            "bulk_density" => self.bulk_density,
            "chamber_pressure_bar" => self.chamber_pressure_bar,
            "specific_energy_kwh_per_kg" => self.specific_energy_kwh_per_kg,
            _ => None,
        }
    }

    /// Flat `(field, value)` record of the populated numeric fields.
    pub fn numeric_fields(&self) -> Vec<(&'static str, f64)> {
        RESULT_FIELDS
            .iter()
            .filter_map(|name| self.field(name).map(|value| (*name, value)))
            .collect()
    }

    /// Flavour profile rendered as `label (pct%)` pairs.
    pub fn flavor_summary(&self) -> String {
        self.flavor_profile
            .iter()
            .map(|(label, pct)| format!("{label} ({pct}%)"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A completed run: the validated inputs together with their prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRun {
    pub parameters: ProcessParameters,
    pub blend: Blend,
    pub result: SimulationResult,
}
