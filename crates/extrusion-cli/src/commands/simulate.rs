//! Simulate command handler for a single blend and parameter set.

use anyhow::{anyhow, Context, Result};
use clap::Args;

use extrusion_lib::{ProcessParameters, SimulationEngine};

use crate::output::{print_json, print_result_text, OutputFormat};

/// Process parameter flags; unset values fall back to the standard operating point.
#[derive(Args, Debug, Clone, Default)]
pub struct ProcessArgs {
    /// Barrel temperature in °C (60-180).
    #[arg(long)]
    pub temperature: Option<f64>,
    /// Screw speed in rpm (100-600).
    #[arg(long)]
    pub rpm: Option<f64>,
    /// Feed moisture in percent (10-25).
    #[arg(long)]
    pub moisture: Option<f64>,
    /// Fat content in percent (0-15).
    #[arg(long)]
    pub fat: Option<f64>,
    /// Screw diameter in mm (20-60).
    #[arg(long)]
    pub screw_diameter: Option<f64>,
    /// Screw length in mm (400-1600).
    #[arg(long)]
    pub screw_length: Option<f64>,
    /// Feed rate in kg/h (5-200).
    #[arg(long)]
    pub feed_rate: Option<f64>,
    /// Die diameter in mm (1-20).
    #[arg(long)]
    pub die_diameter: Option<f64>,
    /// Measured chamber pressure in bar (20-200); replaces the derived value.
    #[arg(long)]
    pub pressure: Option<f64>,
}

impl ProcessArgs {
    pub fn to_parameters(&self) -> ProcessParameters {
        let defaults = ProcessParameters::default();
        ProcessParameters {
            temperature_c: self.temperature.unwrap_or(defaults.temperature_c),
            rpm: self.rpm.unwrap_or(defaults.rpm),
            moisture_pct: self.moisture.unwrap_or(defaults.moisture_pct),
            fat_pct: self.fat.unwrap_or(defaults.fat_pct),
            screw_diameter_mm: self.screw_diameter.unwrap_or(defaults.screw_diameter_mm),
            screw_length_mm: self.screw_length.unwrap_or(defaults.screw_length_mm),
            feed_rate_kg_h: self.feed_rate.unwrap_or(defaults.feed_rate_kg_h),
            die_diameter_mm: self.die_diameter.unwrap_or(defaults.die_diameter_mm),
            chamber_pressure_bar: self.pressure.or(defaults.chamber_pressure_bar),
        }
    }
}

/// Parse a `name=percent` blend entry.
pub fn parse_blend_entry(value: &str) -> Result<(String, f64)> {
    let (name, ratio) = value
        .split_once('=')
        .ok_or_else(|| anyhow!("expected NAME=PERCENT, got '{value}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("material name missing in '{value}'"));
    }
    let ratio = ratio
        .trim()
        .parse::<f64>()
        .with_context(|| format!("invalid percentage in '{value}'"))?;
    Ok((name.to_string(), ratio))
}

/// Handle the simulate subcommand.
pub fn handle_simulate(
    engine: &SimulationEngine,
    model: &str,
    blend: &[(String, f64)],
    process: &ProcessArgs,
    format: OutputFormat,
) -> Result<()> {
    let params = process.to_parameters();
    let run = engine
        .run_recorded(
            blend.iter().map(|(name, ratio)| (name.as_str(), *ratio)),
            &params,
            model,
        )
        .with_context(|| format!("simulation with model '{model}' failed"))?;

    match format {
        OutputFormat::Text => print_result_text(&run.blend, &run.parameters, &run.result),
        OutputFormat::Json => print_json(&run)?,
    }
    Ok(())
}
