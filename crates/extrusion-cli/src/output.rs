//! Output formatting for simulation results.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

use extrusion_lib::{
    BatchOutcome, Blend, HistoryDelta, MaterialCatalog, ProcessParameters, SimulationResult,
};

/// Supported output formats for single runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report.
    #[default]
    Text,
    /// Pretty-printed JSON of the inputs and result.
    Json,
}

/// Print the material catalog to stdout in a formatted table.
pub fn print_material_catalog(catalog: &MaterialCatalog) {
    if catalog.is_empty() {
        println!("No materials available in catalog.");
        return;
    }

    println!("Available materials ({}):", catalog.len());
    println!(
        "{:<16} {:>10} {:>10}  {}",
        "Name", "Expansion", "Crisp", "Flavor"
    );
    for material in catalog.materials() {
        println!(
            "{:<16} {:>10.2} {:>10.2}  {}",
            material.name, material.expansion_coeff, material.crisp_coeff, material.flavor_label
        );
    }
}

/// Print one simulation as a text report.
pub fn print_result_text(blend: &Blend, params: &ProcessParameters, result: &SimulationResult) {
    println!("Model: {}", result.model_version);
    let blend_summary = blend
        .ratios()
        .iter()
        .map(|(name, ratio)| format!("{name} {ratio}%"))
        .collect::<Vec<_>>()
        .join(", ");
    println!("Blend: {blend_summary}");
    println!(
        "Process: {} °C, {} rpm, {}% moisture, {}% fat",
        params.temperature_c, params.rpm, params.moisture_pct, params.fat_pct
    );
    println!();

    for (field, value) in result.numeric_fields() {
        println!("  {:<28} {:>10}", field, value);
    }
    println!("  {:<28} {}", "flavor_profile", result.flavor_summary());
    if let Some(appearance) = result.appearance {
        println!("  {:<28} {}", "appearance", appearance);
    }
    if let Some(color) = result.color {
        println!("  {:<28} {}", "color", color);
    }
}

/// Print any serialisable value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialise output")?;
    println!("{json}");
    Ok(())
}

/// Print one line per batch row followed by a summary.
pub fn print_batch_outcomes(outcomes: &[BatchOutcome]) {
    let mut failed = 0;
    for outcome in outcomes {
        match &outcome.outcome {
            Ok(result) => println!(
                "Row {}: ok expansion_index={} crispness_index={} water_activity={}",
                outcome.row_index,
                result.expansion_index,
                result.crispness_index,
                result.water_activity
            ),
            Err(err) => {
                failed += 1;
                println!("Row {}: error: {}", outcome.row_index, err);
            }
        }
    }
    println!(
        "Processed {} rows: {} ok, {} failed",
        outcomes.len(),
        outcomes.len() - failed,
        failed
    );
}

/// Print the field-wise change between two numbered runs.
pub fn print_history_delta(previous_run: usize, current_run: usize, delta: &HistoryDelta) {
    println!("Run {previous_run} -> run {current_run}:");
    for field in &delta.fields {
        println!(
            "  {} {:<28} {:>10} -> {:<10} ({:+})",
            field.direction(),
            field.field,
            field.previous,
            field.current,
            field.difference
        );
    }
}
