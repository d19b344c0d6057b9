//! Compare command handler: run rows in order and report run-to-run changes.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::warn;

use extrusion_lib::{read_batch_rows, HistoryTracker, SimulationEngine};

use crate::output::print_history_delta;

/// Handle the compare subcommand.
///
/// Each valid row is appended to a [`HistoryTracker`]; from the second run on
/// the delta against the previous run is printed. Invalid rows are skipped.
pub fn handle_compare(
    engine: &SimulationEngine,
    model: &str,
    input: &Path,
    history_output: Option<&Path>,
) -> Result<()> {
    let file = fs::File::open(input)
        .with_context(|| format!("failed to open comparison input {}", input.display()))?;
    let rows = read_batch_rows(file, engine.catalog())
        .with_context(|| format!("failed to read rows from {}", input.display()))?;

    let mut history = HistoryTracker::new();
    for (row_index, row) in rows.into_iter().enumerate() {
        let run = row.and_then(|row| {
            engine.run_recorded(
                row.blend.iter().map(|(name, ratio)| (name.as_str(), *ratio)),
                &row.parameters,
                model,
            )
        });

        match run {
            Ok(run) => {
                history.append(run);
                if history.len() > 1 {
                    let delta = history.delta()?;
                    print_history_delta(history.len() - 1, history.len(), &delta);
                }
            }
            Err(err) => {
                warn!(row = row_index, error = %err, "skipping row");
                eprintln!("Skipping row {row_index}: {err}");
            }
        }
    }

    if let Some(path) = history_output {
        let file = fs::File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        history
            .write_csv(file)
            .with_context(|| format!("failed to write history to {}", path.display()))?;
        println!("History written to {}", path.display());
    }

    history
        .delta()
        .context("not enough valid rows to compare runs")?;
    Ok(())
}
