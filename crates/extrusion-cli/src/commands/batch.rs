//! Batch command handler: run every row of a CSV file through one model.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use extrusion_lib::{write_batch_csv, BatchRunner, SimulationEngine};

use crate::output::print_batch_outcomes;

/// Handle the batch subcommand.
///
/// Failed rows are reported alongside successful ones; they do not make the
/// command fail.
pub fn handle_batch(
    engine: &SimulationEngine,
    model: &str,
    input: &Path,
    output: Option<&Path>,
) -> Result<()> {
    let file = fs::File::open(input)
        .with_context(|| format!("failed to open batch input {}", input.display()))?;
    let outcomes = BatchRunner::new(engine)
        .run_batch_csv(file, model)
        .with_context(|| format!("failed to read batch rows from {}", input.display()))?;

    print_batch_outcomes(&outcomes);

    if let Some(path) = output {
        let file = fs::File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        write_batch_csv(file, &outcomes)
            .with_context(|| format!("failed to write batch results to {}", path.display()))?;
        println!("Results written to {}", path.display());
    }

    Ok(())
}
