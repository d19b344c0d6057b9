//! Models command handler for listing registered model versions.

use anyhow::Result;

use extrusion_lib::SimulationEngine;

/// Handle the models subcommand.
pub fn handle_list_models(engine: &SimulationEngine) -> Result<()> {
    let registry = engine.registry();
    if registry.is_empty() {
        println!("No model versions registered.");
        return Ok(());
    }

    println!("Model versions ({}):", registry.len());
    for model in registry.models() {
        println!("{:<14} {}", model.version(), model.description());
    }
    Ok(())
}
