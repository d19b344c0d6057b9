//! Materials command handler for listing the active catalog.

use anyhow::Result;

use extrusion_lib::SimulationEngine;

use crate::output::print_material_catalog;

/// Handle the materials subcommand.
pub fn handle_list_materials(engine: &SimulationEngine) -> Result<()> {
    print_material_catalog(engine.catalog());
    Ok(())
}
