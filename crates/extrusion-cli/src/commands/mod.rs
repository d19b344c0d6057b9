// Handlers for CLI subcommands.
//
// Each module handles one subcommand; main.rs parses arguments and dispatches here.

pub mod batch;
pub mod compare;
pub mod materials;
pub mod models;
pub mod simulate;
