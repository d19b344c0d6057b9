//! Extrusion simulation CLI library.
//!
//! Command handlers, engine configuration and output rendering for the
//! `extrusion-cli` binary. All simulation logic lives in `extrusion-lib`.

pub mod commands;
pub mod config;
pub mod output;
