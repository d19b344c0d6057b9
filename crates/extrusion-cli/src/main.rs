use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use extrusion_cli::commands::{batch, compare, materials, models, simulate};
use extrusion_cli::config::EngineSources;
use extrusion_cli::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(author, version, about = "Twin-screw extrusion simulation tools")]
struct Cli {
    /// Material catalog CSV (overrides EXTRUSION_MATERIALS).
    #[arg(long, global = true)]
    materials: Option<PathBuf>,

    /// JSON file of additional model versions (overrides EXTRUSION_MODELS).
    #[arg(long, global = true)]
    models: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the materials in the active catalog.
    Materials,
    /// List the registered model versions.
    Models,
    /// Simulate one blend under one set of process parameters.
    Simulate {
        /// Model version to evaluate.
        #[arg(long)]
        model: String,
        /// Blend entry as NAME=PERCENT; repeat for each material.
        #[arg(long = "blend", required = true, value_parser = simulate::parse_blend_entry)]
        blend: Vec<(String, f64)>,
        #[command(flatten)]
        process: simulate::ProcessArgs,
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Run every row of a CSV file through one model.
    Batch {
        /// Model version to evaluate.
        #[arg(long)]
        model: String,
        /// CSV with material columns and process-parameter columns.
        #[arg(long)]
        input: PathBuf,
        /// Write per-row results to this CSV file.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run rows in order and show how each run differs from the previous one.
    Compare {
        /// Model version to evaluate.
        #[arg(long)]
        model: String,
        /// CSV with material columns and process-parameter columns.
        #[arg(long)]
        input: PathBuf,
        /// Export the run history to this CSV file.
        #[arg(long)]
        history_output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let sources = EngineSources {
        materials: cli.materials,
        models: cli.models,
    };
    let engine = sources.build_engine()?;

    match cli.command {
        Command::Materials => materials::handle_list_materials(&engine),
        Command::Models => models::handle_list_models(&engine),
        Command::Simulate {
            model,
            blend,
            process,
            format,
        } => simulate::handle_simulate(&engine, &model, &blend, &process, format),
        Command::Batch {
            model,
            input,
            output,
        } => batch::handle_batch(&engine, &model, &input, output.as_deref()),
        Command::Compare {
            model,
            input,
            history_output,
        } => compare::handle_compare(&engine, &model, &input, history_output.as_deref()),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
