/// tonechain - apply a chain of audio filters to a file and write WAV
mod config;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use crate::config::CliConfig;
use std::path::PathBuf;
use tonechain_core::FilterKind;
use tonechain_pipeline::{
    assemble, debug_export, run_pipeline, save_output, RunOptions, RunOutcome,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tonechain")]
#[command(about = "Run audio files through a configurable filter chain", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./tonechain.toml when present)
    #[arg(short, long, global = true, env = "TONECHAIN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process the input file
    Run {
        /// Audio file to process
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// WAV file to write
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Enable a filter (high-pass, low-pass, echo, equalizer, karaoke); repeatable
        #[arg(short, long = "enable")]
        enable: Vec<FilterKind>,
        /// Export the graph to pipeline.dot/pipeline.pdf before running
        #[arg(long)]
        graph: bool,
    },
    /// Copy the last output to another location
    Save {
        /// Destination; `.wav` is appended when missing
        #[arg(short, long)]
        to: PathBuf,
    },
    /// Assemble the graph without running it and export it
    Graph,
    /// Print the effective configuration as TOML
    PrintConfig,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tonechain=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            input,
            output,
            enable,
            graph,
        } => {
            if let Some(input) = input {
                config.pipeline.input_path = input;
            }
            if let Some(output) = output {
                config.pipeline.output_path = output;
            }
            for kind in enable {
                config.pipeline.set_enabled(kind, true);
            }
            config.validate()?;
            run(config, graph)?;
        }
        Commands::Save { to } => {
            let saved = save_output(&config.pipeline.output_path, &to)?;
            println!("Saved {}", saved.display());
        }
        Commands::Graph => {
            let graph = assemble(config.pipeline).context("Failed to assemble pipeline")?;
            println!("{}", graph.describe());
            let report = debug_export::export(&graph);
            match (report.dot_path, report.pdf_path) {
                (Some(dot), Some(pdf)) => println!("Wrote {} and {}", dot.display(), pdf.display()),
                (Some(dot), None) => println!("Wrote {} (PDF rendering failed)", dot.display()),
                _ => bail!("Could not write the pipeline graph"),
            }
        }
        Commands::PrintConfig => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

fn run(config: CliConfig, graph: bool) -> anyhow::Result<()> {
    let output = config.pipeline.output_path.clone();
    let options = RunOptions {
        export_graph: graph || config.debug.export_graph,
        ..RunOptions::default()
    };

    tracing::info!(
        "Processing {} with {:?}",
        config.pipeline.input_path.display(),
        config.pipeline.enabled_kinds()
    );

    match run_pipeline(config.pipeline, &options)? {
        RunOutcome::EndOfStream => {
            println!("Wrote {}", output.display());
            Ok(())
        }
        RunOutcome::Error(err) => {
            bail!(
                "Processing failed: {}{}",
                err,
                err.debug
                    .as_deref()
                    .map(|d| format!(" ({})", d))
                    .unwrap_or_default()
            )
        }
        RunOutcome::Cancelled => {
            tracing::warn!("Run cancelled");
            Ok(())
        }
    }
}
