//! protosync: extract game prototype data from an upstream content
//! checkout and derive wiki lookup tables.
//!
//! The four stages run individually or chained with `run`; directory
//! roots come from `protosync.toml` (see
//! [`protosync_pipeline::workspace::Config`]).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use protosync_pipeline::{Config, Workspace, convert, import, process, publish};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "protosync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the configuration file (default: ./protosync.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy the configured files out of the upstream checkout
    Import,

    /// Convert imported YAML prototype files to JSON
    Convert,

    /// Resolve prototype inheritance and derive the output tables
    Process,

    /// Stage wiki payloads that changed since the last publish
    Publish {
        /// CI run URL to mention in the edit summaries
        #[arg(long)]
        run_url: Option<String>,
    },

    /// Run all four stages in order
    Run {
        /// CI run URL to mention in the edit summaries
        #[arg(long)]
        run_url: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG in the environment always takes precedence; --verbose
    // falls back to DEBUG, the default to INFO.
    let fallback = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::from_default_env().add_directive(fallback.into());
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let cwd = std::env::current_dir().context("failed to read working directory")?;
    let config =
        Config::load(cli.config.as_deref(), &cwd).context("failed to load configuration")?;
    let workspace = config.workspace();

    match cli.command {
        Commands::Import => run_import(&workspace),
        Commands::Convert => run_convert(&workspace),
        Commands::Process => run_process(&workspace),
        Commands::Publish { run_url } => run_publish(&workspace, run_url.as_deref()),
        Commands::Run { run_url } => {
            run_import(&workspace)?;
            run_convert(&workspace)?;
            run_process(&workspace)?;
            run_publish(&workspace, run_url.as_deref())
        }
    }
}

fn run_import(workspace: &Workspace) -> Result<()> {
    let summary = import::run(workspace).context("import stage failed")?;
    println!(
        "imported {} files ({} KiB) across {} data paths",
        summary.files_copied,
        summary.bytes_copied / 1024,
        summary.data_paths
    );
    Ok(())
}

fn run_convert(workspace: &Workspace) -> Result<()> {
    let summary = convert::run(workspace).context("convert stage failed")?;
    println!(
        "converted {} files holding {} records across {} data paths",
        summary.files_converted, summary.records_found, summary.data_paths
    );
    Ok(())
}

fn run_process(workspace: &Workspace) -> Result<()> {
    process::run(workspace).context("process stage failed")?;
    println!("derived output tables in {}", workspace.output_root().display());
    Ok(())
}

fn run_publish(workspace: &Workspace, run_url: Option<&str>) -> Result<()> {
    let summary = publish::run(workspace, run_url).context("publish stage failed")?;
    for page in &summary.staged {
        println!("staged: {}", page.page);
    }
    println!(
        "{} staged, {} unchanged",
        summary.staged.len(),
        summary.unchanged.len()
    );
    Ok(())
}
