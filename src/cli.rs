//! Command-line interface.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use crate::app::{self, BatchSummary};
use crate::config::Config;
use crate::request::{
    parse_category_pair, BarfiberRequest, ExtractRequest, ExtractTarget, StrainRequest,
};

#[derive(Parser)]
#[command(name = "strain-tab")]
#[command(about = "Column extraction and strain tables for fibre-section outputs", version)]
pub struct Cli {
    /// Path to a JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy one whitespace-separated column out of each input file
    ExtractColumn {
        /// 1-based column number
        #[arg(short = 'n', long, default_value_t = 2)]
        column: usize,
        /// Input files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Output directory; files are named {stem}_column_{N}.txt
        #[arg(short, long, conflicts_with = "output_file", required_unless_present = "output_file")]
        output_dir: Option<PathBuf>,
        /// Write a single input straight to this file
        #[arg(long)]
        output_file: Option<PathBuf>,
        /// Replace existing outputs instead of skipping them
        #[arg(long)]
        overwrite: bool,
    },

    /// Tabulate max |strain| of barfiber outputs per folder
    Barfiber {
        /// Folders holding barfiber *.out files
        #[arg(required = true)]
        folders: Vec<PathBuf>,
        /// Output directory
        #[arg(short, long)]
        output_dir: PathBuf,
    },

    /// Strain along the section for each selected level
    StrainDistribution(StrainArgs),

    /// Max strain below and above each category height
    MaxStrain(StrainArgs),
}

#[derive(clap::Args)]
struct StrainArgs {
    /// Results file per category, as CATEGORY=PATH (repeatable)
    #[arg(short, long = "input", value_parser = parse_category_pair, required = true)]
    inputs: Vec<(u32, PathBuf)>,
    /// Levels to emit, e.g. 0.5g (repeatable or comma separated)
    #[arg(short, long = "level", value_delimiter = ',', required = true)]
    levels: Vec<String>,
    /// Output directory
    #[arg(short, long)]
    output_dir: PathBuf,
}

impl StrainArgs {
    fn into_request(self, config: &Config) -> Result<StrainRequest> {
        Ok(StrainRequest::new(
            self.inputs,
            self.levels,
            self.output_dir,
            config,
        )?)
    }
}

fn print_summary(title: &str, summary: &BatchSummary) {
    println!("{title}");
    println!("  succeeded: {}", summary.succeeded);
    println!("  failed:    {}", summary.failed);
    if summary.skipped > 0 {
        println!("  skipped:   {}", summary.skipped);
    }
    if !summary.messages.is_empty() {
        println!("details:");
        for msg in &summary.messages {
            println!("  {msg}");
        }
    }
}

fn print_outputs(outputs: &[PathBuf]) {
    for path in outputs {
        println!("{}", path.display());
    }
}

/// A batch fails as a whole only when every attempted input failed.
fn batch_status(summary: &BatchSummary) -> Result<()> {
    if summary.succeeded == 0 && summary.failed > 0 {
        anyhow::bail!("no input could be processed");
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    let config = match &cli.config {
        Some(path) => {
            let cfg = Config::from_json(path).context("loading config")?;
            info!("Loaded config from: {}", path.display());
            cfg
        }
        None => Config::default(),
    };

    match cli.command {
        Commands::ExtractColumn {
            column,
            inputs,
            output_dir,
            output_file,
            overwrite,
        } => {
            let target = match (output_file, output_dir) {
                (Some(file), _) => ExtractTarget::File(file),
                (None, Some(dir)) => ExtractTarget::Directory(dir),
                (None, None) => anyhow::bail!("either --output-dir or --output-file is required"),
            };
            let req = ExtractRequest::new(column, inputs, target, overwrite)?;
            let summary = app::extract_columns(&req, &config);
            print_summary("Column extraction finished", &summary);
            batch_status(&summary)?;
        }
        Commands::Barfiber {
            folders,
            output_dir,
        } => {
            let req = BarfiberRequest::new(folders, output_dir)?;
            let summary = app::tabulate_barfiber(&req, &config)?;
            print_summary("Barfiber tabulation finished", &summary);
            print_outputs(&summary.outputs);
            batch_status(&summary)?;
        }
        Commands::StrainDistribution(args) => {
            let req = args.into_request(&config)?;
            print_outputs(&app::strain_distribution(&req, &config)?);
        }
        Commands::MaxStrain(args) => {
            let req = args.into_request(&config)?;
            print_outputs(&app::max_strain(&req, &config)?);
        }
    }

    Ok(())
}
