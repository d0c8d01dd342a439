mod harmonize_cmd;
mod mr_cmd;
mod run_cmd;
mod sop_cmd;
mod threshold_args;

use harmonize_cmd::*;
use mr_cmd::*;
use run_cmd::*;
use sop_cmd::*;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lupin")]
#[command(
    about = "Locus-level Unified Pleiotropy and INstrument analysis: allele harmonization, LD-aware signal overlap and Mendelian Randomization"
)]
struct Cli {
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Orient exposure effects to the outcome alleles and report dropped rows
    Harmonize(HarmonizeArgs),
    /// Score the LD-aware signal overlap (SOP) of one locus
    Sop(SopArgs),
    /// Run IVW and MR-Egger on the harmonized instruments of one locus
    Mr(MrArgs),
    /// Run harmonization, SOP and MR over every locus of a manifest
    Run(RunArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    match &cli.commands {
        Commands::Harmonize(args) => {
            harmonize_pairs(args)?;
        }
        Commands::Sop(args) => {
            sop_locus(args)?;
        }
        Commands::Mr(args) => {
            mr_locus(args)?;
        }
        Commands::Run(args) => {
            run_manifest(args)?;
        }
    }

    Ok(())
}
