use anyhow::Result;
use clap::Args;
use matrix_util::common_io::mkdir;
use log::info;

use lupin::io::manifest::read_manifest;
use lupin::io::results::*;
use lupin::locus::{evaluate_locus, run_batch, LocusOutcome};

use crate::threshold_args::ThresholdArgs;

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(
        long,
        help = "Tab-separated manifest: locus pairs ld blocks exposure_set outcome_set [instruments]; `-` for none"
    )]
    pub manifest: String,

    #[command(flatten)]
    pub thresholds: ThresholdArgs,

    #[arg(long, default_value_t = 0, help = "Parallel jobs (0 = all CPUs)")]
    pub jobs: usize,

    #[arg(short, long, help = "Output prefix for results and parameters")]
    pub output: String,
}

pub fn run_manifest(args: &RunArgs) -> Result<()> {
    let params = args.thresholds.to_params()?;
    mkdir(&args.output)?;
    let entries = read_manifest(&args.manifest)?;

    let outcomes = run_batch(&entries, args.jobs, |entry| match entry.load() {
        Ok(input) => evaluate_locus(&input, &params),
        Err(err) => LocusOutcome::failed(&entry.locus, &err),
    })?;

    let sop_rows: Vec<SopRow> = outcomes.iter().map(SopRow::from_outcome).collect();
    write_sop_results(&format!("{}.sop.tsv", args.output), &sop_rows)?;
    write_mr_results(&format!("{}.mr.tsv", args.output), &outcomes)?;
    write_direction_results(&format!("{}.direction.tsv", args.output), &outcomes)?;

    let num_pass = outcomes
        .iter()
        .filter_map(|x| x.analysis.as_ref()?.overlap.as_ref())
        .filter(|s| s.pass)
        .count();

    let report = serde_json::json!({
        "command": "run",
        "manifest": args.manifest,
        "num_loci": outcomes.len(),
        "num_success": outcomes.iter().filter(|x| x.is_success()).count(),
        "num_sop_pass": num_pass,
        "jobs": args.jobs,
        "params": params,
    });
    write_parameters(&format!("{}.parameters.json", args.output), &report)?;

    info!("run completed successfully");
    Ok(())
}
