use anyhow::Result;
use clap::Args;
use matrix_util::common_io::mkdir;
use log::info;

use lupin::io::results::{write_direction_results, write_mr_results, write_parameters};
use lupin::locus::{evaluate_locus, LocusInput};
use lupin::summary_stats::{read_id_list, read_paired_sumstats};

use crate::threshold_args::ThresholdArgs;

#[derive(Args, Debug, Clone)]
pub struct MrArgs {
    #[arg(long, help = "Paired exposure/outcome summary statistics (.tsv or .tsv.gz)")]
    pub pairs: String,

    #[arg(long, help = "Restrict instruments to the SNP ids listed in this file")]
    pub instruments: Option<String>,

    #[arg(long, default_value = "locus", help = "Locus name in the output")]
    pub name: String,

    #[command(flatten)]
    pub thresholds: ThresholdArgs,

    #[arg(short, long, help = "Output prefix for results and parameters")]
    pub output: String,
}

pub fn mr_locus(args: &MrArgs) -> Result<()> {
    let params = args.thresholds.to_params()?;
    mkdir(&args.output)?;

    let mut input = LocusInput::new(&args.name, read_paired_sumstats(&args.pairs)?);
    if let Some(file) = args.instruments.as_deref() {
        input.instrument_ids = Some(read_id_list(file)?);
    }

    let outcome = evaluate_locus(&input, &params);
    info!("{}: {}", outcome.name, outcome.status);

    let outcomes = [outcome];
    write_mr_results(&format!("{}.mr.tsv", args.output), &outcomes)?;
    write_direction_results(&format!("{}.direction.tsv", args.output), &outcomes)?;

    let report = serde_json::json!({
        "command": "mr",
        "pairs": args.pairs,
        "instruments": args.instruments,
        "status": outcomes[0].status.to_string(),
        "params": params,
    });
    write_parameters(&format!("{}.parameters.json", args.output), &report)?;

    info!("mr completed successfully");
    Ok(())
}
