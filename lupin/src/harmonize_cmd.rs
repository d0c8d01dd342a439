use anyhow::Result;
use clap::Args;
use log::{info, warn};
use matrix_util::common_io::mkdir;

use lupin::harmonize::{
    exposure_ref_missing_fraction, harmonize, harmonize_locus, HarmonizedPair,
};
use lupin::io::results::{write_harmonized, write_parameters};
use lupin::params::HarmonizeParams;
use lupin::summary_stats::{read_paired_sumstats, resolve_duplicate_snps, PairedRecord};

use crate::threshold_args::ThresholdArgs;

#[derive(Args, Debug, Clone)]
pub struct HarmonizeArgs {
    #[arg(long, help = "Paired exposure/outcome summary statistics (.tsv or .tsv.gz)")]
    pub pairs: String,

    #[command(flatten)]
    pub thresholds: ThresholdArgs,

    #[arg(short, long, help = "Output prefix for results and parameters")]
    pub output: String,
}

pub fn harmonize_pairs(args: &HarmonizeArgs) -> Result<()> {
    let params = args.thresholds.to_params()?;
    mkdir(&args.output)?;

    let records = resolve_duplicate_snps(read_paired_sumstats(&args.pairs)?);
    let (pair, status) = harmonize_with_status(&records, &params.harmonize);

    info!(
        "{} of {} rows harmonized ({} flipped, {} unclassifiable, {} ambiguous)",
        pair.len(),
        pair.num_input,
        pair.num_flipped(),
        pair.num_unclassifiable,
        pair.num_ambiguous
    );

    write_harmonized(&format!("{}.harmonized.tsv.gz", args.output), &pair)?;

    let report = serde_json::json!({
        "command": "harmonize",
        "pairs": args.pairs,
        "status": status,
        "num_input": pair.num_input,
        "num_retained": pair.len(),
        "num_flipped": pair.num_flipped(),
        "num_unclassifiable": pair.num_unclassifiable,
        "num_ambiguous": pair.num_ambiguous,
        "retained_ratio": pair.retained_ratio(),
        "exposure_ref_missing": exposure_ref_missing_fraction(&records),
        "params": params.harmonize,
    });
    write_parameters(&format!("{}.parameters.json", args.output), &report)?;

    info!("harmonize completed successfully");
    Ok(())
}

/// Guarded harmonization; a skipped locus still reports its harmonized rows
fn harmonize_with_status(
    records: &[PairedRecord],
    params: &HarmonizeParams,
) -> (HarmonizedPair, String) {
    match harmonize_locus(records, params) {
        Ok(pair) => (pair, "success".to_string()),
        Err(err) => {
            warn!("{}", err);
            (harmonize(records), err.to_string())
        }
    }
}
