use anyhow::Result;
use clap::Args;
use matrix_util::common_io::mkdir;
use log::info;

use lupin::harmonize::harmonize_locus;
use lupin::io::results::{write_parameters, write_sop_results, SopRow};
use lupin::ld::{read_ld, read_ld_blocks};
use lupin::sop::{score_overlap_by_ids, LocusUniverse};
use lupin::summary_stats::{read_id_list, read_paired_sumstats, resolve_duplicate_snps};

use crate::threshold_args::ThresholdArgs;

#[derive(Args, Debug, Clone)]
pub struct SopArgs {
    #[arg(long, help = "Paired exposure/outcome summary statistics (.tsv or .tsv.gz)")]
    pub pairs: String,

    #[arg(long, help = "LD triples `id_a id_b r` over SNPs and block representatives")]
    pub ld: String,

    #[arg(long, help = "LD blocks with columns `snp_ids z_exp z_out`")]
    pub blocks: Option<String>,

    #[arg(long, help = "Informative SNP/block ids of the exposure, one per line")]
    pub exposure_set: String,

    #[arg(long, help = "Informative SNP/block ids of the outcome, one per line")]
    pub outcome_set: String,

    #[arg(long, default_value = "locus", help = "Locus name in the output")]
    pub name: String,

    #[command(flatten)]
    pub thresholds: ThresholdArgs,

    #[arg(short, long, help = "Output prefix for results and parameters")]
    pub output: String,
}

pub fn sop_locus(args: &SopArgs) -> Result<()> {
    let params = args.thresholds.to_params()?;
    mkdir(&args.output)?;

    let records = resolve_duplicate_snps(read_paired_sumstats(&args.pairs)?);
    let ld = read_ld(&args.ld)?;
    let blocks = match args.blocks.as_deref() {
        Some(file) => read_ld_blocks(file)?,
        None => vec![],
    };
    let exposure_set = read_id_list(&args.exposure_set)?;
    let outcome_set = read_id_list(&args.outcome_set)?;

    let scored = harmonize_locus(&records, &params.harmonize).and_then(|pair| {
        let universe = LocusUniverse::build(&pair, &ld, &blocks)?;
        score_overlap_by_ids(&universe, &exposure_set, &outcome_set, &params.sop)
    });

    let (status, score) = match scored.as_ref() {
        Ok(score) => {
            info!(
                "{}: SOP = {:.4} (Eg = {:.4}, Eq = {:.4}) {}",
                args.name,
                score.sop,
                score.explained_outcome,
                score.explained_exposure,
                if score.pass { "pass" } else { "fail" }
            );
            ("success".to_string(), Some(score))
        }
        Err(err) if err.is_skip() => (err.to_string(), None),
        Err(err) => (format!("error: {}", err), None),
    };

    let row = SopRow {
        locus: &args.name,
        status: status.clone(),
        score,
    };
    write_sop_results(&format!("{}.sop.tsv", args.output), &[row])?;

    let report = serde_json::json!({
        "command": "sop",
        "pairs": args.pairs,
        "ld": args.ld,
        "blocks": args.blocks,
        "exposure_set": args.exposure_set,
        "outcome_set": args.outcome_set,
        "status": status,
        "score": scored.as_ref().ok(),
        "params": params,
    });
    write_parameters(&format!("{}.parameters.json", args.output), &report)?;

    info!("sop completed");
    Ok(())
}
