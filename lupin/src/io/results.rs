use std::io::Write;

use anyhow::Result;
use log::info;
use matrix_util::common_io::open_buf_writer;

use crate::harmonize::{HarmonizedPair, Orientation};
use crate::locus::LocusOutcome;
use crate::sop::OverlapScore;

const MISSING: &str = "NA";

fn fixed(x: f64) -> String {
    if x.is_nan() {
        MISSING.to_string()
    } else {
        format!("{:.6}", x)
    }
}

fn sci(x: f64) -> String {
    if x.is_nan() {
        MISSING.to_string()
    } else {
        format!("{:.4e}", x)
    }
}

fn opt(x: Option<&str>) -> &str {
    x.unwrap_or(MISSING)
}

/// One line of the overlap table
pub struct SopRow<'a> {
    pub locus: &'a str,
    pub status: String,
    pub score: Option<&'a OverlapScore>,
}

impl<'a> SopRow<'a> {
    pub fn from_outcome(outcome: &'a LocusOutcome) -> Self {
        Self {
            locus: &outcome.name,
            status: outcome.status.to_string(),
            score: outcome.analysis.as_ref().and_then(|a| a.overlap.as_ref()),
        }
    }
}

/// Write overlap scores.
///
/// Columns: `locus status sop pass explained_exposure explained_outcome
/// sigma2_exposure sigma2_outcome num_eigen num_ids`
pub fn write_sop_results(out_file: &str, rows: &[SopRow]) -> Result<()> {
    let mut writer = open_buf_writer(out_file)?;
    writeln!(
        writer,
        "locus\tstatus\tsop\tpass\texplained_exposure\texplained_outcome\tsigma2_exposure\tsigma2_outcome\tnum_eigen\tnum_ids"
    )?;

    for row in rows {
        write!(writer, "{}\t{}", row.locus, row.status)?;
        match row.score {
            Some(s) => writeln!(
                writer,
                "\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                fixed(s.sop),
                s.pass as u8,
                fixed(s.explained_exposure),
                fixed(s.explained_outcome),
                fixed(s.sigma2_exposure),
                fixed(s.sigma2_outcome),
                s.num_eigen,
                s.num_ids
            )?,
            None => writeln!(writer, "{}", format!("\t{}", MISSING).repeat(8))?,
        }
    }
    writer.flush()?;
    info!("Wrote overlap scores: {}", out_file);
    Ok(())
}

/// Write harmonization counts and MR estimates of every locus
pub fn write_mr_results(out_file: &str, outcomes: &[LocusOutcome]) -> Result<()> {
    let mut writer = open_buf_writer(out_file)?;
    writeln!(
        writer,
        "{}",
        [
            "locus",
            "status",
            "num_input",
            "num_retained",
            "num_unclassifiable",
            "num_ambiguous",
            "num_flipped",
            "num_instruments",
            "mean_f",
            "min_f",
            "ivw_beta",
            "ivw_se",
            "ivw_pvalue",
            "q",
            "q_pvalue",
            "egger_slope",
            "egger_slope_se",
            "egger_pvalue",
            "egger_intercept",
            "egger_intercept_se",
            "egger_intercept_pvalue",
        ]
        .join("\t")
    )?;

    for outcome in outcomes {
        write!(writer, "{}\t{}\t{}", outcome.name, outcome.status, outcome.num_input)?;
        let Some(a) = outcome.analysis.as_ref() else {
            writeln!(writer, "{}", format!("\t{}", MISSING).repeat(18))?;
            continue;
        };
        let h = &a.harmonized;
        let mr = &a.mr;
        writeln!(
            writer,
            "\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            h.len(),
            h.num_unclassifiable,
            h.num_ambiguous,
            h.num_flipped(),
            mr.num_instruments,
            fixed(mr.strength.mean_f),
            fixed(mr.strength.min_f),
            fixed(mr.ivw.beta),
            fixed(mr.ivw.se),
            sci(mr.ivw.pvalue),
            fixed(mr.ivw.q),
            sci(mr.ivw.q_pvalue),
            fixed(mr.egger.slope),
            fixed(mr.egger.slope_se),
            sci(mr.egger.slope_pvalue),
            fixed(mr.egger.intercept),
            fixed(mr.egger.intercept_se),
            sci(mr.egger.intercept_pvalue),
        )?;
    }
    writer.flush()?;
    info!("Wrote MR results: {}", out_file);
    Ok(())
}

/// Write per-gene direction agreement: `locus gene num_snps d_t`
pub fn write_direction_results(out_file: &str, outcomes: &[LocusOutcome]) -> Result<()> {
    let mut writer = open_buf_writer(out_file)?;
    writeln!(writer, "locus\tgene\tnum_snps\td_t")?;
    for outcome in outcomes {
        let Some(a) = outcome.analysis.as_ref() else {
            continue;
        };
        for d in &a.directions {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}",
                outcome.name,
                d.group,
                d.num_snps,
                fixed(d.agreement)
            )?;
        }
    }
    writer.flush()?;
    info!("Wrote direction agreement: {}", out_file);
    Ok(())
}

/// Write harmonized rows with the exposure on the outcome's allele coding
pub fn write_harmonized(out_file: &str, pair: &HarmonizedPair) -> Result<()> {
    let mut writer = open_buf_writer(out_file)?;
    writeln!(
        writer,
        "snp\tgene\tref_out\talt_out\tref_exp\talt_exp\tbeta_exp\tse_exp\tpval_exp\tbeta_out\tse_out\tpval_out\torientation"
    )?;
    for row in &pair.rows {
        let exp = row.aligned_exposure();
        let out = &row.record.outcome;
        let orientation = match row.orientation {
            Orientation::Concordant => "concordant",
            Orientation::Discordant => "discordant",
        };
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            row.snp_id(),
            opt(row.record.group.as_deref()),
            opt(out.ref_allele.as_deref()),
            opt(out.alt_allele.as_deref()),
            opt(exp.ref_allele.as_deref()),
            opt(exp.alt_allele.as_deref()),
            fixed(exp.beta),
            fixed(exp.se),
            sci(exp.pval),
            fixed(out.beta),
            fixed(out.se),
            sci(out.pval),
            orientation
        )?;
    }
    writer.flush()?;
    info!("Wrote {} harmonized rows: {}", pair.len(), out_file);
    Ok(())
}

/// Write parameters JSON
pub fn write_parameters(param_file: &str, params: &serde_json::Value) -> Result<()> {
    std::fs::write(param_file, serde_json::to_string_pretty(params)?)?;
    info!("Wrote parameters: {}", param_file);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locus::{evaluate_locus, LocusInput};
    use crate::params::LocusParams;
    use crate::summary_stats::{PairedRecord, SummaryStatRecord};
    use matrix_util::common_io::read_lines;

    fn record(snp: &str, beta_exp: f64, beta_out: f64) -> PairedRecord {
        let stat = |beta: f64| SummaryStatRecord {
            snp_id: snp.into(),
            ref_allele: Some("A".into()),
            alt_allele: Some("G".into()),
            beta,
            se: 0.1,
            pval: 0.01,
        };
        PairedRecord {
            group: Some("G1".into()),
            exposure: stat(beta_exp),
            outcome: stat(beta_out),
        }
    }

    #[test]
    fn test_write_results() -> Result<()> {
        let params = LocusParams::default();
        let ok = LocusInput::new(
            "L1",
            vec![record("rs1", 0.5, 0.2), record("rs2", 0.3, 0.1), record("rs3", -0.2, 0.1)],
        );
        let empty = LocusInput::new("L2", vec![]);
        let outcomes = vec![evaluate_locus(&ok, &params), evaluate_locus(&empty, &params)];

        let dir = tempfile::tempdir()?;
        let mr_file = dir.path().join("out.mr.tsv");
        let mr_file = mr_file.to_str().unwrap();
        write_mr_results(mr_file, &outcomes)?;

        let lines = read_lines(mr_file)?;
        assert_eq!(lines.len(), 3);
        let ncol = lines[0].split('\t').count();
        assert!(lines.iter().all(|l| l.split('\t').count() == ncol));
        assert!(lines[1].starts_with("L1\tsuccess\t3\t3"));
        assert!(lines[2].starts_with("L2\tskip (empty)"));

        let sop_file = dir.path().join("out.sop.tsv");
        let sop_file = sop_file.to_str().unwrap();
        let rows: Vec<SopRow> = outcomes.iter().map(SopRow::from_outcome).collect();
        write_sop_results(sop_file, &rows)?;
        let lines = read_lines(sop_file)?;
        let ncol = lines[0].split('\t').count();
        assert!(lines.iter().all(|l| l.split('\t').count() == ncol));

        let dir_file = dir.path().join("out.direction.tsv");
        let dir_file = dir_file.to_str().unwrap();
        write_direction_results(dir_file, &outcomes)?;
        let lines = read_lines(dir_file)?;
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("L1\tG1\t3\t"));
        Ok(())
    }
}
