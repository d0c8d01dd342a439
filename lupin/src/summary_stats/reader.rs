use anyhow::{Context, Result};
use log::info;
use matrix_util::common_io::{read_table, Delimiter, ReadTableOut};

use super::record::{PairedRecord, SummaryStatRecord};

/// Column names of the paired summary statistics table
pub mod columns {
    pub const SNP: &str = "snp";
    pub const GROUP: &str = "gene";
    pub const REF_EXP: &str = "ref_exp";
    pub const ALT_EXP: &str = "alt_exp";
    pub const BETA_EXP: &str = "beta_exp";
    pub const SE_EXP: &str = "se_exp";
    pub const PVAL_EXP: &str = "pval_exp";
    pub const REF_OUT: &str = "ref_out";
    pub const ALT_OUT: &str = "alt_out";
    pub const BETA_OUT: &str = "beta_out";
    pub const SE_OUT: &str = "se_out";
    pub const PVAL_OUT: &str = "pval_out";
}

fn is_missing(token: &str) -> bool {
    token.is_empty()
        || token == "."
        || token.eq_ignore_ascii_case("na")
        || token.eq_ignore_ascii_case("nan")
        || token.eq_ignore_ascii_case("none")
}

fn parse_allele(token: Option<&Box<str>>) -> Option<Box<str>> {
    token.filter(|x| !is_missing(x)).cloned()
}

fn parse_number(token: Option<&Box<str>>, column: &str, line: usize) -> Result<f64> {
    match token {
        Some(x) if !is_missing(x) => x
            .parse::<f64>()
            .with_context(|| format!("line {}: bad {} value '{}'", line, column, x)),
        _ => Ok(f64::NAN),
    }
}

struct StudyColumns {
    ref_allele: usize,
    alt_allele: usize,
    beta: usize,
    se: usize,
    pval: Option<usize>,
}

impl StudyColumns {
    fn locate(table: &ReadTableOut, file: &str, names: [&str; 5]) -> Result<Self> {
        Ok(Self {
            ref_allele: table.require_column(names[0], file)?,
            alt_allele: table.require_column(names[1], file)?,
            beta: table.require_column(names[2], file)?,
            se: table.require_column(names[3], file)?,
            pval: table.column_index(names[4]),
        })
    }

    fn parse(&self, snp: &str, row: &[Box<str>], line: usize) -> Result<SummaryStatRecord> {
        Ok(SummaryStatRecord {
            snp_id: snp.into(),
            ref_allele: parse_allele(row.get(self.ref_allele)),
            alt_allele: parse_allele(row.get(self.alt_allele)),
            beta: parse_number(row.get(self.beta), "beta", line)?,
            se: parse_number(row.get(self.se), "se", line)?,
            pval: match self.pval {
                Some(j) => parse_number(row.get(j), "pval", line)?,
                None => f64::NAN,
            },
        })
    }
}

/// Read a tab-separated table of paired exposure/outcome statistics.
///
/// Required columns: `snp ref_exp alt_exp beta_exp se_exp ref_out alt_out
/// beta_out se_out`. Optional: `pval_exp pval_out gene`. Column order is
/// free; `NA`, `.` and empty fields are missing values.
pub fn read_paired_sumstats(path: &str) -> Result<Vec<PairedRecord>> {
    use columns::*;

    let table = read_table(path, "\t", true)?;

    let snp_col = table.require_column(SNP, path)?;
    let group_col = table.column_index(GROUP);
    let exp_cols =
        StudyColumns::locate(&table, path, [REF_EXP, ALT_EXP, BETA_EXP, SE_EXP, PVAL_EXP])?;
    let out_cols =
        StudyColumns::locate(&table, path, [REF_OUT, ALT_OUT, BETA_OUT, SE_OUT, PVAL_OUT])?;

    let mut records = Vec::with_capacity(table.num_rows());

    for (i, row) in table.rows.iter().enumerate() {
        let line = i + 2;
        let Some(snp) = row.get(snp_col).filter(|x| !is_missing(x)) else {
            anyhow::bail!("{}: line {} has no SNP id", path, line);
        };
        records.push(PairedRecord {
            group: parse_allele(group_col.and_then(|j| row.get(j))),
            exposure: exp_cols.parse(snp, row, line)?,
            outcome: out_cols.parse(snp, row, line)?,
        });
    }

    info!("Read {} paired records from {}", records.len(), path);
    Ok(records)
}

/// Read identifiers from the first column of a header-less file
pub fn read_id_list(path: &str) -> Result<Vec<Box<str>>> {
    let table = read_table(path, Delimiter::Whitespace, false)?;
    let ids: Vec<Box<str>> = table
        .rows
        .into_iter()
        .filter_map(|row| row.into_iter().next())
        .collect();
    info!("Read {} ids from {}", ids.len(), path);
    Ok(ids)
}
