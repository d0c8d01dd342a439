use std::collections::HashMap;

use anyhow::{Context, Result};
use log::info;
use matrix_util::common_io::read_table;

use crate::common::BLOCK_ID_PREFIX;
use crate::error::LocusError;

/// A group of correlated SNPs standing in the analysis as one
/// representative with precomputed z-scores
#[derive(Debug, Clone, PartialEq)]
pub struct LdBlock {
    pub block_id: Box<str>,
    pub snp_ids: Vec<Box<str>>,
    pub z_exposure: f64,
    pub z_outcome: f64,
}

impl LdBlock {
    /// The block id is derived from the first member: `block|<snp>`
    pub fn new(snp_ids: Vec<Box<str>>, z_exposure: f64, z_outcome: f64) -> Result<Self, LocusError> {
        let Some(first) = snp_ids.first() else {
            return Err(LocusError::DimensionMismatch(
                "LD block without member SNPs".into(),
            ));
        };
        Ok(Self {
            block_id: block_id_of(first),
            snp_ids,
            z_exposure,
            z_outcome,
        })
    }
}

pub fn block_id_of(first_snp: &str) -> Box<str> {
    format!("{}{}", BLOCK_ID_PREFIX, first_snp).into_boxed_str()
}

pub fn is_block_id(id: &str) -> bool {
    id.starts_with(BLOCK_ID_PREFIX)
}

/// Replace every `block|...` id by the member SNPs of that block, keeping
/// the order of appearance. Unknown block ids are reported together.
pub fn expand_block_ids<S: AsRef<str>>(
    ids: &[S],
    blocks: &[LdBlock],
) -> Result<Vec<Box<str>>, LocusError> {
    let by_id: HashMap<&str, &LdBlock> = blocks.iter().map(|b| (b.block_id.as_ref(), b)).collect();

    let mut expanded = Vec::with_capacity(ids.len());
    let mut missing: Vec<Box<str>> = vec![];

    for id in ids.iter().map(|x| x.as_ref()) {
        if !is_block_id(id) {
            expanded.push(id.into());
            continue;
        }
        match by_id.get(id) {
            Some(block) => expanded.extend(block.snp_ids.iter().cloned()),
            None => missing.push(id.into()),
        }
    }

    if !missing.is_empty() {
        return Err(LocusError::MissingIds {
            context: "LD blocks".into(),
            ids: missing,
        });
    }
    Ok(expanded)
}

/// Read LD blocks from a table with columns `snp_ids z_exp z_out`, member
/// SNPs comma-separated.
pub fn read_ld_blocks(path: &str) -> Result<Vec<LdBlock>> {
    let table = read_table(path, "\t", true)?;
    let snp_col = table.require_column("snp_ids", path)?;
    let zexp_col = table.require_column("z_exp", path)?;
    let zout_col = table.require_column("z_out", path)?;

    let mut blocks = Vec::with_capacity(table.num_rows());
    for (i, row) in table.rows.iter().enumerate() {
        let line = i + 2;
        let snp_ids: Vec<Box<str>> = field(row, snp_col, path, line)?
            .split(',')
            .map(str::trim)
            .filter(|x| !x.is_empty())
            .map(Box::from)
            .collect();
        let z_exposure: f64 = field(row, zexp_col, path, line)?
            .parse()
            .with_context(|| format!("{}: line {}: bad z_exp", path, line))?;
        let z_outcome: f64 = field(row, zout_col, path, line)?
            .parse()
            .with_context(|| format!("{}: line {}: bad z_out", path, line))?;

        let block = LdBlock::new(snp_ids, z_exposure, z_outcome)
            .with_context(|| format!("{}: line {}", path, line))?;
        blocks.push(block);
    }

    info!("Read {} LD blocks from {}", blocks.len(), path);
    Ok(blocks)
}

fn field<'a>(row: &'a [Box<str>], j: usize, path: &str, line: usize) -> Result<&'a str> {
    row.get(j)
        .map(|x| x.as_ref())
        .with_context(|| format!("{}: line {} is truncated", path, line))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks() -> Vec<LdBlock> {
        vec![
            LdBlock::new(vec!["rs5".into(), "rs6".into()], 1.0, 2.0).unwrap(),
            LdBlock::new(vec!["rs9".into()], -1.0, 0.5).unwrap(),
        ]
    }

    #[test]
    fn test_block_id() {
        let b = blocks();
        assert_eq!(b[0].block_id.as_ref(), "block|rs5");
        assert!(is_block_id(&b[1].block_id));
        assert!(!is_block_id("rs5"));
        assert!(LdBlock::new(vec![], 0.0, 0.0).is_err());
    }

    #[test]
    fn test_expand_block_ids() {
        let expanded = expand_block_ids(&["rs1", "block|rs5", "rs2"], &blocks()).unwrap();
        let expanded: Vec<&str> = expanded.iter().map(|x| x.as_ref()).collect();
        assert_eq!(expanded, vec!["rs1", "rs5", "rs6", "rs2"]);
    }

    #[test]
    fn test_expand_unknown_block() {
        let err = expand_block_ids(&["block|rs7"], &blocks()).unwrap_err();
        assert!(matches!(err, LocusError::MissingIds { .. }));
    }
}
