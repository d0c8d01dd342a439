use std::collections::{HashMap, HashSet};

use log::{debug, info};

use crate::common::{DVec, Mat};
use crate::error::LocusError;
use crate::harmonize::HarmonizedPair;
use crate::ld::{LdBlock, LdMatrix};
use crate::summary_stats::Study;

/// Ordered ids of one locus (individual SNPs first, then one
/// representative per LD block) with their LD matrix and both studies'
/// z-scores on that ordering
#[derive(Debug, Clone)]
pub struct LocusUniverse {
    ld: LdMatrix,
    num_snps: usize,
    z_exposure: DVec,
    z_outcome: DVec,
}

impl LocusUniverse {
    /// Individual SNPs are the harmonized SNPs found in the LD matrix that
    /// do not belong to any block, in LD order. Block representatives are
    /// appended in block order and must be present in the LD matrix.
    pub fn build(
        pair: &HarmonizedPair,
        ld: &LdMatrix,
        blocks: &[LdBlock],
    ) -> Result<Self, LocusError> {
        let in_blocks: HashSet<&str> = blocks
            .iter()
            .flat_map(|b| b.snp_ids.iter().map(|x| x.as_ref()))
            .collect();

        let mut z_by_snp: HashMap<&str, (f64, f64)> = HashMap::new();
        for rec in pair.records() {
            z_by_snp
                .entry(rec.snp_id())
                .or_insert((rec.exposure.z(), rec.outcome.z()));
        }

        let mut ids: Vec<Box<str>> = vec![];
        let mut z_exp = vec![];
        let mut z_out = vec![];
        let mut num_nonfinite = 0;

        for id in ld.ids() {
            if in_blocks.contains(id.as_ref()) {
                continue;
            }
            let Some(&(ze, zo)) = z_by_snp.get(id.as_ref()) else {
                continue;
            };
            if !(ze.is_finite() && zo.is_finite()) {
                num_nonfinite += 1;
                continue;
            }
            ids.push(id.clone());
            z_exp.push(ze);
            z_out.push(zo);
        }
        let num_snps = ids.len();

        if num_nonfinite > 0 {
            debug!("left out {} SNPs with non-finite z", num_nonfinite);
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for block in blocks {
            if !seen.insert(block.block_id.as_ref()) {
                continue;
            }
            ids.push(block.block_id.clone());
            z_exp.push(block.z_exposure);
            z_out.push(block.z_outcome);
        }

        if ids.is_empty() {
            return Err(LocusError::DimensionMismatch(
                "no harmonized SNP or LD block in the LD matrix".into(),
            ));
        }

        let sub_ld = ld.subset(&ids, "LD matrix")?;
        info!(
            "Locus universe: {} SNPs + {} blocks",
            num_snps,
            ids.len() - num_snps
        );

        Ok(Self {
            ld: sub_ld,
            num_snps,
            z_exposure: DVec::from_vec(z_exp),
            z_outcome: DVec::from_vec(z_out),
        })
    }

    /// Universe from an already aligned LD matrix and z-score vectors
    pub fn from_parts(ld: LdMatrix, z_exposure: DVec, z_outcome: DVec) -> Result<Self, LocusError> {
        if z_exposure.len() != ld.len() || z_outcome.len() != ld.len() {
            return Err(LocusError::DimensionMismatch(format!(
                "{} ids, {} exposure z, {} outcome z",
                ld.len(),
                z_exposure.len(),
                z_outcome.len()
            )));
        }
        let num_snps = ld
            .ids()
            .iter()
            .filter(|x| !crate::ld::is_block_id(x))
            .count();
        Ok(Self {
            ld,
            num_snps,
            z_exposure,
            z_outcome,
        })
    }

    pub fn ids(&self) -> &[Box<str>] {
        self.ld.ids()
    }

    pub fn len(&self) -> usize {
        self.ld.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ld.is_empty()
    }

    pub fn num_snps(&self) -> usize {
        self.num_snps
    }

    pub fn num_blocks(&self) -> usize {
        self.len() - self.num_snps
    }

    pub fn r(&self) -> &Mat {
        self.ld.r()
    }

    pub fn z(&self, study: Study) -> &DVec {
        match study {
            Study::Exposure => &self.z_exposure,
            Study::Outcome => &self.z_outcome,
        }
    }

    /// Positions of `ids` in the universe; absent ids are reported together
    pub fn indices_of<S: AsRef<str>>(&self, ids: &[S], context: &str) -> Result<Vec<usize>, LocusError> {
        let mut indices = Vec::with_capacity(ids.len());
        let mut missing: Vec<Box<str>> = vec![];
        for id in ids {
            match self.ld.position(id.as_ref()) {
                Some(i) => indices.push(i),
                None => missing.push(id.as_ref().into()),
            }
        }
        if !missing.is_empty() {
            return Err(LocusError::MissingIds {
                context: context.into(),
                ids: missing,
            });
        }
        Ok(indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harmonize::harmonize;
    use crate::summary_stats::{PairedRecord, SummaryStatRecord};

    fn record(snp: &str, z_exp: f64, z_out: f64) -> PairedRecord {
        let stat = |z: f64| SummaryStatRecord {
            snp_id: snp.into(),
            ref_allele: Some("A".into()),
            alt_allele: Some("G".into()),
            beta: z,
            se: 1.0,
            pval: 0.1,
        };
        PairedRecord {
            group: None,
            exposure: stat(z_exp),
            outcome: stat(z_out),
        }
    }

    fn ld() -> LdMatrix {
        LdMatrix::from_triples(vec![
            ("rs1", "rs2", 0.1),
            ("rs2", "rs3", 0.2),
            ("rs3", "block|rs4", 0.3),
            ("rs1", "rs9", 0.0),
        ])
    }

    #[test]
    fn test_build_orders_snps_then_blocks() {
        let pair = harmonize(&[
            record("rs3", 1.0, 2.0),
            record("rs1", 3.0, 4.0),
            record("rs4", 5.0, 6.0),
            record("rs7", 1.0, 1.0),
        ]);
        let blocks = vec![LdBlock::new(vec!["rs4".into(), "rs5".into()], 7.0, 8.0).unwrap()];
        let universe = LocusUniverse::build(&pair, &ld(), &blocks).unwrap();

        let ids: Vec<&str> = universe.ids().iter().map(|x| x.as_ref()).collect();
        assert_eq!(ids, vec!["rs1", "rs3", "block|rs4"]);
        assert_eq!(universe.num_snps(), 2);
        assert_eq!(universe.num_blocks(), 1);
        assert_eq!(universe.z(Study::Exposure).as_slice(), &[3.0, 1.0, 7.0]);
        assert_eq!(universe.z(Study::Outcome).as_slice(), &[4.0, 2.0, 8.0]);
        assert_eq!(universe.r()[(1, 2)], 0.3);
    }

    #[test]
    fn test_missing_block_in_ld() {
        let pair = harmonize(&[record("rs1", 1.0, 1.0)]);
        let blocks = vec![LdBlock::new(vec!["rs8".into()], 1.0, 1.0).unwrap()];
        let err = LocusUniverse::build(&pair, &ld(), &blocks).unwrap_err();
        assert!(matches!(err, LocusError::MissingIds { .. }));
    }

    #[test]
    fn test_indices_of() {
        let pair = harmonize(&[record("rs1", 1.0, 1.0), record("rs2", 1.0, 1.0)]);
        let universe = LocusUniverse::build(&pair, &ld(), &[]).unwrap();
        assert_eq!(universe.indices_of(&["rs2", "rs1"], "set").unwrap(), vec![1, 0]);
        match universe.indices_of(&["rs2", "rs5"], "exposure set") {
            Err(LocusError::MissingIds { context, ids }) => {
                assert_eq!(context.as_ref(), "exposure set");
                assert_eq!(ids.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
