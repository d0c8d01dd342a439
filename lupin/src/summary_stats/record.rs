use std::fmt;

/// Which side of the two-sample design a statistic comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Study {
    /// molecular QTL
    Exposure,
    /// disease GWAS
    Outcome,
}

impl fmt::Display for Study {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Study::Exposure => write!(f, "exposure"),
            Study::Outcome => write!(f, "outcome"),
        }
    }
}

/// Association of one SNP in one study. Missing alleles are `None`,
/// missing numbers are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryStatRecord {
    pub snp_id: Box<str>,
    pub ref_allele: Option<Box<str>>,
    pub alt_allele: Option<Box<str>>,
    pub beta: f64,
    pub se: f64,
    pub pval: f64,
}

impl SummaryStatRecord {
    /// `beta / se`; NaN propagates
    pub fn z(&self) -> f64 {
        self.beta / self.se
    }
}

/// One row of the joined exposure/outcome table of a locus
#[derive(Debug, Clone, PartialEq)]
pub struct PairedRecord {
    /// optional grouping of exposure rows, e.g. the QTL gene
    pub group: Option<Box<str>>,
    pub exposure: SummaryStatRecord,
    pub outcome: SummaryStatRecord,
}

impl PairedRecord {
    pub fn snp_id(&self) -> &str {
        &self.outcome.snp_id
    }
}

/// Keep one row per SNP: the one with the smallest outcome p-value (NaN
/// p-values rank last). The first occurrence order of SNPs is preserved.
pub fn resolve_duplicate_snps(records: Vec<PairedRecord>) -> Vec<PairedRecord> {
    use std::collections::HashMap;

    let mut position: HashMap<Box<str>, usize> = HashMap::new();
    let mut kept: Vec<PairedRecord> = Vec::with_capacity(records.len());

    let rank = |p: f64| if p.is_nan() { f64::INFINITY } else { p };

    for rec in records {
        match position.get(rec.snp_id()) {
            Some(&i) => {
                if rank(rec.outcome.pval) < rank(kept[i].outcome.pval) {
                    kept[i] = rec;
                }
            }
            None => {
                position.insert(rec.snp_id().into(), kept.len());
                kept.push(rec);
            }
        }
    }
    kept
}
