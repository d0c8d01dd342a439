pub mod allele;

pub use allele::*;

use log::{info, warn};

use crate::error::{LocusError, SkipReason};
use crate::params::HarmonizeParams;
use crate::summary_stats::{PairedRecord, SummaryStatRecord};

/// A row that survived harmonization. The exposure effect is already
/// expressed on the outcome's allele coding; the alleles are kept as read.
#[derive(Debug, Clone, PartialEq)]
pub struct HarmonizedRow {
    pub record: PairedRecord,
    pub orientation: Orientation,
}

impl HarmonizedRow {
    pub fn snp_id(&self) -> &str {
        self.record.snp_id()
    }

    /// Exposure record with alleles rewritten to the outcome coding, so
    /// that harmonizing it again leaves the effect unchanged.
    pub fn aligned_exposure(&self) -> SummaryStatRecord {
        let exposure = &self.record.exposure;
        match self.orientation {
            Orientation::Concordant => exposure.clone(),
            Orientation::Discordant => SummaryStatRecord {
                ref_allele: exposure.alt_allele.clone(),
                alt_allele: exposure.ref_allele.clone(),
                ..exposure.clone()
            },
        }
    }
}

/// Exposure and outcome tables joined by SNP with a common allele coding
#[derive(Debug, Clone, Default)]
pub struct HarmonizedPair {
    pub rows: Vec<HarmonizedRow>,
    pub num_input: usize,
    pub num_unclassifiable: usize,
    pub num_ambiguous: usize,
}

impl HarmonizedPair {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn num_dropped(&self) -> usize {
        self.num_unclassifiable + self.num_ambiguous
    }

    pub fn num_flipped(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.orientation == Orientation::Discordant)
            .count()
    }

    /// Fraction of input rows that were kept; 0 for an empty input
    pub fn retained_ratio(&self) -> f64 {
        if self.num_input == 0 {
            0.0
        } else {
            self.rows.len() as f64 / self.num_input as f64
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &PairedRecord> {
        self.rows.iter().map(|r| &r.record)
    }
}

/// Orient every row's exposure effect to the outcome allele coding.
///
/// Discordant rows get the exposure beta negated; unclassifiable and
/// ambiguous rows are dropped and counted.
pub fn harmonize(records: &[PairedRecord]) -> HarmonizedPair {
    let mut pair = HarmonizedPair {
        rows: Vec::with_capacity(records.len()),
        num_input: records.len(),
        ..Default::default()
    };

    for rec in records {
        let matched = match_alleles(
            rec.outcome.ref_allele.as_deref(),
            rec.outcome.alt_allele.as_deref(),
            rec.exposure.ref_allele.as_deref(),
            rec.exposure.alt_allele.as_deref(),
        );

        match matched {
            AlleleMatch::Oriented(orientation) => {
                let mut record = rec.clone();
                if orientation == Orientation::Discordant {
                    record.exposure.beta = -record.exposure.beta;
                }
                pair.rows.push(HarmonizedRow {
                    record,
                    orientation,
                });
            }
            AlleleMatch::Ambiguous => pair.num_ambiguous += 1,
            AlleleMatch::Unclassifiable => pair.num_unclassifiable += 1,
        }
    }

    if pair.num_dropped() > 0 {
        info!(
            "Dropped {} of {} rows that could not be oriented ({} ambiguous)",
            pair.num_dropped(),
            pair.num_input,
            pair.num_ambiguous
        );
    }
    pair
}

/// Fraction of rows with no exposure reference allele
pub fn exposure_ref_missing_fraction(records: &[PairedRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let missing = records
        .iter()
        .filter(|r| r.exposure.ref_allele.is_none())
        .count();
    missing as f64 / records.len() as f64
}

/// Harmonize a locus and apply the data-quality guard: skip when the
/// exposure ref allele is missing too often or too few rows survive.
pub fn harmonize_locus(
    records: &[PairedRecord],
    params: &HarmonizeParams,
) -> Result<HarmonizedPair, LocusError> {
    if records.is_empty() {
        return Err(LocusError::Skip(SkipReason::Empty));
    }

    let missing = exposure_ref_missing_fraction(records);
    if missing > params.max_ref_missing {
        warn!(
            "Exposure ref allele missing in {:.1}% of rows",
            100.0 * missing
        );
        return Err(LocusError::Skip(SkipReason::MissingRefAllele {
            fraction: missing,
            max_fraction: params.max_ref_missing,
        }));
    }

    let pair = harmonize(records);
    let ratio = pair.retained_ratio();
    if ratio < params.min_retained {
        warn!("Only {:.1}% of rows retained after harmonization", 100.0 * ratio);
        return Err(LocusError::Skip(SkipReason::LowRetention {
            ratio,
            min_ratio: params.min_retained,
        }));
    }

    Ok(pair)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paired(
        snp: &str,
        out_alleles: (&str, &str),
        exp_alleles: (Option<&str>, &str),
        beta_exp: f64,
    ) -> PairedRecord {
        PairedRecord {
            group: None,
            exposure: SummaryStatRecord {
                snp_id: snp.into(),
                ref_allele: exp_alleles.0.map(Box::from),
                alt_allele: Some(exp_alleles.1.into()),
                beta: beta_exp,
                se: 0.1,
                pval: 0.01,
            },
            outcome: SummaryStatRecord {
                snp_id: snp.into(),
                ref_allele: Some(out_alleles.0.into()),
                alt_allele: Some(out_alleles.1.into()),
                beta: 0.05,
                se: 0.02,
                pval: 0.01,
            },
        }
    }

    #[test]
    fn test_flip_and_drop() {
        let records = vec![
            paired("rs1", ("A", "G"), (Some("A"), "G"), 0.3),
            paired("rs2", ("A", "G"), (Some("G"), "A"), 0.3),
            paired("rs3", ("A", "G"), (Some("AT"), "G"), 0.3),
            paired("rs4", ("A", "G"), (Some("C"), "T"), 0.3),
        ];
        let pair = harmonize(&records);
        assert_eq!(pair.len(), 2);
        assert_eq!(pair.num_unclassifiable, 2);
        assert_eq!(pair.num_flipped(), 1);
        assert_eq!(pair.rows[0].record.exposure.beta, 0.3);
        assert_eq!(pair.rows[1].record.exposure.beta, -0.3);
        assert_eq!(pair.rows[1].snp_id(), "rs2");
        assert!((pair.retained_ratio() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_harmonization_is_idempotent() {
        let records = vec![
            paired("rs1", ("A", "G"), (Some("A"), "G"), 0.3),
            paired("rs2", ("C", "T"), (Some("T"), "C"), -0.4),
            paired("rs3", ("A", "-"), (Some("-"), "A"), 0.1),
        ];
        let once = harmonize(&records);

        let realigned: Vec<PairedRecord> = once
            .rows
            .iter()
            .map(|r| PairedRecord {
                exposure: r.aligned_exposure(),
                ..r.record.clone()
            })
            .collect();
        let twice = harmonize(&realigned);

        assert_eq!(twice.len(), once.len());
        assert_eq!(twice.num_flipped(), 0);
        for (a, b) in once.rows.iter().zip(twice.rows.iter()) {
            assert_eq!(a.record.exposure.beta, b.record.exposure.beta);
        }
    }

    #[test]
    fn test_retained_rows_have_one_orientation() {
        let records = vec![
            paired("rs1", ("A", "G"), (Some("A"), "G"), 0.3),
            paired("rs2", ("A", "G"), (Some("G"), "A"), 0.3),
            paired("rs3", ("A,G", "G,A"), (Some("A"), "G"), 0.3),
            paired("rs4", ("AC", "G"), (Some("AC"), "G"), 0.3),
        ];
        let pair = harmonize(&records);
        assert_eq!(pair.num_ambiguous, 1);
        for row in &pair.rows {
            let out = &row.record.outcome;
            let exp = &row.record.exposure;
            let matched = match_alleles(
                out.ref_allele.as_deref(),
                out.alt_allele.as_deref(),
                exp.ref_allele.as_deref(),
                exp.alt_allele.as_deref(),
            );
            assert_eq!(matched, AlleleMatch::Oriented(row.orientation));
        }
        assert!(pair.rows.iter().all(|r| r.snp_id() != "rs4"));
    }

    #[test]
    fn test_guard_missing_reference() {
        let records = vec![
            paired("rs1", ("A", "G"), (None, "G"), 0.3),
            paired("rs2", ("A", "G"), (Some("A"), "G"), 0.3),
        ];
        let err = harmonize_locus(&records, &HarmonizeParams::default()).unwrap_err();
        assert!(matches!(
            err,
            LocusError::Skip(SkipReason::MissingRefAllele { .. })
        ));
    }

    #[test]
    fn test_guard_missing_reference_boundary() {
        let mut records: Vec<PairedRecord> = (0..7)
            .map(|i| paired(&format!("rs{}", i), ("A", "G"), (Some("A"), "G"), 0.1))
            .collect();
        for i in 7..10 {
            records.push(paired(&format!("rs{}", i), ("A", "G"), (None, "G"), 0.1));
        }
        // exactly 30% missing passes
        assert!(harmonize_locus(&records, &HarmonizeParams::default()).is_ok());

        records.push(paired("rs10", ("A", "G"), (None, "G"), 0.1));
        let err = harmonize_locus(&records, &HarmonizeParams::default()).unwrap_err();
        assert!(matches!(
            err,
            LocusError::Skip(SkipReason::MissingRefAllele { .. })
        ));
    }

    #[test]
    fn test_guard_low_retention() {
        let mut records: Vec<PairedRecord> = (0..7)
            .map(|i| paired(&format!("rs{}", i), ("A", "G"), (Some("A"), "G"), 0.1))
            .collect();
        for i in 7..10 {
            records.push(paired(&format!("rs{}", i), ("A", "G"), (Some("C"), "T"), 0.1));
        }
        // exactly 70% retained passes
        assert!(harmonize_locus(&records, &HarmonizeParams::default()).is_ok());

        records.push(paired("rs10", ("A", "G"), (Some("C"), "T"), 0.1));
        let err = harmonize_locus(&records, &HarmonizeParams::default()).unwrap_err();
        assert!(matches!(err, LocusError::Skip(SkipReason::LowRetention { .. })));
    }

    #[test]
    fn test_guard_empty() {
        let err = harmonize_locus(&[], &HarmonizeParams::default()).unwrap_err();
        assert!(matches!(err, LocusError::Skip(SkipReason::Empty)));
    }
}
