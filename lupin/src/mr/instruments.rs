use log::debug;
use serde::Serialize;

use crate::error::LocusError;
use crate::summary_stats::PairedRecord;

/// Effect sizes of the usable instruments of a locus, exposure already
/// oriented to the outcome alleles
#[derive(Debug, Clone, Default)]
pub struct Instruments {
    pub snp_ids: Vec<Box<str>>,
    pub beta_exp: Vec<f64>,
    pub se_exp: Vec<f64>,
    pub beta_out: Vec<f64>,
    pub se_out: Vec<f64>,
}

impl Instruments {
    /// Keep rows where none of `beta_exp, se_exp, beta_out, se_out` is NaN
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a PairedRecord>,
    {
        let mut ret = Self::default();
        let mut num_dropped = 0;
        for rec in records {
            let (e, o) = (&rec.exposure, &rec.outcome);
            if [e.beta, e.se, o.beta, o.se].iter().any(|x| x.is_nan()) {
                num_dropped += 1;
                continue;
            }
            ret.push(rec.snp_id(), e.beta, e.se, o.beta, o.se);
        }
        if num_dropped > 0 {
            debug!("{} rows with missing effects left out of MR", num_dropped);
        }
        ret
    }

    /// Build from parallel vectors, applying the same NaN filter
    pub fn from_slices(
        beta_exp: &[f64],
        se_exp: &[f64],
        beta_out: &[f64],
        se_out: &[f64],
    ) -> Result<Self, LocusError> {
        let n = beta_exp.len();
        if se_exp.len() != n || beta_out.len() != n || se_out.len() != n {
            return Err(LocusError::DimensionMismatch(format!(
                "instrument vectors of lengths {}, {}, {}, {}",
                n,
                se_exp.len(),
                beta_out.len(),
                se_out.len()
            )));
        }
        let mut ret = Self::default();
        for i in 0..n {
            let row = [beta_exp[i], se_exp[i], beta_out[i], se_out[i]];
            if row.iter().any(|x| x.is_nan()) {
                continue;
            }
            ret.push(&format!("{}", i), row[0], row[1], row[2], row[3]);
        }
        Ok(ret)
    }

    fn push(&mut self, snp_id: &str, beta_exp: f64, se_exp: f64, beta_out: f64, se_out: f64) {
        self.snp_ids.push(snp_id.into());
        self.beta_exp.push(beta_exp);
        self.se_exp.push(se_exp);
        self.beta_out.push(beta_out);
        self.se_out.push(se_out);
    }

    pub fn len(&self) -> usize {
        self.beta_exp.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beta_exp.is_empty()
    }

    /// inverse-variance weights `1 / se_out²`
    pub fn weights(&self) -> Vec<f64> {
        self.se_out.iter().map(|s| 1.0 / (s * s)).collect()
    }

    /// Copy with instrument `skip` removed
    pub fn without(&self, skip: usize) -> Self {
        let mut ret = Self::default();
        for i in (0..self.len()).filter(|&i| i != skip) {
            ret.push(
                &self.snp_ids[i],
                self.beta_exp[i],
                self.se_exp[i],
                self.beta_out[i],
                self.se_out[i],
            );
        }
        ret
    }
}

/// Per-instrument F statistic `(beta_exp / se_exp)²`
pub fn f_statistics(instruments: &Instruments) -> Vec<f64> {
    instruments
        .beta_exp
        .iter()
        .zip(instruments.se_exp.iter())
        .map(|(b, s)| (b / s).powi(2))
        .collect()
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct InstrumentStrength {
    pub mean_f: f64,
    pub min_f: f64,
}

/// Mean and minimum F statistic; NaN without instruments
pub fn instrument_strength(instruments: &Instruments) -> InstrumentStrength {
    let f = f_statistics(instruments);
    if f.is_empty() {
        return InstrumentStrength {
            mean_f: f64::NAN,
            min_f: f64::NAN,
        };
    }
    InstrumentStrength {
        mean_f: f.iter().sum::<f64>() / f.len() as f64,
        min_f: f.iter().copied().fold(f64::INFINITY, f64::min),
    }
}

fn sign(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

/// Direction agreement `Σ|βe|·[sign βe = sign βo] / Σ|βe|`, or 0 when the
/// exposure effects are all zero. Pairs with a non-finite effect are
/// ignored.
pub fn direction_agreement(beta_exp: &[f64], beta_out: &[f64]) -> f64 {
    let mut num = 0.0;
    let mut denom = 0.0;
    for (&be, &bo) in beta_exp.iter().zip(beta_out.iter()) {
        if !(be.is_finite() && bo.is_finite()) {
            continue;
        }
        denom += be.abs();
        if sign(be) == sign(bo) {
            num += be.abs();
        }
    }
    if denom == 0.0 {
        0.0
    } else {
        num / denom
    }
}

/// Direction agreement of one exposure group (gene)
#[derive(Debug, Clone, Serialize)]
pub struct GroupDirection {
    pub group: Box<str>,
    pub num_snps: usize,
    pub agreement: f64,
}

/// Direction agreement per group, groups in order of first appearance.
/// Rows without a group are left out.
pub fn direction_by_group<'a, I>(records: I) -> Vec<GroupDirection>
where
    I: IntoIterator<Item = &'a PairedRecord>,
{
    let mut order: Vec<Box<str>> = vec![];
    let mut betas: std::collections::HashMap<Box<str>, (Vec<f64>, Vec<f64>)> =
        Default::default();

    for rec in records {
        let Some(group) = rec.group.as_ref() else {
            continue;
        };
        let entry = betas.entry(group.clone()).or_insert_with(|| {
            order.push(group.clone());
            (vec![], vec![])
        });
        entry.0.push(rec.exposure.beta);
        entry.1.push(rec.outcome.beta);
    }

    order
        .into_iter()
        .filter_map(|group| {
            let (be, bo) = betas.remove(&group)?;
            Some(GroupDirection {
                agreement: direction_agreement(&be, &bo),
                num_snps: be.len(),
                group,
            })
        })
        .collect()
}
