use log::warn;
use serde::Serialize;

use super::conditional::{conditional_z, ProjectionPath};
use super::sigma::estimate_sigma2;
use super::spectral::SpectralTruncation;
use super::universe::LocusUniverse;
use crate::common::DVec;
use crate::error::LocusError;
use crate::params::SopParams;
use crate::summary_stats::Study;

/// Signal overlap of one locus
#[derive(Debug, Clone, Serialize)]
pub struct OverlapScore {
    pub sop: f64,
    /// Eq: exposure energy explained by the outcome's informative set
    pub explained_exposure: f64,
    /// Eg: outcome energy explained by the exposure's informative set
    pub explained_outcome: f64,
    pub sigma2_exposure: f64,
    pub sigma2_outcome: f64,
    pub num_eigen: usize,
    pub num_ids: usize,
    pub pass: bool,
}

/// One study's share of signal energy explained by the other study's set
#[derive(Debug, Clone)]
pub struct ExplainedEnergy {
    pub sigma2: f64,
    pub total: f64,
    pub residual: f64,
    pub fraction: f64,
    pub path: ProjectionPath,
}

/// Standardize `study`'s z by its robust scale, condition it on
/// `selected` and compare the energies before and after.
pub fn explained_energy(
    universe: &LocusUniverse,
    basis: &SpectralTruncation,
    study: Study,
    selected: &[usize],
    params: &SopParams,
) -> Result<ExplainedEnergy, LocusError> {
    let z = universe.z(study);
    let sigma2 = estimate_sigma2(z.as_slice(), &params.sigma);
    let z_std: DVec = z / sigma2.sqrt();

    let cond = conditional_z(&z_std, universe.r(), selected, basis)?;

    let total = basis.energy(&z_std)?;
    if !(total.is_finite() && total > 0.0) {
        return Err(LocusError::DegenerateEnergy {
            study: study.to_string().into(),
            energy: total,
        });
    }
    let residual = basis.energy(&cond.z)?;
    if !residual.is_finite() {
        return Err(LocusError::Numerical(format!(
            "{} residual energy is not finite",
            study
        )));
    }

    let raw = (total - residual) / total;
    let fraction = raw.clamp(0.0, 1.0);
    if fraction != raw {
        warn!(
            "{} explained fraction {:.4} clipped to [0,1] (total {:.4e}, residual {:.4e})",
            study, raw, total, residual
        );
    }

    Ok(ExplainedEnergy {
        sigma2,
        total,
        residual,
        fraction,
        path: cond.path,
    })
}

/// SOP = (Eg + Eq) / 2 where Eg conditions the outcome z on the
/// exposure's informative set and Eq the exposure z on the outcome's.
/// Both sets are positions in `universe`.
pub fn score_overlap(
    universe: &LocusUniverse,
    exposure_set: &[usize],
    outcome_set: &[usize],
    params: &SopParams,
) -> Result<OverlapScore, LocusError> {
    let basis = SpectralTruncation::new(universe.r(), &params.spectral)?;

    let eg = explained_energy(universe, &basis, Study::Outcome, exposure_set, params)?;
    let eq = explained_energy(universe, &basis, Study::Exposure, outcome_set, params)?;

    let sop = 0.5 * (eg.fraction + eq.fraction);

    Ok(OverlapScore {
        sop,
        explained_exposure: eq.fraction,
        explained_outcome: eg.fraction,
        sigma2_exposure: eq.sigma2,
        sigma2_outcome: eg.sigma2,
        num_eigen: basis.rank(),
        num_ids: universe.len(),
        pass: sop >= params.pass_threshold,
    })
}

/// Same as [`score_overlap`] with the informative sets given as ids
pub fn score_overlap_by_ids<S: AsRef<str>>(
    universe: &LocusUniverse,
    exposure_ids: &[S],
    outcome_ids: &[S],
    params: &SopParams,
) -> Result<OverlapScore, LocusError> {
    let exposure_set = universe.indices_of(exposure_ids, "exposure informative set")?;
    let outcome_set = universe.indices_of(outcome_ids, "outcome informative set")?;
    score_overlap(universe, &exposure_set, &outcome_set, params)
}
