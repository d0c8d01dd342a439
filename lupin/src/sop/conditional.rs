use log::debug;
use matrix_util::dmatrix_util::select_entries;
use matrix_util::traits::SelectOps;

use super::spectral::SpectralTruncation;
use crate::common::{DVec, Mat};
use crate::error::LocusError;

/// relative singular value cutoff of the pseudo-inverse
const PINV_RCOND: f64 = 1e-15;

/// How the coefficients of the selected set were obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionPath {
    /// nothing selected; z returned as is
    Identity,
    /// truncated global basis restricted to the selected rows
    GlobalBasis,
    /// LU solve of `R[S,S] β = z[S]`
    ExactSolve,
    /// SVD pseudo-inverse of `R[S,S]`
    PseudoInverse,
}

impl std::fmt::Display for ProjectionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProjectionPath::Identity => "identity",
            ProjectionPath::GlobalBasis => "global_basis",
            ProjectionPath::ExactSolve => "exact_solve",
            ProjectionPath::PseudoInverse => "pseudo_inverse",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone)]
pub struct ConditionalZ {
    pub z: DVec,
    pub path: ProjectionPath,
}

/// Remove the LD-mediated contribution of the `selected` entries from `z`.
///
/// `z_cond = z - R[:,S] β` with `β ≈ R[S,S]⁻¹ z[S]`. β comes from the
/// shared truncated basis when it spans all of `z`; otherwise, or when
/// that gives non-finite values, from an LU solve, and as a last resort
/// from the pseudo-inverse.
pub fn conditional_z(
    z: &DVec,
    r: &Mat,
    selected: &[usize],
    basis: &SpectralTruncation,
) -> Result<ConditionalZ, LocusError> {
    let n = z.len();
    if r.nrows() != n || r.ncols() != n {
        return Err(LocusError::DimensionMismatch(format!(
            "z has {} entries but LD is {}x{}",
            n,
            r.nrows(),
            r.ncols()
        )));
    }
    if let Some(&bad) = selected.iter().find(|&&i| i >= n) {
        return Err(LocusError::IndexOutOfRange { index: bad, len: n });
    }

    if selected.is_empty() {
        return Ok(ConditionalZ {
            z: z.clone(),
            path: ProjectionPath::Identity,
        });
    }

    let z_s = select_entries(z, selected);
    let (beta, path) = select_coefficients(r, selected, &z_s, basis)?;
    debug!(
        "conditioned on {} of {} entries via {}",
        selected.len(),
        n,
        path
    );

    let r_full_sub = r.select_columns_by(selected);
    Ok(ConditionalZ {
        z: z - r_full_sub * beta,
        path,
    })
}

fn select_coefficients(
    r: &Mat,
    selected: &[usize],
    z_s: &DVec,
    basis: &SpectralTruncation,
) -> Result<(DVec, ProjectionPath), LocusError> {
    if basis.dim() == r.nrows() {
        if let Ok(inv) = basis.restricted_inverse(selected) {
            let beta = inv * z_s;
            if all_finite(&beta) {
                return Ok((beta, ProjectionPath::GlobalBasis));
            }
        }
    }

    let r_sub = r.select_square(selected);

    if let Some(beta) = r_sub.clone().lu().solve(z_s) {
        if all_finite(&beta) {
            return Ok((beta, ProjectionPath::ExactSolve));
        }
    }

    let svd = r_sub.svd(true, true);
    let smax = svd.singular_values.max();
    let eps = PINV_RCOND * smax;
    let pinv = svd
        .pseudo_inverse(eps)
        .map_err(|e| LocusError::Numerical(format!("pseudo-inverse failed: {}", e)))?;
    let beta = pinv * z_s;
    if !all_finite(&beta) {
        return Err(LocusError::Numerical(
            "conditional coefficients are not finite".into(),
        ));
    }
    Ok((beta, ProjectionPath::PseudoInverse))
}

fn all_finite(x: &DVec) -> bool {
    x.iter().all(|v| v.is_finite())
}
