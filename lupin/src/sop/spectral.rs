use log::debug;
use matrix_util::traits::SelectOps;

use crate::common::{DVec, Mat};
use crate::error::LocusError;
use crate::params::SpectralParams;

/// Truncated eigen-decomposition of an LD matrix, `R ≈ U diag(Λ) U'`.
///
/// Only eigenpairs with `λ > threshold` are kept, in descending order;
/// the top pair is kept even when it falls below the threshold. The
/// truncated precision `P = U diag(1/Λ) U'` stands in for `R⁻¹`.
#[derive(Debug, Clone)]
pub struct SpectralTruncation {
    pub u: Mat,
    pub lambda: DVec,
    pub threshold: f64,
}

impl SpectralTruncation {
    pub fn new(r: &Mat, params: &SpectralParams) -> Result<Self, LocusError> {
        let n = r.nrows();
        if n == 0 || r.ncols() != n {
            return Err(LocusError::DimensionMismatch(format!(
                "spectral truncation needs a non-empty square matrix, got {}x{}",
                r.nrows(),
                r.ncols()
            )));
        }
        if r.iter().any(|x| !x.is_finite()) {
            return Err(LocusError::Numerical(
                "LD matrix has non-finite entries".into(),
            ));
        }

        let eig = r.clone().symmetric_eigen();

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| eig.eigenvalues[b].total_cmp(&eig.eigenvalues[a]));

        let lambda_max = eig.eigenvalues[order[0]];
        let threshold = params.cutoff(lambda_max);

        let mut keep: Vec<usize> = order
            .iter()
            .copied()
            .filter(|&i| eig.eigenvalues[i] > threshold)
            .collect();

        if keep.is_empty() {
            debug!(
                "no eigenvalue above {:.3e}; keeping the top one ({:.3e})",
                threshold, lambda_max
            );
            keep.push(order[0]);
        }

        if lambda_max <= 0.0 {
            return Err(LocusError::Numerical(format!(
                "largest LD eigenvalue {} is not positive",
                lambda_max
            )));
        }

        let u = eig.eigenvectors.select_columns_by(&keep);
        let lambda = DVec::from_iterator(keep.len(), keep.iter().map(|&i| eig.eigenvalues[i]));

        debug!("kept {} of {} eigenpairs (threshold {:.3e})", keep.len(), n, threshold);

        Ok(Self {
            u,
            lambda,
            threshold,
        })
    }

    /// number of kept eigenpairs
    pub fn rank(&self) -> usize {
        self.lambda.len()
    }

    /// dimension of the matrix that was decomposed
    pub fn dim(&self) -> usize {
        self.u.nrows()
    }

    fn inverse_lambda(&self) -> DVec {
        self.lambda.map(|l| 1.0 / l)
    }

    /// `U diag(1/Λ) U'`
    pub fn precision(&self) -> Mat {
        let scaled = scale_columns(&self.u, &self.inverse_lambda());
        scaled * self.u.transpose()
    }

    /// Signal energy `z' P z`, computed as `Σ_k (u_k'z)² / λ_k`
    pub fn energy(&self, z: &DVec) -> Result<f64, LocusError> {
        if z.len() != self.dim() {
            return Err(LocusError::DimensionMismatch(format!(
                "z has {} entries, basis has {}",
                z.len(),
                self.dim()
            )));
        }
        let proj = self.u.transpose() * z;
        Ok(proj
            .iter()
            .zip(self.lambda.iter())
            .map(|(p, l)| p * p / l)
            .sum())
    }

    /// `U[S,:] diag(1/Λ) U[S,:]'`, the truncated inverse restricted to rows `S`
    pub fn restricted_inverse(&self, rows: &[usize]) -> Result<Mat, LocusError> {
        if let Some(&bad) = rows.iter().find(|&&i| i >= self.dim()) {
            return Err(LocusError::IndexOutOfRange {
                index: bad,
                len: self.dim(),
            });
        }
        let u_s = self.u.select_rows_by(rows);
        let scaled = scale_columns(&u_s, &self.inverse_lambda());
        Ok(scaled * u_s.transpose())
    }
}

fn scale_columns(x: &Mat, w: &DVec) -> Mat {
    let mut ret = x.clone();
    for (j, mut col) in ret.column_iter_mut().enumerate() {
        col *= w[j];
    }
    ret
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use matrix_util::traits::{ColumnOps, SymmetricOps};

    fn ar1(n: usize, rho: f64) -> Mat {
        Mat::from_fn(n, n, |i, j| rho.powi((i as i32 - j as i32).abs()))
    }

    #[test]
    fn test_identity_keeps_everything() {
        let basis = SpectralTruncation::new(&Mat::identity(5, 5), &SpectralParams::default()).unwrap();
        assert_eq!(basis.rank(), 5);
        assert_abs_diff_eq!(basis.precision(), Mat::identity(5, 5), epsilon = 1e-10);
    }

    #[test]
    fn test_sorted_positive_orthonormal() {
        let r = ar1(8, 0.9);
        let basis = SpectralTruncation::new(&r, &SpectralParams::default()).unwrap();
        assert!(basis.rank() >= 1 && basis.rank() < 8);
        for k in 1..basis.rank() {
            assert!(basis.lambda[k - 1] > basis.lambda[k]);
        }
        assert!(basis.lambda.iter().all(|&l| l > basis.threshold && l > 0.0));
        assert!(basis.u.orthonormality_error() < 1e-8);
    }

    #[test]
    fn test_force_keep_top() {
        let params = SpectralParams {
            threshold: Some(100.0),
            ..Default::default()
        };
        let basis = SpectralTruncation::new(&ar1(4, 0.5), &params).unwrap();
        assert_eq!(basis.rank(), 1);
    }

    #[test]
    fn test_energy_matches_precision() {
        let r = ar1(6, 0.6);
        let basis = SpectralTruncation::new(&r, &SpectralParams::default()).unwrap();
        let z = DVec::from_vec(vec![1.0, -0.5, 2.0, 0.3, 0.0, 1.2]);
        let quad = basis.precision().quadratic_form(&z);
        assert_abs_diff_eq!(basis.energy(&z).unwrap(), quad, epsilon = 1e-10);
    }

    #[test]
    fn test_rejects_bad_input() {
        let params = SpectralParams::default();
        assert!(SpectralTruncation::new(&Mat::zeros(0, 0), &params).is_err());
        assert!(SpectralTruncation::new(&Mat::zeros(2, 3), &params).is_err());
        assert!(SpectralTruncation::new(&Mat::zeros(3, 3), &params).is_err());
    }

    #[test]
    fn test_restricted_inverse_bounds() {
        let basis = SpectralTruncation::new(&Mat::identity(3, 3), &SpectralParams::default()).unwrap();
        let inv = basis.restricted_inverse(&[0, 2]).unwrap();
        assert_abs_diff_eq!(inv, Mat::identity(2, 2), epsilon = 1e-12);
        assert!(matches!(
            basis.restricted_inverse(&[3]),
            Err(LocusError::IndexOutOfRange { index: 3, len: 3 })
        ));
    }
}
