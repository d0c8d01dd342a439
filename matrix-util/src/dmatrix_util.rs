use crate::traits::*;
pub use nalgebra::{DMatrix, DVector};
use nalgebra::{RealField, Scalar};

impl<T> SelectOps for DMatrix<T>
where
    T: Scalar + Copy,
{
    type Mat = DMatrix<T>;

    fn select_rows_by(&self, rows: &[usize]) -> Self::Mat {
        DMatrix::from_fn(rows.len(), self.ncols(), |i, j| self[(rows[i], j)])
    }

    fn select_columns_by(&self, cols: &[usize]) -> Self::Mat {
        DMatrix::from_fn(self.nrows(), cols.len(), |i, j| self[(i, cols[j])])
    }

    fn select_square(&self, idx: &[usize]) -> Self::Mat {
        DMatrix::from_fn(idx.len(), idx.len(), |i, j| self[(idx[i], idx[j])])
    }
}

impl<T> SymmetricOps for DMatrix<T>
where
    T: RealField + Copy,
{
    type Scalar = T;
    type DVec = DVector<T>;

    fn quadratic_form(&self, x: &Self::DVec) -> Self::Scalar {
        debug_assert_eq!(self.nrows(), x.len());
        debug_assert_eq!(self.ncols(), x.len());
        x.dot(&(self * x))
    }

    fn is_symmetric(&self, tol: Self::Scalar) -> bool {
        if self.nrows() != self.ncols() {
            return false;
        }
        let n = self.nrows();
        for i in 0..n {
            for j in (i + 1)..n {
                if (self[(i, j)] - self[(j, i)]).abs() > tol {
                    return false;
                }
            }
        }
        true
    }

    fn symmetrize_inplace(&mut self) {
        let half = T::one() / (T::one() + T::one());
        let n = self.nrows().min(self.ncols());
        for i in 0..n {
            for j in (i + 1)..n {
                let avg = (self[(i, j)] + self[(j, i)]) * half;
                self[(i, j)] = avg;
                self[(j, i)] = avg;
            }
        }
    }
}

impl<T> ColumnOps for DMatrix<T>
where
    T: RealField + Copy,
{
    type Scalar = T;

    fn orthonormality_error(&self) -> Self::Scalar {
        let gram = self.transpose() * self;
        let k = gram.nrows();
        let mut worst = T::zero();
        for i in 0..k {
            for j in 0..k {
                let target = if i == j { T::one() } else { T::zero() };
                let dev = (gram[(i, j)] - target).abs();
                if dev > worst {
                    worst = dev;
                }
            }
        }
        worst
    }
}

/// Pick vector entries by index: `x[idx]`
pub fn select_entries<T>(x: &DVector<T>, idx: &[usize]) -> DVector<T>
where
    T: Scalar + Copy,
{
    DVector::from_iterator(idx.len(), idx.iter().map(|&i| x[i]))
}

/// Median of the finite values; `None` when there are none
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    let m = sorted.len();
    if m % 2 == 1 {
        Some(sorted[m / 2])
    } else {
        Some(0.5 * (sorted[m / 2 - 1] + sorted[m / 2]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_square() {
        let xx = DMatrix::<f64>::from_fn(4, 4, |i, j| (10 * i + j) as f64);
        let sub = xx.select_square(&[3, 1]);
        assert_eq!(sub[(0, 0)], 33.0);
        assert_eq!(sub[(0, 1)], 31.0);
        assert_eq!(sub[(1, 0)], 13.0);
        assert_eq!(sub[(1, 1)], 11.0);
    }

    #[test]
    fn test_median_even_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[f64::NAN]), None);
    }

    #[test]
    fn test_symmetrize() {
        let mut xx = DMatrix::<f64>::from_row_slice(2, 2, &[1.0, 0.2, 0.4, 1.0]);
        assert!(!xx.is_symmetric(1e-8));
        xx.symmetrize_inplace();
        assert!(xx.is_symmetric(1e-12));
        assert!((xx[(0, 1)] - 0.3).abs() < 1e-12);
    }
}
