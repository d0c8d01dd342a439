/// Pick rows and columns by index lists
pub trait SelectOps {
    type Mat;

    /// `self[rows, :]`
    fn select_rows_by(&self, rows: &[usize]) -> Self::Mat;

    /// `self[:, cols]`
    fn select_columns_by(&self, cols: &[usize]) -> Self::Mat;

    /// `self[idx, idx]`, a principal submatrix
    fn select_square(&self, idx: &[usize]) -> Self::Mat;
}

/// Routines on symmetric matrices
pub trait SymmetricOps {
    type Scalar;
    type DVec;

    /// Quadratic form `x' A x`
    fn quadratic_form(&self, x: &Self::DVec) -> Self::Scalar;

    /// Check `|A[i,j] - A[j,i]| <= tol` for all pairs
    fn is_symmetric(&self, tol: Self::Scalar) -> bool;

    /// Replace `A` by `(A + A') / 2`
    fn symmetrize_inplace(&mut self);
}

/// Checks on a matrix of column vectors
pub trait ColumnOps {
    type Scalar;

    /// Largest deviation of `X'X` from the identity
    fn orthonormality_error(&self) -> Self::Scalar;
}
