pub type Mat = nalgebra::DMatrix<f64>;
pub type DVec = nalgebra::DVector<f64>;

/// Prefix of identifiers that stand for a whole LD block
pub const BLOCK_ID_PREFIX: &str = "block|";

/// Placeholder allele for insertions/deletions
pub const INDEL_ALLELE: &str = "-";
