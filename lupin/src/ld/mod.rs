pub mod block;

pub use block::*;

use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use log::info;
use matrix_util::common_io::{read_table, Delimiter};
use matrix_util::traits::{SelectOps, SymmetricOps};

use crate::common::Mat;
use crate::error::LocusError;

/// Symmetric SNP correlation matrix with unit diagonal, rows labelled by id
#[derive(Debug, Clone)]
pub struct LdMatrix {
    ids: Vec<Box<str>>,
    r: Mat,
    index: HashMap<Box<str>, usize>,
}

impl LdMatrix {
    /// Assemble from `(id_a, id_b, r)` triples.
    ///
    /// Ids are sorted, repeated `(id_a, id_b)` pairs keep their first value,
    /// the diagonal defaults to 1 and absent pairs stay 0.
    pub fn from_triples<I, S>(triples: I) -> Self
    where
        I: IntoIterator<Item = (S, S, f64)>,
        S: AsRef<str>,
    {
        let mut seen: HashSet<(Box<str>, Box<str>)> = HashSet::new();
        let mut kept: Vec<(Box<str>, Box<str>, f64)> = vec![];
        for (a, b, r) in triples {
            let key: (Box<str>, Box<str>) = (a.as_ref().into(), b.as_ref().into());
            if seen.insert(key.clone()) {
                kept.push((key.0, key.1, r));
            }
        }

        let mut ids: Vec<Box<str>> = kept
            .iter()
            .flat_map(|(a, b, _)| [a.clone(), b.clone()])
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        ids.sort();

        let index = build_index(&ids);
        let mut r = Mat::identity(ids.len(), ids.len());
        for (a, b, v) in kept {
            let (i, j) = (index[&a], index[&b]);
            r[(i, j)] = v;
            r[(j, i)] = v;
        }

        Self { ids, r, index }
    }

    /// Wrap a dense matrix; it must be square, symmetric up to rounding
    /// and match `ids`
    pub fn from_matrix(ids: Vec<Box<str>>, mut r: Mat) -> Result<Self, LocusError> {
        if r.nrows() != r.ncols() || r.nrows() != ids.len() {
            return Err(LocusError::DimensionMismatch(format!(
                "LD matrix is {}x{} for {} ids",
                r.nrows(),
                r.ncols(),
                ids.len()
            )));
        }
        if !r.is_symmetric(1e-6) {
            return Err(LocusError::Numerical("LD matrix is not symmetric".into()));
        }
        r.symmetrize_inplace();
        let index = build_index(&ids);
        if index.len() != ids.len() {
            return Err(LocusError::DimensionMismatch(
                "LD matrix ids are not unique".into(),
            ));
        }
        Ok(Self { ids, r, index })
    }

    pub fn ids(&self) -> &[Box<str>] {
        &self.ids
    }

    pub fn r(&self) -> &Mat {
        &self.r
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Principal submatrix in the order of `ids`. Every id must be present.
    pub fn subset<S: AsRef<str>>(&self, ids: &[S], context: &str) -> Result<Self, LocusError> {
        let mut positions = Vec::with_capacity(ids.len());
        let mut missing: Vec<Box<str>> = vec![];
        for id in ids {
            match self.position(id.as_ref()) {
                Some(i) => positions.push(i),
                None => missing.push(id.as_ref().into()),
            }
        }
        if !missing.is_empty() {
            return Err(LocusError::MissingIds {
                context: context.into(),
                ids: missing,
            });
        }

        let sub_ids: Vec<Box<str>> = positions.iter().map(|&i| self.ids[i].clone()).collect();
        let index = build_index(&sub_ids);
        Ok(Self {
            r: self.r.select_square(&positions),
            ids: sub_ids,
            index,
        })
    }
}

fn build_index(ids: &[Box<str>]) -> HashMap<Box<str>, usize> {
    let mut index = HashMap::with_capacity(ids.len());
    for (i, id) in ids.iter().enumerate() {
        index.entry(id.clone()).or_insert(i);
    }
    index
}

/// Parse `id_a id_b r` triples; a header line is recognized by a
/// non-numeric third field and skipped.
pub fn read_ld_triples(path: &str) -> Result<Vec<(Box<str>, Box<str>, f64)>> {
    let table = read_table(path, Delimiter::Whitespace, false)?;
    let mut triples = Vec::with_capacity(table.num_rows());

    for (line, row) in table.rows.iter().enumerate() {
        anyhow::ensure!(
            row.len() >= 3,
            "{}: line {} needs 3 fields, found {}",
            path,
            line + 1,
            row.len()
        );
        let value = match row[2].parse::<f64>() {
            Ok(v) => v,
            Err(_) if line == 0 => continue,
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("{}: line {}: bad r value '{}'", path, line + 1, row[2])
                })
            }
        };
        triples.push((row[0].clone(), row[1].clone(), value));
    }
    Ok(triples)
}

/// Read an LD matrix stored as pairwise triples
pub fn read_ld(path: &str) -> Result<LdMatrix> {
    let ld = LdMatrix::from_triples(read_ld_triples(path)?);
    info!("Read LD matrix over {} ids from {}", ld.len(), path);
    Ok(ld)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_triples() {
        let ld = LdMatrix::from_triples(vec![
            ("rs2", "rs1", 0.5),
            ("rs3", "rs1", -0.2),
            ("rs2", "rs1", 0.9),
        ]);
        assert_eq!(ld.ids().len(), 3);
        assert_eq!(ld.ids()[0].as_ref(), "rs1");
        assert_eq!(ld.r()[(0, 1)], 0.5);
        assert_eq!(ld.r()[(1, 0)], 0.5);
        assert_eq!(ld.r()[(0, 2)], -0.2);
        assert_eq!(ld.r()[(1, 2)], 0.0);
        assert_eq!(ld.r()[(2, 2)], 1.0);
    }

    #[test]
    fn test_subset_keeps_order() {
        let ld = LdMatrix::from_triples(vec![("a", "b", 0.1), ("b", "c", 0.3), ("a", "c", 0.2)]);
        let sub = ld.subset(&["c", "a"], "test").unwrap();
        assert_eq!(sub.position("c"), Some(0));
        assert_eq!(sub.r()[(0, 1)], 0.2);
        assert_eq!(sub.r()[(0, 0)], 1.0);
    }

    #[test]
    fn test_subset_reports_missing() {
        let ld = LdMatrix::from_triples(vec![("a", "b", 0.1)]);
        match ld.subset(&["a", "x", "y"], "locus LD") {
            Err(LocusError::MissingIds { ids, .. }) => {
                assert_eq!(ids, vec![Box::from("x"), Box::from("y")]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_from_matrix_rejects_asymmetric() {
        let r = Mat::from_row_slice(2, 2, &[1.0, 0.5, 0.1, 1.0]);
        assert!(LdMatrix::from_matrix(vec!["a".into(), "b".into()], r).is_err());
        let r = Mat::identity(2, 2);
        assert!(LdMatrix::from_matrix(vec!["a".into()], r).is_err());
    }
}
