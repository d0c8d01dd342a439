use std::collections::BTreeSet;

use crate::common::INDEL_ALLELE;

/// How the exposure coding relates to the outcome coding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// same ref/alt assignment; effect kept
    Concordant,
    /// ref and alt exchanged; exposure effect negated
    Discordant,
}

/// Result of comparing the alleles of one SNP across the two studies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlleleMatch {
    Oriented(Orientation),
    /// both orientations fit (overlapping multi-allelic sets)
    Ambiguous,
    /// a missing allele, a multi-base token, or no orientation fits
    Unclassifiable,
}

/// Upper-cased, comma-separated allele notation as a set, e.g. `"a,T"` ->
/// `{A, T}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlleleSet(BTreeSet<String>);

impl AlleleSet {
    pub fn parse(allele: &str) -> Self {
        Self(
            allele
                .to_uppercase()
                .split(',')
                .map(|x| x.trim().to_string())
                .collect(),
        )
    }

    /// Single-base tokens and the indel placeholder can be oriented;
    /// anything longer cannot.
    pub fn is_orientable(&self) -> bool {
        self.0
            .iter()
            .all(|x| x.chars().count() <= 1 || x == INDEL_ALLELE)
    }

    /// `self ⊆ other ∨ other ⊆ self`
    pub fn nested_with(&self, other: &AlleleSet) -> bool {
        self.0.is_subset(&other.0) || other.0.is_subset(&self.0)
    }
}

/// Compare outcome alleles against exposure alleles.
///
/// Concordant: `alt_out ~ alt_exp` and `ref_out ~ ref_exp`; discordant:
/// `alt_out ~ ref_exp` and `ref_out ~ alt_exp`, where `~` is the nested
/// subset test on upper-cased allele sets.
pub fn match_alleles(
    ref_out: Option<&str>,
    alt_out: Option<&str>,
    ref_exp: Option<&str>,
    alt_exp: Option<&str>,
) -> AlleleMatch {
    let (Some(ref_out), Some(alt_out), Some(ref_exp), Some(alt_exp)) =
        (ref_out, alt_out, ref_exp, alt_exp)
    else {
        return AlleleMatch::Unclassifiable;
    };

    let ref_out = AlleleSet::parse(ref_out);
    let alt_out = AlleleSet::parse(alt_out);
    let ref_exp = AlleleSet::parse(ref_exp);
    let alt_exp = AlleleSet::parse(alt_exp);

    if ![&ref_out, &alt_out, &ref_exp, &alt_exp]
        .iter()
        .all(|x| x.is_orientable())
    {
        return AlleleMatch::Unclassifiable;
    }

    let concordant = alt_out.nested_with(&alt_exp) && ref_out.nested_with(&ref_exp);
    let discordant = alt_out.nested_with(&ref_exp) && ref_out.nested_with(&alt_exp);

    match (concordant, discordant) {
        (true, false) => AlleleMatch::Oriented(Orientation::Concordant),
        (false, true) => AlleleMatch::Oriented(Orientation::Discordant),
        (true, true) => AlleleMatch::Ambiguous,
        (false, false) => AlleleMatch::Unclassifiable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(r_o: &str, a_o: &str, r_e: &str, a_e: &str) -> AlleleMatch {
        match_alleles(Some(r_o), Some(a_o), Some(r_e), Some(a_e))
    }

    #[test]
    fn test_concordant_and_discordant() {
        assert_eq!(
            check("A", "G", "a", "g"),
            AlleleMatch::Oriented(Orientation::Concordant)
        );
        assert_eq!(
            check("A", "G", "G", "A"),
            AlleleMatch::Oriented(Orientation::Discordant)
        );
    }

    #[test]
    fn test_multi_allelic_subsets() {
        // outcome alt G is contained in exposure alt {G, T}
        assert_eq!(
            check("A", "G", "A", "G,T"),
            AlleleMatch::Oriented(Orientation::Concordant)
        );
        assert_eq!(
            check("C", "A,T", "A", "C"),
            AlleleMatch::Oriented(Orientation::Discordant)
        );
    }

    #[test]
    fn test_indel_placeholder_is_orientable() {
        assert_eq!(
            check("-", "A", "A", "-"),
            AlleleMatch::Oriented(Orientation::Discordant)
        );
    }

    #[test]
    fn test_unclassifiable_rows() {
        assert_eq!(check("AT", "A", "AT", "A"), AlleleMatch::Unclassifiable);
        assert_eq!(check("A", "G", "C", "T"), AlleleMatch::Unclassifiable);
        assert_eq!(check("A", "G", "A", "G,TT"), AlleleMatch::Unclassifiable);
        assert_eq!(
            match_alleles(Some("A"), None, Some("A"), Some("G")),
            AlleleMatch::Unclassifiable
        );
    }

    #[test]
    fn test_ambiguous_sets() {
        assert_eq!(check("A,G", "G,A", "A", "G"), AlleleMatch::Ambiguous);
    }
}
