use crate::partition_descriptor::DataType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a rate-matrix family in the built-in catalog
/// ([`crate::SUBSTITUTION_MATRICES`]). Callers assemble their candidate
/// lists from these ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MatrixId(pub u32);

impl fmt::Display for MatrixId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One named substitution-matrix family. For nucleotide matrices the
/// symmetry string assigns each of the six state pairs (AC AG AT CG CT GT)
/// to a rate class; amino-acid replacement matrices have fixed empirical
/// rates and carry no symmetry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubstitutionMatrix {
    id: MatrixId,
    name: String,
    data_type: DataType,
    symmetry: Option<String>,
}

impl SubstitutionMatrix {
    fn dna(id: u32, name: &str, symmetry: &str) -> Self {
        Self {
            id: MatrixId(id),
            name: name.to_string(),
            data_type: DataType::Nucleotide,
            symmetry: Some(symmetry.to_string()),
        }
    }

    fn protein(id: u32, name: &str) -> Self {
        Self {
            id: MatrixId(id),
            name: name.to_string(),
            data_type: DataType::Protein,
            symmetry: None,
        }
    }

    pub fn builtin_catalog() -> Vec<SubstitutionMatrix> {
        vec![
            Self::dna(0, "JC", "000000"),
            Self::dna(1, "K80", "010010"),
            Self::dna(2, "TrN", "010020"),
            Self::dna(3, "TPM1", "012210"),
            Self::dna(4, "TPM2", "010212"),
            Self::dna(5, "TPM3", "012012"),
            Self::dna(6, "TIM1", "012230"),
            Self::dna(7, "TIM2", "010232"),
            Self::dna(8, "TIM3", "012032"),
            Self::dna(9, "TVM", "012314"),
            Self::dna(10, "GTR", "012345"),
            Self::protein(100, "DAYHOFF"),
            Self::protein(101, "JTT"),
            Self::protein(102, "WAG"),
            Self::protein(103, "LG"),
            Self::protein(104, "BLOSUM62"),
        ]
    }

    pub fn by_id(id: MatrixId) -> Option<&'static SubstitutionMatrix> {
        crate::SUBSTITUTION_MATRICES.iter().find(|m| m.id == id)
    }

    pub fn by_name(name: &str) -> Option<&'static SubstitutionMatrix> {
        crate::SUBSTITUTION_MATRICES
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }

    /// All catalog ids for one data type, the usual candidate list.
    pub fn ids_for(data_type: DataType) -> Vec<MatrixId> {
        crate::SUBSTITUTION_MATRICES
            .iter()
            .filter(|m| m.data_type == data_type)
            .map(|m| m.id)
            .collect()
    }

    #[inline(always)]
    pub fn id(&self) -> MatrixId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline(always)]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn symmetry(&self) -> Option<&str> {
        self.symmetry.as_deref()
    }

    /// Free exchangeability parameters: distinct rate classes minus the one
    /// fixed as reference.
    pub fn free_rate_params(&self) -> usize {
        match &self.symmetry {
            Some(symmetry) => {
                let mut classes: Vec<u8> = symmetry.bytes().collect();
                classes.sort_unstable();
                classes.dedup();
                classes.len().saturating_sub(1)
            }
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lookup() {
        let gtr = SubstitutionMatrix::by_name("GTR").unwrap();
        assert_eq!(gtr.id(), MatrixId(10));
        assert_eq!(gtr.symmetry(), Some("012345"));
        assert_eq!(SubstitutionMatrix::by_id(MatrixId(10)).unwrap().name(), "GTR");
        assert!(SubstitutionMatrix::by_id(MatrixId(999)).is_none());
    }

    #[test]
    fn test_free_rate_params() {
        assert_eq!(SubstitutionMatrix::by_name("JC").unwrap().free_rate_params(), 0);
        assert_eq!(SubstitutionMatrix::by_name("K80").unwrap().free_rate_params(), 1);
        assert_eq!(SubstitutionMatrix::by_name("GTR").unwrap().free_rate_params(), 5);
        assert_eq!(SubstitutionMatrix::by_name("LG").unwrap().free_rate_params(), 0);
    }

    #[test]
    fn test_ids_for_data_type() {
        let dna = SubstitutionMatrix::ids_for(DataType::Nucleotide);
        assert_eq!(dna.len(), 11);
        let protein = SubstitutionMatrix::ids_for(DataType::Protein);
        assert_eq!(protein.len(), 5);
        assert!(dna.iter().all(|id| !protein.contains(id)));
    }

    #[test]
    fn test_unique_ids() {
        let catalog = SubstitutionMatrix::builtin_catalog();
        let mut ids: Vec<MatrixId> = catalog.iter().map(|m| m.id()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), catalog.len());
    }
}
