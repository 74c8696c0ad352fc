use crate::alignment::Alignment;
use crate::error::{ErrorCode, SelectionError};
use crate::partition_descriptor::{DataType, PartitionDescriptor};
use crate::state_code::StateSet;
use rayon::prelude::*;
use std::collections::HashMap;

/// One unique alignment column and the number of original sites sharing it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SitePattern {
    column: Vec<u8>,
    weight: u32,
}

impl SitePattern {
    #[inline(always)]
    pub fn column(&self) -> &[u8] {
        &self.column
    }

    #[inline(always)]
    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// A pattern is invariant when some state is compatible with every
    /// sequence; gaps and full ambiguities are compatible with all states.
    pub fn is_invariant(&self, data_type: DataType) -> bool {
        let mut common = StateSet::full(data_type);
        for &symbol in &self.column {
            common = common.intersect(StateSet::decode(data_type, symbol));
            if common.is_empty() {
                return false;
            }
        }
        true
    }
}

/// Pattern-compressed view of one partition's columns. Redundant columns
/// collapse into a single pattern with a weight, keeping downstream
/// per-pattern work proportional to the number of distinct columns rather
/// than the alignment length. First-occurrence order is preserved.
#[derive(Clone, Debug)]
pub struct SitePatterns {
    patterns: Vec<SitePattern>,
    weights: Vec<u32>,
    n_sites: usize,
    n_sequences: usize,
}

impl SitePatterns {
    pub fn build(
        alignment: &dyn Alignment,
        descriptor: &PartitionDescriptor,
    ) -> Result<Self, SelectionError> {
        let n_sequences = alignment.n_sequences();
        if n_sequences == 0 {
            return Err(SelectionError::new(
                ErrorCode::InvalidInput,
                "alignment has no sequences",
            ));
        }
        let mut rows: Vec<&[u8]> = Vec::with_capacity(n_sequences);
        for index in 0..n_sequences {
            let row = alignment.sequence(index).ok_or_else(|| {
                SelectionError::new(
                    ErrorCode::InvalidInput,
                    format!("alignment row {index} is missing"),
                )
            })?;
            if row.len() != alignment.n_sites() {
                return Err(SelectionError::new(
                    ErrorCode::InvalidInput,
                    format!(
                        "alignment row {index} has {} sites, expected {}",
                        row.len(),
                        alignment.n_sites()
                    ),
                ));
            }
            rows.push(row);
        }

        let sites: Vec<usize> = descriptor.sites().collect();
        if let Some(&bad) = sites.iter().find(|&&s| s >= alignment.n_sites()) {
            return Err(SelectionError::new(
                ErrorCode::InvalidInput,
                format!(
                    "descriptor {} covers site {bad}, alignment ends at {}",
                    descriptor.name(),
                    alignment.n_sites()
                ),
            ));
        }

        let columns: Vec<Vec<u8>> = sites
            .par_iter()
            .map(|&site| {
                rows.iter()
                    .map(|row| row[site].to_ascii_uppercase())
                    .collect()
            })
            .collect();

        let mut seen: HashMap<Vec<u8>, usize> = HashMap::with_capacity(columns.len());
        let mut patterns: Vec<SitePattern> = vec![];
        for column in columns {
            match seen.get(&column) {
                Some(&index) => patterns[index].weight += 1,
                None => {
                    seen.insert(column.clone(), patterns.len());
                    patterns.push(SitePattern { column, weight: 1 });
                }
            }
        }
        let weights = patterns.iter().map(|p| p.weight).collect();

        Ok(Self {
            patterns,
            weights,
            n_sites: sites.len(),
            n_sequences,
        })
    }

    #[inline(always)]
    pub fn patterns(&self) -> &[SitePattern] {
        &self.patterns
    }

    /// Pattern weights, parallel to `patterns()`.
    #[inline(always)]
    pub fn weights(&self) -> &[u32] {
        &self.weights
    }

    #[inline(always)]
    pub fn n_patterns(&self) -> usize {
        self.patterns.len()
    }

    #[inline(always)]
    pub fn n_sites(&self) -> usize {
        self.n_sites
    }

    #[inline(always)]
    pub fn n_sequences(&self) -> usize {
        self.n_sequences
    }

    pub fn invariant_weight(&self, data_type: DataType) -> u32 {
        self.patterns
            .iter()
            .filter(|p| p.is_invariant(data_type))
            .map(|p| p.weight)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::PlainAlignment;

    fn patterns_for(sequences: &[&str]) -> SitePatterns {
        let msa = PlainAlignment::from_sequences(sequences).unwrap();
        let descriptor = PartitionDescriptor::contiguous(
            "test",
            0,
            msa.n_sites(),
            DataType::Nucleotide,
        );
        SitePatterns::build(&msa, &descriptor).unwrap()
    }

    #[test]
    fn test_compression() {
        // Columns: AC, GG, AC, TT, GG, AC -> 3 unique patterns
        let patterns = patterns_for(&["AGATGA", "CGCTGC"]);
        assert_eq!(patterns.n_sites(), 6);
        assert_eq!(patterns.n_patterns(), 3);
        assert_eq!(patterns.weights(), &[3, 2, 1]);
        assert_eq!(patterns.patterns()[0].column(), b"AC");
        assert_eq!(patterns.patterns()[1].column(), b"GG");
        assert_eq!(patterns.patterns()[2].column(), b"TT");
        let total: u32 = patterns.weights().iter().sum();
        assert_eq!(total as usize, patterns.n_sites());
    }

    #[test]
    fn test_case_folding() {
        let patterns = patterns_for(&["acgt", "ACGT"]);
        assert_eq!(patterns.n_patterns(), 4);
        for pattern in patterns.patterns() {
            assert_eq!(pattern.column()[0], pattern.column()[1]);
        }
    }

    #[test]
    fn test_invariant_weight() {
        // Columns: AA, AA, CG, A- (gap compatible with A)
        let patterns = patterns_for(&["AACA", "AAG-"]);
        assert_eq!(patterns.invariant_weight(DataType::Nucleotide), 3);
    }

    #[test]
    fn test_sub_range() {
        let msa = PlainAlignment::from_sequences(&["AGATGA", "CGCTGC"]).unwrap();
        let descriptor = PartitionDescriptor::contiguous("head", 0, 2, DataType::Nucleotide);
        let patterns = SitePatterns::build(&msa, &descriptor).unwrap();
        assert_eq!(patterns.n_sites(), 2);
        assert_eq!(patterns.n_patterns(), 2);
    }

    #[test]
    fn test_stride_extraction() {
        use crate::partition_descriptor::SiteRange;
        let msa = PlainAlignment::from_sequences(&["AGATGA", "CGCTGC"]).unwrap();
        let descriptor = PartitionDescriptor::new(
            "pos1",
            vec![SiteRange::with_stride(0, 6, 3)],
            DataType::Nucleotide,
        );
        // Sites 0 and 3: columns AC and TT
        let patterns = SitePatterns::build(&msa, &descriptor).unwrap();
        assert_eq!(patterns.n_sites(), 2);
        assert_eq!(patterns.patterns()[0].column(), b"AC");
        assert_eq!(patterns.patterns()[1].column(), b"TT");
    }

    #[test]
    fn test_descriptor_out_of_bounds() {
        let msa = PlainAlignment::from_sequences(&["ACGT", "ACGT"]).unwrap();
        let descriptor = PartitionDescriptor::contiguous("wide", 0, 5, DataType::Nucleotide);
        let err = SitePatterns::build(&msa, &descriptor).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }
}
