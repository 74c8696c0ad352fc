use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Nucleotide,
    Protein,
}

impl DataType {
    #[inline(always)]
    pub fn n_states(&self) -> usize {
        match self {
            DataType::Nucleotide => 4,
            DataType::Protein => 20,
        }
    }

    /// Number of pairwise exchangeability parameters between states.
    #[inline(always)]
    pub fn n_subst_rates(&self) -> usize {
        let n = self.n_states();
        n * (n - 1) / 2
    }

    #[inline(always)]
    pub fn alphabet(&self) -> &'static [u8] {
        match self {
            DataType::Nucleotide => b"ACGT",
            DataType::Protein => b"ARNDCQEGHILKMFPSTWYV",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Nucleotide => write!(f, "nucleotide"),
            DataType::Protein => write!(f, "protein"),
        }
    }
}

/// Half-open, 0-based run of alignment columns. A stride above 1 picks
/// every n-th column, which is how codon-position partitions are expressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiteRange {
    start: usize,
    end: usize,
    stride: usize,
}

impl SiteRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self::with_stride(start, end, 1)
    }

    pub fn with_stride(start: usize, end: usize, stride: usize) -> Self {
        Self {
            start,
            end,
            stride: stride.max(1),
        }
    }

    #[inline(always)]
    pub fn start(&self) -> usize {
        self.start
    }

    #[inline(always)]
    pub fn end(&self) -> usize {
        self.end
    }

    #[inline(always)]
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn sites(&self) -> impl Iterator<Item = usize> + '_ {
        (self.start..self.end).step_by(self.stride)
    }

    pub fn n_sites(&self) -> usize {
        if self.end <= self.start {
            return 0;
        }
        (self.end - self.start).div_ceil(self.stride)
    }
}

/// Immutable description of one partition: which alignment columns it
/// covers and what kind of data they hold. Compared structurally when a
/// checkpoint is matched against a partition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartitionDescriptor {
    name: String,
    ranges: Vec<SiteRange>,
    data_type: DataType,
}

impl PartitionDescriptor {
    pub fn new(name: impl Into<String>, ranges: Vec<SiteRange>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            ranges,
            data_type,
        }
    }

    /// Descriptor covering one contiguous block of columns.
    pub fn contiguous(
        name: impl Into<String>,
        start: usize,
        end: usize,
        data_type: DataType,
    ) -> Self {
        Self::new(name, vec![SiteRange::new(start, end)], data_type)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ranges(&self) -> &[SiteRange] {
        &self.ranges
    }

    #[inline(always)]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// All covered column indices, in range order.
    pub fn sites(&self) -> impl Iterator<Item = usize> + '_ {
        self.ranges.iter().flat_map(|r| r.sites())
    }

    pub fn n_sites(&self) -> usize {
        self.ranges.iter().map(|r| r.n_sites()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_sites() {
        let range = SiteRange::new(2, 6);
        assert_eq!(range.sites().collect::<Vec<_>>(), vec![2, 3, 4, 5]);
        assert_eq!(range.n_sites(), 4);
    }

    #[test]
    fn test_range_stride() {
        // Third codon positions of a 9-column gene
        let range = SiteRange::with_stride(2, 9, 3);
        assert_eq!(range.sites().collect::<Vec<_>>(), vec![2, 5, 8]);
        assert_eq!(range.n_sites(), 3);
    }

    #[test]
    fn test_empty_range() {
        let range = SiteRange::new(5, 5);
        assert_eq!(range.n_sites(), 0);
        assert_eq!(range.sites().count(), 0);
    }

    #[test]
    fn test_descriptor_sites() {
        let descriptor = PartitionDescriptor::new(
            "genes12",
            vec![SiteRange::new(0, 3), SiteRange::new(7, 9)],
            DataType::Nucleotide,
        );
        assert_eq!(descriptor.sites().collect::<Vec<_>>(), vec![0, 1, 2, 7, 8]);
        assert_eq!(descriptor.n_sites(), 5);
    }

    #[test]
    fn test_data_type() {
        assert_eq!(DataType::Nucleotide.n_states(), 4);
        assert_eq!(DataType::Nucleotide.n_subst_rates(), 6);
        assert_eq!(DataType::Protein.n_states(), 20);
        assert_eq!(DataType::Protein.n_subst_rates(), 190);
        assert_eq!(DataType::Protein.alphabet().len(), 20);
    }

    #[test]
    fn test_descriptor_equality() {
        let a = PartitionDescriptor::contiguous("p1", 0, 10, DataType::Nucleotide);
        let b = PartitionDescriptor::contiguous("p1", 0, 10, DataType::Nucleotide);
        let c = PartitionDescriptor::contiguous("p1", 0, 11, DataType::Nucleotide);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
