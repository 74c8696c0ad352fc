use anyhow::{Result, anyhow};
use bio::io::fasta;
use std::fs::File;

/// Read-only view of a multiple sequence alignment. Partitions hold this
/// behind an `Arc`, so the owning store outlives every partition that
/// references it; nothing in this crate mutates the alignment.
pub trait Alignment: Send + Sync {
    fn n_sequences(&self) -> usize;

    fn n_sites(&self) -> usize;

    /// Raw row `index`, one byte per alignment column.
    fn sequence(&self, index: usize) -> Option<&[u8]>;

    fn label(&self, index: usize) -> Option<&str>;
}

/// In-memory alignment, the reference implementation of [`Alignment`] used
/// by tests and by callers without their own sequence store.
#[derive(Clone, Debug, Default)]
pub struct PlainAlignment {
    labels: Vec<String>,
    rows: Vec<Vec<u8>>,
    n_sites: usize,
}

impl PlainAlignment {
    pub fn new(labels: Vec<String>, rows: Vec<Vec<u8>>) -> Result<Self> {
        if labels.len() != rows.len() {
            return Err(anyhow!(
                "{} labels for {} sequences",
                labels.len(),
                rows.len()
            ));
        }
        let n_sites = rows.first().map(|row| row.len()).unwrap_or(0);
        for (label, row) in labels.iter().zip(&rows) {
            if row.len() != n_sites {
                return Err(anyhow!(
                    "sequence {} has {} sites, expected {}",
                    label,
                    row.len(),
                    n_sites
                ));
            }
        }
        let rows = rows
            .into_iter()
            .map(|row| row.iter().map(|c| c.to_ascii_uppercase()).collect())
            .collect();
        Ok(Self {
            labels,
            rows,
            n_sites,
        })
    }

    /// Rows with generated labels, for quick construction in tests.
    pub fn from_sequences(sequences: &[&str]) -> Result<Self> {
        let labels = (0..sequences.len()).map(|i| format!("seq_{i}")).collect();
        let rows = sequences.iter().map(|s| s.as_bytes().to_vec()).collect();
        Self::new(labels, rows)
    }

    pub fn from_fasta_file(filename: &str) -> Result<Self> {
        let file = File::open(filename)?;
        let mut labels = vec![];
        let mut rows = vec![];
        for record in fasta::Reader::new(file).records() {
            let record = record?;
            labels.push(record.id().to_string());
            rows.push(record.seq().to_vec());
        }
        if rows.is_empty() {
            return Err(anyhow!("no sequences in {filename}"));
        }
        Self::new(labels, rows)
    }
}

impl Alignment for PlainAlignment {
    fn n_sequences(&self) -> usize {
        self.rows.len()
    }

    fn n_sites(&self) -> usize {
        self.n_sites
    }

    fn sequence(&self, index: usize) -> Option<&[u8]> {
        self.rows.get(index).map(|row| row.as_slice())
    }

    fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(|label| label.as_str())
    }
}
