use crate::error::{ErrorCode, SelectionError};
use crate::partition_descriptor::DataType;
use crate::site_patterns::SitePatterns;
use crate::state_code::StateSet;
use rayon::prelude::*;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Floor for a state count of zero when smoothing is requested.
const SMOOTH_COUNT: f64 = 1e-4;

/// Pseudo-count for a substitution pair never observed, so relative rates
/// stay strictly positive.
const UNOBSERVED_PAIR_COUNT: f64 = 0.5;

#[derive(Clone, Debug)]
enum StatCell<T> {
    Unset,
    Ready(T),
    Failed(SelectionError),
}

/// Empirical statistics of one partition, each computed at most once from
/// the compressed patterns. A cell records success or failure on the first
/// attempt; later getters return the recorded outcome, and only the
/// `recompute_*` entry points clear a cell. Read access after the first
/// computation is lock-cheap and thread-safe.
#[derive(Debug, Default)]
pub struct EmpiricalStats {
    frequencies: RwLock<StatCell<Vec<f64>>>,
    subst_rates: RwLock<StatCell<Vec<f64>>>,
    pinv: RwLock<StatCell<f64>>,
    computations: AtomicUsize,
}

impl<T> Default for StatCell<T> {
    fn default() -> Self {
        StatCell::Unset
    }
}

impl EmpiricalStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached frequencies; computes with smoothing on first access.
    pub fn frequencies(
        &self,
        patterns: &SitePatterns,
        data_type: DataType,
    ) -> Result<Vec<f64>, SelectionError> {
        self.compute_frequencies(patterns, data_type, true)
    }

    pub fn compute_frequencies(
        &self,
        patterns: &SitePatterns,
        data_type: DataType,
        smooth: bool,
    ) -> Result<Vec<f64>, SelectionError> {
        self.get_or_compute(&self.frequencies, || {
            Self::count_frequencies(patterns, data_type, smooth)
        })
    }

    pub fn recompute_frequencies(
        &self,
        patterns: &SitePatterns,
        data_type: DataType,
        smooth: bool,
    ) -> Result<Vec<f64>, SelectionError> {
        Self::reset(&self.frequencies);
        self.compute_frequencies(patterns, data_type, smooth)
    }

    pub fn subst_rates(
        &self,
        patterns: &SitePatterns,
        data_type: DataType,
    ) -> Result<Vec<f64>, SelectionError> {
        self.get_or_compute(&self.subst_rates, || {
            Self::count_subst_rates(patterns, data_type)
        })
    }

    pub fn recompute_subst_rates(
        &self,
        patterns: &SitePatterns,
        data_type: DataType,
    ) -> Result<Vec<f64>, SelectionError> {
        Self::reset(&self.subst_rates);
        self.subst_rates(patterns, data_type)
    }

    pub fn pinv(
        &self,
        patterns: &SitePatterns,
        data_type: DataType,
    ) -> Result<f64, SelectionError> {
        self.get_or_compute(&self.pinv, || Self::count_pinv(patterns, data_type))
    }

    pub fn recompute_pinv(
        &self,
        patterns: &SitePatterns,
        data_type: DataType,
    ) -> Result<f64, SelectionError> {
        Self::reset(&self.pinv);
        self.pinv(patterns, data_type)
    }

    /// Number of computations actually run (not served from cache).
    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::Relaxed)
    }

    fn get_or_compute<T: Clone>(
        &self,
        cell: &RwLock<StatCell<T>>,
        compute: impl FnOnce() -> Result<T, SelectionError>,
    ) -> Result<T, SelectionError> {
        {
            let guard = cell.read().expect("statistic cell lock poisoned");
            match &*guard {
                StatCell::Ready(value) => return Ok(value.clone()),
                StatCell::Failed(err) => return Err(err.clone()),
                StatCell::Unset => {}
            }
        }
        let mut guard = cell.write().expect("statistic cell lock poisoned");
        // Double check: another thread may have initialized meanwhile.
        match &*guard {
            StatCell::Ready(value) => return Ok(value.clone()),
            StatCell::Failed(err) => return Err(err.clone()),
            StatCell::Unset => {}
        }
        self.computations.fetch_add(1, Ordering::Relaxed);
        match compute() {
            Ok(value) => {
                *guard = StatCell::Ready(value.clone());
                Ok(value)
            }
            Err(err) => {
                *guard = StatCell::Failed(err.clone());
                Err(err)
            }
        }
    }

    fn reset<T>(cell: &RwLock<StatCell<T>>) {
        let mut guard = cell.write().expect("statistic cell lock poisoned");
        *guard = StatCell::Unset;
    }

    /// Weighted state counts over all patterns, normalized to a probability
    /// vector. A partial ambiguity splits its weight equally over its
    /// states; gaps and full ambiguities are not counted.
    fn count_frequencies(
        patterns: &SitePatterns,
        data_type: DataType,
        smooth: bool,
    ) -> Result<Vec<f64>, SelectionError> {
        let n_states = data_type.n_states();
        let mut counts = patterns
            .patterns()
            .par_iter()
            .map(|pattern| {
                let mut local = vec![0.0_f64; n_states];
                for &symbol in pattern.column() {
                    let set = StateSet::decode(data_type, symbol);
                    if set.is_full(data_type) {
                        continue;
                    }
                    let share = pattern.weight() as f64 / set.len() as f64;
                    for state in set.states() {
                        local[state] += share;
                    }
                }
                local
            })
            .reduce(
                || vec![0.0_f64; n_states],
                |mut acc, local| {
                    for (total, value) in acc.iter_mut().zip(local) {
                        *total += value;
                    }
                    acc
                },
            );

        if smooth {
            for count in counts.iter_mut() {
                if *count == 0.0 {
                    *count = SMOOTH_COUNT;
                }
            }
        } else if let Some(state) = counts.iter().position(|&count| count == 0.0) {
            return Err(SelectionError::new(
                ErrorCode::EmpiricalFrequencies,
                format!(
                    "state {} never observed in the partition",
                    data_type.alphabet()[state] as char
                ),
            ));
        }
        let total: f64 = counts.iter().sum();
        if total <= 0.0 {
            return Err(SelectionError::new(
                ErrorCode::EmpiricalFrequencies,
                "no countable symbols in the partition",
            ));
        }
        Ok(counts.into_iter().map(|count| count / total).collect())
    }

    /// Pairwise substitution counts from pattern co-occurrence, reported
    /// relative to the last state pair (G<->T = 1). Only unambiguous symbol
    /// pairs count; only nucleotide data carries this parameterization.
    fn count_subst_rates(
        patterns: &SitePatterns,
        data_type: DataType,
    ) -> Result<Vec<f64>, SelectionError> {
        if data_type != DataType::Nucleotide {
            return Err(SelectionError::new(
                ErrorCode::EmpiricalSubstRates,
                format!("no substitution-rate parameterization for {data_type} data"),
            ));
        }
        let n_states = data_type.n_states();
        let n_rates = data_type.n_subst_rates();
        let mut counts = patterns
            .patterns()
            .par_iter()
            .map(|pattern| {
                let mut local = vec![0.0_f64; n_rates];
                let states: Vec<Option<usize>> = pattern
                    .column()
                    .iter()
                    .map(|&symbol| StateSet::decode(data_type, symbol).single_state())
                    .collect();
                for (position, &first) in states.iter().enumerate() {
                    let Some(first) = first else { continue };
                    for &second in &states[position + 1..] {
                        let Some(second) = second else { continue };
                        if first != second {
                            local[Self::pair_index(first, second, n_states)] +=
                                pattern.weight() as f64;
                        }
                    }
                }
                local
            })
            .reduce(
                || vec![0.0_f64; n_rates],
                |mut acc, local| {
                    for (total, value) in acc.iter_mut().zip(local) {
                        *total += value;
                    }
                    acc
                },
            );

        if counts.iter().sum::<f64>() == 0.0 {
            return Err(SelectionError::new(
                ErrorCode::EmpiricalSubstRates,
                "no substitution observed between any sequence pair",
            ));
        }
        for count in counts.iter_mut() {
            if *count == 0.0 {
                *count = UNOBSERVED_PAIR_COUNT;
            }
        }
        let reference = counts[n_rates - 1];
        Ok(counts.into_iter().map(|count| count / reference).collect())
    }

    /// Index of the unordered state pair (a, b) in the conventional rate
    /// order AC, AG, AT, CG, CT, GT.
    fn pair_index(a: usize, b: usize, n_states: usize) -> usize {
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        low * n_states - low * (low + 1) / 2 + (high - low - 1)
    }

    fn count_pinv(patterns: &SitePatterns, data_type: DataType) -> Result<f64, SelectionError> {
        if patterns.n_sites() == 0 {
            return Err(SelectionError::new(
                ErrorCode::EmpiricalPinv,
                "partition covers no sites",
            ));
        }
        let invariant = patterns.invariant_weight(data_type) as f64;
        Ok(invariant / patterns.n_sites() as f64)
    }
}
