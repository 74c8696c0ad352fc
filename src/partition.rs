use crate::alignment::Alignment;
use crate::checkpoint::{self, CheckpointRecord, RestoreReport};
use crate::empirical_stats::EmpiricalStats;
use crate::error::{ErrorCode, SelectionError};
use crate::model::{Evaluation, Model, ModelKey};
use crate::model_params::{ParamMask, ParamVariant};
use crate::model_registry::ModelRegistry;
use crate::partition_descriptor::{DataType, PartitionDescriptor};
use crate::site_patterns::SitePatterns;
use crate::substitution_model::MatrixId;
use crate::tree::Tree;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::Arc;

/// One alignment slice under model selection: its pattern-compressed view,
/// lazily computed empirical statistics, and the owned candidate-model
/// registry. The alignment (and optional tree) are shared handles; the
/// stores outlive every partition referencing them.
pub struct Partition {
    id: u32,
    alignment: Arc<dyn Alignment>,
    tree: Option<Arc<dyn Tree>>,
    descriptor: PartitionDescriptor,
    patterns: SitePatterns,
    stats: EmpiricalStats,
    registry: ModelRegistry,
}

impl Partition {
    pub fn new(
        id: u32,
        alignment: Arc<dyn Alignment>,
        tree: Option<Arc<dyn Tree>>,
        descriptor: PartitionDescriptor,
        candidate_matrices: &[MatrixId],
        params: ParamMask,
    ) -> Result<Self, SelectionError> {
        let patterns = SitePatterns::build(alignment.as_ref(), &descriptor)?;
        let registry = ModelRegistry::from_candidates(candidate_matrices, params)?;
        Ok(Self {
            id,
            alignment,
            tree,
            descriptor,
            patterns,
            stats: EmpiricalStats::new(),
            registry,
        })
    }

    #[inline(always)]
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn descriptor(&self) -> &PartitionDescriptor {
        &self.descriptor
    }

    #[inline(always)]
    pub fn data_type(&self) -> DataType {
        self.descriptor.data_type()
    }

    #[inline(always)]
    pub fn n_sites(&self) -> usize {
        self.patterns.n_sites()
    }

    #[inline(always)]
    pub fn n_patterns(&self) -> usize {
        self.patterns.n_patterns()
    }

    #[inline(always)]
    pub fn n_sequences(&self) -> usize {
        self.patterns.n_sequences()
    }

    pub fn patterns(&self) -> &SitePatterns {
        &self.patterns
    }

    /// Pattern weights, parallel to `patterns().patterns()`.
    pub fn pattern_weights(&self) -> &[u32] {
        self.patterns.weights()
    }

    /// Raw alignment row, passed through from the provider.
    pub fn sequence(&self, index: usize) -> Option<&[u8]> {
        self.alignment.sequence(index)
    }

    pub fn tree(&self) -> Option<&Arc<dyn Tree>> {
        self.tree.as_ref()
    }

    /// Cached empirical frequencies (smoothed on first access).
    pub fn empirical_frequencies(&self) -> Result<Vec<f64>, SelectionError> {
        self.stats.frequencies(&self.patterns, self.data_type())
    }

    /// First call computes with the given smoothing and caches; later
    /// calls return the cache whatever the flag.
    pub fn compute_empirical_frequencies(
        &self,
        smooth: bool,
    ) -> Result<Vec<f64>, SelectionError> {
        self.stats
            .compute_frequencies(&self.patterns, self.data_type(), smooth)
    }

    /// Explicit re-attempt: clears the cached outcome first.
    pub fn recompute_empirical_frequencies(
        &self,
        smooth: bool,
    ) -> Result<Vec<f64>, SelectionError> {
        self.stats
            .recompute_frequencies(&self.patterns, self.data_type(), smooth)
    }

    pub fn empirical_subst_rates(&self) -> Result<Vec<f64>, SelectionError> {
        self.stats.subst_rates(&self.patterns, self.data_type())
    }

    pub fn recompute_empirical_subst_rates(&self) -> Result<Vec<f64>, SelectionError> {
        self.stats
            .recompute_subst_rates(&self.patterns, self.data_type())
    }

    pub fn empirical_pinv(&self) -> Result<f64, SelectionError> {
        self.stats.pinv(&self.patterns, self.data_type())
    }

    pub fn recompute_empirical_pinv(&self) -> Result<f64, SelectionError> {
        self.stats.recompute_pinv(&self.patterns, self.data_type())
    }

    #[inline(always)]
    pub fn n_models(&self) -> usize {
        self.registry.len()
    }

    pub fn models(&self) -> &[Model] {
        self.registry.models()
    }

    /// Per-model write surface for the evaluate phase; see
    /// [`ModelRegistry::models_mut`].
    pub fn models_mut(&mut self) -> &mut [Model] {
        self.registry.models_mut()
    }

    pub fn model(&self, index: usize) -> Option<&Model> {
        self.registry.model(index)
    }

    pub fn model_by_matrix(&self, matrix: MatrixId, variant: ParamVariant) -> Option<&Model> {
        self.registry.model_by_matrix(matrix, variant)
    }

    pub fn model_by_matrix_mut(
        &mut self,
        matrix: MatrixId,
        variant: ParamVariant,
    ) -> Option<&mut Model> {
        self.registry.model_by_matrix_mut(matrix, variant)
    }

    /// Whole-collection swap; the optimizer's write-back seam.
    pub fn set_models(&mut self, models: Vec<Model>) -> Result<(), SelectionError> {
        self.registry.set_models(models)
    }

    /// Rank by score; see [`ModelRegistry::sort`] for the total order.
    pub fn sort_models(&mut self, forwards: bool) {
        self.registry.sort(forwards);
    }

    /// Append a snapshot of this partition's evaluation state to the sink.
    pub fn output_log(&self, out: &mut dyn Write) -> Result<(), SelectionError> {
        let record = CheckpointRecord::capture(self.id, &self.descriptor, self.models());
        checkpoint::write_record(out, &record)
    }

    /// Restore evaluation state from a log written by `output_log` on a
    /// partition with the same identity and candidate configuration. Fully
    /// validated before any state changes; on mismatch this partition is
    /// left exactly as it was.
    pub fn input_log(&mut self, source: &mut dyn Read) -> Result<RestoreReport, SelectionError> {
        let (record, skipped_records) = checkpoint::read_latest(source)?;
        if record.partition_id != self.id {
            return Err(SelectionError::new(
                ErrorCode::CheckpointMismatch,
                format!("log is for partition {}, not {}", record.partition_id, self.id),
            ));
        }
        if record.descriptor != self.descriptor {
            return Err(SelectionError::new(
                ErrorCode::CheckpointMismatch,
                format!("log descriptor differs for partition {}", self.name()),
            ));
        }
        if record.models.len() != self.n_models() {
            return Err(SelectionError::new(
                ErrorCode::CheckpointMismatch,
                format!(
                    "log holds {} models, partition has {}",
                    record.models.len(),
                    self.n_models()
                ),
            ));
        }
        let mut staged: HashMap<ModelKey, Option<Evaluation>> =
            HashMap::with_capacity(record.models.len());
        for entry in &record.models {
            if staged.insert(entry.key(), entry.evaluation.clone()).is_some() {
                return Err(SelectionError::new(
                    ErrorCode::CheckpointMismatch,
                    format!("log lists model {} twice", entry.key()),
                ));
            }
            if self.model_by_matrix(entry.matrix, entry.variant).is_none() {
                return Err(SelectionError::new(
                    ErrorCode::CheckpointMismatch,
                    format!("log model {} is not a candidate here", entry.key()),
                ));
            }
        }

        let mut restored = 0;
        for model in self.registry.models_mut() {
            let evaluation = staged.remove(&model.key()).flatten();
            if evaluation.is_some() {
                restored += 1;
            }
            model.restore_evaluation(evaluation);
        }
        Ok(RestoreReport {
            restored,
            skipped_records,
        })
    }
}
