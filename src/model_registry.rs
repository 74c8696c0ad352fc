use crate::error::{ErrorCode, SelectionError};
use crate::model::{Model, ModelKey};
use crate::model_params::{ParamMask, ParamVariant};
use crate::substitution_model::MatrixId;
use itertools::{Itertools, iproduct};
use std::cmp::Ordering;
use std::collections::HashMap;

/// The candidate set for one partition: the Cartesian product of the
/// matrix-id list and the set parameter tags, keyed by (matrix, variant).
/// Size and key set are fixed at construction; only evaluation state and
/// ordering change afterwards.
#[derive(Clone, Debug)]
pub struct ModelRegistry {
    models: Vec<Model>,
    index: HashMap<ModelKey, usize>,
}

impl ModelRegistry {
    pub fn from_candidates(
        matrices: &[MatrixId],
        params: ParamMask,
    ) -> Result<Self, SelectionError> {
        if let Some(dup) = matrices.iter().duplicates().next() {
            return Err(SelectionError::new(
                ErrorCode::DuplicateModelKey,
                format!("matrix {dup} listed twice in the candidate set"),
            ));
        }
        let models: Vec<Model> = iproduct!(matrices.iter().copied(), params.iter())
            .map(|(matrix, variant)| Model::new(matrix, variant))
            .collect();
        let index = Self::build_index(&models)?;
        Ok(Self { models, index })
    }

    fn build_index(models: &[Model]) -> Result<HashMap<ModelKey, usize>, SelectionError> {
        let mut index = HashMap::with_capacity(models.len());
        for (position, model) in models.iter().enumerate() {
            if index.insert(model.key(), position).is_some() {
                return Err(SelectionError::new(
                    ErrorCode::DuplicateModelKey,
                    format!("model {} constructed twice", model.name()),
                ));
            }
        }
        Ok(index)
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    #[inline(always)]
    pub fn models(&self) -> &[Model] {
        &self.models
    }

    /// Per-model write surface for the evaluate phase. Exclusive borrow:
    /// ranking, replacement and checkpointing cannot overlap an in-flight
    /// writer holding this slice.
    pub fn models_mut(&mut self) -> &mut [Model] {
        &mut self.models
    }

    /// Positional access into the current ordering.
    pub fn model(&self, index: usize) -> Option<&Model> {
        self.models.get(index)
    }

    pub fn model_by_matrix(&self, matrix: MatrixId, variant: ParamVariant) -> Option<&Model> {
        let key = ModelKey::new(matrix, variant);
        self.index.get(&key).map(|&position| &self.models[position])
    }

    pub fn model_by_matrix_mut(
        &mut self,
        matrix: MatrixId,
        variant: ParamVariant,
    ) -> Option<&mut Model> {
        let key = ModelKey::new(matrix, variant);
        match self.index.get(&key) {
            Some(&position) => self.models.get_mut(position),
            None => None,
        }
    }

    /// Replace the whole collection. Rejected, leaving current state
    /// untouched, unless the incoming keys are exactly the constructed
    /// ones.
    pub fn set_models(&mut self, models: Vec<Model>) -> Result<(), SelectionError> {
        if models.len() != self.models.len() {
            return Err(SelectionError::new(
                ErrorCode::ModelSetRejected,
                format!("expected {} models, got {}", self.models.len(), models.len()),
            ));
        }
        let index = Self::build_index(&models).map_err(|err| {
            SelectionError::new(ErrorCode::ModelSetRejected, err.message)
        })?;
        if let Some(unknown) = index.keys().find(|key| !self.index.contains_key(*key)) {
            return Err(SelectionError::new(
                ErrorCode::ModelSetRejected,
                format!("model {} was not in the candidate set", unknown.name()),
            ));
        }
        self.models = models;
        self.index = index;
        Ok(())
    }

    /// Reorder by criterion score: ascending when `forwards` (best first
    /// under a lower-is-better criterion), descending otherwise.
    /// Unevaluated models sort after evaluated ones in both directions;
    /// ties, and unevaluated models among themselves, order by ascending
    /// matrix id then variant declaration order.
    pub fn sort(&mut self, forwards: bool) {
        self.models
            .sort_by(|a, b| Self::rank_order(a, b, forwards));
        for (position, model) in self.models.iter().enumerate() {
            self.index.insert(model.key(), position);
        }
    }

    fn rank_order(a: &Model, b: &Model, forwards: bool) -> Ordering {
        match (a.score(), b.score()) {
            (Some(x), Some(y)) => {
                let by_score = if forwards {
                    x.total_cmp(&y)
                } else {
                    y.total_cmp(&x)
                };
                by_score.then_with(|| a.key().cmp(&b.key()))
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.key().cmp(&b.key()),
        }
    }
}
