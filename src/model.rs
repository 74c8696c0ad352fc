use crate::model_params::ParamVariant;
use crate::substitution_model::{MatrixId, SubstitutionMatrix};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identity of a candidate model within one partition. The derived
/// `Ord` (matrix id first, then variant declaration order) is the
/// deterministic tie-break used by ranking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModelKey {
    pub matrix: MatrixId,
    pub variant: ParamVariant,
}

impl ModelKey {
    pub fn new(matrix: MatrixId, variant: ParamVariant) -> Self {
        Self { matrix, variant }
    }

    /// Conventional display name, e.g. `GTR+G` or `matrix42+I`.
    pub fn name(&self) -> String {
        let base = match SubstitutionMatrix::by_id(self.matrix) {
            Some(matrix) => matrix.name().to_string(),
            None => format!("matrix{}", self.matrix),
        };
        format!("{base}{}", self.variant.suffix())
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Optimizer output for one model. The criterion score ranks candidates;
/// the fitted parameters are an optimizer-owned blob this crate stores and
/// round-trips but never interprets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub score: f64,
    pub parameters: serde_json::Value,
}

impl Evaluation {
    pub fn new(score: f64, parameters: serde_json::Value) -> Self {
        Self { score, parameters }
    }

    pub fn scored(score: f64) -> Self {
        Self::new(score, serde_json::Value::Null)
    }
}

/// One candidate model: a key into the search space plus its evaluation
/// state. Unevaluated until a worker attaches an [`Evaluation`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Model {
    key: ModelKey,
    evaluation: Option<Evaluation>,
}

impl Model {
    pub fn new(matrix: MatrixId, variant: ParamVariant) -> Self {
        Self {
            key: ModelKey::new(matrix, variant),
            evaluation: None,
        }
    }

    #[inline(always)]
    pub fn key(&self) -> ModelKey {
        self.key
    }

    #[inline(always)]
    pub fn matrix(&self) -> MatrixId {
        self.key.matrix
    }

    #[inline(always)]
    pub fn variant(&self) -> ParamVariant {
        self.key.variant
    }

    pub fn name(&self) -> String {
        self.key.name()
    }

    #[inline(always)]
    pub fn is_evaluated(&self) -> bool {
        self.evaluation.is_some()
    }

    pub fn score(&self) -> Option<f64> {
        self.evaluation.as_ref().map(|e| e.score)
    }

    pub fn evaluation(&self) -> Option<&Evaluation> {
        self.evaluation.as_ref()
    }

    /// Worker write surface: attach or replace this model's result.
    pub fn set_evaluation(&mut self, evaluation: Evaluation) {
        self.evaluation = Some(evaluation);
    }

    pub(crate) fn restore_evaluation(&mut self, evaluation: Option<Evaluation>) {
        self.evaluation = evaluation;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_names() {
        assert_eq!(ModelKey::new(MatrixId(10), ParamVariant::InvGamma).name(), "GTR+I+G");
        assert_eq!(ModelKey::new(MatrixId(0), ParamVariant::EqualFreqs).name(), "JC");
        assert_eq!(ModelKey::new(MatrixId(999), ParamVariant::Gamma).name(), "matrix999+G");
    }

    #[test]
    fn test_key_ordering() {
        let a = ModelKey::new(MatrixId(0), ParamVariant::Gamma);
        let b = ModelKey::new(MatrixId(1), ParamVariant::EqualFreqs);
        let c = ModelKey::new(MatrixId(1), ParamVariant::Gamma);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_evaluation_state() {
        let mut model = Model::new(MatrixId(10), ParamVariant::Gamma);
        assert!(!model.is_evaluated());
        assert_eq!(model.score(), None);

        model.set_evaluation(Evaluation::new(
            1234.5,
            json!({"alpha": 0.42, "logl": -601.3}),
        ));
        assert!(model.is_evaluated());
        assert_eq!(model.score(), Some(1234.5));
        assert_eq!(model.evaluation().unwrap().parameters["alpha"], 0.42);
    }

    #[test]
    fn test_serde_round_trip() {
        let mut model = Model::new(MatrixId(2), ParamVariant::InvSites);
        model.set_evaluation(Evaluation::scored(99.9));
        let json = serde_json::to_string(&model).unwrap();
        let back: Model = serde_json::from_str(&json).unwrap();
        assert_eq!(back, model);
    }
}
