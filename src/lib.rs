use lazy_static::lazy_static;
use substitution_model::SubstitutionMatrix;

pub mod alignment;
pub mod checkpoint;
pub mod empirical_stats;
pub mod error;
pub mod model;
pub mod model_params;
pub mod model_registry;
pub mod partition;
pub mod partition_descriptor;
pub mod site_patterns;
pub mod state_code;
pub mod substitution_model;
pub mod tree;

lazy_static! {
    // Built-in substitution-matrix catalog
    pub static ref SUBSTITUTION_MATRICES: Vec<SubstitutionMatrix> =
        SubstitutionMatrix::builtin_catalog();
}
