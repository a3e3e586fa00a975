mod bitset;
mod scanner;

// Modules
pub mod constants;
pub mod decision;
pub mod ensemble;
pub mod errors;
pub mod metadata;
pub mod node;
pub mod reader;
pub mod tree;
pub mod utils;

// Individual classes, and functions
pub use ensemble::{Ensemble, ImportanceMethod};
pub use errors::ModelTextError;
pub use metadata::{extract_feature_count, extract_parameters};
pub use reader::{build_ensemble, EnsembleReader};
