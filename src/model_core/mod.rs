/// Prediction pipeline core modules
pub mod artifact;
pub mod entry;
pub mod explain;

// Re-export commonly used types
pub use artifact::{
    AttributionShape, ClassifierArtifact, Contributions, ExplainerArtifact, PreprocessorArtifact,
    TreeNode, DECISION_THRESHOLD,
};
pub use entry::{ModelEntry, Preprocessing, PreprocessingMode, MANUAL_FILL_SENTINEL};
pub use explain::{Attribution, PredictionResult};
