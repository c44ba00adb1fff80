//! Clinical Risk Engine - model registry and inference for pre-trained
//! tabular clinical-risk models
//!
//! This library serves binary-classification predictions with probability
//! output and per-feature explanations. Models are loaded once into a
//! read-only registry and run a fixed pipeline per request: feature
//! extraction, missing-value policy, preprocessing, prediction and
//! attribution.

pub mod config;
pub mod model_core;
pub mod patients;
pub mod registry;
pub mod schema;
pub mod server;
pub mod utils;

pub use config::{EngineConfig, ModelDescriptor};
pub use model_core::{Attribution, ModelEntry, PredictionResult, PreprocessingMode};
pub use patients::{PatientRecord, PatientStore};
pub use registry::{ModelInfo, ModelRegistry};
pub use schema::{FeatureSchema, SchemaVariant};
pub use utils::{EngineError, Result};
