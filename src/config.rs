use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model_core::PreprocessingMode;
use crate::schema::SchemaVariant;
use crate::utils::{EngineError, Result};

/// Declarative description of one model entry to load at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Unique registry key
    pub name: String,
    /// Human-readable name for listings
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    /// Which feature schema the artifacts were fit on
    pub variant: SchemaVariant,
    /// How missing values and scaling are handled
    pub preprocessing: PreprocessingMode,
    /// Path to the classifier artifact file
    pub classifier: PathBuf,
    /// Path to the numeric-column scaler (manual_fill mode only)
    #[serde(default)]
    pub scaler: Option<PathBuf>,
    /// Path to the whole-row preprocessor (embedded mode only)
    #[serde(default)]
    pub preprocessor: Option<PathBuf>,
    /// Path to the explainer artifact, if the model ships one
    #[serde(default)]
    pub explainer: Option<PathBuf>,
}

/// Top-level engine configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Models to load into the registry
    pub models: Vec<ModelDescriptor>,
    /// Directory for the file-backed patient store
    #[serde(default = "default_patient_dir")]
    pub patient_storage_dir: PathBuf,
}

fn default_patient_dir() -> PathBuf {
    PathBuf::from("patient_storage")
}

impl EngineConfig {
    /// Load the configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&data)
            .map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))
    }
}
