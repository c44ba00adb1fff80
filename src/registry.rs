use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::ModelDescriptor;
use crate::model_core::{
    artifact, ClassifierArtifact, ExplainerArtifact, ModelEntry, Preprocessing, PreprocessingMode,
    PreprocessorArtifact,
};
use crate::schema::{FeatureSchema, SchemaVariant};
use crate::utils::{EngineError, Result, StandardScaler};

/// Listing entry for one successfully loaded model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub variant: SchemaVariant,
}

/// Outcome of loading one descriptor
#[derive(Debug)]
enum LoadOutcome {
    Loaded(ModelEntry),
    Failed { name: String, reason: EngineError },
}

/// The set of named model entries, read-only after `load`
///
/// Built explicitly once at startup and passed by reference into request
/// handlers; there is no ambient global registry.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    entries: HashMap<String, ModelEntry>,
}

impl ModelRegistry {
    /// Load every descriptor, skipping entries whose artifacts fail to load
    ///
    /// One bad descriptor never prevents the rest from loading; failures
    /// are logged and the entry is simply absent from the registry.
    pub fn load(descriptors: &[ModelDescriptor]) -> Self {
        let mut entries = HashMap::new();
        for descriptor in descriptors {
            match build_entry(descriptor) {
                LoadOutcome::Loaded(entry) => {
                    tracing::info!(
                        model = %entry.name(),
                        variant = %entry.schema().variant(),
                        "model loaded"
                    );
                    entries.insert(entry.name().to_string(), entry);
                }
                LoadOutcome::Failed { name, reason } => {
                    tracing::warn!(model = %name, error = %reason, "skipping model");
                }
            }
        }
        Self { entries }
    }

    /// Look up a model by registry name
    pub fn get(&self, name: &str) -> Result<&ModelEntry> {
        self.entries
            .get(name)
            .ok_or_else(|| EngineError::ModelNotFound(name.to_string()))
    }

    /// Listing of all successfully loaded entries, sorted by name
    pub fn list_info(&self) -> Vec<ModelInfo> {
        let mut infos: Vec<ModelInfo> = self
            .entries
            .values()
            .map(|entry| ModelInfo {
                name: entry.name().to_string(),
                display_name: entry.display_name().to_string(),
                description: entry.description().to_string(),
                variant: entry.schema().variant(),
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Number of loaded entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Construct one entry from its descriptor, loading all artifacts
fn build_entry(descriptor: &ModelDescriptor) -> LoadOutcome {
    match try_build_entry(descriptor) {
        Ok(entry) => LoadOutcome::Loaded(entry),
        Err(reason) => LoadOutcome::Failed {
            name: descriptor.name.clone(),
            reason,
        },
    }
}

fn try_build_entry(descriptor: &ModelDescriptor) -> Result<ModelEntry> {
    let schema = FeatureSchema::for_variant(descriptor.variant);
    let classifier: ClassifierArtifact = artifact::load_json(&descriptor.classifier)?;

    let preprocessing = match descriptor.preprocessing {
        PreprocessingMode::ManualFill => {
            let scaler: Option<StandardScaler> = descriptor
                .scaler
                .as_deref()
                .map(artifact::load_json)
                .transpose()?;
            Preprocessing::ManualFill { scaler }
        }
        PreprocessingMode::Embedded => {
            let path = descriptor.preprocessor.as_deref().ok_or_else(|| {
                EngineError::Config(format!(
                    "model '{}' uses embedded preprocessing but names no preprocessor",
                    descriptor.name
                ))
            })?;
            let preprocessor: PreprocessorArtifact = artifact::load_json(path)?;
            Preprocessing::Embedded { preprocessor }
        }
    };

    let explainer: Option<ExplainerArtifact> = descriptor
        .explainer
        .as_deref()
        .map(artifact::load_json)
        .transpose()?;

    Ok(ModelEntry::new(
        &descriptor.name,
        &descriptor.display_name,
        &descriptor.description,
        schema,
        preprocessing,
        classifier,
        explainer,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn write_linear_classifier(dir: &Path, file: &str, n: usize) -> PathBuf {
        let path = dir.join(file);
        let body = serde_json::json!({
            "kind": "linear",
            "coefficients": vec![0.0; n],
            "intercept": 0.5,
        });
        fs::write(&path, body.to_string()).unwrap();
        path
    }

    fn descriptor(name: &str, classifier: PathBuf) -> ModelDescriptor {
        ModelDescriptor {
            name: name.to_string(),
            display_name: format!("Model {}", name),
            description: String::new(),
            variant: SchemaVariant::Initial,
            preprocessing: PreprocessingMode::ManualFill,
            classifier,
            scaler: None,
            preprocessor: None,
            explainer: None,
        }
    }

    #[test]
    fn test_load_tolerates_bad_descriptor() {
        let dir = TempDir::new().unwrap();
        let good = write_linear_classifier(dir.path(), "good.json", 13);
        let descriptors = vec![
            descriptor("good", good),
            descriptor("bad", dir.path().join("does_not_exist.json")),
        ];

        let registry = ModelRegistry::load(&descriptors);
        assert_eq!(registry.len(), 1);
        assert!(registry.get("good").is_ok());
        assert!(matches!(
            registry.get("bad"),
            Err(EngineError::ModelNotFound(_))
        ));
    }

    #[test]
    fn test_get_unknown_model() {
        let registry = ModelRegistry::load(&[]);
        assert!(registry.is_empty());
        assert!(matches!(
            registry.get("nope"),
            Err(EngineError::ModelNotFound(_))
        ));
    }

    #[test]
    fn test_list_info_sorted_by_name() {
        let dir = TempDir::new().unwrap();
        let clf = write_linear_classifier(dir.path(), "clf.json", 13);
        let descriptors = vec![
            descriptor("zeta", clf.clone()),
            descriptor("alpha", clf.clone()),
            descriptor("mid", clf),
        ];

        let registry = ModelRegistry::load(&descriptors);
        let names: Vec<String> = registry.list_info().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_embedded_without_preprocessor_is_skipped() {
        let dir = TempDir::new().unwrap();
        let clf = write_linear_classifier(dir.path(), "clf.json", 13);
        let mut bad = descriptor("embedded", clf);
        bad.preprocessing = PreprocessingMode::Embedded;

        let registry = ModelRegistry::load(&[bad]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unreadable_explainer_skips_entry() {
        let dir = TempDir::new().unwrap();
        let clf = write_linear_classifier(dir.path(), "clf.json", 13);
        let mut with_explainer = descriptor("explained", clf);
        with_explainer.explainer = Some(dir.path().join("missing_explainer.json"));

        let registry = ModelRegistry::load(&[with_explainer]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_loaded_entry_predicts() {
        let dir = TempDir::new().unwrap();
        let clf = write_linear_classifier(dir.path(), "clf.json", 13);
        let registry = ModelRegistry::load(&[descriptor("m", clf)]);

        let entry = registry.get("m").unwrap();
        let result = entry.predict(&Map::new()).unwrap();
        // All-zero coefficients: probability is sigmoid(0.5)
        assert!((result.probability - crate::utils::sigmoid(0.5)).abs() < 1e-12);
        assert_eq!(result.label, 1);
    }

    #[test]
    fn test_duplicate_names_keep_last() {
        let dir = TempDir::new().unwrap();
        let clf = write_linear_classifier(dir.path(), "clf.json", 13);
        let mut second = descriptor("dup", clf.clone());
        second.display_name = "Second".to_string();
        let registry = ModelRegistry::load(&[descriptor("dup", clf), second]);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("dup").unwrap().display_name(), "Second");
    }
}
