use std::fs;
use std::path::Path;

use ndarray::Array1;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::utils::{sigmoid, EngineError, Result, StandardScaler};

/// Decision threshold for the positive class
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Load a JSON-serialized artifact from disk
///
/// All artifact files are serde JSON; a missing or unparseable file maps to
/// `EngineError::ArtifactLoad` so the registry can skip the entry.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read_to_string(path)
        .map_err(|e| EngineError::ArtifactLoad(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&data)
        .map_err(|e| EngineError::ArtifactLoad(format!("{}: {}", path.display(), e)))
}

/// One node of a trained decision tree
///
/// Split nodes carry the class distribution of the training samples that
/// reached them, which path attribution needs; leaves carry the final
/// per-class distribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        value: Vec<f64>,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
    Leaf {
        value: Vec<f64>,
    },
}

impl TreeNode {
    /// Per-class distribution at this node
    pub fn value(&self) -> &[f64] {
        match self {
            TreeNode::Split { value, .. } => value,
            TreeNode::Leaf { value } => value,
        }
    }

    /// Walk to the leaf selected by `row`
    fn leaf_for(&self, row: &Array1<f64>) -> Result<&TreeNode> {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { .. } => return Ok(node),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    let value = *row.get(*feature).ok_or_else(|| {
                        EngineError::ArtifactUnavailable(format!(
                            "tree references feature {} but row has {} columns",
                            feature,
                            row.len()
                        ))
                    })?;
                    node = if value <= *threshold { left } else { right };
                }
            }
        }
    }
}

/// A trained binary classifier artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierArtifact {
    /// Logistic-regression-style linear model in log-odds space
    Linear {
        coefficients: Vec<f64>,
        intercept: f64,
    },
    /// Probability-averaging tree ensemble; leaves hold [p_class0, p_class1]
    TreeEnsemble { trees: Vec<TreeNode> },
}

impl ClassifierArtifact {
    /// Probability of the positive class for one preprocessed row
    pub fn predict_probability(&self, row: &Array1<f64>) -> Result<f64> {
        match self {
            ClassifierArtifact::Linear {
                coefficients,
                intercept,
            } => {
                if coefficients.len() != row.len() {
                    return Err(EngineError::ArtifactUnavailable(format!(
                        "classifier expects {} features, got {}",
                        coefficients.len(),
                        row.len()
                    )));
                }
                let log_odds: f64 = coefficients
                    .iter()
                    .zip(row.iter())
                    .map(|(w, x)| w * x)
                    .sum::<f64>()
                    + intercept;
                Ok(sigmoid(log_odds))
            }
            ClassifierArtifact::TreeEnsemble { trees } => {
                if trees.is_empty() {
                    return Err(EngineError::ArtifactUnavailable(
                        "tree ensemble has no trees".to_string(),
                    ));
                }
                let mut total = 0.0;
                for tree in trees {
                    let leaf = tree.leaf_for(row)?;
                    total += positive_class(leaf.value())?;
                }
                Ok(total / trees.len() as f64)
            }
        }
    }

    /// Predicted label under the documented decision threshold
    pub fn predict_label(&self, row: &Array1<f64>) -> Result<u8> {
        Ok(u8::from(self.predict_probability(row)? >= DECISION_THRESHOLD))
    }
}

/// Whole-row preprocessor for embedded-mode models
///
/// A single transform performing both missing-value imputation (consuming
/// the NaN marker) and standard scaling, mirroring a fitted pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessorArtifact {
    /// Per-column imputation value substituted for the missing marker
    pub impute: Vec<f64>,
    /// Fitted scaler over the whole row
    pub scaler: StandardScaler,
}

impl PreprocessorArtifact {
    fn check_row(&self, row: &Array1<f64>) -> Result<()> {
        if self.impute.len() != row.len() {
            return Err(EngineError::ArtifactUnavailable(format!(
                "preprocessor expects {} columns, got {}",
                self.impute.len(),
                row.len()
            )));
        }
        Ok(())
    }

    /// Replace missing markers (NaN) with the fitted imputation values
    pub fn impute(&self, row: &mut Array1<f64>) -> Result<()> {
        self.check_row(row)?;
        for (i, value) in row.iter_mut().enumerate() {
            if value.is_nan() {
                *value = self.impute[i];
            }
        }
        Ok(())
    }

    /// Scale the whole row with the fitted scaler
    pub fn scale(&self, row: &mut Array1<f64>) -> Result<()> {
        self.scaler.transform_row(row)
    }

    /// The combined transform: impute, then scale
    pub fn transform(&self, row: &mut Array1<f64>) -> Result<()> {
        self.impute(row)?;
        self.scale(row)
    }
}

/// Shape of the contributions an explainer emits, resolved once at load time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributionShape {
    /// One contribution vector expressing the positive-class effect directly,
    /// in log-odds space around a scalar base value
    Binary,
    /// One contribution vector per class, already in probability units,
    /// with a per-class base vector
    Multiclass,
}

/// Raw explainer output before positive-class normalization
#[derive(Debug, Clone)]
pub enum Contributions {
    Binary { values: Vec<f64>, base: f64 },
    PerClass { values: Vec<Vec<f64>>, base: Vec<f64> },
}

/// A trained explainer artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExplainerArtifact {
    /// Additive log-odds explainer for linear models:
    /// contribution_i = w_i * (x_i - background_i)
    LinearLogOdds {
        coefficients: Vec<f64>,
        intercept: f64,
        background: Vec<f64>,
    },
    /// Path attribution over a probability tree ensemble: split-by-split
    /// value deltas credited to the split feature, one vector per class
    TreePath { trees: Vec<TreeNode> },
}

impl ExplainerArtifact {
    /// Contribution shape this artifact produces
    pub fn shape(&self) -> AttributionShape {
        match self {
            ExplainerArtifact::LinearLogOdds { .. } => AttributionShape::Binary,
            ExplainerArtifact::TreePath { .. } => AttributionShape::Multiclass,
        }
    }

    /// Per-feature contributions for one preprocessed row
    pub fn explain(&self, row: &Array1<f64>) -> Result<Contributions> {
        match self {
            ExplainerArtifact::LinearLogOdds {
                coefficients,
                intercept,
                background,
            } => {
                if coefficients.len() != row.len() || background.len() != row.len() {
                    return Err(EngineError::ExplainerUnavailable(format!(
                        "explainer expects {} features, got {}",
                        coefficients.len(),
                        row.len()
                    )));
                }
                let values: Vec<f64> = coefficients
                    .iter()
                    .zip(row.iter().zip(background.iter()))
                    .map(|(w, (x, bg))| w * (x - bg))
                    .collect();
                let base: f64 = coefficients
                    .iter()
                    .zip(background.iter())
                    .map(|(w, bg)| w * bg)
                    .sum::<f64>()
                    + intercept;
                Ok(Contributions::Binary { values, base })
            }
            ExplainerArtifact::TreePath { trees } => {
                if trees.is_empty() {
                    return Err(EngineError::ExplainerUnavailable(
                        "tree path explainer has no trees".to_string(),
                    ));
                }
                let n_classes = trees[0].value().len();
                let mut values = vec![vec![0.0; row.len()]; n_classes];
                let mut base = vec![0.0; n_classes];

                for tree in trees {
                    if tree.value().len() != n_classes {
                        return Err(EngineError::ExplainerUnavailable(
                            "inconsistent class count across trees".to_string(),
                        ));
                    }
                    for (class, b) in base.iter_mut().enumerate() {
                        *b += tree.value()[class];
                    }
                    accumulate_path(tree, row, &mut values)?;
                }

                let n_trees = trees.len() as f64;
                for class_values in values.iter_mut() {
                    for v in class_values.iter_mut() {
                        *v /= n_trees;
                    }
                }
                for b in base.iter_mut() {
                    *b /= n_trees;
                }
                Ok(Contributions::PerClass { values, base })
            }
        }
    }
}

/// Credit each split's value delta to the split feature, walking the path
/// `row` takes through `tree`
fn accumulate_path(tree: &TreeNode, row: &Array1<f64>, values: &mut [Vec<f64>]) -> Result<()> {
    let mut node = tree;
    loop {
        match node {
            TreeNode::Leaf { .. } => return Ok(()),
            TreeNode::Split {
                feature,
                threshold,
                value,
                left,
                right,
            } => {
                let x = *row.get(*feature).ok_or_else(|| {
                    EngineError::ExplainerUnavailable(format!(
                        "tree references feature {} but row has {} columns",
                        feature,
                        row.len()
                    ))
                })?;
                let child: &TreeNode = if x <= *threshold { left } else { right };
                let child_value = child.value();
                if child_value.len() != value.len() {
                    return Err(EngineError::ExplainerUnavailable(
                        "inconsistent class count within tree".to_string(),
                    ));
                }
                for (class, class_values) in values.iter_mut().enumerate() {
                    class_values[*feature] += child_value[class] - value[class];
                }
                node = child;
            }
        }
    }
}

fn positive_class(distribution: &[f64]) -> Result<f64> {
    distribution.get(1).copied().ok_or_else(|| {
        EngineError::ArtifactUnavailable(format!(
            "leaf distribution has {} classes, need at least 2",
            distribution.len()
        ))
    })
}
