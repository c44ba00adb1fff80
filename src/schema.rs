use std::collections::{HashMap, HashSet};

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Features collected at disease onset, in the order the artifacts were fit on
pub const INITIAL_FEATURE_NAMES: [&str; 13] = [
    "age_onset",
    "heredity",
    "smoking_status",
    "sex",
    "us1_thyroid_volume",
    "us1_nodules",
    "us1_nodules_cm",
    "tsh_1",
    "ft4_1",
    "ft3_1",
    "ft3_to_ft4_ratio",
    "exophthalmos",
    "thyrotoxic_cardiomyopathy",
];

/// Follow-up features appended after treatment; the full feature list is
/// the initial list plus these, in this order
pub const FOLLOW_UP_FEATURE_NAMES: [&str; 5] = [
    "treatment_type",
    "tsh_3",
    "us3_thyroid_volume",
    "us3_nodules",
    "us3_nodules_cm",
];

/// Categorical features; everything else is numeric
pub const CATEGORICAL_FEATURE_NAMES: [&str; 8] = [
    "heredity",
    "smoking_status",
    "sex",
    "us1_nodules",
    "exophthalmos",
    "thyrotoxic_cardiomyopathy",
    "treatment_type",
    "us3_nodules",
];

/// Which clinical stage a schema covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaVariant {
    /// Onset features only
    Initial,
    /// Onset plus follow-up features
    Full,
}

impl SchemaVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaVariant::Initial => "initial",
            SchemaVariant::Full => "follow-up",
        }
    }
}

impl std::fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Canonical ordered feature list and categorical/numeric partition for one
/// clinical stage
///
/// Feature order is load-bearing: it must match the order the model and
/// scaler artifacts were fit on.
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    variant: SchemaVariant,
    features: Vec<String>,
    categorical: HashSet<String>,
    numeric_positions: Vec<usize>,
}

impl FeatureSchema {
    /// Build the schema for a clinical stage
    pub fn for_variant(variant: SchemaVariant) -> Self {
        let features: Vec<String> = match variant {
            SchemaVariant::Initial => {
                INITIAL_FEATURE_NAMES.iter().map(|s| s.to_string()).collect()
            }
            SchemaVariant::Full => INITIAL_FEATURE_NAMES
                .iter()
                .chain(FOLLOW_UP_FEATURE_NAMES.iter())
                .map(|s| s.to_string())
                .collect(),
        };
        let categorical: HashSet<String> = CATEGORICAL_FEATURE_NAMES
            .iter()
            .filter(|name| features.iter().any(|f| f == *name))
            .map(|s| s.to_string())
            .collect();
        // Computed once here, never recomputed per request
        let numeric_positions = features
            .iter()
            .enumerate()
            .filter(|(_, name)| !categorical.contains(*name))
            .map(|(i, _)| i)
            .collect();

        Self {
            variant,
            features,
            categorical,
            numeric_positions,
        }
    }

    pub fn variant(&self) -> SchemaVariant {
        self.variant
    }

    /// Feature names in canonical order
    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// Number of features
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Positions of the numeric features within the feature vector, in
    /// schema order (matches the column order scalers were fit on)
    pub fn numeric_positions(&self) -> &[usize] {
        &self.numeric_positions
    }

    pub fn is_categorical(&self, name: &str) -> bool {
        self.categorical.contains(name)
    }

    /// Build the ordered feature vector from a raw name -> value map
    ///
    /// Total function: absent or non-finite entries become `sentinel`, the
    /// output always has exactly `len()` positions in schema order.
    pub fn extract(&self, raw: &HashMap<String, f64>, sentinel: f64) -> Array1<f64> {
        Array1::from_iter(self.features.iter().map(|name| {
            raw.get(name)
                .copied()
                .filter(|v| v.is_finite())
                .unwrap_or(sentinel)
        }))
    }
}
