use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::model_core::artifact::Contributions;
use crate::schema::FeatureSchema;
use crate::utils::{sigmoid_slope, EngineError, Result};

/// Index of the positive class in per-class explainer output
const POSITIVE_CLASS: usize = 1;

/// A signed per-feature contribution to one prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attribution {
    /// Feature name
    pub feature: String,
    /// Post-fill, pre-scaling feature value
    pub value: f64,
    /// Signed contribution to the positive-class probability
    pub contribution: f64,
    /// Absolute contribution magnitude
    pub magnitude: f64,
}

/// Outcome of one prediction request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Predicted label, 0 or 1
    pub label: u8,
    /// Probability of the positive class
    pub probability: f64,
    /// Per-feature attributions, sorted by magnitude descending;
    /// absent when no usable explainer is attached
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributions: Option<Vec<Attribution>>,
    /// Explainer base/reference value for the positive class
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_value: Option<f64>,
}

/// Normalize raw explainer output into per-feature probability-space
/// contributions and build the sorted attribution list
///
/// Binary-shape contributions are log-odds deltas; they are mapped into
/// probability space with the derivative-of-sigmoid transform around the
/// base log-odds value. This is exact only for additive log-odds models
/// and is an approximation elsewhere. Multiclass-shape contributions are
/// already probability deltas, so the positive-class slice is taken as is.
///
/// # Arguments
/// * `schema` - Feature schema the contributions are indexed by
/// * `raw_values` - Post-fill, pre-scaling feature vector (schema order)
/// * `contributions` - Raw explainer output
///
/// # Returns
/// * `Ok((attributions, base_value))` sorted by magnitude descending,
///   ties keeping schema order
/// * `Err(EngineError::ExplainerUnavailable)` on any shape mismatch
pub fn build_attributions(
    schema: &FeatureSchema,
    raw_values: &Array1<f64>,
    contributions: Contributions,
) -> Result<(Vec<Attribution>, f64)> {
    let (per_feature, base_value) = match contributions {
        Contributions::Binary { values, base } => {
            let slope = sigmoid_slope(base);
            let scaled: Vec<f64> = values.iter().map(|v| v * slope).collect();
            (scaled, base)
        }
        Contributions::PerClass { mut values, base } => {
            if values.len() <= POSITIVE_CLASS || base.len() <= POSITIVE_CLASS {
                return Err(EngineError::ExplainerUnavailable(format!(
                    "per-class output has {} classes, need at least {}",
                    values.len().min(base.len()),
                    POSITIVE_CLASS + 1
                )));
            }
            (values.swap_remove(POSITIVE_CLASS), base[POSITIVE_CLASS])
        }
    };

    if per_feature.len() != schema.len() {
        return Err(EngineError::ExplainerUnavailable(format!(
            "explainer produced {} contributions for {} features",
            per_feature.len(),
            schema.len()
        )));
    }

    let mut attributions: Vec<Attribution> = schema
        .features()
        .iter()
        .zip(raw_values.iter().zip(per_feature.iter()))
        .map(|(name, (&value, &contribution))| Attribution {
            feature: name.clone(),
            value,
            contribution,
            magnitude: contribution.abs(),
        })
        .collect();

    // Stable sort keeps schema order for equal magnitudes
    attributions.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));

    Ok((attributions, base_value))
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::schema::SchemaVariant;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_magnitudes_non_increasing(
            values in proptest::collection::vec(-10.0f64..10.0, 13),
            base in -5.0f64..5.0,
        ) {
            let schema = FeatureSchema::for_variant(SchemaVariant::Initial);
            let raw = Array1::from_elem(13, 0.0);
            let (attributions, _) =
                build_attributions(&schema, &raw, Contributions::Binary { values, base }).unwrap();

            prop_assert_eq!(attributions.len(), 13);
            for pair in attributions.windows(2) {
                prop_assert!(pair[0].magnitude >= pair[1].magnitude);
            }
        }

        #[test]
        fn prop_magnitude_is_abs_contribution(
            values in proptest::collection::vec(-10.0f64..10.0, 13),
        ) {
            let schema = FeatureSchema::for_variant(SchemaVariant::Initial);
            let raw = Array1::from_elem(13, 0.0);
            let (attributions, _) =
                build_attributions(&schema, &raw, Contributions::Binary { values, base: 0.0 })
                    .unwrap();

            for attribution in attributions {
                prop_assert_eq!(attribution.magnitude, attribution.contribution.abs());
            }
        }
    }
}
