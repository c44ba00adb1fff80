use std::collections::HashMap;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::model_core::artifact::{
    AttributionShape, ClassifierArtifact, ExplainerArtifact, PreprocessorArtifact,
    DECISION_THRESHOLD,
};
use crate::model_core::explain::{self, PredictionResult};
use crate::schema::FeatureSchema;
use crate::utils::{Result, StandardScaler};

/// Sentinel substituted for missing features when filling manually
pub const MANUAL_FILL_SENTINEL: f64 = -1.0;

/// How missing values and scaling are handled before prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreprocessingMode {
    /// Missing features become a fixed sentinel; an optional scaler is
    /// applied to the numeric columns only, categoricals pass through
    ManualFill,
    /// Missing features become a NaN marker consumed by a single
    /// whole-row transform that imputes and scales together
    Embedded,
}

/// Preprocessing state attached to one model entry
///
/// The variant encodes the mode invariant directly: embedded entries never
/// run a manual fill step, manual-fill entries never impute.
#[derive(Debug, Clone)]
pub enum Preprocessing {
    ManualFill { scaler: Option<StandardScaler> },
    Embedded { preprocessor: PreprocessorArtifact },
}

impl Preprocessing {
    pub fn mode(&self) -> PreprocessingMode {
        match self {
            Preprocessing::ManualFill { .. } => PreprocessingMode::ManualFill,
            Preprocessing::Embedded { .. } => PreprocessingMode::Embedded,
        }
    }

    /// Value substituted for absent features during extraction
    fn sentinel(&self) -> f64 {
        match self {
            Preprocessing::ManualFill { .. } => MANUAL_FILL_SENTINEL,
            Preprocessing::Embedded { .. } => f64::NAN,
        }
    }
}

/// One named model variant: schema, artifacts and display metadata
///
/// Entries are built once at registry load and are immutable afterwards;
/// `predict` takes `&self` and holds no mutable state, so concurrent
/// requests need no coordination.
#[derive(Debug, Clone)]
pub struct ModelEntry {
    name: String,
    display_name: String,
    description: String,
    schema: FeatureSchema,
    preprocessing: Preprocessing,
    classifier: ClassifierArtifact,
    explainer: Option<ExplainerArtifact>,
    attribution_shape: Option<AttributionShape>,
}

impl ModelEntry {
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
        schema: FeatureSchema,
        preprocessing: Preprocessing,
        classifier: ClassifierArtifact,
        explainer: Option<ExplainerArtifact>,
    ) -> Self {
        // Shape is resolved once here, never re-detected per request
        let attribution_shape = explainer.as_ref().map(ExplainerArtifact::shape);
        Self {
            name: name.into(),
            display_name: display_name.into(),
            description: description.into(),
            schema,
            preprocessing,
            classifier,
            explainer,
            attribution_shape,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn mode(&self) -> PreprocessingMode {
        self.preprocessing.mode()
    }

    pub fn attribution_shape(&self) -> Option<AttributionShape> {
        self.attribution_shape
    }

    /// Run the full pipeline for one raw feature map:
    /// extraction, missing-value policy, preprocessing, prediction and,
    /// when a usable explainer is attached, attribution
    pub fn predict(&self, raw: &HashMap<String, f64>) -> Result<PredictionResult> {
        let mut raw_values = self.schema.extract(raw, self.preprocessing.sentinel());

        let row = match &self.preprocessing {
            Preprocessing::ManualFill { scaler } => {
                let mut row = raw_values.clone();
                if let Some(scaler) = scaler {
                    scaler.transform_subset(&mut row, self.schema.numeric_positions())?;
                }
                row
            }
            Preprocessing::Embedded { preprocessor } => {
                // Impute first so the reported attribution values are the
                // post-fill, pre-scaling ones
                preprocessor.impute(&mut raw_values)?;
                let mut row = raw_values.clone();
                preprocessor.scale(&mut row)?;
                row
            }
        };

        let probability = self.classifier.predict_probability(&row)?;
        let label = u8::from(probability >= DECISION_THRESHOLD);

        let (attributions, base_value) = match &self.explainer {
            None => (None, None),
            Some(explainer) => match self.attribute(explainer, &raw_values, &row) {
                Ok((attributions, base_value)) => (Some(attributions), Some(base_value)),
                // Non-fatal: the prediction stands, attribution is omitted
                Err(e) => {
                    tracing::warn!(model = %self.name, error = %e, "attribution skipped");
                    (None, None)
                }
            },
        };

        Ok(PredictionResult {
            label,
            probability,
            attributions,
            base_value,
        })
    }

    fn attribute(
        &self,
        explainer: &ExplainerArtifact,
        raw_values: &Array1<f64>,
        row: &Array1<f64>,
    ) -> Result<(Vec<explain::Attribution>, f64)> {
        let contributions = explainer.explain(row)?;
        explain::build_attributions(&self.schema, raw_values, contributions)
    }
}
