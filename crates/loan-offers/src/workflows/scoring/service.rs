use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::artifacts::{load_metadata, load_model, ArtifactError, ModelMetadata};
use super::decision::{decide, ScoringResult, ThresholdSet};
use super::features::{validate, FeatureVector, ValidationError};
use super::model::{InferenceError, ProbabilityModel};
use crate::config::ArtifactConfig;

/// Body accepted by `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    pub features: FeatureVector,
}

/// Metadata echoed verbatim from the loaded artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetaEcho {
    pub model_type: Option<String>,
    pub created_at: Option<String>,
}

/// Body returned by `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    #[serde(flatten)]
    pub result: ScoringResult,
    pub meta: ModelMetaEcho,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Prediction failed: {0}")]
    Inference(#[from] InferenceError),
}

/// Read-only scoring state shared by every request handler.
pub struct ScoringService {
    model: Arc<dyn ProbabilityModel>,
    thresholds: ThresholdSet,
    required_features: Vec<String>,
    meta: ModelMetaEcho,
}

impl std::fmt::Debug for ScoringService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoringService")
            .field("thresholds", &self.thresholds)
            .field("required_features", &self.required_features)
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

impl ScoringService {
    pub fn new(model: Arc<dyn ProbabilityModel>, metadata: ModelMetadata) -> Self {
        let thresholds = metadata.thresholds();
        let required_features = metadata.required_features().to_vec();
        let meta = ModelMetaEcho {
            model_type: metadata.model_type,
            created_at: metadata.created_at,
        };

        Self {
            model,
            thresholds,
            required_features,
            meta,
        }
    }

    /// Loads the model and metadata from disk. Any failure here should stop the process.
    pub fn load(config: &ArtifactConfig) -> Result<Self, ArtifactError> {
        let model = load_model(&config.model_path)?;
        let metadata = load_metadata(&config.metadata_path)?;

        if metadata.required_features().is_empty() {
            warn!(
                path = %config.metadata_path.display(),
                "metadata lists no training features; requests will not be validated"
            );
        }

        info!(
            model_kind = model.model_type(),
            model_type = metadata.model_type.as_deref().unwrap_or("unknown"),
            features = metadata.required_features().len(),
            "loaded scoring artifacts"
        );

        Ok(Self::new(Arc::new(model), metadata))
    }

    pub fn thresholds(&self) -> &ThresholdSet {
        &self.thresholds
    }

    pub fn required_features(&self) -> &[String] {
        &self.required_features
    }

    pub fn meta(&self) -> &ModelMetaEcho {
        &self.meta
    }

    pub fn model(&self) -> &dyn ProbabilityModel {
        self.model.as_ref()
    }

    /// Probability of the positive class for one validated feature mapping.
    pub fn probability(&self, features: &FeatureVector) -> Result<f64, ScoringError> {
        let row = validate(features, &self.required_features)?;
        let probability = self.model.predict_proba(&row)?;
        Ok(probability)
    }

    pub fn predict(&self, request: &PredictRequest) -> Result<PredictResponse, ScoringError> {
        let probability = match self.probability(&request.features) {
            Ok(probability) => probability,
            Err(err) => {
                warn!(error = %err, "prediction rejected");
                return Err(err);
            }
        };

        let result = decide(probability, &self.thresholds);
        debug!(probability, tier = %result.tier(), "prediction scored");

        Ok(PredictResponse {
            result,
            meta: self.meta.clone(),
        })
    }
}
