use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::workflows::scoring::{
    FeatureVector, InferenceError, ModelMetadata, OrderedFeatureVector, PredictRequest,
    ProbabilityModel, ScoringService, ThresholdSet,
};

/// Returns the row's `score` column as the probability, after the usual column check.
pub(super) struct EchoModel {
    pub(super) feature_names: Vec<String>,
}

impl ProbabilityModel for EchoModel {
    fn predict_proba(&self, row: &OrderedFeatureVector) -> Result<f64, InferenceError> {
        if row.columns() != self.feature_names.as_slice() {
            return Err(InferenceError::ColumnMismatch {
                expected: self.feature_names.clone(),
                actual: row.columns().to_vec(),
            });
        }
        row.columns()
            .iter()
            .position(|name| name == "score")
            .map(|idx| row.values()[idx])
            .ok_or_else(|| InferenceError::Malformed("no score column".to_string()))
    }

    fn model_type(&self) -> &str {
        "echo"
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }
}

pub(super) fn columns() -> Vec<String> {
    vec!["Income".to_string(), "score".to_string()]
}

pub(super) fn metadata() -> ModelMetadata {
    ModelMetadata {
        thresholds: Some(ThresholdSet {
            standard: 0.5,
            high_recall: 0.3,
            vip_promo: 0.8,
        }),
        features: Some(columns()),
        model_type: Some("xgboost".to_string()),
        created_at: Some("2025-06-01T12:00:00Z".to_string()),
    }
}

pub(super) fn build_service_with(metadata: ModelMetadata) -> ScoringService {
    let model = EchoModel {
        feature_names: metadata
            .features
            .clone()
            .unwrap_or_else(|| vec!["score".to_string()]),
    };
    ScoringService::new(Arc::new(model), metadata)
}

pub(super) fn build_service() -> Arc<ScoringService> {
    Arc::new(build_service_with(metadata()))
}

pub(super) fn request(score: f64) -> PredictRequest {
    PredictRequest {
        features: [("Income", 110.0), ("score", score)].into_iter().collect(),
    }
}

pub(super) fn request_with(features: FeatureVector) -> PredictRequest {
    PredictRequest { features }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&bytes).expect("json body")
}
