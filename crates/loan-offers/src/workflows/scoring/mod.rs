//! Threshold-based loan offer scoring: feature contract, model inference, and tier decisions.

mod artifacts;
pub mod decision;
pub mod evaluation;
pub mod features;
pub mod model;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use artifacts::{load_metadata, load_model, ArtifactError, ModelMetadata};
pub use decision::{decide, resolve_tier, ScoringResult, ThresholdSet, Tier, TierDecisions};
pub use evaluation::{evaluate_thresholds, EvaluationError, LabeledDataset, TierMetrics};
pub use features::{validate, FeatureVector, OrderedFeatureVector, ValidationError};
pub use model::{InferenceError, LogisticModel, ModelArtifact, ProbabilityModel, TreeEnsemble};
pub use router::scoring_router;
pub use service::{ModelMetaEcho, PredictRequest, PredictResponse, ScoringError, ScoringService};
