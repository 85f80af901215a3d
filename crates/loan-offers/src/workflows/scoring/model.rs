//! Pre-trained classifier artifacts and the inference seam used by the scoring service.
//!
//! Artifacts are exported by the training pipeline as JSON documents tagged by `kind`.
//! Every model records the exact column order it was trained with and refuses rows laid
//! out differently.

use serde::{Deserialize, Serialize};

use super::features::OrderedFeatureVector;

/// Anything able to produce P(positive class) for a single ordered row.
pub trait ProbabilityModel: Send + Sync {
    fn predict_proba(&self, row: &OrderedFeatureVector) -> Result<f64, InferenceError>;

    /// Short family name, e.g. `logistic` or `tree_ensemble`.
    fn model_type(&self) -> &str;

    fn feature_names(&self) -> &[String];
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    #[error("feature names mismatch: model expects {expected:?}, got {actual:?}")]
    ColumnMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },
    #[error("model produced a non-finite score")]
    NonFinite,
    #[error("malformed model: {0}")]
    Malformed(String),
}

/// Serialized classifier, dispatching on the `kind` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Logistic(LogisticModel),
    TreeEnsemble(TreeEnsemble),
}

impl ModelArtifact {
    fn inner(&self) -> &dyn ProbabilityModel {
        match self {
            ModelArtifact::Logistic(model) => model,
            ModelArtifact::TreeEnsemble(model) => model,
        }
    }

    /// Full structural validation, run once when the artifact is loaded. Inference only
    /// re-checks the widths and nodes it actually touches.
    pub fn check(&self) -> Result<(), InferenceError> {
        match self {
            ModelArtifact::Logistic(model) => model.check(),
            ModelArtifact::TreeEnsemble(model) => model.check(),
        }
    }
}

impl ProbabilityModel for ModelArtifact {
    fn predict_proba(&self, row: &OrderedFeatureVector) -> Result<f64, InferenceError> {
        self.inner().predict_proba(row)
    }

    fn model_type(&self) -> &str {
        self.inner().model_type()
    }

    fn feature_names(&self) -> &[String] {
        self.inner().feature_names()
    }
}

/// Standardized logistic regression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler_mean: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler_scale: Option<Vec<f64>>,
}

impl LogisticModel {
    fn check(&self) -> Result<(), InferenceError> {
        self.check_widths()?;
        if let Some(scale) = &self.scaler_scale {
            if scale.iter().any(|value| *value == 0.0) {
                return Err(InferenceError::Malformed(
                    "scaler_scale contains a zero entry".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn check_widths(&self) -> Result<(), InferenceError> {
        let width = self.feature_names.len();
        if self.coefficients.len() != width {
            return Err(InferenceError::Malformed(format!(
                "{} coefficients for {} features",
                self.coefficients.len(),
                width
            )));
        }
        let scalers = [
            ("scaler_mean", &self.scaler_mean),
            ("scaler_scale", &self.scaler_scale),
        ];
        for (label, vector) in scalers {
            if let Some(values) = vector {
                if values.len() != width {
                    return Err(InferenceError::Malformed(format!(
                        "{label} has {} entries for {width} features",
                        values.len()
                    )));
                }
            }
        }
        Ok(())
    }

    fn standardized(&self, idx: usize, value: f64) -> f64 {
        let mean = self
            .scaler_mean
            .as_ref()
            .map(|values| values[idx])
            .unwrap_or(0.0);
        let scale = self
            .scaler_scale
            .as_ref()
            .map(|values| values[idx])
            .unwrap_or(1.0);
        (value - mean) / scale
    }
}

impl ProbabilityModel for LogisticModel {
    fn predict_proba(&self, row: &OrderedFeatureVector) -> Result<f64, InferenceError> {
        ensure_columns(&self.feature_names, row)?;
        // Length checks only; a zero scale surfaces as a non-finite margin.
        self.check_widths()?;

        let z = row
            .values()
            .iter()
            .zip(&self.coefficients)
            .enumerate()
            .fold(self.intercept, |acc, (idx, (value, weight))| {
                acc + weight * self.standardized(idx, *value)
            });

        probability_from_margin(z)
    }

    fn model_type(&self) -> &str {
        "logistic"
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }
}

/// Boosted binary-logistic regression trees; the margin is `base_score` plus every tree's leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<RegressionTree>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Leaf {
        leaf: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        #[serde(default)]
        missing: Option<usize>,
    },
}

impl TreeEnsemble {
    fn check(&self) -> Result<(), InferenceError> {
        let width = self.feature_names.len();
        for (tree_idx, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(InferenceError::Malformed(format!("tree {tree_idx} has no nodes")));
            }
            for (node_idx, node) in tree.nodes.iter().enumerate() {
                if let TreeNode::Split {
                    feature,
                    left,
                    right,
                    missing,
                    ..
                } = node
                {
                    let children = [Some(*left), Some(*right), *missing];
                    let bad_child = children
                        .into_iter()
                        .flatten()
                        .any(|child| child <= node_idx || child >= tree.nodes.len());
                    if *feature >= width || bad_child {
                        return Err(InferenceError::Malformed(format!(
                            "tree {tree_idx} node {node_idx} references an invalid feature or child"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Walks one tree, checking only the nodes on the visited path.
    fn leaf_value(tree: &RegressionTree, values: &[f64]) -> Result<f64, InferenceError> {
        let mut idx = 0;
        loop {
            let node = tree.nodes.get(idx).ok_or_else(|| {
                InferenceError::Malformed(format!("node {idx} is out of range"))
            })?;
            match node {
                TreeNode::Leaf { leaf } => return Ok(*leaf),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    missing,
                } => {
                    let value = *values.get(*feature).ok_or_else(|| {
                        InferenceError::Malformed(format!(
                            "node {idx} splits on unknown feature {feature}"
                        ))
                    })?;
                    let next = if value.is_nan() {
                        missing.unwrap_or(*left)
                    } else if value < *threshold {
                        *left
                    } else {
                        *right
                    };
                    if next <= idx {
                        return Err(InferenceError::Malformed(format!(
                            "node {idx} points back to node {next}"
                        )));
                    }
                    idx = next;
                }
            }
        }
    }
}

impl ProbabilityModel for TreeEnsemble {
    fn predict_proba(&self, row: &OrderedFeatureVector) -> Result<f64, InferenceError> {
        ensure_columns(&self.feature_names, row)?;

        let mut margin = self.base_score;
        for tree in &self.trees {
            margin += Self::leaf_value(tree, row.values())?;
        }

        probability_from_margin(margin)
    }

    fn model_type(&self) -> &str {
        "tree_ensemble"
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }
}

fn ensure_columns(expected: &[String], row: &OrderedFeatureVector) -> Result<(), InferenceError> {
    if expected == row.columns() {
        Ok(())
    } else {
        Err(InferenceError::ColumnMismatch {
            expected: expected.to_vec(),
            actual: row.columns().to_vec(),
        })
    }
}

fn probability_from_margin(margin: f64) -> Result<f64, InferenceError> {
    if !margin.is_finite() {
        return Err(InferenceError::NonFinite);
    }
    Ok(1.0 / (1.0 + (-margin).exp()))
}
