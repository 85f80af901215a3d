use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::decision::{ThresholdSet, Tier};
use super::model::{InferenceError, ModelArtifact};

/// Training-time metadata persisted next to the model artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    #[serde(default)]
    pub thresholds: Option<ThresholdSet>,
    #[serde(default)]
    pub features: Option<Vec<String>>,
    #[serde(default)]
    pub model_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl ModelMetadata {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, serde_json::Error> {
        serde_json::from_reader(reader)
    }

    pub fn thresholds(&self) -> ThresholdSet {
        self.thresholds.unwrap_or_default()
    }

    /// Ordered training columns; empty when the metadata does not record them.
    pub fn required_features(&self) -> &[String] {
        self.features.as_deref().unwrap_or_default()
    }
}

/// Startup failure while loading the model or its metadata.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("artifact not found: {}", path.display())]
    Missing { path: PathBuf },
    #[error("failed to read artifact {}: {source}", path.display())]
    Unreadable { path: PathBuf, source: io::Error },
    #[error("failed to parse artifact {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid model artifact {}: {source}", path.display())]
    InvalidModel {
        path: PathBuf,
        source: InferenceError,
    },
    #[error("threshold for {tier} must be within [0, 1], got {value}")]
    ThresholdOutOfRange { tier: Tier, value: f64 },
}

pub fn load_metadata(path: &Path) -> Result<ModelMetadata, ArtifactError> {
    let reader = open(path)?;
    let metadata = ModelMetadata::from_reader(reader).map_err(|source| ArtifactError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some((tier, value)) = metadata.thresholds().out_of_range() {
        return Err(ArtifactError::ThresholdOutOfRange { tier, value });
    }

    Ok(metadata)
}

pub fn load_model(path: &Path) -> Result<ModelArtifact, ArtifactError> {
    let reader = open(path)?;
    let artifact: ModelArtifact =
        serde_json::from_reader(reader).map_err(|source| ArtifactError::Corrupt {
            path: path.to_path_buf(),
            source,
        })?;

    artifact
        .check()
        .map_err(|source| ArtifactError::InvalidModel {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(artifact)
}

fn open(path: &Path) -> Result<BufReader<File>, ArtifactError> {
    match File::open(path) {
        Ok(file) => Ok(BufReader::new(file)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err(ArtifactError::Missing {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(ArtifactError::Unreadable {
            path: path.to_path_buf(),
            source,
        }),
    }
}
