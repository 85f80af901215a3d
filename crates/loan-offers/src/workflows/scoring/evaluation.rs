//! Offline threshold report over a held-out, already-preprocessed test split.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Serialize;

use super::decision::{decide, Tier};
use super::features::FeatureVector;
use super::service::{ScoringError, ScoringService};

/// Feature matrix read from CSV; columns keep the header order.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledDataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
    pub labels: Vec<bool>,
}

/// Classification quality of one tier's cutoff over the whole dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierMetrics {
    pub tier: Tier,
    pub threshold: f64,
    pub recall: f64,
    pub precision: f64,
    pub accuracy: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("row {row}, column '{column}': '{value}' is not a number")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },
    #[error("label row {row}: '{value}' is not 0 or 1")]
    InvalidLabel { row: usize, value: String },
    #[error("{features} feature rows but {labels} labels")]
    RowCountMismatch { features: usize, labels: usize },
    #[error("row {row}: {source}")]
    Scoring { row: usize, source: ScoringError },
}

impl LabeledDataset {
    pub fn from_paths(features: &Path, labels: &Path) -> Result<Self, EvaluationError> {
        Self::from_readers(open(features)?, open(labels)?)
    }

    pub fn from_readers<F: Read, L: Read>(features: F, labels: L) -> Result<Self, EvaluationError> {
        let (columns, rows) = read_features(features)?;
        let labels = read_labels(labels)?;

        if rows.len() != labels.len() {
            return Err(EvaluationError::RowCountMismatch {
                features: rows.len(),
                labels: labels.len(),
            });
        }

        Ok(Self {
            columns,
            rows,
            labels,
        })
    }
}

/// Scores every row once and reports recall, precision, and accuracy for each tier cutoff.
pub fn evaluate_thresholds(
    service: &ScoringService,
    dataset: &LabeledDataset,
) -> Result<Vec<TierMetrics>, EvaluationError> {
    let probabilities = dataset
        .rows
        .iter()
        .enumerate()
        .map(|(idx, values)| {
            let features: FeatureVector = dataset
                .columns
                .iter()
                .cloned()
                .zip(values.iter().copied())
                .collect();
            service
                .probability(&features)
                .map_err(|source| EvaluationError::Scoring {
                    row: idx + 1,
                    source,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let thresholds = service.thresholds();
    let metrics = Tier::PRECEDENCE
        .into_iter()
        .filter_map(|tier| thresholds.cutoff(tier).map(|cutoff| (tier, cutoff)))
        .map(|(tier, threshold)| {
            let mut counts = ConfusionCounts::default();
            for (probability, actual) in probabilities.iter().zip(&dataset.labels) {
                let predicted = decide(*probability, thresholds).decisions().get(tier);
                counts.record(predicted, *actual);
            }
            TierMetrics {
                tier,
                threshold,
                recall: counts.recall(),
                precision: counts.precision(),
                accuracy: counts.accuracy(),
            }
        })
        .collect();

    Ok(metrics)
}

#[derive(Debug, Default)]
struct ConfusionCounts {
    true_positive: usize,
    false_positive: usize,
    true_negative: usize,
    false_negative: usize,
}

impl ConfusionCounts {
    fn record(&mut self, predicted: bool, actual: bool) {
        match (predicted, actual) {
            (true, true) => self.true_positive += 1,
            (true, false) => self.false_positive += 1,
            (false, false) => self.true_negative += 1,
            (false, true) => self.false_negative += 1,
        }
    }

    fn recall(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    fn accuracy(&self) -> f64 {
        let total =
            self.true_positive + self.false_positive + self.true_negative + self.false_negative;
        ratio(self.true_positive + self.true_negative, total)
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn open(path: &Path) -> Result<File, EvaluationError> {
    File::open(path).map_err(|source| EvaluationError::Open {
        path: path.display().to_string(),
        source,
    })
}

fn read_features<R: Read>(reader: R) -> Result<(Vec<String>, Vec<Vec<f64>>), EvaluationError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let columns: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|name| name.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (idx, record) in csv_reader.records().enumerate() {
        let record = record?;
        let values = record
            .iter()
            .zip(&columns)
            .map(|(raw, column)| {
                raw.trim()
                    .parse::<f64>()
                    .map_err(|_| EvaluationError::InvalidValue {
                        row: idx + 1,
                        column: column.clone(),
                        value: raw.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(values);
    }

    Ok((columns, rows))
}

fn read_labels<R: Read>(reader: R) -> Result<Vec<bool>, EvaluationError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut labels = Vec::new();
    for (idx, record) in csv_reader.records().enumerate() {
        let record = record?;
        let raw = record.get(0).unwrap_or_default().trim();
        let label = match raw.parse::<f64>() {
            Ok(value) if value == 0.0 => false,
            Ok(value) if value == 1.0 => true,
            _ => {
                return Err(EvaluationError::InvalidLabel {
                    row: idx + 1,
                    value: raw.to_string(),
                })
            }
        };
        labels.push(label);
    }
    Ok(labels)
}
