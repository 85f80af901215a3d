use clap::Args;
use loan_offers::config::AppConfig;
use loan_offers::error::AppError;
use loan_offers::telemetry;
use loan_offers::workflows::scoring::{
    evaluate_thresholds, LabeledDataset, ScoringService, TierMetrics,
};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// CSV of preprocessed feature rows with a header line
    #[arg(long = "features-csv", default_value = "model/X_test_preprocessed.csv")]
    pub(crate) features_csv: PathBuf,
    /// Single-column CSV of 0/1 labels aligned with the feature rows
    #[arg(long = "labels-csv", default_value = "model/y_test.csv")]
    pub(crate) labels_csv: PathBuf,
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let service = ScoringService::load(&config.artifacts)?;
    let dataset = LabeledDataset::from_paths(&args.features_csv, &args.labels_csv)?;
    info!(
        rows = dataset.rows.len(),
        features = %args.features_csv.display(),
        "evaluating threshold tiers"
    );

    let metrics = evaluate_thresholds(&service, &dataset)?;
    write_report(&mut io::stdout().lock(), &metrics)?;
    Ok(())
}

fn write_report<W: Write>(out: &mut W, metrics: &[TierMetrics]) -> io::Result<()> {
    for entry in metrics {
        writeln!(
            out,
            "[{}] threshold = {} | Recall = {:.3} | Precision = {:.3} | Accuracy = {:.3}",
            entry.tier, entry.threshold, entry.recall, entry.precision, entry.accuracy
        )?;
    }
    Ok(())
}
