use loan_offers::error::AppError;
use loan_offers::workflows::scoring::{FeatureVector, PredictRequest, PredictResponse};
use serde::Deserialize;
use std::time::Duration;

/// Raw screening answers before one-hot encoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ApplicantAnswers {
    /// Annual income in thousands of dollars.
    pub(crate) income: f64,
    /// 1 = undergraduate, 2 = graduate, 3 = advanced/professional.
    pub(crate) education: u8,
    /// Household size, 1 through 4.
    pub(crate) family_size: u8,
    pub(crate) cd_account: bool,
}

impl ApplicantAnswers {
    /// Dummy-encodes the categorical answers the way the model was trained (first level dropped).
    pub(crate) fn features(&self) -> FeatureVector {
        let flag = |condition: bool| if condition { 1.0 } else { 0.0 };

        [
            ("Income", self.income),
            ("Education_2", flag(self.education == 2)),
            ("Education_3", flag(self.education == 3)),
            ("Family_2", flag(self.family_size == 2)),
            ("Family_3", flag(self.family_size == 3)),
            ("Family_4", flag(self.family_size == 4)),
            ("CD Account_1", flag(self.cd_account)),
        ]
        .into_iter()
        .collect()
    }
}

/// What the scoring service said about one request.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PredictOutcome {
    Scored(PredictResponse),
    Rejected { status: u16, detail: String },
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// HTTP client for the scoring service's `/predict` endpoint.
pub(crate) struct ScoringClient {
    http: reqwest::Client,
    predict_url: String,
}

impl ScoringClient {
    pub(crate) fn new(base_url: &str) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| AppError::Client(err.to_string()))?;

        Ok(Self {
            http,
            predict_url: format!("{}/predict", base_url.trim_end_matches('/')),
        })
    }

    pub(crate) fn predict_url(&self) -> &str {
        &self.predict_url
    }

    pub(crate) async fn predict(&self, features: FeatureVector) -> Result<PredictOutcome, AppError> {
        let response = self
            .http
            .post(&self.predict_url)
            .json(&PredictRequest { features })
            .send()
            .await
            .map_err(|err| AppError::Client(format!("{}: {err}", self.predict_url)))?;

        let status = response.status();
        if status.is_success() {
            let body = response
                .json::<PredictResponse>()
                .await
                .map_err(|err| AppError::Client(format!("unexpected response body: {err}")))?;
            return Ok(PredictOutcome::Scored(body));
        }

        let text = response.text().await.unwrap_or_default();
        let detail = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(ErrorBody {
                detail: serde_json::Value::String(detail),
            }) => detail,
            Ok(ErrorBody { detail }) => detail.to_string(),
            Err(_) => text,
        };

        Ok(PredictOutcome::Rejected {
            status: status.as_u16(),
            detail,
        })
    }
}
