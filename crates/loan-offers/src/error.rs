use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::notification::NotificationError;
use crate::workflows::scoring::{ArtifactError, EvaluationError};
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Artifact(ArtifactError),
    Notification(NotificationError),
    Evaluation(EvaluationError),
    Client(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Artifact(err) => write!(f, "failed to load artifacts: {}", err),
            AppError::Notification(err) => write!(f, "notification error: {}", err),
            AppError::Evaluation(err) => write!(f, "evaluation error: {}", err),
            AppError::Client(detail) => write!(f, "scoring client error: {}", detail),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Artifact(err) => Some(err),
            AppError::Notification(err) => Some(err),
            AppError::Evaluation(err) => Some(err),
            AppError::Client(_) => None,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ArtifactError> for AppError {
    fn from(value: ArtifactError) -> Self {
        Self::Artifact(value)
    }
}

impl From<NotificationError> for AppError {
    fn from(value: NotificationError) -> Self {
        Self::Notification(value)
    }
}

impl From<EvaluationError> for AppError {
    fn from(value: EvaluationError) -> Self {
        Self::Evaluation(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::scoring::Tier;
    use std::error::Error;

    #[test]
    fn startup_artifact_failure_keeps_its_source() {
        let err: AppError = ArtifactError::ThresholdOutOfRange {
            tier: Tier::Standard,
            value: 1.5,
        }
        .into();

        assert_eq!(
            err.to_string(),
            "failed to load artifacts: threshold for standard must be within [0, 1], got 1.5"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn notification_failure_is_reported_not_mapped_to_http() {
        let err: AppError = NotificationError::InvalidEmail("jane.example.com".to_string()).into();
        assert!(matches!(err, AppError::Notification(_)));
        assert!(err.to_string().starts_with("notification error: invalid email address"));
    }
}
