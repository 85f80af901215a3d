use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::workflows::notification::transport::SENDGRID_MAIL_SEND_URL;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub artifacts: ArtifactConfig,
    pub notification: NotificationConfig,
    pub client: ClientConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(&var_or("APP_ENV", "development"));

        let host = var_or("APP_HOST", "127.0.0.1");
        let port = var_or("APP_PORT", "8000")
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = var_or("APP_LOG_LEVEL", "info");

        let artifacts = ArtifactConfig {
            model_path: PathBuf::from(var_or("LOAN_MODEL_PATH", "model/loan_model.json")),
            metadata_path: PathBuf::from(var_or("LOAN_META_PATH", "model/model_meta.json")),
        };

        let notification = NotificationConfig {
            api_key: optional_var("SENDGRID_API_KEY"),
            from_email: optional_var("SENDGRID_FROM_EMAIL"),
            api_url: var_or("SENDGRID_API_URL", SENDGRID_MAIL_SEND_URL),
            template_dir: PathBuf::from(var_or("EMAIL_TEMPLATE_DIR", "email_templates")),
            subject: var_or("EMAIL_SUBJECT", "Loan Offer!!"),
        };

        let client = ClientConfig {
            scoring_url: var_or("SCORING_URL", "http://localhost:8000"),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment == AppEnvironment::Development,
            },
            artifacts,
            notification,
            client,
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    /// Colored output, only wanted on a developer terminal.
    pub ansi: bool,
}

/// Locations of the trained model and its metadata.
#[derive(Debug, Clone)]
pub struct ArtifactConfig {
    pub model_path: PathBuf,
    pub metadata_path: PathBuf,
}

/// Email provider credentials and template location. Credentials stay optional here;
/// their absence is reported when a send is attempted.
#[derive(Clone)]
pub struct NotificationConfig {
    pub api_key: Option<String>,
    pub from_email: Option<String>,
    pub api_url: String,
    pub template_dir: PathBuf,
    pub subject: String,
}

impl fmt::Debug for NotificationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("from_email", &self.from_email)
            .field("api_url", &self.api_url)
            .field("template_dir", &self.template_dir)
            .field("subject", &self.subject)
            .finish()
    }
}

/// Where the interactive client sends scoring requests.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub scoring_url: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
