use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::kyc::KycServiceError;
use std::fmt;

/// Failures that end a CLI command or stop the server from starting.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    /// A final-decision file or summary that is not valid JSON for its shape.
    Decode(serde_json::Error),
    Workflow(KycServiceError),
}

impl AppError {
    /// Process exit status: 2 for bad configuration or input, 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_)
            | AppError::Decode(_)
            | AppError::Workflow(KycServiceError::Payload(_)) => 2,
            AppError::Telemetry(_) | AppError::Io(_) | AppError::Workflow(_) => 1,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {err}"),
            AppError::Telemetry(err) => write!(f, "telemetry error: {err}"),
            AppError::Io(err) => write!(f, "io error: {err}"),
            AppError::Decode(err) => write!(f, "malformed final-decision payload: {err}"),
            AppError::Workflow(err) => write!(f, "kyc workflow error: {err}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Decode(err) => Some(err),
            AppError::Workflow(err) => Some(err),
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

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value)
    }
}

impl From<KycServiceError> for AppError {
    fn from(value: KycServiceError) -> Self {
        Self::Workflow(value)
    }
}
