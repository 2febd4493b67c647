use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::kyc::verdict::{VerdictConfig, DEFAULT_ATTEMPT_PENALTY};
use crate::workflows::kyc::DEFAULT_MAX_ATTEMPTS;

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
    pub policy: VerdictConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = match env::var("APP_LOG_FORMAT") {
            Ok(value) => LogFormat::parse(&value)?,
            Err(_) => LogFormat::Compact,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                log_format,
            },
            policy: load_policy()?,
        })
    }
}

fn load_policy() -> Result<VerdictConfig, ConfigError> {
    let max_attempts = match env::var("KYC_MAX_ATTEMPTS") {
        Ok(value) => match value.trim().parse::<u32>() {
            Ok(parsed) if parsed > 0 => parsed,
            _ => return Err(ConfigError::InvalidMaxAttempts { value }),
        },
        Err(_) => DEFAULT_MAX_ATTEMPTS,
    };

    let attempt_penalty = match env::var("KYC_ATTEMPT_PENALTY") {
        Ok(value) => value
            .trim()
            .parse::<u8>()
            .map_err(|_| ConfigError::InvalidAttemptPenalty { value })?,
        Err(_) => DEFAULT_ATTEMPT_PENALTY,
    };

    let escalate_duplicates = match env::var("KYC_ESCALATE_DUPLICATES") {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => return Err(ConfigError::InvalidFlag {
                name: "KYC_ESCALATE_DUPLICATES",
                value,
            }),
        },
        Err(_) => false,
    };

    Ok(VerdictConfig {
        max_attempts,
        attempt_penalty,
        escalate_duplicates,
    })
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

/// Output layout for the fmt subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            _ => Err(ConfigError::InvalidLogFormat {
                value: value.to_string(),
            }),
        }
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidLogFormat { value: String },
    InvalidMaxAttempts { value: String },
    InvalidAttemptPenalty { value: String },
    InvalidFlag { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidLogFormat { value } => {
                write!(f, "APP_LOG_FORMAT must be 'compact' or 'pretty', got '{value}'")
            }
            ConfigError::InvalidMaxAttempts { value } => {
                write!(f, "KYC_MAX_ATTEMPTS must be a positive integer, got '{value}'")
            }
            ConfigError::InvalidAttemptPenalty { value } => {
                write!(f, "KYC_ATTEMPT_PENALTY must be between 0 and 255, got '{value}'")
            }
            ConfigError::InvalidFlag { name, value } => {
                write!(f, "{name} must be true or false, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
