/// Configuration management for meeting-service
///
/// Loads configuration from environment variables with sensible defaults.
/// AWS credentials and endpoints are resolved separately by `aws-config`.
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;
use crate::services::ServiceTimeouts;
use crate::store::DEFAULT_RETENTION_SECS;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub store: StoreConfig,
    pub provider: ProviderConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub env: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    DynamoDb { table_name: String },
    Memory,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub retention_secs: u32,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub media_region: String,
    pub timeout: Duration,
}

impl StoreConfig {
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::from(self.retention_secs))
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env`, if present)
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match lookup("MEETING_STORE")
            .unwrap_or_else(|| "dynamodb".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "dynamodb" => {
                let table_name = lookup("TABLE_NAME")
                    .filter(|t| !t.trim().is_empty())
                    .ok_or_else(|| {
                        AppError::Config(
                            "TABLE_NAME must be set when MEETING_STORE=dynamodb".to_string(),
                        )
                    })?;
                StoreBackend::DynamoDb { table_name }
            }
            "memory" => StoreBackend::Memory,
            other => {
                return Err(AppError::Config(format!(
                    "MEETING_STORE must be 'dynamodb' or 'memory', got '{other}'"
                )))
            }
        };

        let media_region = lookup("MEDIA_REGION")
            .or_else(|| lookup("AWS_REGION"))
            .unwrap_or_else(|| "us-east-1".to_string());

        Ok(Config {
            app: AppConfig {
                host: lookup("MEETING_SERVICE_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&lookup, "MEETING_SERVICE_PORT", 8080)?,
                env: lookup("APP_ENV").unwrap_or_else(|| "development".to_string()),
            },
            store: StoreConfig {
                backend,
                retention_secs: parse_or(&lookup, "MEETING_TTL_SECS", DEFAULT_RETENTION_SECS)?,
                timeout: Duration::from_millis(parse_or(&lookup, "STORE_TIMEOUT_MS", 3_000)?),
            },
            provider: ProviderConfig {
                media_region,
                timeout: Duration::from_millis(parse_or(&lookup, "PROVIDER_TIMEOUT_MS", 10_000)?),
            },
        })
    }

    pub fn timeouts(&self) -> ServiceTimeouts {
        ServiceTimeouts {
            store: self.store.timeout,
            provider: self.provider.timeout,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("invalid {key}='{raw}': {e}"))),
        None => Ok(default),
    }
}
