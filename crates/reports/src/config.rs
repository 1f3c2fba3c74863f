//! Report engine configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CANTEEN_API_BASE_URL` - Base URL of the canteen REST backend
//!
//! ## Optional
//! - `CANTEEN_HTTP_TIMEOUT_SECS` - Per-request network timeout (default: 30)
//! - `CANTEEN_UTC_OFFSET_MINUTES` - Wall-clock offset for "today"/"week"/"month"
//!   windows (default: 330, i.e. IST)
//! - `CANTEEN_GST_RATE` - GST rate used for client-side receipts (default: 0.05)
//! - `CANTEEN_SESSION_FILE` - Where the login session is persisted
//!   (default: `.canteen-session.json`)
//! - `CANTEEN_EXPORT_DIR` - Directory for spreadsheet exports (default: `.`)

use std::path::PathBuf;
use std::time::Duration;

use chrono::FixedOffset;
use rust_decimal::Decimal;
use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_UTC_OFFSET_MINUTES: i32 = 330;
const DEFAULT_GST_RATE: &str = "0.05";
const DEFAULT_SESSION_FILE: &str = ".canteen-session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Report engine configuration.
#[derive(Debug, Clone)]
pub struct ReportsConfig {
    /// Backend base URL (always ends with `/`)
    pub api_base_url: Url,
    /// Network timeout applied to every backend call
    pub http_timeout: Duration,
    /// Canonical wall-clock offset for date windows
    pub utc_offset: FixedOffset,
    /// GST rate for client-side receipt computation
    pub gst_rate: Decimal,
    /// Session file location
    pub session_file: PathBuf,
    /// Default directory for exported workbooks
    pub export_dir: PathBuf,
}

impl ReportsConfig {
    /// Build a configuration with defaults for everything but the base URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL is not http(s).
    pub fn new(api_base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_base_url(api_base_url)?,
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            utc_offset: offset_from_minutes(DEFAULT_UTC_OFFSET_MINUTES)?,
            gst_rate: parse_gst_rate(DEFAULT_GST_RATE)?,
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            export_dir: PathBuf::from("."),
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = parse_base_url(&get_required_env("CANTEEN_API_BASE_URL")?)?;

        let timeout_secs = get_env_or_default(
            "CANTEEN_HTTP_TIMEOUT_SECS",
            &DEFAULT_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("CANTEEN_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
        })?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "CANTEEN_HTTP_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let offset_minutes = get_env_or_default(
            "CANTEEN_UTC_OFFSET_MINUTES",
            &DEFAULT_UTC_OFFSET_MINUTES.to_string(),
        )
        .parse::<i32>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("CANTEEN_UTC_OFFSET_MINUTES".to_string(), e.to_string())
        })?;

        let gst_rate = parse_gst_rate(&get_env_or_default("CANTEEN_GST_RATE", DEFAULT_GST_RATE))?;

        Ok(Self {
            api_base_url,
            http_timeout: Duration::from_secs(timeout_secs),
            utc_offset: offset_from_minutes(offset_minutes)?,
            gst_rate,
            session_file: PathBuf::from(get_env_or_default(
                "CANTEEN_SESSION_FILE",
                DEFAULT_SESSION_FILE,
            )),
            export_dir: PathBuf::from(get_env_or_default("CANTEEN_EXPORT_DIR", ".")),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse the backend base URL, forcing a trailing slash so `Url::join` keeps
/// any path prefix (e.g. `/api`).
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar("CANTEEN_API_BASE_URL".to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "CANTEEN_API_BASE_URL".to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn offset_from_minutes(minutes: i32) -> Result<FixedOffset, ConfigError> {
    FixedOffset::east_opt(minutes * 60).ok_or_else(|| {
        ConfigError::InvalidEnvVar(
            "CANTEEN_UTC_OFFSET_MINUTES".to_string(),
            format!("{minutes} is outside +/-24h"),
        )
    })
}

fn parse_gst_rate(raw: &str) -> Result<Decimal, ConfigError> {
    let rate = raw
        .trim()
        .parse::<Decimal>()
        .map_err(|e| ConfigError::InvalidEnvVar("CANTEEN_GST_RATE".to_string(), e.to_string()))?;

    if rate.is_sign_negative() || rate >= Decimal::ONE {
        return Err(ConfigError::InvalidEnvVar(
            "CANTEEN_GST_RATE".to_string(),
            format!("{rate} must be in [0, 1)"),
        ));
    }
    Ok(rate)
}
