use std::time::Duration;

use crate::error::AppError;

/// Primary mirror of the racing-data API.
pub const PRIMARY_MIRROR: &str = "https://api.jolpi.ca/ergast";
/// Legacy mirror, tried when the primary fails.
pub const LEGACY_MIRROR: &str = "https://ergast.com/mrd";
/// Statistics page carrying the fantasy-game payload.
pub const FANTASY_STATS_URL: &str = "https://f1fantasytools.com/statistics";

pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_PAGE_TIMEOUT: Duration = Duration::from_secs(60);

/// Ordered list of interchangeable base endpoints for the racing-data API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorConfig {
    pub base_urls: Vec<String>,
    /// Applied independently to every attempt.
    pub timeout: Duration,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            base_urls: vec![PRIMARY_MIRROR.to_string(), LEGACY_MIRROR.to_string()],
            timeout: DEFAULT_API_TIMEOUT,
        }
    }
}

impl MirrorConfig {
    pub fn new(base_urls: Vec<String>, timeout: Duration) -> Result<Self, AppError> {
        let base_urls: Vec<String> = base_urls
            .into_iter()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();
        if base_urls.is_empty() {
            return Err(AppError::ConfigError(
                "at least one API mirror must be configured".into(),
            ));
        }
        if timeout.is_zero() {
            return Err(AppError::ConfigError("timeout must be non-zero".into()));
        }
        Ok(Self { base_urls, timeout })
    }

    /// Parse a comma-separated mirror list.
    pub fn parse_mirrors(raw: &str) -> Vec<String> {
        raw.split(',').map(|s| s.trim().to_string()).collect()
    }

    /// Read configuration from environment variables.
    ///
    /// - `PITWALL_MIRRORS` (optional, comma-separated, defaults to the two known mirrors)
    /// - `PITWALL_TIMEOUT_SECS` (optional, defaults to 30)
    pub fn from_env() -> Result<Self, AppError> {
        let base_urls = match std::env::var("PITWALL_MIRRORS") {
            Err(_) => Self::default().base_urls,
            Ok(raw) => Self::parse_mirrors(&raw),
        };

        let timeout = match std::env::var("PITWALL_TIMEOUT_SECS") {
            Err(_) => DEFAULT_API_TIMEOUT,
            Ok(raw) => {
                let secs: u64 = raw.parse().map_err(|_| {
                    AppError::ConfigError(format!(
                        "Invalid PITWALL_TIMEOUT_SECS '{raw}': must be a positive integer"
                    ))
                })?;
                Duration::from_secs(secs)
            }
        };

        Self::new(base_urls, timeout)
    }
}
