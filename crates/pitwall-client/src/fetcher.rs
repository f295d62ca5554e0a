use std::time::Duration;

use pitwall_core::config::{DEFAULT_API_TIMEOUT, DEFAULT_PAGE_TIMEOUT};
use pitwall_core::error::AppError;
use pitwall_core::traits::Fetcher;
use reqwest::Client;

const API_USER_AGENT: &str = concat!("pitwall/", env!("CARGO_PKG_VERSION"));
/// The statistics site serves a stripped page to unknown agents.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0";

/// HTTP fetcher using reqwest.
///
/// Downloads response bodies with a configurable User-Agent and timeout.
/// Timeouts, connection failures and non-success statuses map to the
/// error kinds the mirror layer falls back on.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
    timeout_secs: u64,
}

impl ReqwestFetcher {
    /// Fetcher for the racing-data API.
    pub fn new() -> Result<Self, AppError> {
        Self::with_timeout(DEFAULT_API_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, AppError> {
        Self::build(API_USER_AGENT, timeout)
    }

    /// Fetcher for HTML pages, identifying as a browser.
    pub fn for_pages() -> Result<Self, AppError> {
        Self::build(BROWSER_USER_AGENT, DEFAULT_PAGE_TIMEOUT)
    }

    fn build(user_agent: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs: timeout.as_secs(),
        })
    }
}

impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                AppError::NetworkError(format!("Connection failed: {e}"))
            } else {
                AppError::HttpError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpError(format!(
                "HTTP {} for {}",
                status.as_u16(),
                url
            )));
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout_secs)
            } else {
                AppError::HttpError(format!("Failed to read response body: {e}"))
            }
        })
    }
}
