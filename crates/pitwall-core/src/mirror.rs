//! Ordered fallback across interchangeable API mirrors.
//!
//! Wraps any [`Fetcher`] and tries each configured base endpoint in priority
//! order. The first attempt that completes with a successful body wins. A
//! timeout, a non-success status and a connection error all mean "try the
//! next mirror"; a failed mirror is never retried within the same call.
//!
//! # Example
//!
//! ```rust,no_run
//! use pitwall_core::config::MirrorConfig;
//! use pitwall_core::mirror::MirrorFetcher;
//! # use pitwall_core::traits::Fetcher;
//! # #[derive(Clone)] struct MyFetcher;
//! # impl Fetcher for MyFetcher {
//! #     async fn fetch(&self, _: &str) -> Result<String, pitwall_core::AppError> { todo!() }
//! # }
//! # async fn run() -> Result<(), pitwall_core::AppError> {
//! let api = MirrorFetcher::new(MyFetcher, MirrorConfig::default());
//! let body = api.get("/f1/2024.json", &[("limit", "1000")]).await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use serde::de::DeserializeOwned;
use url::Url;

use crate::config::MirrorConfig;
use crate::error::AppError;
use crate::traits::Fetcher;

/// A [`Fetcher`] wrapper that resolves relative paths against a list of
/// mirrors with first-success-wins fallback.
#[derive(Clone)]
pub struct MirrorFetcher<F> {
    inner: F,
    base_urls: Vec<String>,
    timeout: Duration,
}

impl<F: Fetcher> MirrorFetcher<F> {
    pub fn new(inner: F, config: MirrorConfig) -> Self {
        Self {
            inner,
            base_urls: config.base_urls,
            timeout: config.timeout,
        }
    }

    pub fn base_urls(&self) -> &[String] {
        &self.base_urls
    }

    /// Fetch `path` from the first mirror that answers successfully.
    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<String, AppError> {
        let mut last = AppError::ConfigError("no API mirrors configured".into());

        for base in &self.base_urls {
            let url = match join_url(base, path, query) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!(%base, error = %e, "Skipping mirror");
                    last = e;
                    continue;
                }
            };

            tracing::debug!(%url, "Fetching");
            let attempt = tokio::time::timeout(self.timeout, self.inner.fetch(&url)).await;
            let result = match attempt {
                Ok(result) => result,
                Err(_) => Err(AppError::Timeout(self.timeout.as_secs())),
            };

            match result {
                Ok(body) => return Ok(body),
                Err(e) if e.is_fallback_worthy() => {
                    tracing::warn!(%url, error = %e, "Mirror failed, falling back");
                    last = e;
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::FetchExhausted {
            path: path.to_string(),
            last: Box::new(last),
        })
    }

    /// Fetch `path` and decode the body as JSON.
    ///
    /// An undecodable body is returned as an error without trying further
    /// mirrors: the endpoint answered, the payload is what is wrong.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, AppError> {
        let body = self.get(path, query).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Join a base endpoint and a relative path with exactly one `/`, then
/// append the query parameters.
pub fn join_url(base: &str, path: &str, query: &[(&str, &str)]) -> Result<String, AppError> {
    let joined = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    let mut url =
        Url::parse(&joined).map_err(|e| AppError::HttpError(format!("Invalid URL {joined}: {e}")))?;
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query.iter().copied());
    }
    Ok(url.into())
}
