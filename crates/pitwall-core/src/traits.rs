use std::future::Future;

use crate::error::AppError;
use crate::models::SeasonBlob;

/// Fetches the raw body of a URL.
///
/// Implementations must map timeouts, connection failures and non-success
/// statuses to [`AppError::Timeout`], [`AppError::NetworkError`] and
/// [`AppError::HttpError`] so callers can fall back to another endpoint.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// Locates and decodes the embedded season payload of a statistics page.
pub trait BlobExtractor: Send + Sync + Clone {
    fn extract(&self, html: &str) -> Result<SeasonBlob, AppError>;
}
