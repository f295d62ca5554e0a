pub mod extractor;
pub mod fetcher;

pub use extractor::FlightBlobExtractor;
pub use fetcher::ReqwestFetcher;
