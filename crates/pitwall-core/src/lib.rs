pub mod calendar;
pub mod config;
pub mod emit;
pub mod ergast;
pub mod error;
pub mod fanout;
pub mod fantasy;
pub mod mirror;
pub mod models;
pub mod official;
pub mod race_points;
pub mod standings;
pub mod traits;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use calendar::SeasonCalendar;
pub use config::MirrorConfig;
pub use emit::{EmitSummary, OutputLayout, Table};
pub use ergast::ErgastApi;
pub use error::AppError;
pub use fantasy::{FantasyPipeline, FantasyTables};
pub use mirror::MirrorFetcher;
pub use official::{Mode, OfficialPipeline};
pub use traits::{BlobExtractor, Fetcher};
