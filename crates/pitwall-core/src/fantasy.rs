use crate::emit::{EmitSummary, OutputLayout, Table, write_table_file};
use crate::ergast::coerce_u32;
use crate::error::AppError;
use crate::models::{FantasyEntity, FantasyPointsRow, FantasyPriceRow, SeasonBlob};
use crate::traits::{BlobExtractor, Fetcher};

/// Long-format fantasy tables for one season.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FantasyTables {
    pub season: u32,
    pub driver_points: Vec<FantasyPointsRow>,
    pub constructor_points: Vec<FantasyPointsRow>,
    pub driver_prices: Vec<FantasyPriceRow>,
    pub constructor_prices: Vec<FantasyPriceRow>,
}

impl FantasyTables {
    /// Reshape a decoded blob. The blob's own season wins over
    /// `fallback_season` when it is an integer.
    pub fn from_blob(blob: SeasonBlob, fallback_season: u32) -> Self {
        let result = blob.season_result.unwrap_or_default();
        let season = coerce_u32(result.season.as_ref()).unwrap_or(fallback_season);
        let mut tables = Self {
            season,
            ..Self::default()
        };

        for (round, set) in result.race_results.unwrap_or_default() {
            for entity in set.drivers.unwrap_or_default() {
                tables.driver_points.push(points_row(season, round, &entity));
                tables.driver_prices.push(price_row(season, round, entity));
            }
            for entity in set.constructors.unwrap_or_default() {
                tables.constructor_points.push(points_row(season, round, &entity));
                tables.constructor_prices.push(price_row(season, round, entity));
            }
        }
        tables
    }

    pub fn write(&self, layout: &OutputLayout) -> Result<Vec<EmitSummary>, AppError> {
        let path = |table| layout.table_path(self.season, table);
        Ok(vec![
            write_table_file(&path(Table::FantasyDriverPoints), &self.driver_points)?,
            write_table_file(&path(Table::FantasyConstructorPoints), &self.constructor_points)?,
            write_table_file(&path(Table::FantasyDriverPrices), &self.driver_prices)?,
            write_table_file(&path(Table::FantasyConstructorPrices), &self.constructor_prices)?,
        ])
    }
}

fn points_row(season: u32, round: u32, entity: &FantasyEntity) -> FantasyPointsRow {
    FantasyPointsRow {
        season,
        round,
        id: entity.id.clone(),
        abbr: entity.abbreviation.clone(),
        entity_type: entity.entity_type.clone(),
        total_points: entity.total_points.clone(),
        nn_total_points: entity.nn_total_points.clone(),
    }
}

fn price_row(season: u32, round: u32, entity: FantasyEntity) -> FantasyPriceRow {
    FantasyPriceRow {
        season,
        round,
        id: entity.id,
        abbr: entity.abbreviation,
        price: entity.price,
        price_change: entity.price_change,
        percent_owned: entity.percent_owned,
        x2_percent_owned: entity.x2_percent_owned,
    }
}

/// Orchestrates the fantasy pipeline: fetch page -> extract blob -> reshape.
///
/// Generic over the transport and the extractor so it can run against mocks.
pub struct FantasyPipeline<F, E>
where
    F: Fetcher,
    E: BlobExtractor,
{
    fetcher: F,
    extractor: E,
    page_url: String,
}

impl<F, E> FantasyPipeline<F, E>
where
    F: Fetcher,
    E: BlobExtractor,
{
    pub fn new(fetcher: F, extractor: E, page_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            extractor,
            page_url: page_url.into(),
        }
    }

    pub async fn fetch_tables(&self, fallback_season: u32) -> Result<FantasyTables, AppError> {
        tracing::info!("Fetching {}", self.page_url);
        let html = self.fetcher.fetch(&self.page_url).await?;
        tracing::info!("Fetched {} bytes of HTML", html.len());

        let blob = self.extractor.extract(&html)?;
        let tables = FantasyTables::from_blob(blob, fallback_season);
        tracing::info!(
            season = tables.season,
            drivers = tables.driver_points.len(),
            constructors = tables.constructor_points.len(),
            "Extracted fantasy tables"
        );
        Ok(tables)
    }

    /// Fetch, extract and write all four tables.
    pub async fn run(
        &self,
        fallback_season: u32,
        layout: &OutputLayout,
    ) -> Result<Vec<EmitSummary>, AppError> {
        self.fetch_tables(fallback_season).await?.write(layout)
    }
}
