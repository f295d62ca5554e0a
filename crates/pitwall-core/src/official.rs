use std::str::FromStr;

use crate::calendar::SeasonCalendar;
use crate::emit::{EmitSummary, OutputLayout, Table, write_table_file};
use crate::ergast::ErgastApi;
use crate::error::AppError;
use crate::race_points::{RacePoints, collect_race_points};
use crate::standings::{Standings, collect_standings};
use crate::traits::Fetcher;

/// Which official tables a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Per-race points.
    Race,
    /// Cumulative standings after each round.
    Standings,
    #[default]
    Both,
}

impl Mode {
    pub fn includes_race(self) -> bool {
        matches!(self, Mode::Race | Mode::Both)
    }

    pub fn includes_standings(self) -> bool {
        matches!(self, Mode::Standings | Mode::Both)
    }
}

impl FromStr for Mode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "race" => Ok(Mode::Race),
            "standings" => Ok(Mode::Standings),
            "both" => Ok(Mode::Both),
            other => Err(AppError::ConfigError(format!(
                "Unknown mode '{other}': expected race, standings or both"
            ))),
        }
    }
}

/// Everything one official run computed for a season, before any file is
/// written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeasonTables {
    pub season: u32,
    pub race_points: Option<RacePoints>,
    pub standings: Option<Standings>,
}

/// Official-results pipeline: calendar -> per-round results and standings.
pub struct OfficialPipeline<F: Fetcher> {
    api: ErgastApi<F>,
    concurrency: usize,
}

impl<F: Fetcher> OfficialPipeline<F> {
    /// Sequential pipeline: one request outstanding at a time.
    pub fn new(api: ErgastApi<F>) -> Self {
        Self { api, concurrency: 1 }
    }

    /// Allow up to `concurrency` per-round requests in flight. Rows are still
    /// produced in round order.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub async fn calendar(&self, season: u32) -> Result<SeasonCalendar, AppError> {
        SeasonCalendar::fetch(&self.api, season).await
    }

    pub async fn race_points(&self, calendar: &SeasonCalendar) -> Result<RacePoints, AppError> {
        collect_race_points(&self.api, calendar, self.concurrency).await
    }

    pub async fn standings(&self, calendar: &SeasonCalendar) -> Result<Standings, AppError> {
        collect_standings(&self.api, calendar, self.concurrency).await
    }

    /// Compute the requested tables for one season.
    pub async fn season_tables(
        &self,
        calendar: &SeasonCalendar,
        mode: Mode,
    ) -> Result<SeasonTables, AppError> {
        let race_points = if mode.includes_race() {
            Some(self.race_points(calendar).await?)
        } else {
            None
        };
        let standings = if mode.includes_standings() {
            Some(self.standings(calendar).await?)
        } else {
            None
        };
        Ok(SeasonTables {
            season: calendar.season(),
            race_points,
            standings,
        })
    }

    /// Fetch and write one season. Nothing is written unless every fetch
    /// succeeded.
    pub async fn run_season(
        &self,
        season: u32,
        mode: Mode,
        include_schedule: bool,
        layout: &OutputLayout,
    ) -> Result<Vec<EmitSummary>, AppError> {
        let calendar = self.calendar(season).await?;
        let tables = self.season_tables(&calendar, mode).await?;

        let mut written = tables.write(layout)?;
        if include_schedule {
            written.push(write_schedule(&calendar, layout)?);
        }
        Ok(written)
    }
}

impl SeasonTables {
    pub fn write(&self, layout: &OutputLayout) -> Result<Vec<EmitSummary>, AppError> {
        let path = |table| layout.table_path(self.season, table);
        let mut written = Vec::new();
        if let Some(points) = &self.race_points {
            written.push(write_table_file(&path(Table::DriverRacePoints), &points.drivers)?);
            written.push(write_table_file(
                &path(Table::ConstructorRacePoints),
                &points.constructors,
            )?);
        }
        if let Some(standings) = &self.standings {
            written.push(write_table_file(&path(Table::DriverStandings), &standings.drivers)?);
            written.push(write_table_file(
                &path(Table::ConstructorStandings),
                &standings.constructors,
            )?);
        }
        Ok(written)
    }
}

/// Write the `dim_round_dates` table of a calendar.
pub fn write_schedule(
    calendar: &SeasonCalendar,
    layout: &OutputLayout,
) -> Result<EmitSummary, AppError> {
    write_table_file(
        &layout.table_path(calendar.season(), Table::Schedule),
        calendar.schedule(),
    )
}
