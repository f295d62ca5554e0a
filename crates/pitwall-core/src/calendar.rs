use crate::error::AppError;
use crate::ergast::{ErgastApi, Race, coerce_u32};
use crate::models::{RoundDescriptor, ScheduleRow};
use crate::traits::Fetcher;

/// The race calendar of one season, fetched once and iterable any number of
/// times in ascending round order.
#[derive(Debug, Clone)]
pub struct SeasonCalendar {
    season: u32,
    schedule: Vec<ScheduleRow>,
}

impl SeasonCalendar {
    /// Fetch `/f1/{season}.json` and build the calendar.
    ///
    /// Zero races, or an envelope without a race table, is
    /// [`AppError::EmptyResult`].
    pub async fn fetch<F: Fetcher>(api: &ErgastApi<F>, season: u32) -> Result<Self, AppError> {
        let races = api.season(season).await?.into_races();
        let calendar = Self::from_races(season, races);
        if calendar.schedule.is_empty() {
            return Err(AppError::EmptyResult(format!(
                "No races returned for season {season}"
            )));
        }
        tracing::info!(season, rounds = calendar.len(), "Loaded season calendar");
        Ok(calendar)
    }

    fn from_races(season: u32, races: Vec<Race>) -> Self {
        let mut schedule: Vec<ScheduleRow> = races
            .into_iter()
            .filter_map(|race| {
                let Some(round) = coerce_u32(race.round.as_ref()) else {
                    tracing::warn!(season, round = ?race.round, "Dropping race with unparsable round");
                    return None;
                };
                let circuit = race.circuit.unwrap_or_default();
                let location = circuit.location.unwrap_or_default();
                Some(ScheduleRow {
                    season,
                    round,
                    race_name: race.race_name.unwrap_or_default(),
                    circuit_name: circuit.circuit_name.unwrap_or_default(),
                    locality: location.locality.unwrap_or_default(),
                    country: location.country.unwrap_or_default(),
                    race_date: race.date.unwrap_or_default(),
                    race_time: race.time.unwrap_or_default(),
                })
            })
            .collect();

        schedule.sort_by_key(|row| row.round);
        schedule.dedup_by_key(|row| row.round);
        Self { season, schedule }
    }

    pub fn season(&self) -> u32 {
        self.season
    }

    pub fn len(&self) -> usize {
        self.schedule.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schedule.is_empty()
    }

    /// Round descriptors in ascending round order.
    pub fn rounds(&self) -> impl Iterator<Item = RoundDescriptor> + '_ {
        self.schedule.iter().map(|row| RoundDescriptor {
            season: row.season,
            round: row.round,
            race_name: row.race_name.clone(),
        })
    }

    /// Calendar rows for the `dim_round_dates` table.
    pub fn schedule(&self) -> &[ScheduleRow] {
        &self.schedule
    }
}
