//! Cumulative championship standings reshaped into long format.

use crate::calendar::SeasonCalendar;
use crate::error::AppError;
use crate::ergast::{Envelope, ErgastApi, coerce_count, coerce_points, coerce_position};
use crate::fanout::per_round;
use crate::models::{ConstructorStandingsRow, DriverStandingsRow, RoundDescriptor};
use crate::traits::Fetcher;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Standings {
    pub drivers: Vec<DriverStandingsRow>,
    pub constructors: Vec<ConstructorStandingsRow>,
}

/// One row per driver in the round's snapshot; none if the snapshot is absent.
pub fn flatten_driver_standings(rd: &RoundDescriptor, envelope: Envelope) -> Vec<DriverStandingsRow> {
    let Some(list) = envelope.into_first_standings_list() else {
        return Vec::new();
    };

    list.driver_standings
        .unwrap_or_default()
        .into_iter()
        .map(|row| {
            let driver = row.driver.unwrap_or_default();
            let constructor = row
                .constructors
                .and_then(|c| c.into_iter().next())
                .unwrap_or_default();
            DriverStandingsRow {
                season: rd.season,
                round: rd.round,
                race_name: rd.race_name.clone(),
                position: coerce_position(row.position.as_ref()),
                points: coerce_points(row.points.as_ref()),
                wins: coerce_count(row.wins.as_ref()),
                driver_code: driver.code(),
                driver_external_id: driver.id(),
                driver_given_name: driver.given_name(),
                driver_family_name: driver.family_name(),
                constructor_external_id: constructor.id(),
                constructor_name: constructor.name(),
            }
        })
        .collect()
}

/// One row per constructor in the round's snapshot; none if the snapshot is absent.
pub fn flatten_constructor_standings(
    rd: &RoundDescriptor,
    envelope: Envelope,
) -> Vec<ConstructorStandingsRow> {
    let Some(list) = envelope.into_first_standings_list() else {
        return Vec::new();
    };

    list.constructor_standings
        .unwrap_or_default()
        .into_iter()
        .map(|row| {
            let constructor = row.constructor.unwrap_or_default();
            ConstructorStandingsRow {
                season: rd.season,
                round: rd.round,
                race_name: rd.race_name.clone(),
                position: coerce_position(row.position.as_ref()),
                points: coerce_points(row.points.as_ref()),
                wins: coerce_count(row.wins.as_ref()),
                constructor_external_id: constructor.id(),
                constructor_name: constructor.name(),
            }
        })
        .collect()
}

/// Fetch both snapshots of a round. Both requests are issued before either
/// failure is reported.
async fn fetch_snapshots<F: Fetcher>(
    api: &ErgastApi<F>,
    rd: &RoundDescriptor,
) -> Result<(Envelope, Envelope), AppError> {
    let drivers = api.driver_standings(rd.season, rd.round).await;
    let constructors = api.constructor_standings(rd.season, rd.round).await;
    Ok((drivers?, constructors?))
}

/// Fetch and flatten the standings after every round, in round order.
pub async fn collect_standings<F: Fetcher>(
    api: &ErgastApi<F>,
    calendar: &SeasonCalendar,
    concurrency: usize,
) -> Result<Standings, AppError> {
    let fetched = per_round(calendar, concurrency, |rd| async move {
        fetch_snapshots(api, &rd).await
    })
    .await?;

    let mut out = Standings::default();
    for (rd, (drivers, constructors)) in fetched {
        let drivers = flatten_driver_standings(&rd, drivers);
        let constructors = flatten_constructor_standings(&rd, constructors);
        if drivers.is_empty() && constructors.is_empty() {
            tracing::debug!(season = rd.season, round = rd.round, "No standings yet");
        } else {
            tracing::info!(
                season = rd.season,
                round = rd.round,
                drivers = drivers.len(),
                constructors = constructors.len(),
                "Normalized standings"
            );
        }
        out.drivers.extend(drivers);
        out.constructors.extend(constructors);
    }
    Ok(out)
}
