//! Per-race driver points and constructor totals derived from them.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::calendar::SeasonCalendar;
use crate::error::AppError;
use crate::ergast::{Envelope, ErgastApi, coerce_points, coerce_position};
use crate::fanout::per_round;
use crate::models::{ConstructorRaceRow, RaceResultRow, RoundDescriptor};
use crate::traits::Fetcher;

/// Driver and constructor per-race rows for a whole season.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RacePoints {
    pub drivers: Vec<RaceResultRow>,
    pub constructors: Vec<ConstructorRaceRow>,
}

/// Constructor totals for a single round.
///
/// Owned by one round's processing and consumed when its rows are emitted.
#[derive(Debug, Default)]
pub struct ConstructorAccumulator {
    points: HashMap<String, f64>,
    names: HashMap<String, String>,
}

impl ConstructorAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, constructor_id: &str, constructor_name: &str, points: f64) {
        *self.points.entry(constructor_id.to_string()).or_insert(0.0) += points;
        self.names
            .insert(constructor_id.to_string(), constructor_name.to_string());
    }

    /// Descending points, ties by ascending constructor id.
    pub fn into_rows(self, rd: &RoundDescriptor) -> Vec<ConstructorRaceRow> {
        let Self { points, mut names } = self;
        let mut totals: Vec<(String, f64)> = points.into_iter().collect();
        totals.sort_by(|(a_id, a_pts), (b_id, b_pts)| {
            b_pts
                .partial_cmp(a_pts)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a_id.cmp(b_id))
        });

        totals
            .into_iter()
            .map(|(id, points)| ConstructorRaceRow {
                season: rd.season,
                round: rd.round,
                race_name: rd.race_name.clone(),
                points,
                constructor_name: names.remove(&id).unwrap_or_default(),
                constructor_external_id: id,
            })
            .collect()
    }
}

/// Flatten one round's results payload into driver rows and the derived
/// constructor rows. A payload without races yields no rows.
pub fn aggregate_round(
    rd: &RoundDescriptor,
    envelope: Envelope,
) -> (Vec<RaceResultRow>, Vec<ConstructorRaceRow>) {
    let results = envelope
        .into_races()
        .into_iter()
        .next()
        .and_then(|race| race.results)
        .unwrap_or_default();

    let mut drivers = Vec::with_capacity(results.len());
    let mut acc = ConstructorAccumulator::new();

    for result in results {
        let driver = result.driver.unwrap_or_default();
        let constructor = result.constructor.unwrap_or_default();
        let row = RaceResultRow {
            season: rd.season,
            round: rd.round,
            race_name: rd.race_name.clone(),
            finishing_position: coerce_position(result.position.as_ref()),
            points: coerce_points(result.points.as_ref()),
            driver_code: driver.code(),
            driver_external_id: driver.id(),
            driver_given_name: driver.given_name(),
            driver_family_name: driver.family_name(),
            constructor_external_id: constructor.id(),
            constructor_name: constructor.name(),
        };

        if row.constructor_external_id.is_empty() {
            tracing::warn!(
                round = rd.round,
                driver = %row.driver_external_id,
                "Result without constructor id"
            );
        }
        acc.add(&row.constructor_external_id, &row.constructor_name, row.points);
        drivers.push(row);
    }

    let constructors = acc.into_rows(rd);
    (drivers, constructors)
}

/// Fetch every round's results and aggregate them, in round order.
pub async fn collect_race_points<F: Fetcher>(
    api: &ErgastApi<F>,
    calendar: &SeasonCalendar,
    concurrency: usize,
) -> Result<RacePoints, AppError> {
    let fetched = per_round(calendar, concurrency, |rd| async move {
        api.results(rd.season, rd.round).await
    })
    .await?;

    let mut out = RacePoints::default();
    for (rd, envelope) in fetched {
        let (drivers, constructors) = aggregate_round(&rd, envelope);
        if drivers.is_empty() {
            tracing::debug!(season = rd.season, round = rd.round, "No results yet, skipping round");
            continue;
        }
        tracing::info!(
            season = rd.season,
            round = rd.round,
            drivers = drivers.len(),
            constructors = constructors.len(),
            "Aggregated race results"
        );
        out.drivers.extend(drivers);
        out.constructors.extend(constructors);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::MirrorConfig;
    use crate::mirror::MirrorFetcher;
    use crate::testutil::{MockFetcher, MockResponse, result, results_payload, season_payload};

    fn rd(round: u32) -> RoundDescriptor {
        RoundDescriptor {
            season: 2024,
            round,
            race_name: format!("Race {round}"),
        }
    }

    fn envelope(value: serde_json::Value) -> Envelope {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_ties_break_by_ascending_constructor_id() {
        let mut acc = ConstructorAccumulator::new();
        acc.add("red", "Red", 43.0);
        acc.add("green", "Green", 18.0);
        acc.add("blue", "Blue", 43.0);

        let ids: Vec<String> = acc
            .into_rows(&rd(1))
            .into_iter()
            .map(|r| r.constructor_external_id)
            .collect();
        assert_eq!(ids, vec!["blue", "red", "green"]);
    }

    #[test]
    fn test_constructor_points_sum_across_drivers() {
        let env = envelope(results_payload(
            2024,
            1,
            "Race 1",
            &[
                result("1", "25", "VER", "red_bull"),
                result("2", "18", "PER", "red_bull"),
                result("3", "15", "SAI", "ferrari"),
                result("4", "12.5", "LEC", "ferrari"),
                result("5", "", "HAM", "mercedes"),
            ],
        ));

        let (drivers, constructors) = aggregate_round(&rd(1), env);

        assert_eq!(drivers.len(), 5);
        assert_eq!(drivers[4].points, 0.0);
        let totals: Vec<(&str, f64)> = constructors
            .iter()
            .map(|c| (c.constructor_external_id.as_str(), c.points))
            .collect();
        assert_eq!(
            totals,
            vec![("red_bull", 43.0), ("ferrari", 27.5), ("mercedes", 0.0)]
        );
    }

    #[test]
    fn test_conservation_holds_with_blank_constructor() {
        let env = envelope(results_payload(
            2024,
            1,
            "Race 1",
            &[
                result("1", "25", "VER", "red_bull"),
                result("2", "18", "XXX", ""),
                result("3", "1", "BOT", "sauber"),
            ],
        ));

        let (drivers, constructors) = aggregate_round(&rd(1), env);

        let driver_sum: f64 = drivers.iter().map(|d| d.points).sum();
        let constructor_sum: f64 = constructors.iter().map(|c| c.points).sum();
        assert_eq!(driver_sum, constructor_sum);
        assert_eq!(constructors.len(), 3);
    }

    #[test]
    fn test_unclassified_position_is_absent() {
        let env = envelope(results_payload(
            2024,
            1,
            "Race 1",
            &[result("1", "25", "ver", "red_bull"), result("", "0", "ALB", "williams")],
        ));
        let (drivers, _) = aggregate_round(&rd(1), env);
        assert_eq!(drivers[0].finishing_position, Some(1));
        assert_eq!(drivers[0].driver_code, "VER");
        assert_eq!(drivers[1].finishing_position, None);
    }

    #[test]
    fn test_empty_race_list_yields_nothing() {
        let (drivers, constructors) =
            aggregate_round(&rd(1), envelope(results_payload(2024, 1, "Race 1", &[])));
        assert!(drivers.is_empty());
        assert!(constructors.is_empty());
    }

    #[test]
    fn test_last_seen_name_wins() {
        let mut acc = ConstructorAccumulator::new();
        acc.add("rb", "AlphaTauri", 1.0);
        acc.add("rb", "RB F1 Team", 2.0);
        let rows = acc.into_rows(&rd(1));
        assert_eq!(rows[0].constructor_name, "RB F1 Team");
        assert_eq!(rows[0].points, 3.0);
    }

    fn season_fetcher() -> MockFetcher {
        MockFetcher::new()
            .route(
                "/f1/2024.json",
                MockResponse::json(season_payload(2024, &[(1, "Race 1"), (2, "Race 2"), (3, "Race 3")])),
            )
            .route(
                "/f1/2024/1/results.json",
                MockResponse::json(results_payload(
                    2024,
                    1,
                    "Race 1",
                    &[result("1", "25", "VER", "red_bull"), result("2", "18", "LEC", "ferrari")],
                )),
            )
            .route(
                "/f1/2024/2/results.json",
                MockResponse::json(results_payload(2024, 2, "Race 2", &[])),
            )
            .route(
                "/f1/2024/3/results.json",
                MockResponse::json(results_payload(
                    2024,
                    3,
                    "Race 3",
                    &[result("1", "25", "LEC", "ferrari"), result("2", "18", "VER", "red_bull")],
                )),
            )
    }

    fn api(fetcher: MockFetcher) -> ErgastApi<MockFetcher> {
        let config =
            MirrorConfig::new(vec!["https://api.example".into()], Duration::from_secs(5)).unwrap();
        ErgastApi::new(MirrorFetcher::new(fetcher, config))
    }

    #[tokio::test]
    async fn season_skips_rounds_without_results() {
        let api = api(season_fetcher());
        let calendar = SeasonCalendar::fetch(&api, 2024).await.unwrap();

        let points = collect_race_points(&api, &calendar, 1).await.unwrap();

        let rounds: Vec<u32> = points.drivers.iter().map(|d| d.round).collect();
        assert_eq!(rounds, vec![1, 1, 3, 3]);
        let constructor_order: Vec<(u32, &str)> = points
            .constructors
            .iter()
            .map(|c| (c.round, c.constructor_external_id.as_str()))
            .collect();
        assert_eq!(
            constructor_order,
            vec![(1, "red_bull"), (1, "ferrari"), (3, "ferrari"), (3, "red_bull")]
        );
    }

    #[tokio::test]
    async fn concurrent_fetch_keeps_round_order() {
        let api = api(season_fetcher());
        let calendar = SeasonCalendar::fetch(&api, 2024).await.unwrap();

        let sequential = collect_race_points(&api, &calendar, 1).await.unwrap();
        let parallel = collect_race_points(&api, &calendar, 4).await.unwrap();

        assert_eq!(sequential, parallel);
    }

    #[tokio::test]
    async fn transport_failure_mid_season_is_fatal() {
        let fetcher = MockFetcher::new()
            .route(
                "/f1/2024.json",
                MockResponse::json(season_payload(2024, &[(1, "Race 1"), (2, "Race 2")])),
            )
            .route("/f1/2024/1/results.json", MockResponse::Status(500))
            .route(
                "/f1/2024/2/results.json",
                MockResponse::json(results_payload(2024, 2, "Race 2", &[])),
            );
        let api = api(fetcher.clone());
        let calendar = SeasonCalendar::fetch(&api, 2024).await.unwrap();

        let err = collect_race_points(&api, &calendar, 1).await.unwrap_err();

        assert!(matches!(err, AppError::FetchExhausted { .. }));
        assert_eq!(fetcher.calls_matching("/2/results.json"), 0);
    }
}
