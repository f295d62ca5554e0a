use std::collections::{BTreeMap, HashMap};

use pitwall_core::testutil::{MockFetcher, MockResponse, result, results_payload, season_payload};
use pitwall_core::{AppError, Mode, OutputLayout, Table};

use crate::integration::common::{LEGACY, PRIMARY, official_pipeline, read_table, season_2024};

fn points_by_round(rows: &[HashMap<String, String>]) -> BTreeMap<u32, f64> {
    let mut totals = BTreeMap::new();
    for row in rows {
        let round: u32 = row["round"].parse().unwrap();
        let points: f64 = row["points"].parse().unwrap();
        *totals.entry(round).or_insert(0.0) += points;
    }
    totals
}

#[tokio::test]
async fn primary_down_season_is_served_by_legacy_mirror() {
    let fetcher =
        season_2024(MockFetcher::new().route("primary.example", MockResponse::ConnectionRefused));
    let dir = tempfile::tempdir().unwrap();
    let layout = OutputLayout::new(dir.path());

    let written = official_pipeline(fetcher.clone(), 3)
        .run_season(2024, Mode::Both, true, &layout)
        .await
        .unwrap();

    assert_eq!(written.len(), 5);
    let calls = fetcher.calls();
    let primary_calls = calls.iter().filter(|c| c.starts_with(PRIMARY)).count();
    let legacy_calls = calls.iter().filter(|c| c.starts_with(LEGACY)).count();
    // Calendar plus three rounds of results, driver and constructor standings.
    assert_eq!(primary_calls, 10);
    assert_eq!(legacy_calls, 10);
    assert!(calls.iter().all(|c| c.contains("limit=1000")));
}

#[tokio::test]
async fn constructor_totals_conserve_driver_points() {
    let fetcher = season_2024(MockFetcher::new());
    let dir = tempfile::tempdir().unwrap();
    let layout = OutputLayout::new(dir.path());

    official_pipeline(fetcher, 4)
        .run_season(2024, Mode::Race, false, &layout)
        .await
        .unwrap();

    let drivers = read_table(&layout.table_path(2024, Table::DriverRacePoints));
    let constructors = read_table(&layout.table_path(2024, Table::ConstructorRacePoints));

    assert_eq!(drivers.len(), 9);
    assert_eq!(points_by_round(&drivers), points_by_round(&constructors));

    let rounds: Vec<&str> = drivers.iter().map(|r| r["round"].as_str()).collect();
    assert_eq!(rounds, ["1", "1", "1", "1", "1", "2", "2", "2", "2"]);

    let round_one: Vec<(&str, &str)> = constructors
        .iter()
        .filter(|r| r["round"] == "1")
        .map(|r| (r["constructorCode"].as_str(), r["points"].as_str()))
        .collect();
    assert_eq!(
        round_one,
        [("red_bull", "44.0"), ("ferrari", "27.0"), ("mercedes", "10.0")]
    );

    let unclassified = drivers.iter().find(|r| r["driverCode"] == "HAM").unwrap();
    assert_eq!(unclassified["position"], "");
    assert_eq!(unclassified["points"], "0.0");
}

#[tokio::test]
async fn standings_skip_rounds_without_a_list() {
    let fetcher = season_2024(MockFetcher::new());
    let dir = tempfile::tempdir().unwrap();
    let layout = OutputLayout::new(dir.path());

    official_pipeline(fetcher, 2)
        .run_season(2024, Mode::Standings, false, &layout)
        .await
        .unwrap();

    let drivers = read_table(&layout.table_path(2024, Table::DriverStandings));
    let keyed: Vec<(&str, &str, &str, &str)> = drivers
        .iter()
        .map(|r| {
            (
                r["round"].as_str(),
                r["raceName"].as_str(),
                r["driverCode"].as_str(),
                r["points"].as_str(),
            )
        })
        .collect();
    assert_eq!(
        keyed,
        [
            ("1", "Bahrain Grand Prix", "VER", "26.0"),
            ("1", "Bahrain Grand Prix", "PER", "18.0"),
            ("2", "Saudi Arabian Grand Prix", "VER", "51.0"),
            ("2", "Saudi Arabian Grand Prix", "PER", "36.0"),
        ]
    );
    assert!(!layout.table_path(2024, Table::DriverRacePoints).exists());
}

#[tokio::test]
async fn seasons_run_independently() {
    let fetcher = season_2024(MockFetcher::new()).route(
        "/f1/2031.json",
        MockResponse::json(season_payload(2031, &[])),
    );
    let dir = tempfile::tempdir().unwrap();
    let layout = OutputLayout::new(dir.path());
    let pipeline = official_pipeline(fetcher, 1);

    let empty = pipeline
        .run_season(2031, Mode::Both, true, &layout)
        .await
        .unwrap_err();
    let written = pipeline
        .run_season(2024, Mode::Both, true, &layout)
        .await
        .unwrap();

    assert!(empty.is_empty_result());
    assert!(!layout.season_dir(2031).exists());
    assert_eq!(written.len(), 5);
    assert!(written.iter().all(|s| s.path.starts_with(layout.season_dir(2024))));
}

#[tokio::test]
async fn unreachable_api_is_exhausted_and_writes_nothing() {
    let fetcher = MockFetcher::new()
        .route("primary.example", MockResponse::Status(502))
        .route("legacy.example", MockResponse::ConnectionRefused);
    let dir = tempfile::tempdir().unwrap();
    let layout = OutputLayout::new(dir.path());

    let err = official_pipeline(fetcher, 1)
        .run_season(2024, Mode::Both, true, &layout)
        .await
        .unwrap_err();

    match err {
        AppError::FetchExhausted { path, last } => {
            assert_eq!(path, "/f1/2024.json");
            assert!(matches!(*last, AppError::NetworkError(_)));
        }
        other => panic!("expected FetchExhausted, got {other:?}"),
    }
    assert!(!dir.path().join("seasons").exists());
}

#[tokio::test]
async fn upstream_correction_only_changes_affected_tables() {
    let dir = tempfile::tempdir().unwrap();
    let layout = OutputLayout::new(dir.path());

    official_pipeline(season_2024(MockFetcher::new()), 1)
        .run_season(2024, Mode::Both, false, &layout)
        .await
        .unwrap();

    // A penalty moves points from LEC to SAI after the first run.
    let corrected = MockFetcher::new().route(
        "/f1/2024/2/results.json",
        MockResponse::json(results_payload(
            2024,
            2,
            "Saudi Arabian Grand Prix",
            &[
                result("1", "25", "VER", "red_bull"),
                result("2", "18", "PER", "red_bull"),
                result("3", "16", "SAI", "ferrari"),
                result("", "0", "HAM", "mercedes"),
            ],
        )),
    );
    let second = official_pipeline(season_2024(corrected), 1)
        .run_season(2024, Mode::Both, false, &layout)
        .await
        .unwrap();

    let changed: Vec<bool> = second.iter().map(|s| s.changed).collect();
    // Driver race points change; constructor totals and standings do not.
    assert_eq!(changed, [true, false, false, false]);
}
