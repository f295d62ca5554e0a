use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use pitwall_core::testutil::{
    MockFetcher, MockResponse, constructor_standings_payload, driver_standings_payload, result,
    results_payload, season_payload,
};
use pitwall_core::{ErgastApi, MirrorConfig, MirrorFetcher, OfficialPipeline};

pub const PRIMARY: &str = "https://primary.example/ergast";
pub const LEGACY: &str = "https://legacy.example/mrd";

/// Pipeline over the two test mirrors, with `concurrency` rounds in flight.
pub fn official_pipeline(fetcher: MockFetcher, concurrency: usize) -> OfficialPipeline<MockFetcher> {
    let config = MirrorConfig::new(
        vec![PRIMARY.to_string(), LEGACY.to_string()],
        Duration::from_secs(5),
    )
    .unwrap();
    OfficialPipeline::new(ErgastApi::new(MirrorFetcher::new(fetcher, config)))
        .with_concurrency(concurrency)
}

/// Three-round 2024 season served by whichever mirror the routes reach.
pub fn season_2024(fetcher: MockFetcher) -> MockFetcher {
    fetcher
        .route(
            "/f1/2024.json",
            MockResponse::json(season_payload(
                2024,
                &[
                    (3, "Australian Grand Prix"),
                    (1, "Bahrain Grand Prix"),
                    (2, "Saudi Arabian Grand Prix"),
                ],
            )),
        )
        .route(
            "/f1/2024/1/results.json",
            MockResponse::json(results_payload(
                2024,
                1,
                "Bahrain Grand Prix",
                &[
                    result("1", "26", "VER", "red_bull"),
                    result("2", "18", "PER", "red_bull"),
                    result("3", "15", "SAI", "ferrari"),
                    result("4", "12", "LEC", "ferrari"),
                    result("5", "10", "RUS", "mercedes"),
                ],
            )),
        )
        .route(
            "/f1/2024/2/results.json",
            MockResponse::json(results_payload(
                2024,
                2,
                "Saudi Arabian Grand Prix",
                &[
                    result("1", "25", "VER", "red_bull"),
                    result("2", "18", "PER", "red_bull"),
                    result("3", "16", "LEC", "ferrari"),
                    result("", "0", "HAM", "mercedes"),
                ],
            )),
        )
        // Round 3 has not been run yet.
        .route(
            "/f1/2024/3/results.json",
            MockResponse::json(results_payload(2024, 3, "Australian Grand Prix", &[])),
        )
        .route(
            "/f1/2024/1/driverStandings.json",
            MockResponse::json(driver_standings_payload(&[
                ("1", "26", "1", "VER", "red_bull"),
                ("2", "18", "0", "PER", "red_bull"),
            ])),
        )
        .route(
            "/f1/2024/2/driverStandings.json",
            MockResponse::json(driver_standings_payload(&[
                ("1", "51", "2", "VER", "red_bull"),
                ("2", "36", "0", "PER", "red_bull"),
            ])),
        )
        .route(
            "/f1/2024/3/driverStandings.json",
            MockResponse::json(driver_standings_payload(&[])),
        )
        .route(
            "/f1/2024/1/constructorStandings.json",
            MockResponse::json(constructor_standings_payload(&[
                ("1", "44", "1", "red_bull"),
                ("2", "27", "0", "ferrari"),
            ])),
        )
        .route(
            "/f1/2024/2/constructorStandings.json",
            MockResponse::json(constructor_standings_payload(&[
                ("1", "87", "2", "red_bull"),
                ("2", "43", "0", "ferrari"),
            ])),
        )
        .route(
            "/f1/2024/3/constructorStandings.json",
            MockResponse::json(constructor_standings_payload(&[])),
        )
}

/// Read a written table back as header -> cell maps.
pub fn read_table(path: &Path) -> Vec<HashMap<String, String>> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader.deserialize().map(|row| row.unwrap()).collect()
}
