//! Test utilities: mock implementations of the core traits and builders for
//! upstream payloads.
//!
//! Handwritten mocks for dependency injection in unit tests. Mocks use
//! `Arc<Mutex<_>>` for interior mutability, allowing assertions on recorded
//! calls.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;

use crate::error::AppError;
use crate::models::SeasonBlob;
use crate::traits::{BlobExtractor, Fetcher};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Canned outcome for a routed URL.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Body(String),
    Status(u16),
    ConnectionRefused,
    /// Never answers; the caller's timeout has to fire.
    Hang,
}

impl MockResponse {
    pub fn body(body: impl Into<String>) -> Self {
        MockResponse::Body(body.into())
    }

    pub fn json(value: serde_json::Value) -> Self {
        MockResponse::Body(value.to_string())
    }
}

/// Mock fetcher that routes URLs to canned responses.
///
/// The first route whose key is a substring of the requested URL answers.
/// Routes are not consumed, so a pipeline can be run repeatedly against the
/// same fetcher. Unrouted URLs answer HTTP 404.
#[derive(Clone, Default)]
pub struct MockFetcher {
    routes: Arc<Mutex<Vec<(String, MockResponse)>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, key: &str, response: MockResponse) -> Self {
        self.routes
            .lock()
            .unwrap()
            .push((key.to_string(), response));
        self
    }

    /// Every URL requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_matching(&self, needle: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.contains(needle))
            .count()
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        self.calls.lock().unwrap().push(url.to_string());
        let response = {
            let routes = self.routes.lock().unwrap();
            routes
                .iter()
                .find(|(key, _)| url.contains(key.as_str()))
                .map(|(_, response)| response.clone())
        };

        match response {
            Some(MockResponse::Body(body)) => Ok(body),
            Some(MockResponse::Status(code)) => {
                Err(AppError::HttpError(format!("HTTP {code} for {url}")))
            }
            Some(MockResponse::ConnectionRefused) => Err(AppError::NetworkError(format!(
                "Connection failed: {url}: connection refused"
            ))),
            Some(MockResponse::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(AppError::Timeout(3600))
            }
            None => Err(AppError::HttpError(format!("HTTP 404 for {url}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// MockExtractor
// ---------------------------------------------------------------------------

/// Mock extractor that returns a fixed blob or a structural error.
#[derive(Clone)]
pub struct MockExtractor {
    blob: Option<SeasonBlob>,
    pages: Arc<Mutex<Vec<String>>>,
}

impl MockExtractor {
    pub fn new(blob: SeasonBlob) -> Self {
        Self {
            blob: Some(blob),
            pages: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing() -> Self {
        Self {
            blob: None,
            pages: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Pages handed to `extract`, in order.
    pub fn pages(&self) -> Vec<String> {
        self.pages.lock().unwrap().clone()
    }
}

impl BlobExtractor for MockExtractor {
    fn extract(&self, html: &str) -> Result<SeasonBlob, AppError> {
        self.pages.lock().unwrap().push(html.to_string());
        self.blob
            .clone()
            .ok_or_else(|| AppError::ExtractionError("Could not find embedded seasonResult blob".into()))
    }
}

// ---------------------------------------------------------------------------
// Upstream payload builders
// ---------------------------------------------------------------------------

/// Calendar payload (`/f1/{season}.json`) with one race per `(round, name)`.
pub fn season_payload(season: u32, races: &[(u32, &str)]) -> serde_json::Value {
    let races: Vec<serde_json::Value> = races
        .iter()
        .map(|(round, name)| {
            json!({
                "season": season.to_string(),
                "round": round.to_string(),
                "raceName": name,
                "Circuit": {
                    "circuitName": format!("{name} Circuit"),
                    "Location": {"locality": "Town", "country": "Country"}
                },
                "date": format!("{season}-03-{:02}", round),
                "time": "15:00:00Z"
            })
        })
        .collect();
    json!({"MRData": {"RaceTable": {"season": season.to_string(), "Races": races}}})
}

/// One driver's classified result for [`results_payload`].
#[derive(Debug, Clone)]
pub struct ResultFixture {
    pub position: &'static str,
    pub points: &'static str,
    pub code: &'static str,
    pub driver_id: &'static str,
    pub constructor_id: &'static str,
    pub constructor_name: &'static str,
}

pub fn result(
    position: &'static str,
    points: &'static str,
    code: &'static str,
    constructor_id: &'static str,
) -> ResultFixture {
    ResultFixture {
        position,
        points,
        code,
        driver_id: code,
        constructor_id,
        constructor_name: constructor_id,
    }
}

/// Results payload (`/f1/{season}/{round}/results.json`); no fixtures means
/// an empty race list.
pub fn results_payload(
    season: u32,
    round: u32,
    race_name: &str,
    results: &[ResultFixture],
) -> serde_json::Value {
    if results.is_empty() {
        return json!({"MRData": {"RaceTable": {"Races": []}}});
    }
    let results: Vec<serde_json::Value> = results
        .iter()
        .map(|r| {
            json!({
                "position": r.position,
                "points": r.points,
                "Driver": {
                    "driverId": r.driver_id,
                    "code": r.code,
                    "givenName": format!("Given {}", r.code),
                    "familyName": format!("Family {}", r.code)
                },
                "Constructor": {"constructorId": r.constructor_id, "name": r.constructor_name}
            })
        })
        .collect();
    json!({"MRData": {"RaceTable": {"Races": [{
        "season": season.to_string(),
        "round": round.to_string(),
        "raceName": race_name,
        "Results": results
    }]}}})
}

/// Driver standings payload; entries are `(position, points, wins, code, constructor_id)`.
pub fn driver_standings_payload(entries: &[(&str, &str, &str, &str, &str)]) -> serde_json::Value {
    if entries.is_empty() {
        return json!({"MRData": {"StandingsTable": {"StandingsLists": []}}});
    }
    let rows: Vec<serde_json::Value> = entries
        .iter()
        .map(|(position, points, wins, code, constructor)| {
            json!({
                "position": position,
                "points": points,
                "wins": wins,
                "Driver": {"driverId": code, "code": code, "givenName": "G", "familyName": "F"},
                "Constructors": [{"constructorId": constructor, "name": constructor}]
            })
        })
        .collect();
    json!({"MRData": {"StandingsTable": {"StandingsLists": [{"DriverStandings": rows}]}}})
}

/// Constructor standings payload; entries are `(position, points, wins, constructor_id)`.
pub fn constructor_standings_payload(entries: &[(&str, &str, &str, &str)]) -> serde_json::Value {
    if entries.is_empty() {
        return json!({"MRData": {"StandingsTable": {"StandingsLists": []}}});
    }
    let rows: Vec<serde_json::Value> = entries
        .iter()
        .map(|(position, points, wins, constructor)| {
            json!({
                "position": position,
                "points": points,
                "wins": wins,
                "Constructor": {"constructorId": constructor, "name": constructor}
            })
        })
        .collect();
    json!({"MRData": {"StandingsTable": {"StandingsLists": [{"ConstructorStandings": rows}]}}})
}
