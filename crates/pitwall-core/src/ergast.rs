//! Wire types and client for the Ergast-compatible racing-data API.
//!
//! Every level of the `MRData` envelope is optional: a missing table or list
//! decodes as empty, which upstream uses to signal "no data yet". Numeric
//! fields arrive as strings and are coerced leniently; see the `coerce_*`
//! helpers.

use serde::Deserialize;
use serde_json::Value;

use crate::error::AppError;
use crate::mirror::MirrorFetcher;
use crate::traits::Fetcher;

const PAGE_LIMIT: &str = "1000";

#[derive(Debug, Default, Deserialize)]
pub struct Envelope {
    #[serde(rename = "MRData", default)]
    pub mr_data: Option<MrData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MrData {
    #[serde(rename = "RaceTable", default)]
    pub race_table: Option<RaceTable>,
    #[serde(rename = "StandingsTable", default)]
    pub standings_table: Option<StandingsTable>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RaceTable {
    #[serde(rename = "Races", default)]
    pub races: Option<Vec<Race>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Race {
    #[serde(default)]
    pub season: Option<Value>,
    #[serde(default)]
    pub round: Option<Value>,
    #[serde(default)]
    pub race_name: Option<String>,
    #[serde(rename = "Circuit", default)]
    pub circuit: Option<Circuit>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(rename = "Results", default)]
    pub results: Option<Vec<RaceResult>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Circuit {
    #[serde(default)]
    pub circuit_name: Option<String>,
    #[serde(rename = "Location", default)]
    pub location: Option<Location>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RaceResult {
    #[serde(default)]
    pub position: Option<Value>,
    #[serde(default)]
    pub points: Option<Value>,
    #[serde(rename = "Driver", default)]
    pub driver: Option<Driver>,
    #[serde(rename = "Constructor", default)]
    pub constructor: Option<Constructor>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    #[serde(default)]
    pub driver_id: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
}

impl Driver {
    pub fn code(&self) -> String {
        self.code.as_deref().unwrap_or("").trim().to_uppercase()
    }

    pub fn id(&self) -> String {
        self.driver_id.as_deref().unwrap_or("").trim().to_string()
    }

    pub fn given_name(&self) -> String {
        self.given_name.clone().unwrap_or_default()
    }

    pub fn family_name(&self) -> String {
        self.family_name.clone().unwrap_or_default()
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constructor {
    #[serde(default)]
    pub constructor_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl Constructor {
    pub fn id(&self) -> String {
        self.constructor_id.as_deref().unwrap_or("").trim().to_string()
    }

    pub fn name(&self) -> String {
        self.name.clone().unwrap_or_default()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StandingsTable {
    #[serde(rename = "StandingsLists", default)]
    pub standings_lists: Option<Vec<StandingsList>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StandingsList {
    #[serde(rename = "DriverStandings", default)]
    pub driver_standings: Option<Vec<DriverStanding>>,
    #[serde(rename = "ConstructorStandings", default)]
    pub constructor_standings: Option<Vec<ConstructorStanding>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DriverStanding {
    #[serde(default)]
    pub position: Option<Value>,
    #[serde(default)]
    pub points: Option<Value>,
    #[serde(default)]
    pub wins: Option<Value>,
    #[serde(rename = "Driver", default)]
    pub driver: Option<Driver>,
    #[serde(rename = "Constructors", default)]
    pub constructors: Option<Vec<Constructor>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConstructorStanding {
    #[serde(default)]
    pub position: Option<Value>,
    #[serde(default)]
    pub points: Option<Value>,
    #[serde(default)]
    pub wins: Option<Value>,
    #[serde(rename = "Constructor", default)]
    pub constructor: Option<Constructor>,
}

impl Envelope {
    /// `MRData.RaceTable.Races`, empty when any level is missing.
    pub fn into_races(self) -> Vec<Race> {
        self.mr_data
            .and_then(|m| m.race_table)
            .and_then(|t| t.races)
            .unwrap_or_default()
    }

    /// First entry of `MRData.StandingsTable.StandingsLists`, if any.
    pub fn into_first_standings_list(self) -> Option<StandingsList> {
        self.mr_data
            .and_then(|m| m.standings_table)
            .and_then(|t| t.standings_lists)
            .and_then(|lists| lists.into_iter().next())
    }
}

// ---------------------------------------------------------------------------
// Lenient coercion
// ---------------------------------------------------------------------------

fn as_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parse a non-negative integer from a number or numeric string.
pub fn coerce_u32(value: Option<&Value>) -> Option<u32> {
    match value? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Points: missing, unparsable, negative or non-finite values count as zero.
pub fn coerce_points(value: Option<&Value>) -> f64 {
    match as_f64(value) {
        Some(p) if p.is_finite() && p > 0.0 => p,
        _ => 0.0,
    }
}

/// Position: absent unless a positive integer.
pub fn coerce_position(value: Option<&Value>) -> Option<u32> {
    coerce_u32(value).filter(|p| *p > 0)
}

/// Counters such as wins: zero unless parsable.
pub fn coerce_count(value: Option<&Value>) -> u32 {
    coerce_u32(value).unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub fn season_path(season: u32) -> String {
    format!("/f1/{season}.json")
}

pub fn results_path(season: u32, round: u32) -> String {
    format!("/f1/{season}/{round}/results.json")
}

pub fn driver_standings_path(season: u32, round: u32) -> String {
    format!("/f1/{season}/{round}/driverStandings.json")
}

pub fn constructor_standings_path(season: u32, round: u32) -> String {
    format!("/f1/{season}/{round}/constructorStandings.json")
}

/// Typed access to the racing-data API through the mirror fallback layer.
#[derive(Clone)]
pub struct ErgastApi<F> {
    mirrors: MirrorFetcher<F>,
}

impl<F: Fetcher> ErgastApi<F> {
    pub fn new(mirrors: MirrorFetcher<F>) -> Self {
        Self { mirrors }
    }

    async fn envelope(&self, path: &str) -> Result<Envelope, AppError> {
        self.mirrors.get_json(path, &[("limit", PAGE_LIMIT)]).await
    }

    pub async fn season(&self, season: u32) -> Result<Envelope, AppError> {
        self.envelope(&season_path(season)).await
    }

    pub async fn results(&self, season: u32, round: u32) -> Result<Envelope, AppError> {
        self.envelope(&results_path(season, round)).await
    }

    pub async fn driver_standings(&self, season: u32, round: u32) -> Result<Envelope, AppError> {
        self.envelope(&driver_standings_path(season, round)).await
    }

    pub async fn constructor_standings(
        &self,
        season: u32,
        round: u32,
    ) -> Result<Envelope, AppError> {
        self.envelope(&constructor_standings_path(season, round))
            .await
    }
}
