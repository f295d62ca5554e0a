use std::collections::BTreeMap;

use serde::Deserialize;

use crate::emit::{LongRow, Record, fmt_float, fmt_json_scalar};

/// One scheduled race event of a season.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundDescriptor {
    pub season: u32,
    pub round: u32,
    pub race_name: String,
}

/// Calendar details for one round (`dim_round_dates`).
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleRow {
    pub season: u32,
    pub round: u32,
    pub race_name: String,
    pub circuit_name: String,
    pub locality: String,
    pub country: String,
    pub race_date: String,
    pub race_time: String,
}

/// Driver-grained race result.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceResultRow {
    pub season: u32,
    pub round: u32,
    pub race_name: String,
    /// Absent when the result is unclassified.
    pub finishing_position: Option<u32>,
    pub points: f64,
    pub driver_code: String,
    pub driver_external_id: String,
    pub driver_given_name: String,
    pub driver_family_name: String,
    pub constructor_external_id: String,
    pub constructor_name: String,
}

/// Constructor points for one race, summed from the drivers' results.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorRaceRow {
    pub season: u32,
    pub round: u32,
    pub race_name: String,
    pub points: f64,
    pub constructor_external_id: String,
    pub constructor_name: String,
}

/// Driver championship state immediately after a round.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverStandingsRow {
    pub season: u32,
    pub round: u32,
    pub race_name: String,
    pub position: Option<u32>,
    /// Cumulative.
    pub points: f64,
    pub wins: u32,
    pub driver_code: String,
    pub driver_external_id: String,
    pub driver_given_name: String,
    pub driver_family_name: String,
    pub constructor_external_id: String,
    pub constructor_name: String,
}

/// Constructor championship state immediately after a round.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorStandingsRow {
    pub season: u32,
    pub round: u32,
    pub race_name: String,
    pub position: Option<u32>,
    /// Cumulative.
    pub points: f64,
    pub wins: u32,
    pub constructor_external_id: String,
    pub constructor_name: String,
}

/// Fantasy-game scoring of one entity in one round.
#[derive(Debug, Clone, PartialEq)]
pub struct FantasyPointsRow {
    pub season: u32,
    pub round: u32,
    pub id: serde_json::Value,
    pub abbr: serde_json::Value,
    pub entity_type: serde_json::Value,
    pub total_points: serde_json::Value,
    pub nn_total_points: serde_json::Value,
}

/// Fantasy-game price and ownership of one entity in one round.
#[derive(Debug, Clone, PartialEq)]
pub struct FantasyPriceRow {
    pub season: u32,
    pub round: u32,
    pub id: serde_json::Value,
    pub abbr: serde_json::Value,
    pub price: serde_json::Value,
    pub price_change: serde_json::Value,
    pub percent_owned: serde_json::Value,
    pub x2_percent_owned: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Embedded season payload
// ---------------------------------------------------------------------------

/// Decoded `{"seasonResult": ...}` object embedded in the statistics page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeasonBlob {
    #[serde(rename = "seasonResult", default)]
    pub season_result: Option<SeasonResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonResult {
    #[serde(default)]
    pub season: Option<serde_json::Value>,
    /// Keyed by round number; ordered ascending.
    #[serde(default)]
    pub race_results: Option<BTreeMap<u32, RaceResultSet>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RaceResultSet {
    #[serde(default)]
    pub drivers: Option<Vec<FantasyEntity>>,
    #[serde(default)]
    pub constructors: Option<Vec<FantasyEntity>>,
}

/// One driver or constructor entry of the fantasy payload.
///
/// Every field is kept as the raw JSON scalar; absent fields become `null`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FantasyEntity {
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(default)]
    pub abbreviation: serde_json::Value,
    #[serde(rename = "type", default)]
    pub entity_type: serde_json::Value,
    #[serde(default)]
    pub total_points: serde_json::Value,
    #[serde(default)]
    pub nn_total_points: serde_json::Value,
    #[serde(default)]
    pub price: serde_json::Value,
    #[serde(default)]
    pub price_change: serde_json::Value,
    #[serde(default)]
    pub percent_owned: serde_json::Value,
    #[serde(default)]
    pub x2_percent_owned: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Long-format columns
// ---------------------------------------------------------------------------

fn fmt_position(position: Option<u32>) -> String {
    position.map(|p| p.to_string()).unwrap_or_default()
}

impl LongRow for ScheduleRow {
    const COLUMNS: &'static [&'static str] = &[
        "season",
        "round",
        "raceName",
        "circuitName",
        "locality",
        "country",
        "raceDate",
        "raceTime",
    ];

    fn to_record(&self) -> Record {
        Record::new()
            .with("season", self.season.to_string())
            .with("round", self.round.to_string())
            .with("raceName", &self.race_name)
            .with("circuitName", &self.circuit_name)
            .with("locality", &self.locality)
            .with("country", &self.country)
            .with("raceDate", &self.race_date)
            .with("raceTime", &self.race_time)
    }
}

impl LongRow for RaceResultRow {
    const COLUMNS: &'static [&'static str] = &[
        "season",
        "round",
        "raceName",
        "position",
        "points",
        "driverCode",
        "ergast_driver_id",
        "driver_givenName",
        "driver_familyName",
        "constructorCode",
        "constructor_name",
    ];

    fn to_record(&self) -> Record {
        Record::new()
            .with("season", self.season.to_string())
            .with("round", self.round.to_string())
            .with("raceName", &self.race_name)
            .with("position", fmt_position(self.finishing_position))
            .with("points", fmt_float(self.points))
            .with("driverCode", &self.driver_code)
            .with("ergast_driver_id", &self.driver_external_id)
            .with("driver_givenName", &self.driver_given_name)
            .with("driver_familyName", &self.driver_family_name)
            .with("constructorCode", &self.constructor_external_id)
            .with("constructor_name", &self.constructor_name)
    }
}

impl LongRow for ConstructorRaceRow {
    const COLUMNS: &'static [&'static str] = &[
        "season",
        "round",
        "raceName",
        "points",
        "constructorCode",
        "constructor_name",
    ];

    fn to_record(&self) -> Record {
        Record::new()
            .with("season", self.season.to_string())
            .with("round", self.round.to_string())
            .with("raceName", &self.race_name)
            .with("points", fmt_float(self.points))
            .with("constructorCode", &self.constructor_external_id)
            .with("constructor_name", &self.constructor_name)
    }
}

impl LongRow for DriverStandingsRow {
    const COLUMNS: &'static [&'static str] = &[
        "season",
        "round",
        "raceName",
        "position",
        "points",
        "wins",
        "driverCode",
        "ergast_driver_id",
        "driver_givenName",
        "driver_familyName",
        "constructorCode",
        "constructor_name",
    ];

    fn to_record(&self) -> Record {
        Record::new()
            .with("season", self.season.to_string())
            .with("round", self.round.to_string())
            .with("raceName", &self.race_name)
            .with("position", fmt_position(self.position))
            .with("points", fmt_float(self.points))
            .with("wins", self.wins.to_string())
            .with("driverCode", &self.driver_code)
            .with("ergast_driver_id", &self.driver_external_id)
            .with("driver_givenName", &self.driver_given_name)
            .with("driver_familyName", &self.driver_family_name)
            .with("constructorCode", &self.constructor_external_id)
            .with("constructor_name", &self.constructor_name)
    }
}

impl LongRow for ConstructorStandingsRow {
    const COLUMNS: &'static [&'static str] = &[
        "season",
        "round",
        "raceName",
        "position",
        "points",
        "wins",
        "constructorCode",
        "constructor_name",
    ];

    fn to_record(&self) -> Record {
        Record::new()
            .with("season", self.season.to_string())
            .with("round", self.round.to_string())
            .with("raceName", &self.race_name)
            .with("position", fmt_position(self.position))
            .with("points", fmt_float(self.points))
            .with("wins", self.wins.to_string())
            .with("constructorCode", &self.constructor_external_id)
            .with("constructor_name", &self.constructor_name)
    }
}

impl LongRow for FantasyPointsRow {
    const COLUMNS: &'static [&'static str] = &[
        "season",
        "round",
        "id",
        "abbr",
        "type",
        "totalPoints",
        "nnTotalPoints",
    ];

    fn to_record(&self) -> Record {
        Record::new()
            .with("season", self.season.to_string())
            .with("round", self.round.to_string())
            .with("id", fmt_json_scalar(&self.id))
            .with("abbr", fmt_json_scalar(&self.abbr))
            .with("type", fmt_json_scalar(&self.entity_type))
            .with("totalPoints", fmt_json_scalar(&self.total_points))
            .with("nnTotalPoints", fmt_json_scalar(&self.nn_total_points))
    }
}

impl LongRow for FantasyPriceRow {
    const COLUMNS: &'static [&'static str] = &[
        "season",
        "round",
        "id",
        "abbr",
        "price",
        "priceChange",
        "percentOwned",
        "x2PercentOwned",
    ];

    fn to_record(&self) -> Record {
        Record::new()
            .with("season", self.season.to_string())
            .with("round", self.round.to_string())
            .with("id", fmt_json_scalar(&self.id))
            .with("abbr", fmt_json_scalar(&self.abbr))
            .with("price", fmt_json_scalar(&self.price))
            .with("priceChange", fmt_json_scalar(&self.price_change))
            .with("percentOwned", fmt_json_scalar(&self.percent_owned))
            .with("x2PercentOwned", fmt_json_scalar(&self.x2_percent_owned))
    }
}
