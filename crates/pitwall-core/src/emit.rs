//! Long-format CSV emitter.
//!
//! Callers declare the schema as an ordered column list; each row is a
//! [`Record`] mapping column names to already-rendered cell values. Columns a
//! record does not set are written as empty cells. Output is a pure function
//! of the inputs, so re-running a pipeline on unchanged upstream data
//! reproduces the files byte for byte.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::AppError;

/// One row mapping, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record(BTreeMap<String, String>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: impl Into<String>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: &str, value: impl Into<String>) {
        self.0.insert(column.to_string(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.0.get(column).map(String::as_str)
    }
}

/// A row type with a fixed long-format schema.
pub trait LongRow {
    const COLUMNS: &'static [&'static str];

    fn to_record(&self) -> Record;
}

/// Render a float the way the reporting layer expects (`25.0`, `0.5`).
pub fn fmt_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// Render a raw JSON scalar as a cell: `null` becomes empty, strings are
/// written unquoted, anything else uses its JSON text.
pub fn fmt_json_scalar(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Compute a SHA-256 hash of a byte slice, returned as 64-char hex.
pub fn compute_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// Write a header row plus one row per record. Returns the number of rows.
pub fn write_table<W, I>(writer: W, columns: &[&str], records: I) -> Result<usize, AppError>
where
    W: Write,
    I: IntoIterator<Item = Record>,
{
    let mut csv = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv.write_record(columns)?;

    let mut rows = 0;
    for record in records {
        csv.write_record(columns.iter().map(|c| record.get(c).unwrap_or("")))?;
        rows += 1;
    }
    csv.flush()?;
    Ok(rows)
}

/// Render a typed row set into CSV bytes.
pub fn render_rows<R: LongRow>(rows: &[R]) -> Result<Vec<u8>, AppError> {
    let mut buf = Vec::new();
    write_table(&mut buf, R::COLUMNS, rows.iter().map(LongRow::to_record))?;
    Ok(buf)
}

/// Outcome of writing one table file.
#[derive(Debug, Clone)]
pub struct EmitSummary {
    pub path: PathBuf,
    pub rows: usize,
    /// SHA-256 of the bytes written.
    pub content_hash: String,
    /// False when the file already held exactly these bytes.
    pub changed: bool,
}

/// Write a typed row set to `path`, creating parent directories.
pub fn write_table_file<R: LongRow>(path: &Path, rows: &[R]) -> Result<EmitSummary, AppError> {
    let bytes = render_rows(rows)?;
    let content_hash = compute_hash(&bytes);

    let changed = match std::fs::read(path) {
        Ok(existing) => compute_hash(&existing) != content_hash,
        Err(_) => true,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| AppError::OutputError(format!("{}: {e}", parent.display())))?;
    }
    std::fs::write(path, &bytes)
        .map_err(|e| AppError::OutputError(format!("{}: {e}", path.display())))?;

    if changed {
        tracing::info!(
            path = %path.display(),
            rows = rows.len(),
            content_hash = %&content_hash[..8],
            "Wrote table"
        );
    } else {
        tracing::info!(
            path = %path.display(),
            rows = rows.len(),
            content_hash = %&content_hash[..8],
            "Table unchanged"
        );
    }

    Ok(EmitSummary {
        path: path.to_path_buf(),
        rows: rows.len(),
        content_hash,
        changed,
    })
}

/// Output tables written by the pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    DriverRacePoints,
    ConstructorRacePoints,
    DriverStandings,
    ConstructorStandings,
    Schedule,
    FantasyDriverPoints,
    FantasyConstructorPoints,
    FantasyDriverPrices,
    FantasyConstructorPrices,
}

impl Table {
    pub fn file_name(self) -> &'static str {
        match self {
            Table::DriverRacePoints => "f1_official_driver_race_points.csv",
            Table::ConstructorRacePoints => "f1_official_constructor_race_points.csv",
            Table::DriverStandings => "f1_official_driver_standings.csv",
            Table::ConstructorStandings => "f1_official_constructor_standings.csv",
            Table::Schedule => "dim_round_dates.csv",
            Table::FantasyDriverPoints => "f1fantasytools_points_drivers_long.csv",
            Table::FantasyConstructorPoints => "f1fantasytools_points_constructors_long.csv",
            Table::FantasyDriverPrices => "f1fantasytools_prices_drivers_long.csv",
            Table::FantasyConstructorPrices => "f1fantasytools_prices_constructors_long.csv",
        }
    }
}

/// `<root>/seasons/<season>/raw/<table>.csv`
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn season_dir(&self, season: u32) -> PathBuf {
        self.root
            .join("seasons")
            .join(season.to_string())
            .join("raw")
    }

    pub fn table_path(&self, season: u32, table: Table) -> PathBuf {
        self.season_dir(season).join(table.file_name())
    }
}
