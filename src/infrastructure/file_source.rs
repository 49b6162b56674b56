use crate::domain::market::{Candle, Timeframe};
use crate::domain::ports::CandleSource;
use anyhow::{Context, Result, bail};
use chrono::DateTime;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Candle timestamp as found in files: unix milliseconds or RFC 3339.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTime {
    Millis(i64),
    Text(String),
}

impl RawTime {
    fn to_millis(&self) -> Result<i64> {
        match self {
            RawTime::Millis(ms) => Ok(*ms),
            RawTime::Text(text) => parse_time(text),
        }
    }
}

fn parse_time(text: &str) -> Result<i64> {
    let text = text.trim();
    if let Ok(ms) = text.parse::<i64>() {
        return Ok(ms);
    }
    let parsed = DateTime::parse_from_rfc3339(text)
        .with_context(|| format!("Failed to parse candle time '{}'", text))?;
    Ok(parsed.timestamp_millis())
}

#[derive(Debug, Deserialize)]
struct CsvRecord {
    time: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

#[derive(Debug, Deserialize)]
struct JsonRecord {
    time: RawTime,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

/// Sorts by time and drops repeated timestamps, keeping the first occurrence.
fn normalize(path: &Path, mut candles: Vec<Candle>) -> Vec<Candle> {
    candles.sort_by_key(|c| c.time);
    let before = candles.len();
    candles.dedup_by_key(|c| c.time);
    if candles.len() < before {
        warn!(
            "{}: dropped {} duplicate candle timestamps",
            path.display(),
            before - candles.len()
        );
    }
    candles
}

/// CSV file with a `time,open,high,low,close` header.
#[derive(Debug, Clone)]
pub struct CsvCandleFile {
    path: PathBuf,
}

impl CsvCandleFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn read(&self) -> Result<Vec<Candle>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        let mut rdr = csv::Reader::from_reader(BufReader::new(file));

        let mut candles = Vec::new();
        for (row, result) in rdr.deserialize().enumerate() {
            let record: CsvRecord = result
                .with_context(|| format!("{}: bad record at row {}", self.path.display(), row + 1))?;
            candles.push(Candle::new(
                parse_time(&record.time)?,
                record.open,
                record.high,
                record.low,
                record.close,
            ));
        }
        Ok(normalize(&self.path, candles))
    }
}

impl CandleSource for CsvCandleFile {
    fn fetch(&self, symbol: &str, timeframe: Timeframe) -> Result<Vec<Candle>> {
        let candles = self.read()?;
        info!(
            "Loaded {} {} candles for {} from {}",
            candles.len(),
            timeframe,
            symbol,
            self.path.display()
        );
        Ok(candles)
    }
}

/// JSON array of `{time, open, high, low, close}` objects.
#[derive(Debug, Clone)]
pub struct JsonCandleFile {
    path: PathBuf,
}

impl JsonCandleFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn read(&self) -> Result<Vec<Candle>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        let records: Vec<JsonRecord> = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;

        let candles = records
            .into_iter()
            .map(|r| {
                Ok(Candle::new(
                    r.time.to_millis()?,
                    r.open,
                    r.high,
                    r.low,
                    r.close,
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(normalize(&self.path, candles))
    }
}

impl CandleSource for JsonCandleFile {
    fn fetch(&self, symbol: &str, timeframe: Timeframe) -> Result<Vec<Candle>> {
        let candles = self.read()?;
        info!(
            "Loaded {} {} candles for {} from {}",
            candles.len(),
            timeframe,
            symbol,
            self.path.display()
        );
        Ok(candles)
    }
}

/// Picks the reader from the file extension (`.csv` or `.json`).
pub fn source_for_path(path: &Path) -> Result<Box<dyn CandleSource>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("csv") => Ok(Box::new(CsvCandleFile::new(path))),
        Some("json") => Ok(Box::new(JsonCandleFile::new(path))),
        _ => bail!("Unsupported candle file {}: expected .csv or .json", path.display()),
    }
}

/// Symbol guessed from the file stem, e.g. `XAUUSD_15m.csv` -> `XAUUSD`.
pub fn symbol_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.split(['_', '-', '.']).next())
        .filter(|s| !s.is_empty())
        .unwrap_or("UNKNOWN")
        .to_ascii_uppercase()
}
