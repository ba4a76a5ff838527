//! Candle series loading.
//!
//! CSV files need a `timestamp,open,high,low,close,volume` header with the
//! timestamp in epoch milliseconds. Extra columns are ignored. JSON Lines
//! files hold one serialized [`Candle`] per line; blank lines are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use pmm_core::{validate_series, Candle, Price, Size};
use rust_decimal::Decimal;
use tracing::info;

use crate::error::{PersistenceError, PersistenceResult};
use crate::writer::OutputFormat;

const COLUMNS: [&str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

/// Load and validate a candle series.
pub fn load_candles(path: impl AsRef<Path>) -> PersistenceResult<Vec<Candle>> {
    let path = path.as_ref();
    let candles = match OutputFormat::from_path(path)? {
        OutputFormat::Csv => read_csv(path)?,
        OutputFormat::JsonLines => read_jsonl(path)?,
    };

    validate_series(&candles)?;

    info!(
        path = %path.display(),
        candles = candles.len(),
        first = ?candles.first().map(|c| c.timestamp),
        last = ?candles.last().map(|c| c.timestamp),
        "Loaded candles"
    );
    Ok(candles)
}

fn row_error(path: &Path, line: u64, reason: impl Into<String>) -> PersistenceError {
    PersistenceError::Row {
        path: path.display().to_string(),
        line,
        reason: reason.into(),
    }
}

fn read_csv(path: &Path) -> PersistenceResult<Vec<Candle>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = rdr.headers()?.clone();
    let mut index = [0usize; 6];
    for (slot, name) in index.iter_mut().zip(COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| row_error(path, 1, format!("missing column '{name}'")))?;
    }

    let mut candles = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let field = |i: usize| record.get(index[i]).unwrap_or("");

        let timestamp = parse_timestamp(field(0))
            .ok_or_else(|| row_error(path, line, format!("bad timestamp '{}'", field(0))))?;
        let decimal = |i: usize| {
            Decimal::from_str(field(i))
                .map_err(|e| row_error(path, line, format!("bad {}: {e}", COLUMNS[i])))
        };

        candles.push(Candle::new(
            timestamp,
            Price::new(decimal(1)?),
            Price::new(decimal(2)?),
            Price::new(decimal(3)?),
            Price::new(decimal(4)?),
            Size::new(decimal(5)?),
        ));
    }
    Ok(candles)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let millis = raw.parse::<i64>().ok()?;
    Utc.timestamp_millis_opt(millis).single()
}

fn read_jsonl(path: &Path) -> PersistenceResult<Vec<Candle>> {
    let reader = BufReader::new(File::open(path)?);
    let mut candles = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let candle: Candle = serde_json::from_str(&line)
            .map_err(|e| row_error(path, n as u64 + 1, e.to_string()))?;
        candles.push(candle);
    }
    Ok(candles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmm_core::CoreError;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_csv() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "eth.csv",
            "timestamp,open,high,low,close,volume\n\
             1700000000000,2000.1,2001.5,1999.0,2000.9,12.5\n\
             1700000060000,2000.9,2002.0,2000.2,2001.7,8\n",
        );
        let candles = load_candles(&path).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].open, Price::new(dec!(2000.1)));
        assert_eq!(candles[1].close, Price::new(dec!(2001.7)));
        assert_eq!(candles[1].timestamp.timestamp_millis(), 1_700_000_060_000);
    }

    #[test]
    fn test_csv_column_order_and_extra_columns() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "k.csv",
            "close,volume,trades,timestamp,low,high,open\n\
             10.5,1,7,1000,9.5,11,10\n",
        );
        let candles = load_candles(&path).unwrap();
        assert_eq!(candles[0].close, Price::new(dec!(10.5)));
        assert_eq!(candles[0].high, Price::new(dec!(11)));
    }

    #[test]
    fn test_csv_missing_column() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "k.csv", "timestamp,open,high,low,close\n1,1,1,1,1\n");
        let err = load_candles(&path).unwrap_err();
        assert!(err.to_string().contains("missing column 'volume'"));
    }

    #[test]
    fn test_csv_bad_number_reports_line() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "k.csv",
            "timestamp,open,high,low,close,volume\n1000,10,11,9,10,1\n2000,10,abc,9,10,1\n",
        );
        match load_candles(&path) {
            Err(PersistenceError::Row { line, reason, .. }) => {
                assert_eq!(line, 3);
                assert!(reason.contains("high"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_non_increasing_timestamps_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "k.csv",
            "timestamp,open,high,low,close,volume\n2000,10,11,9,10,1\n2000,10,11,9,10,1\n",
        );
        assert!(matches!(
            load_candles(&path),
            Err(PersistenceError::Core(CoreError::NonMonotonicTimestamp { index: 1 }))
        ));
    }

    #[test]
    fn test_load_jsonl() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "k.jsonl",
            "{\"timestamp\":1000,\"open\":\"10\",\"high\":\"11\",\"low\":\"9\",\"close\":\"10.5\",\"volume\":\"3\"}\n\
             \n\
             {\"timestamp\":2000,\"open\":\"10.5\",\"high\":\"12\",\"low\":\"10\",\"close\":\"11\",\"volume\":\"2\"}\n",
        );
        let candles = load_candles(&path).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[1].close, Price::new(dec!(11)));
    }

    #[test]
    fn test_inconsistent_bar_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "k.jsonl",
            "{\"timestamp\":1000,\"open\":\"10\",\"high\":\"9\",\"low\":\"8\",\"close\":\"10\",\"volume\":\"1\"}\n",
        );
        assert!(matches!(
            load_candles(&path),
            Err(PersistenceError::Core(CoreError::InvalidCandle { index: 0, .. }))
        ));
    }

    #[test]
    fn test_unknown_extension() {
        assert!(matches!(
            load_candles("candles.xlsx"),
            Err(PersistenceError::UnsupportedFormat(_))
        ));
    }
}
