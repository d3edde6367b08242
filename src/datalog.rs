//! ==============================================================================
//! datalog.rs - the append-only CSV log
//! ==============================================================================
//!
//! purpose:
//!     the only channel between the monitor and the dashboard. the monitor
//!     appends one row per cycle; the dashboard re-reads the whole file on
//!     every request. there is no locking between the two processes.
//!
//! file format:
//!
//! ```text
//!     timestamp,pm1_0,pm2_5,pm10,co2,eco2,tvoc,ozone,temperature,humidity
//!     2025-03-01T10:00:00.123456+01:00,4,9,12,612,415,12,31.5,21.9,44
//!     2025-03-01T10:01:00.120019+01:00,5,10,13,,416,14,30.25,21.9,44.1
//! ```
//!
//! writer rules:
//!     - exactly one header row, written when the file is created
//!     - an absent sensor leaves empty cells, never zeros
//!     - rows end in '\n'; a torn last line is terminated before the next row
//!
//! reader tolerance:
//!     a final line without '\n' is a row still being written and is
//!     ignored. rows whose cell count differs from the header are skipped.
//!
//! ==============================================================================

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::record::Record;

/// Column order of every row. The header is the contract with all readers.
pub const COLUMNS: [&str; 10] = [
    "timestamp",
    "pm1_0",
    "pm2_5",
    "pm10",
    "co2",
    "eco2",
    "tvoc",
    "ozone",
    "temperature",
    "humidity",
];

/// Record key for each value column, in `COLUMNS[1..]` order.
const RECORD_KEYS: [&str; 9] = [
    "pms5003_pm1_0",
    "pms5003_pm2_5",
    "pms5003_pm10",
    "mhz19_co2",
    "sgp30_eco2",
    "sgp30_tvoc",
    "mq131_ozone",
    "dht22_temperature",
    "dht22_humidity",
];

pub fn header_line() -> String {
    let mut line = COLUMNS.join(",");
    line.push('\n');
    line
}

/// One record as a CSV line, newline included.
pub fn format_row(record: &Record) -> String {
    let mut line = String::from(record.timestamp());
    for key in RECORD_KEYS {
        line.push(',');
        if let Some(value) = record.get(key) {
            line.push_str(&value.to_string());
        }
    }
    line.push('\n');
    line
}

// ==============================================================================
// writer
// ==============================================================================

#[derive(Debug, Clone)]
pub struct DataLog {
    path: PathBuf,
}

impl DataLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row, writing the header first if the file is new or empty.
    ///
    /// A last line left unterminated by an interrupted write is closed off
    /// first, so the new row starts on a line of its own.
    pub fn append(&self, record: &Record) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening {}", self.path.display()))?;

        let len = file.metadata().map(|m| m.len()).unwrap_or(0);
        let mut chunk = if len == 0 {
            header_line()
        } else if ends_with_newline(&mut file, len)
            .with_context(|| format!("reading {}", self.path.display()))?
        {
            String::new()
        } else {
            tracing::warn!("[DATALOG] Terminating torn last line in {}", self.path.display());
            "\n".to_string()
        };
        chunk.push_str(&format_row(record));

        // one write so a reader never sees a header without its first row
        file.write_all(chunk.as_bytes())
            .with_context(|| format!("appending to {}", self.path.display()))?;
        Ok(())
    }
}

fn ends_with_newline(file: &mut File, len: u64) -> std::io::Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

// ==============================================================================
// reader
// ==============================================================================

/// One complete data row as the dashboard sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRow {
    pub timestamp: String,
    /// Numeric cells by column name. Empty or non-numeric cells are left out.
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

impl LogRow {
    pub fn get(&self, column: &str) -> Option<f64> {
        self.values.get(column).copied()
    }

    pub fn taken_at(&self) -> Option<DateTime<Local>> {
        parse_timestamp(&self.timestamp)
    }
}

/// Values of one column over a time window, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Series {
    pub timestamps: Vec<String>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LogStats {
    pub total_readings: usize,
    pub data_available: bool,
    pub oldest_reading: Option<String>,
    pub newest_reading: Option<String>,
}

/// RFC 3339 first; naive ISO-8601 is taken as local time.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Local>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Local));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()?
        .and_local_timezone(Local)
        .earliest()
}

#[derive(Debug, Clone)]
pub struct LogReader {
    path: PathBuf,
}

impl LogReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Every complete, well-formed row. A missing file reads as empty.
    pub fn rows(&self) -> Result<Vec<LogRow>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()))
            }
        };
        Ok(parse_log(&content))
    }

    pub fn latest(&self) -> Result<Option<LogRow>> {
        Ok(self.rows()?.pop())
    }

    /// `column` over the last `hours` before `now`, capped to the newest `max_points`.
    pub fn recent(&self, column: &str, hours: u32, max_points: usize, now: DateTime<Local>) -> Result<Series> {
        let mut points: Vec<(String, f64)> = in_window(self.rows()?, hours, now)
            .filter_map(|row| {
                let value = row.get(column)?;
                Some((row.timestamp, value))
            })
            .collect();

        let skip = points.len().saturating_sub(max_points);
        let (timestamps, values): (Vec<String>, Vec<f64>) = points.drain(skip..).unzip();
        Ok(Series { timestamps, values })
    }

    /// Row count and time span of the last 24 hours.
    pub fn stats(&self, now: DateTime<Local>) -> Result<LogStats> {
        let rows: Vec<LogRow> = in_window(self.rows()?, 24, now).collect();
        Ok(LogStats {
            total_readings: rows.len(),
            data_available: !rows.is_empty(),
            oldest_reading: rows.first().map(|r| r.timestamp.clone()),
            newest_reading: rows.last().map(|r| r.timestamp.clone()),
        })
    }
}

/// `None` cutoff: the window reaches past chrono's range and keeps every row.
fn in_window(rows: Vec<LogRow>, hours: u32, now: DateTime<Local>) -> impl Iterator<Item = LogRow> {
    let cutoff = Duration::try_hours(i64::from(hours)).and_then(|span| now.checked_sub_signed(span));
    rows.into_iter().filter(move |row| {
        row.taken_at()
            .is_some_and(|at| cutoff.map_or(true, |cutoff| at >= cutoff))
    })
}

/// Parse the whole file body. Uses the file's own header for column names.
pub fn parse_log(content: &str) -> Vec<LogRow> {
    // everything after the last '\n' is a row still being written
    let complete = match content.rfind('\n') {
        Some(end) => &content[..end],
        None => return Vec::new(),
    };

    let mut lines = complete.split('\n').map(|l| l.trim_end_matches('\r'));
    let header: Vec<&str> = match lines.next() {
        Some(h) => h.split(',').collect(),
        None => return Vec::new(),
    };

    lines
        .filter_map(|line| {
            let cells: Vec<&str> = line.split(',').collect();
            if cells.len() != header.len() {
                return None;
            }
            let mut timestamp = String::new();
            let mut values = BTreeMap::new();
            for (column, cell) in header.iter().zip(cells) {
                if *column == "timestamp" {
                    timestamp = cell.to_string();
                } else if let Ok(v) = cell.parse::<f64>() {
                    values.insert(column.to_string(), v);
                }
            }
            Some(LogRow { timestamp, values })
        })
        .collect()
}
