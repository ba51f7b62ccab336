//! Spreadsheet row normalization
//!
//! Uploaded workbooks arrive with arbitrary header spellings ("Meet Goal",
//! `meet_goal`, `meetgoal`) and dates encoded as Excel serials, strings, or
//! cell datetimes. This module turns that into strictly typed
//! [`MeasurementRow`]s before any reconciliation logic runs; nothing
//! loosely typed leaks past it.

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::models::MeasurementRow;

/// Excel's day-serial epoch. Serial 1 is 1899-12-31.
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Highest serial accepted (9999-12-31)
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// A loosely typed cell as produced by the workbook reader
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Text(String),
    Number(f64),
    Empty,
}

/// One uploaded row: raw header paired with its cell, in column order
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    cells: Vec<(String, RawValue)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, header: impl Into<String>, value: RawValue) {
        self.cells.push((header.into(), value));
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|(_, v)| matches!(v, RawValue::Empty))
    }

    fn get(&self, field: Field) -> Option<&RawValue> {
        self.cells
            .iter()
            .find(|(h, _)| canonical_field(h) == Some(field))
            .map(|(_, v)| v)
    }
}

/// Canonical fields a measurement row can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Date,
    Value,
    Goal,
    MeetGoal,
    BehindGoal,
    AtRisk,
    /// Present in exported templates; derived from the date on re-import
    Week,
    Year,
}

/// Strip whitespace, underscores, and hyphens; lowercase the rest
fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Map a raw header to its canonical field, if it denotes one
fn canonical_field(header: &str) -> Option<Field> {
    match normalize_header(header).as_str() {
        "date" => Some(Field::Date),
        "value" => Some(Field::Value),
        "goal" => Some(Field::Goal),
        "meetgoal" => Some(Field::MeetGoal),
        "behindgoal" => Some(Field::BehindGoal),
        "atrisk" => Some(Field::AtRisk),
        "week" => Some(Field::Week),
        "year" => Some(Field::Year),
        _ => None,
    }
}

/// Decode an Excel day serial (epoch 1899-12-30) into a calendar date
///
/// Fractional parts carry the time of day and are discarded; measurements
/// are day-granular.
fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_EXCEL_SERIAL {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(EXCEL_EPOCH.0, EXCEL_EPOCH.1, EXCEL_EPOCH.2)?;
    epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
}

/// Parse a date string in the formats that show up in uploads
fn parse_date_str(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let formats = [
        "%Y-%m-%d", // 2025-01-15
        "%m/%d/%Y", // 01/15/2025
        "%m/%d/%y", // 01/15/25
        "%m-%d-%Y", // 01-15-2025
        "%d/%m/%Y", // 15/01/2025 (European)
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    // Datetime strings: take the date part
    if let Some((date_part, _)) = s.split_once(['T', ' ']) {
        if let Ok(date) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
            return Some(date);
        }
    }

    None
}

/// Normalize any date-like cell into a calendar date
pub fn normalize_date(value: &RawValue) -> Option<NaiveDate> {
    match value {
        RawValue::Number(n) => serial_to_date(*n),
        RawValue::Text(s) => parse_date_str(s),
        RawValue::Empty => None,
    }
}

/// Coerce a numeric cell, tolerating currency formatting in text cells
fn parse_number(value: &RawValue) -> Option<f64> {
    match value {
        RawValue::Number(n) => Some(*n),
        RawValue::Text(s) => {
            let cleaned: String = s.trim().replace(['$', ',', ' '], "");
            if cleaned.is_empty() {
                None
            } else {
                cleaned.parse().ok()
            }
        }
        RawValue::Empty => None,
    }
}

/// A row excluded from the batch, reported rather than silently dropped
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    /// Zero-based position in the uploaded row sequence
    pub index: usize,
    pub reason: String,
}

/// Result of normalizing one upload
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    /// Rows with a valid date, in upload order
    pub rows: Vec<MeasurementRow>,
    /// Rows that could not be keyed by date
    pub skipped: Vec<SkippedRow>,
}

impl NormalizedBatch {
    /// True when no row survived with a valid date
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Build a batch from rows that are already typed (manual entry)
    pub fn from_rows(rows: Vec<MeasurementRow>) -> Self {
        Self {
            rows,
            skipped: Vec::new(),
        }
    }
}

/// Normalize an uploaded row sequence into typed measurement rows
///
/// Pure transform: a row with an unusable date degrades to a `skipped`
/// entry, never an error. `value` defaults to 0 when absent; threshold
/// fields stay `None` so "not tracked" survives into storage.
pub fn normalize_rows(raw: &[RawRow]) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();

    for (index, row) in raw.iter().enumerate() {
        if row.is_empty() {
            batch.skipped.push(SkippedRow {
                index,
                reason: "empty row".to_string(),
            });
            continue;
        }

        let date = match row.get(Field::Date) {
            Some(cell) => match normalize_date(cell) {
                Some(date) => date,
                None => {
                    batch.skipped.push(SkippedRow {
                        index,
                        reason: format!("unparseable date: {:?}", cell),
                    });
                    continue;
                }
            },
            None => {
                batch.skipped.push(SkippedRow {
                    index,
                    reason: "no date column".to_string(),
                });
                continue;
            }
        };

        batch.rows.push(MeasurementRow {
            date,
            value: row.get(Field::Value).and_then(parse_number).unwrap_or(0.0),
            goal: row.get(Field::Goal).and_then(parse_number),
            meet_goal: row.get(Field::MeetGoal).and_then(parse_number),
            behind_goal: row.get(Field::BehindGoal).and_then(parse_number),
            at_risk: row.get(Field::AtRisk).and_then(parse_number),
        });
    }

    debug!(
        rows = batch.rows.len(),
        skipped = batch.skipped.len(),
        "Normalized upload"
    );

    batch
}
