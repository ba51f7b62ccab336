//! Workbook reading (.xlsx, .xls)
//!
//! Thin collaborator in front of calamine: opens a workbook, takes the first
//! sheet, and emits raw header/cell rows for the normalizer. All typing and
//! header canonicalization happens in [`crate::import`].

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use tracing::debug;

use crate::error::{Error, Result};
use crate::import::{RawRow, RawValue};

fn cell_value(cell: &Data) -> RawValue {
    match cell {
        Data::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                RawValue::Empty
            } else {
                RawValue::Text(s.to_string())
            }
        }
        Data::Float(f) => RawValue::Number(*f),
        Data::Int(i) => RawValue::Number(*i as f64),
        Data::DateTime(dt) => RawValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawValue::Text(s.clone()),
        Data::Bool(b) => RawValue::Number(if *b { 1.0 } else { 0.0 }),
        Data::Error(_) | Data::Empty => RawValue::Empty,
    }
}

/// Read the first sheet of a workbook into raw rows
///
/// Fails only on an unreadable or empty workbook; individual odd cells
/// degrade to empty values and are handled downstream.
pub fn read_workbook(path: &Path) -> Result<Vec<RawRow>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| Error::Spreadsheet(format!("failed to open workbook: {}", e)))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let sheet_name = sheet_names
        .first()
        .ok_or_else(|| Error::Spreadsheet("workbook has no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|e| Error::Spreadsheet(format!("failed to read sheet: {}", e)))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or_else(|| Error::Spreadsheet("no data found in workbook".to_string()))?
        .iter()
        .map(|cell| match cell {
            Data::String(s) => s.trim().to_string(),
            Data::Empty => String::new(),
            other => format!("{}", other),
        })
        .collect();

    let raw: Vec<RawRow> = rows
        .map(|cells| {
            let mut row = RawRow::new();
            for (header, cell) in headers.iter().zip(cells) {
                if !header.is_empty() {
                    row.push(header.clone(), cell_value(cell));
                }
            }
            row
        })
        .collect();

    debug!(
        sheet = %sheet_name,
        rows = raw.len(),
        columns = headers.len(),
        "Read workbook"
    );

    Ok(raw)
}
