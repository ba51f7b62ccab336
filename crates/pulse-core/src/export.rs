//! Measurement export
//!
//! Produces the CSV shape that re-imports cleanly: the header row uses the
//! canonical column names the normalizer recognizes, and untracked
//! thresholds export as empty cells rather than zeros.

use crate::error::Result;
use crate::models::MeasurementRow;

/// Canonical template columns, also accepted back by the import normalizer
pub const TEMPLATE_HEADERS: [&str; 6] =
    ["Date", "Value", "Goal", "MeetGoal", "BehindGoal", "AtRisk"];

fn cell(value: Option<f64>) -> String {
    value.map(|n| n.to_string()).unwrap_or_default()
}

/// Render measurement rows as CSV
pub fn measurements_to_csv(rows: &[MeasurementRow]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(TEMPLATE_HEADERS)?;

    for row in rows {
        writer.write_record(&[
            row.date.to_string(),
            row.value.to_string(),
            cell(row.goal),
            cell(row.meet_goal),
            cell(row.behind_goal),
            cell(row.at_risk),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| crate::error::Error::Import(format!("CSV buffer error: {}", e)))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Empty import template (header row only)
pub fn template_csv() -> Result<String> {
    measurements_to_csv(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_template_has_canonical_headers() {
        let csv = template_csv().unwrap();
        assert_eq!(csv.trim(), "Date,Value,Goal,MeetGoal,BehindGoal,AtRisk");
    }

    #[test]
    fn test_untracked_thresholds_export_empty() {
        let mut row =
            MeasurementRow::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), 5.0);
        row.goal = Some(10.0);

        let csv = measurements_to_csv(&[row]).unwrap();
        let data_line = csv.lines().nth(1).unwrap();
        assert_eq!(data_line, "2025-01-01,5,10,,,");
    }
}
