//! Raw table loading
//!
//! Reads delimited exports into an untyped tabular form that the platform
//! adapters map onto the common record types. Column lookup is fail-fast: an
//! export missing a required column aborts the run instead of coercing to a
//! default. Cell-level missingness stays `None`.

use crate::error::PipelineError;
use chrono::{DateTime, NaiveDateTime, Utc};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;

/// One raw export: header row plus string-valued data rows
#[derive(Debug, Clone)]
pub struct RawTable {
    /// Table name used in error messages (usually the file stem)
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Read a CSV export from disk
    pub fn from_path<P: AsRef<Path>>(path: P, name: &str) -> Result<Self, PipelineError> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(file, name)
    }

    /// Read a CSV export from any reader
    pub fn from_reader<R: std::io::Read>(reader: R, name: &str) -> Result<Self, PipelineError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(RawTable {
            name: name.to_string(),
            headers,
            rows,
        })
    }

    /// Index of a required column; fails the run when absent
    pub fn column(&self, name: &str) -> Result<usize, PipelineError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| PipelineError::missing_column(&self.name, name))
    }

    /// Indices for a list of required columns, in order
    pub fn columns(&self, names: &[&str]) -> Result<Vec<usize>, PipelineError> {
        names.iter().map(|n| self.column(n)).collect()
    }

    /// Cell as a trimmed string; `None` when absent or empty
    pub fn cell<'a>(&'a self, row: &'a [String], col: usize) -> Option<&'a str> {
        let value = row.get(col)?.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("na") {
            None
        } else {
            Some(value)
        }
    }

    /// Cell as a float; malformed values propagate as missing
    pub fn cell_f64(&self, row: &[String], col: usize) -> Option<f64> {
        self.cell(row, col)?.parse().ok()
    }

    /// Cell as a timestamp; `None` when absent, error when present but
    /// unparseable (a broken key timestamp should stop the run)
    pub fn cell_timestamp(
        &self,
        row: &[String],
        row_index: usize,
        col: usize,
    ) -> Result<Option<DateTime<Utc>>, PipelineError> {
        match self.cell(row, col) {
            None => Ok(None),
            Some(value) => parse_timestamp(value)
                .map(Some)
                .ok_or_else(|| PipelineError::TimestampParseError {
                    table: self.name.clone(),
                    row: row_index,
                    value: value.to_string(),
                }),
        }
    }

    /// Cell as a required string field
    pub fn cell_required<'a>(
        &'a self,
        row: &'a [String],
        row_index: usize,
        col: usize,
        field: &str,
    ) -> Result<&'a str, PipelineError> {
        self.cell(row, col).ok_or_else(|| PipelineError::MissingField {
            table: self.name.clone(),
            row: row_index,
            field: field.to_string(),
        })
    }
}

/// Parse a timestamp in either RFC 3339 or `YYYY-MM-DD HH:MM:SS` form.
/// Naive timestamps are taken as UTC, matching the platform exports.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_table() -> RawTable {
        let data = "\
player_id,end_time,duration
p1,2021-03-01 09:30:00,1.5
p2,,
p3,2021-03-01T10:00:00Z,oops
";
        RawTable::from_reader(data.as_bytes(), "sessions").unwrap()
    }

    #[test]
    fn test_headers_and_rows() {
        let table = sample_table();
        assert_eq!(table.headers, vec!["player_id", "end_time", "duration"]);
        assert_eq!(table.rows.len(), 3);
    }

    #[test]
    fn test_missing_column_fails_fast() {
        let table = sample_table();
        let err = table.column("start_time").unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingColumn { ref column, .. } if column == "start_time"
        ));
    }

    #[test]
    fn test_cell_missingness() {
        let table = sample_table();
        let col = table.column("duration").unwrap();
        assert_eq!(table.cell_f64(&table.rows[0], col), Some(1.5));
        // Empty and malformed cells both read as missing
        assert_eq!(table.cell_f64(&table.rows[1], col), None);
        assert_eq!(table.cell_f64(&table.rows[2], col), None);
    }

    #[test]
    fn test_timestamp_formats() {
        let table = sample_table();
        let col = table.column("end_time").unwrap();
        let naive = table.cell_timestamp(&table.rows[0], 0, col).unwrap();
        let rfc = table.cell_timestamp(&table.rows[2], 2, col).unwrap();
        assert!(naive.is_some());
        assert!(rfc.is_some());
        assert_eq!(table.cell_timestamp(&table.rows[1], 1, col).unwrap(), None);
    }

    #[test]
    fn test_unparseable_timestamp_is_an_error() {
        let data = "player_id,end_time\np1,not-a-time\n";
        let table = RawTable::from_reader(data.as_bytes(), "sessions").unwrap();
        let col = table.column("end_time").unwrap();
        let err = table.cell_timestamp(&table.rows[0], 0, col).unwrap_err();
        assert!(matches!(err, PipelineError::TimestampParseError { .. }));
    }

    #[test]
    fn test_na_literal_reads_as_missing() {
        let data = "player_id,duration\np1,NA\n";
        let table = RawTable::from_reader(data.as_bytes(), "sessions").unwrap();
        let col = table.column("duration").unwrap();
        assert_eq!(table.cell(&table.rows[0], col), None);
    }
}
