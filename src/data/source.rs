//! Raw series sources.

use crate::core::SeriesFrame;
use crate::error::{EnsembleError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use ndarray::Array2;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where a provider gets its frame from.
#[derive(Debug, Clone)]
pub enum DataSource {
    /// CSV file with a leading date column, read once on first use.
    File(PathBuf),
    /// Frame already in memory (fetched or generated by the caller).
    Online(Arc<SeriesFrame>),
}

impl DataSource {
    pub fn load(&self) -> Result<Arc<SeriesFrame>> {
        match self {
            DataSource::File(path) => read_csv(path).map(Arc::new),
            DataSource::Online(frame) => Ok(Arc::clone(frame)),
        }
    }
}

/// Parse a timestamp in one of the layouts found in common benchmark files.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Ok(t.with_timezone(&Utc));
    }
    for layout in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y/%m/%d %H:%M"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(raw, layout) {
            return Ok(t.and_utc());
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(t) = d.and_hms_opt(0, 0, 0) {
            return Ok(t.and_utc());
        }
    }
    Err(EnsembleError::Parse(format!("unrecognised timestamp '{raw}'")))
}

/// Read a CSV whose first column holds timestamps and the rest numeric features.
pub fn read_csv(path: &Path) -> Result<SeriesFrame> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| EnsembleError::Io(format!("{}: {e}", path.display())))?;

    let headers = reader.headers()?.clone();
    if headers.len() < 2 {
        return Err(EnsembleError::Parse(format!(
            "{}: expected a date column and at least one feature",
            path.display()
        )));
    }
    let columns: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut timestamps = Vec::new();
    let mut flat = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != headers.len() {
            return Err(EnsembleError::Parse(format!(
                "row {}: expected {} fields, got {}",
                line + 1,
                headers.len(),
                record.len()
            )));
        }
        timestamps.push(parse_timestamp(&record[0])?);
        for field in record.iter().skip(1) {
            let value: f64 = field.parse().map_err(|_| {
                EnsembleError::Parse(format!("row {}: invalid number '{field}'", line + 1))
            })?;
            flat.push(value);
        }
    }

    if timestamps.is_empty() {
        return Err(EnsembleError::EmptyData);
    }
    let values = Array2::from_shape_vec((timestamps.len(), columns.len()), flat)?;
    SeriesFrame::new(timestamps, columns, values)
}
