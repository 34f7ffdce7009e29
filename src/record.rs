//! Measurement records in the fixed CSV schema.
//!
//! Columns: `timestamp,user_height_cm,<measurement names>`. The measurement
//! columns follow [`Measurement::ALL`], so the header never changes between
//! saves. Undefined values are written as empty fields.

use chrono::{DateTime, Local};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::measure::{Measurement, MeasurementSet};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One saved measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    pub timestamp: DateTime<Local>,
    pub user_height_cm: Option<f32>,
    pub values: MeasurementSet,
}

impl MeasurementRecord {
    pub fn header() -> String {
        let mut columns = vec!["timestamp", "user_height_cm"];
        columns.extend(Measurement::ALL.iter().map(|m| m.name()));
        columns.join(",")
    }

    pub fn to_csv_row(&self) -> String {
        let mut fields = Vec::with_capacity(Measurement::COUNT + 2);
        fields.push(self.timestamp.format(TIMESTAMP_FORMAT).to_string());
        fields.push(format_value(self.user_height_cm));
        fields.extend(self.values.iter().map(|(_, v)| format_value(v)));
        fields.join(",")
    }
}

fn format_value(value: Option<f32>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => String::new(),
    }
}

/// Append-only CSV writer. The header is written once, before the first row.
pub struct RecordWriter<W: Write> {
    writer: W,
    header_written: bool,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            header_written: false,
        }
    }

    /// For a destination that already carries the header.
    pub fn appending(writer: W) -> Self {
        Self {
            writer,
            header_written: true,
        }
    }

    pub fn write_record(&mut self, record: &MeasurementRecord) -> Result<()> {
        if !self.header_written {
            writeln!(self.writer, "{}", MeasurementRecord::header())?;
            self.header_written = true;
        }
        writeln!(self.writer, "{}", record.to_csv_row())?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Opens (or creates) a CSV file for appending, creating parent directories.
pub fn open_csv<P: AsRef<Path>>(path: P) -> Result<RecordWriter<BufWriter<File>>> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let has_content = fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false);
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let writer = BufWriter::new(file);
    Ok(if has_content {
        RecordWriter::appending(writer)
    } else {
        RecordWriter::new(writer)
    })
}
