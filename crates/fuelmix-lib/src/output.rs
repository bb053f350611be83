//! Writers for sweep results.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::sweep::SweepRecord;

/// File format for exported sweep records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    /// Infer the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        ext.parse().ok()
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(Error::invalid_scenario(format!(
                "unsupported export format '{other}' (expected json or csv)"
            ))),
        }
    }
}

/// Write records as a pretty-printed JSON array.
pub fn write_sweep_json<W: Write>(writer: W, records: &[SweepRecord]) -> Result<()> {
    let mut writer = writer;
    serde_json::to_writer_pretty(&mut writer, records)?;
    writeln!(writer)?;
    Ok(())
}

/// Write records as CSV with a header row; failed cells leave figures empty.
pub fn write_sweep_csv<W: Write>(writer: W, records: &[SweepRecord]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write records to `writer` in `format`.
pub fn write_sweep<W: Write>(writer: W, records: &[SweepRecord], format: ExportFormat) -> Result<()> {
    match format {
        ExportFormat::Json => write_sweep_json(writer, records),
        ExportFormat::Csv => write_sweep_csv(writer, records),
    }
}

/// Write records to a file, creating parent directories as needed.
pub fn export_sweep(path: &Path, records: &[SweepRecord], format: ExportFormat) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = BufWriter::new(File::create(path)?);
    write_sweep(file, records, format)
}
