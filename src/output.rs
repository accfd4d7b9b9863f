// Output writers
//
// All writers run once, after every input file has been processed. Each
// output file is written to a temp file next to its destination and renamed
// into place, so an interrupted run never leaves a half-written file behind.

pub mod csv_tables;
pub mod xlsx;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

use crate::layout::{webpro, LayoutRegistry};
use crate::record::Table;

pub use csv_tables::write_csv_tables;
pub use xlsx::write_workbook;

/// Name of the single sheet written in wide mode
pub const WIDE_SHEET: &str = "all_data";

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Table '{entity}' does not fit in a worksheet: {msg}")]
    TooLarge { entity: String, msg: String },

    #[error("Tables '{first}' and '{second}' both map to sheet '{sheet}'")]
    SheetNameClash {
        sheet: String,
        first: String,
        second: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Shape of the consolidated output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputShape {
    /// One workbook, one sheet per entity type (whole-sheet consolidation)
    #[default]
    Workbook,
    /// One CSV file per entity type, with synthesized keys
    Tables,
    /// One workbook with a single `all_data` sheet
    Wide,
}

impl OutputShape {
    /// Built-in layout registry for this shape
    pub fn builtin_layouts(self) -> LayoutRegistry {
        match self {
            OutputShape::Workbook => webpro::sheet_dump(),
            OutputShape::Tables => webpro::relational(),
            OutputShape::Wide => webpro::wide(),
        }
    }

    /// Default destination, relative to the working directory
    pub fn default_output(self) -> PathBuf {
        match self {
            OutputShape::Workbook => PathBuf::from("output/webpro_combined_data.xlsx"),
            OutputShape::Tables => PathBuf::from("output/csv"),
            OutputShape::Wide => PathBuf::from("output/webpro_all_data.xlsx"),
        }
    }
}

impl fmt::Display for OutputShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputShape::Workbook => "workbook",
            OutputShape::Tables => "tables",
            OutputShape::Wide => "wide",
        };
        f.write_str(name)
    }
}

impl FromStr for OutputShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "workbook" | "xlsx" => Ok(OutputShape::Workbook),
            "tables" | "csv" => Ok(OutputShape::Tables),
            "wide" => Ok(OutputShape::Wide),
            other => Err(format!("unknown output shape: {other}")),
        }
    }
}

/// Write all tables in the given shape; returns the files written
pub fn write_output(
    tables: &[Table],
    shape: OutputShape,
    destination: &Path,
) -> Result<Vec<PathBuf>, OutputError> {
    match shape {
        OutputShape::Tables => write_csv_tables(tables, destination),
        OutputShape::Workbook | OutputShape::Wide => {
            write_workbook(tables, destination)?;
            Ok(vec![destination.to_path_buf()])
        }
    }
}

/// Replace `path` with `bytes` via a temp file in the same directory
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), OutputError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
