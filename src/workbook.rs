use calamine::{open_workbook_auto, Reader, Sheets};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::sheet::SheetGrid;

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("Failed to open workbook {path}: {msg}")]
    WorkbookOpen { path: PathBuf, msg: String },

    #[error("Failed to read sheet '{sheet}': {msg}")]
    SheetRead { sheet: String, msg: String },
}

/// Named sheets of one input workbook
///
/// `sheet` returns `Ok(None)` for a sheet the workbook does not have; that is
/// "no data for this entity", not a failure.
pub trait WorkbookSource {
    fn sheet_names(&self) -> Vec<String>;

    fn sheet(&mut self, name: &str) -> Result<Option<SheetGrid>, ReadError>;

    fn has_sheet(&self, name: &str) -> bool {
        self.sheet_names().iter().any(|n| n == name)
    }
}

/// Workbook on disk, read through calamine (xlsx, xlsm, xls, ods)
pub struct CalamineWorkbook {
    sheets: Sheets<BufReader<File>>,
}

impl CalamineWorkbook {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ReadError> {
        let path = path.as_ref().to_path_buf();
        let sheets = open_workbook_auto(&path).map_err(|e| ReadError::WorkbookOpen {
            path: path.clone(),
            msg: e.to_string(),
        })?;
        debug!("Opened workbook: {}", path.display());
        Ok(Self { sheets })
    }
}

impl WorkbookSource for CalamineWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names()
    }

    fn sheet(&mut self, name: &str) -> Result<Option<SheetGrid>, ReadError> {
        if !self.has_sheet(name) {
            return Ok(None);
        }
        let range = self
            .sheets
            .worksheet_range(name)
            .map_err(|e| ReadError::SheetRead {
                sheet: name.to_string(),
                msg: e.to_string(),
            })?;
        Ok(Some(SheetGrid::from_range(&range)))
    }
}

/// Hand-built workbook, keeps sheets in insertion order
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    names: Vec<String>,
    sheets: BTreeMap<String, SheetGrid>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, name: impl Into<String>, grid: SheetGrid) -> Self {
        self.insert(name, grid);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, grid: SheetGrid) {
        let name = name.into();
        if !self.sheets.contains_key(&name) {
            self.names.push(name.clone());
        }
        self.sheets.insert(name, grid);
    }
}

impl WorkbookSource for MemoryWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.names.clone()
    }

    fn sheet(&mut self, name: &str) -> Result<Option<SheetGrid>, ReadError> {
        Ok(self.sheets.get(name).cloned())
    }
}
