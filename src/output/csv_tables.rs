use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::{write_atomic, OutputError};
use crate::record::Table;

/// Serialize one table as UTF-8 CSV with a header row
pub fn table_to_csv(table: &Table) -> Result<Vec<u8>, OutputError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(table.columns())?;
    for record in table.records() {
        let row: Vec<String> = table
            .row_values(record)
            .into_iter()
            .map(|value| value.to_string())
            .collect();
        writer.write_record(&row)?;
    }
    writer.into_inner().map_err(|e| OutputError::Io(e.into_error()))
}

/// One `{entity}.csv` per non-empty table under `dir`
pub fn write_csv_tables(tables: &[Table], dir: &Path) -> Result<Vec<PathBuf>, OutputError> {
    fs::create_dir_all(dir)?;

    let mut written = Vec::new();
    for table in tables.iter().filter(|t| !t.is_empty()) {
        let path = dir.join(format!("{}.csv", table.entity_type));
        write_atomic(&path, &table_to_csv(table)?)?;
        info!("  {}: {} rows -> {}", table.entity_type, table.len(), path.display());
        written.push(path);
    }
    Ok(written)
}
