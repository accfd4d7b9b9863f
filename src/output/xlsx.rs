use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, Workbook, Worksheet};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use super::{write_atomic, OutputError};
use crate::cell::CellValue;
use crate::record::Table;

/// Excel's sheet name limit, in characters
const MAX_SHEET_NAME: usize = 31;
const MAX_ROWS: usize = 1_048_576;
const MAX_COLS: usize = 16_384;

/// Sheet-safe name: forbidden characters replaced, cut to 31 characters
pub fn sheet_name(entity: &str) -> String {
    entity
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .take(MAX_SHEET_NAME)
        .collect()
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
) -> Result<(), OutputError> {
    match value {
        CellValue::Null => {}
        CellValue::Text(s) => {
            sheet.write_string(row, col, s)?;
        }
        CellValue::Number(n) if n.is_finite() => {
            sheet.write_number(row, col, *n)?;
        }
        CellValue::Number(n) => {
            sheet.write_string(row, col, n.to_string())?;
        }
        CellValue::Int(i) => {
            sheet.write_number(row, col, *i as f64)?;
        }
        CellValue::Bool(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
    }
    Ok(())
}

fn write_table(sheet: &mut Worksheet, table: &Table, header: &Format) -> Result<(), OutputError> {
    if table.len() + 1 > MAX_ROWS || table.columns().len() > MAX_COLS {
        return Err(OutputError::TooLarge {
            entity: table.entity_type.clone(),
            msg: format!("{} rows x {} columns", table.len(), table.columns().len()),
        });
    }

    for (col, name) in table.columns().iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, name, header)?;
    }
    for (row, record) in table.records().iter().enumerate() {
        for (col, value) in table.row_values(record).into_iter().enumerate() {
            write_cell(sheet, row as u32 + 1, col as u16, value)?;
        }
    }
    Ok(())
}

/// Sheet names for `tables`, failing when two entities map to the same sheet
///
/// Excel compares sheet names case-insensitively, so the check does too.
fn unique_sheet_names(tables: &[&Table]) -> Result<Vec<String>, OutputError> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    tables
        .iter()
        .map(|table| {
            let name = sheet_name(&table.entity_type);
            if let Some(first) = seen.insert(name.to_lowercase(), &table.entity_type) {
                return Err(OutputError::SheetNameClash {
                    sheet: name,
                    first: first.to_string(),
                    second: table.entity_type.clone(),
                });
            }
            Ok(name)
        })
        .collect()
}

/// One sheet per non-empty table, sheets ordered by name
///
/// The creation date is pinned so the same tables always produce the same bytes.
pub fn write_workbook(tables: &[Table], path: &Path) -> Result<(), OutputError> {
    let mut workbook = Workbook::new();
    let properties =
        DocProperties::new().set_creation_datetime(&ExcelDateTime::from_ymd(2000, 1, 1)?);
    workbook.set_properties(&properties);
    let header = Format::new().set_bold();

    let mut tables: Vec<&Table> = tables.iter().filter(|t| !t.is_empty()).collect();
    tables.sort_by(|a, b| a.entity_type.cmp(&b.entity_type));
    let names = unique_sheet_names(&tables)?;

    for (table, name) in tables.into_iter().zip(names) {
        let sheet = workbook.add_worksheet();
        sheet.set_name(name)?;
        write_table(sheet, table, &header)?;
        info!("  {}: {} rows", table.entity_type, table.len());
    }

    let bytes = workbook.save_to_buffer()?;
    write_atomic(path, &bytes)
}
