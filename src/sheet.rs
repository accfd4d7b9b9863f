/// Raw 2-D grid of one worksheet, addressed by absolute sheet position
use calamine::{Data, Range};

use crate::cell::CellValue;

static NULL_CELL: CellValue = CellValue::Null;

/// Rows of typed cells, row 0 / column 0 being the sheet's A1 cell
///
/// calamine ranges start at the first used cell, so a sheet whose content
/// begins at C5 yields a range whose local (0, 0) is C5. Layout offsets are
/// absolute sheet rows, which is why the grid is padded back to A1 here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetGrid {
    rows: Vec<Vec<CellValue>>,
}

impl SheetGrid {
    pub fn new(rows: Vec<Vec<CellValue>>) -> Self {
        Self { rows }
    }

    /// Build from string rows; empty strings become null cells
    pub fn from_strings(rows: &[&[&str]]) -> Self {
        let rows = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|s| {
                        if s.is_empty() {
                            CellValue::Null
                        } else {
                            CellValue::text(*s)
                        }
                    })
                    .collect()
            })
            .collect();
        Self { rows }
    }

    pub fn from_range(range: &Range<Data>) -> Self {
        let Some((end_row, end_col)) = range.end() else {
            return Self::default();
        };

        let rows = (0..=end_row)
            .map(|row| {
                (0..=end_col)
                    .map(|col| {
                        range
                            .get_value((row, col))
                            .map(CellValue::from)
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();

        Self { rows }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at an absolute position; out-of-range positions read as null
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&NULL_CELL)
    }

    pub fn row(&self, row: usize) -> &[CellValue] {
        self.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rows from `start` (inclusive) to the end of the sheet
    pub fn rows_from(&self, start: usize) -> impl Iterator<Item = (usize, &[CellValue])> + '_ {
        self.rows
            .iter()
            .enumerate()
            .skip(start)
            .map(|(idx, row)| (idx, row.as_slice()))
    }
}
