// Building attributes from the vertical basic-information form
//
// The form is a label/value sheet: labels sit in column B, values in C (or
// further right for split fields such as location and floor counts). Labels
// are matched by substring, so form revisions that add circled numbers or
// trailing notes still match. When several rows match the same attribute
// the last one wins.

use tracing::debug;

use crate::cell::CellValue;
use crate::record::Record;
use crate::sheet::SheetGrid;

const LABEL_COL: usize = 1;
const VALUE_COL: usize = 2;

/// Per-file state stamped onto every record produced from that file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileContext {
    pub file_id: String,
    pub building_name: CellValue,
    pub prefecture: CellValue,
    pub city: CellValue,
    pub region: CellValue,
    pub structure: CellValue,
    pub floors_above: CellValue,
    pub floors_below: CellValue,
    pub evaluation_target: CellValue,
    pub total_area: CellValue,
    pub solar_region: CellValue,
    pub sheet_date: CellValue,
    pub responsible_person: CellValue,
}

/// Names of the columns stamped by [`FileContext::common_columns`]
pub const COMMON_COLUMNS: [&str; 9] = [
    "file_id",
    "building_name",
    "prefecture",
    "city",
    "region",
    "structure",
    "floors_above",
    "floors_below",
    "evaluation_target",
];

impl FileContext {
    /// Context with only a file id, for files without a basic-information sheet
    pub fn new(file_id: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            ..Self::default()
        }
    }

    pub fn from_sheet(file_id: impl Into<String>, grid: &SheetGrid) -> Self {
        let mut ctx = Self::new(file_id);

        for (row_idx, row) in grid.rows_from(0) {
            let Some(label) = row.get(LABEL_COL).filter(|c| c.is_present()) else {
                continue;
            };
            let label = label.to_string();
            if ctx.apply_label(&label, grid, row_idx) {
                debug!("Basic info row {}: {}", row_idx, label.trim());
            }
        }
        ctx
    }

    /// Match one label row; returns whether any attribute was set
    fn apply_label(&mut self, label: &str, grid: &SheetGrid, row: usize) -> bool {
        let value = |col: usize| present(grid.cell(row, col));
        let first_of = |a: usize, b: usize| {
            let v = value(a);
            if v.is_null() {
                value(b)
            } else {
                v
            }
        };

        if label.contains("シート作成月日") {
            self.sheet_date = value(VALUE_COL);
        } else if label.contains("入力責任者") {
            self.responsible_person = value(VALUE_COL);
        } else if label.contains("評価対象") {
            self.evaluation_target = value(VALUE_COL);
        } else if label.contains("建物の名称") {
            self.building_name = value(VALUE_COL);
        } else if label.contains("所在地") {
            self.prefecture = value(3);
            self.city = first_of(5, 4);
        } else if label.contains("年間日射") {
            self.solar_region = value(VALUE_COL);
        } else if label.contains("地域の区分") || label.contains("地域区分") {
            self.region = value(VALUE_COL).coerce_int();
        } else if label.contains("構造") && !label.contains("外壁") {
            self.structure = value(VALUE_COL);
        } else if label.contains("階数") {
            self.floors_above = value(3).coerce_int();
            self.floors_below = first_of(5, 4).coerce_int();
        } else if label.contains("延べ面積") {
            self.total_area = value(VALUE_COL);
        } else {
            return false;
        }
        true
    }

    /// Building name as text, empty when the form did not provide one
    pub fn building_name(&self) -> String {
        self.building_name.to_string()
    }

    /// `file_id` and `building_name`, stamped onto every record
    pub fn identity_columns(&self) -> Vec<(String, CellValue)> {
        vec![
            ("file_id".to_string(), CellValue::text(&self.file_id)),
            (
                "building_name".to_string(),
                self.building_name.clone().blank_to_empty(),
            ),
        ]
    }

    /// The full set of common columns; missing attributes stamp as empty text
    pub fn common_columns(&self) -> Vec<(String, CellValue)> {
        let values = [
            CellValue::text(&self.file_id),
            self.building_name.clone(),
            self.prefecture.clone(),
            self.city.clone(),
            self.region.clone(),
            self.structure.clone(),
            self.floors_above.clone(),
            self.floors_below.clone(),
            self.evaluation_target.clone(),
        ];
        COMMON_COLUMNS
            .iter()
            .zip(values)
            .map(|(name, value)| (name.to_string(), value.blank_to_empty()))
            .collect()
    }

    /// One row of the buildings table
    pub fn to_record(&self) -> Record {
        let mut record: Record = self.common_columns().into_iter().collect();
        record.set("total_area", self.total_area.clone());
        record.set("solar_region", self.solar_region.clone());
        record.set("sheet_date", self.sheet_date.clone());
        record.set("responsible_person", self.responsible_person.clone());
        record
    }
}

fn present(cell: &CellValue) -> CellValue {
    if cell.is_present() {
        cell.clone()
    } else {
        CellValue::Null
    }
}
