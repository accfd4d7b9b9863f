// Shared fixture builders for integration tests
//
// Fixtures are real .xlsx files written at test time, laid out like the
// WEBPRO input forms: absolute 0-based rows, data starting at row 10.

#![allow(dead_code)]

use rust_xlsxwriter::Workbook;
use std::path::Path;

pub const BASIC: &str = "0) 基本情報";
pub const ROOMS: &str = "1) 室仕様";
pub const WALLS: &str = "2-2) 外壁構成 ";
pub const HEAT_SOURCES: &str = "2-5) 熱源";
pub const LIGHTING: &str = "4) 照明";

/// First data row of the relational layouts
pub const DATA_ROW: u32 = 10;

/// One sheet: (absolute row, cells from column A); empty strings are left blank
pub struct FixtureSheet {
    pub name: &'static str,
    pub rows: Vec<(u32, Vec<String>)>,
}

impl FixtureSheet {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, row: u32, cells: &[&str]) -> Self {
        self.rows
            .push((row, cells.iter().map(|c| c.to_string()).collect()));
        self
    }
}

/// Write sheets to `path`; numeric-looking cells are written as numbers
pub fn write_fixture(path: &Path, sheets: &[FixtureSheet]) {
    let mut workbook = Workbook::new();
    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet.name).expect("valid sheet name");
        for (row, cells) in &sheet.rows {
            for (col, value) in cells.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                let col = col as u16;
                match value.parse::<f64>() {
                    Ok(n) => worksheet.write_number(*row, col, n).expect("write number"),
                    Err(_) => worksheet.write_string(*row, col, value).expect("write string"),
                };
            }
        }
    }
    workbook.save(path).expect("save fixture workbook");
}

pub fn basic_sheet(building_name: &str) -> FixtureSheet {
    FixtureSheet::new(BASIC)
        .row(1, &["", "様式0. 基本情報"])
        .row(8, &["", "④建物の名称", building_name])
        .row(9, &["", "⑤建築物所在地", "都道府県", "東京都", "市区町村", "港区"])
        .row(11, &["", "⑥省エネ基準地域区分", "6"])
        .row(13, &["", "⑧階数", "地上", "8", "地下", "1"])
}

pub fn rooms_sheet(names: &[&str]) -> FixtureSheet {
    let mut sheet = FixtureSheet::new(ROOMS).row(5, &["階", "室名", "建物用途"]);
    for (i, name) in names.iter().enumerate() {
        sheet = sheet.row(
            DATA_ROW + i as u32,
            &["1F", *name, "事務所等", "事務室", "事務室", "80", "3.5", "2.7", "■", "■", "", "□"],
        );
    }
    sheet
}

/// One wall spec "W1" followed by two material layers and boundary rows
pub fn walls_sheet() -> FixtureSheet {
    FixtureSheet::new(WALLS)
        .row(4, &["外壁名称", "壁の種類", "熱貫流率"])
        .row(DATA_ROW, &["W1", "concrete", "0.5"])
        .row(DATA_ROW + 1, &["", "", "", "", "室内側"])
        .row(DATA_ROW + 2, &["", "", "", "1", "plaster", "0.6", "10"])
        .row(DATA_ROW + 3, &["", "", "", "2", "concrete", "1.6", "150"])
        .row(DATA_ROW + 4, &["", "", "", "", "室外側"])
}

pub fn heat_source_sheet() -> FixtureSheet {
    FixtureSheet::new(HEAT_SOURCES)
        .row(
            DATA_ROW,
            &["HS-1", "無", "有", "冷暖切替", "", "空冷ヒートポンプ", "1番目", "2"],
        )
        .row(DATA_ROW + 1, &["", "", "", "", "", "電気式ボイラ", "2番目", "1"])
        .row(
            DATA_ROW + 3,
            &["HS-2", "無", "無", "冷房専用", "", "水冷チラー", "1番目", "1"],
        )
}

pub fn lighting_sheet() -> FixtureSheet {
    FixtureSheet::new(LIGHTING)
        .row(
            DATA_ROW,
            &["1F", "事務室", "事務所等", "事務室", "80", "3.5", "2.7", "", "", "", "LED-A", "30", "20"],
        )
        .row(
            DATA_ROW + 1,
            &["", "", "", "", "", "", "", "", "", "", "LED-B", "15", "4"],
        )
}
