// Sheet extraction
//
// Turns the data rows of one sheet into flat records according to a
// `LayoutSpec`. Extraction is lazy and order-preserving; blank rows are
// skipped before any coercion runs.

use std::collections::HashSet;
use tracing::debug;

use crate::cell::CellValue;
use crate::layout::{ColumnSpec, HeaderFusion, IdSpec, LayoutSpec};
use crate::record::Record;
use crate::sheet::SheetGrid;

/// Whether a row carries data for a layout
///
/// Checked on raw cells: a column whose coercion would turn a blank into a
/// value (flags, empty notes) must not make a blank row look filled.
pub fn row_has_data(row: &[CellValue], spec: &LayoutSpec) -> bool {
    let present = |idx: &usize| row.get(*idx).is_some_and(CellValue::is_present);
    if spec.required_any.is_empty() {
        spec.columns.iter().map(|c| &c.index).any(present)
    } else {
        spec.required_any.iter().any(present)
    }
}

/// Build a record from the given columns of one row, coercions applied
pub fn build_record<'a>(
    row: &[CellValue],
    columns: impl IntoIterator<Item = &'a ColumnSpec>,
) -> Record {
    static NULL: CellValue = CellValue::Null;
    columns
        .into_iter()
        .map(|col| {
            let raw = row.get(col.index).unwrap_or(&NULL);
            (col.field.clone(), col.coercion.apply(raw))
        })
        .collect()
}

/// Lazily extract one record per data row of `grid`
pub fn extract_records<'a>(
    grid: &'a SheetGrid,
    spec: &'a LayoutSpec,
) -> impl Iterator<Item = Record> + 'a {
    grid.rows_from(spec.data_start_row)
        .filter(move |(_, row)| row_has_data(row, spec))
        .map(move |(_, row)| build_record(row, &spec.columns))
}

/// Stamp synthetic ids onto extracted records, in emission order
///
/// `Sequence` ids are `{file_id}_{prefix}{n:03}` counting from 1;
/// `FromColumn` ids are `{file_id}_{value}` with the value taken verbatim.
pub fn assign_ids(records: &mut [Record], spec: &LayoutSpec, file_id: &str) {
    let Some(id) = &spec.id else {
        return;
    };

    for (n, record) in records.iter_mut().enumerate() {
        let value = match id {
            IdSpec::Sequence { prefix, .. } => format!("{}_{}{:03}", file_id, prefix, n + 1),
            IdSpec::FromColumn { column, .. } => {
                let field = spec
                    .columns
                    .iter()
                    .find(|c| c.index == *column)
                    .map(|c| c.field.as_str())
                    .unwrap_or_default();
                format!("{}_{}", file_id, record.get_str(field))
            }
        };
        record.prepend(vec![(id.field().to_string(), CellValue::Text(value))]);
    }
}

/// Column names from a header row, optionally fused with a units row
///
/// A unit is appended as `{header}_{unit}` unless it is blank or starts with
/// an opening parenthesis (those are already part of the header text).
/// Newlines are removed; a blank header becomes `col_{i}`. Repeated names get
/// a `_{i}` suffix so every column stays addressable.
pub fn fuse_headers(grid: &SheetGrid, fusion: &HeaderFusion) -> Vec<String> {
    let mut seen = HashSet::new();

    (0..fusion.width)
        .map(|i| {
            let header = grid.cell(fusion.header_row, i);
            let mut name = if header.is_present() {
                let label = header.to_string();
                match fusion.unit_row.map(|row| grid.cell(row, i)) {
                    Some(unit) if is_fusable_unit(unit) => format!("{}_{}", label, unit),
                    _ => label,
                }
            } else {
                format!("col_{}", i)
            };
            name = name.replace(['\r', '\n'], "").trim().to_string();

            if !seen.insert(name.clone()) {
                debug!("Duplicate header '{}' at column {}", name, i);
                name = format!("{}_{}", name, i);
                seen.insert(name.clone());
            }
            name
        })
        .collect()
}

fn is_fusable_unit(unit: &CellValue) -> bool {
    if !unit.is_present() {
        return false;
    }
    let text = unit.to_string();
    let text = text.trim_start();
    !(text.starts_with('(') || text.starts_with('（'))
}

/// Whole-sheet extraction: fused header names, first column must be present
pub fn dump_sheet(grid: &SheetGrid, spec: &LayoutSpec) -> Vec<Record> {
    let Some(fusion) = &spec.header_fusion else {
        return extract_records(grid, spec).collect();
    };
    let headers = fuse_headers(grid, fusion);

    grid.rows_from(spec.data_start_row)
        .filter(|(_, row)| row.first().is_some_and(CellValue::is_present))
        .map(|(_, row)| {
            headers
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), row.get(i).cloned().unwrap_or_default()))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Coercion;

    fn room_layout() -> LayoutSpec {
        LayoutSpec::flat(
            "rooms",
            "1) 室仕様",
            2,
            vec![
                ColumnSpec::new(0, "floor"),
                ColumnSpec::new(1, "room_name"),
                ColumnSpec::coerced(2, "is_ac_target", Coercion::Flag),
                ColumnSpec::coerced(3, "note", Coercion::EmptyIfBlank),
            ],
        )
    }

    #[test]
    fn test_extract_skips_blank_rows_and_keeps_order() {
        let grid = SheetGrid::from_strings(&[
            &["header"],
            &["units"],
            &["1F", "事務室", "■", ""],
            &["", "  ", "", ""],
            &["2F", "会議室", "□", "memo"],
        ]);
        let layout = room_layout();
        let records: Vec<Record> = extract_records(&grid, &layout).collect();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get_str("room_name"), "事務室");
        assert_eq!(records[0].get("is_ac_target"), Some(&CellValue::Int(1)));
        assert_eq!(records[0].get("note"), Some(&CellValue::text("")));
        assert_eq!(records[1].get_str("floor"), "2F");
        assert_eq!(records[1].get("is_ac_target"), Some(&CellValue::Int(0)));
    }

    #[test]
    fn test_short_rows_read_as_null() {
        let grid = SheetGrid::from_strings(&[&[], &[], &["1F"]]);
        let layout = room_layout();
        let records: Vec<Record> = extract_records(&grid, &layout).collect();

        assert_eq!(records.len(), 1);
        assert!(records[0].get("room_name").unwrap().is_null());
        assert_eq!(records[0].len(), 4);
    }

    #[test]
    fn test_required_columns_narrow_row_filter() {
        let grid = SheetGrid::from_strings(&[&[], &[], &["", "", "■", "memo"]]);
        let layout = room_layout().with_required(&[0, 1]);
        assert_eq!(extract_records(&grid, &layout).count(), 0);
    }

    #[test]
    fn test_assign_sequence_ids() {
        let grid = SheetGrid::from_strings(&[&[], &[], &["1F", "A"], &["2F", "B"]]);
        let layout = room_layout().with_id(IdSpec::Sequence {
            field: "room_id".to_string(),
            prefix: "R".to_string(),
        });
        let mut records: Vec<Record> = extract_records(&grid, &layout).collect();
        assign_ids(&mut records, &layout, "007");

        assert_eq!(records[0].get_str("room_id"), "007_R001");
        assert_eq!(records[1].get_str("room_id"), "007_R002");
        assert_eq!(records[1].field_names().next(), Some("room_id"));
    }

    #[test]
    fn test_assign_ids_from_column() {
        let grid = SheetGrid::from_strings(&[&[], &[], &["", "G1"]]);
        let layout = room_layout().with_id(IdSpec::FromColumn {
            field: "window_spec_id".to_string(),
            column: 1,
        });
        let mut records: Vec<Record> = extract_records(&grid, &layout).collect();
        assign_ids(&mut records, &layout, "002");
        assert_eq!(records[0].get_str("window_spec_id"), "002_G1");
    }

    #[test]
    fn test_fuse_headers() {
        let grid = SheetGrid::from_strings(&[
            &["階", "室面積", "熱貫流率\n(W/m2K)", "", "名称"],
            &["", "m2", "(W/m2K)", "kW", "（-）"],
        ]);
        let fusion = HeaderFusion {
            header_row: 0,
            unit_row: Some(1),
            width: 5,
        };
        assert_eq!(
            fuse_headers(&grid, &fusion),
            vec!["階", "室面積_m2", "熱貫流率(W/m2K)", "col_3", "名称"]
        );
    }

    #[test]
    fn test_fuse_headers_deduplicates() {
        let grid = SheetGrid::from_strings(&[&["台数", "台数", "台数"]]);
        let fusion = HeaderFusion {
            header_row: 0,
            unit_row: None,
            width: 3,
        };
        assert_eq!(fuse_headers(&grid, &fusion), vec!["台数", "台数_1", "台数_2"]);
    }

    #[test]
    fn test_dump_sheet_requires_first_column() {
        let grid = SheetGrid::from_strings(&[
            &["名称", "値"],
            &["W1", "0.5"],
            &["", "0.7"],
            &["W2", ""],
        ]);
        let layout = LayoutSpec::flat("03_外壁構成", "2-2) 外壁構成 ", 1, vec![]).with_header_fusion(
            HeaderFusion {
                header_row: 0,
                unit_row: None,
                width: 2,
            },
        );
        let records = dump_sheet(&grid, &layout);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get_str("名称"), "W2");
        assert!(records[1].get("値").unwrap().is_null());
    }
}
