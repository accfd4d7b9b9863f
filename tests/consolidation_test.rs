// End-to-end consolidation over real .xlsx fixtures

mod common;

use common::*;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use webpro_etl::cell::CellValue;
use webpro_etl::consolidate::{discover_inputs, ConsolidateError, Consolidation, Consolidator};
use webpro_etl::output::{write_output, OutputShape};

fn run(dir: &Path, shape: OutputShape) -> Consolidation {
    let paths = discover_inputs(dir, "*.xlsx").expect("inputs found");
    Consolidator::new(shape.builtin_layouts(), shape).run(&paths)
}

fn two_building_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(
        &dir.path().join("A.xlsx"),
        &[
            basic_sheet("A棟"),
            rooms_sheet(&["A1", "A2", "A3"]),
            walls_sheet(),
            heat_source_sheet(),
            lighting_sheet(),
        ],
    );
    write_fixture(
        &dir.path().join("B.xlsx"),
        &[basic_sheet("B棟"), rooms_sheet(&["B1", "B2"]), walls_sheet()],
    );
    dir
}

#[test]
fn test_wall_specs_and_layers_across_two_files() {
    let dir = two_building_dir();
    let result = run(dir.path(), OutputShape::Tables);

    let specs = result.table("wall_specs").unwrap();
    let ids: Vec<String> = specs
        .records()
        .iter()
        .map(|r| r.get_str("wall_spec_id"))
        .collect();
    assert_eq!(ids, vec!["001_W1", "002_W1"]);
    assert_eq!(specs.records()[0].get_str("wall_type"), "concrete");
    assert_eq!(specs.records()[0].get("u_value"), Some(&CellValue::Number(0.5)));

    let layers = result.table("wall_layers").unwrap();
    assert_eq!(layers.len(), 4);
    let linked: Vec<(String, String)> = layers
        .records()
        .iter()
        .map(|r| (r.get_str("wall_spec_id"), r.get_str("layer_order")))
        .collect();
    assert_eq!(
        linked,
        vec![
            ("001_W1".to_string(), "1".to_string()),
            ("001_W1".to_string(), "2".to_string()),
            ("002_W1".to_string(), "1".to_string()),
            ("002_W1".to_string(), "2".to_string()),
        ]
    );
    assert_eq!(layers.records()[1].get_str("material_name"), "concrete");
    assert_eq!(layers.records()[2].get_str("wall_layer_id"), "002_W1_U01");
}

#[test]
fn test_room_rows_keep_file_then_row_order() {
    let dir = two_building_dir();
    let result = run(dir.path(), OutputShape::Tables);

    let rooms = result.table("rooms").unwrap();
    let names: Vec<String> = rooms.records().iter().map(|r| r.get_str("room_name")).collect();
    assert_eq!(names, vec!["A1", "A2", "A3", "B1", "B2"]);

    let first = &rooms.records()[0];
    assert_eq!(first.get_str("file_id"), "001");
    assert_eq!(first.get_str("building_name"), "A棟");
    assert_eq!(first.get("is_ac_target"), Some(&CellValue::Int(1)));
    assert_eq!(first.get("is_light_target"), Some(&CellValue::Int(0)));
    assert_eq!(first.get("is_hw_target"), Some(&CellValue::Int(0)));
    assert_eq!(rooms.records()[4].get_str("room_id"), "002_R002");

    let buildings = result.table("buildings").unwrap();
    assert_eq!(buildings.len(), 2);
    assert_eq!(buildings.records()[1].get_str("prefecture"), "東京都");
    assert_eq!(buildings.records()[1].get("floors_above"), Some(&CellValue::Int(8)));
}

#[test]
fn test_missing_lighting_sheet_only_empties_lighting() {
    let dir = two_building_dir();
    let result = run(dir.path(), OutputShape::Tables);

    let lighting = result.table("lighting").unwrap();
    assert!(lighting
        .records()
        .iter()
        .all(|r| r.get_str("file_id") == "001"));
    assert_eq!(lighting.len(), 2);

    let b = &result.files[1];
    assert_eq!(b.records_for("lighting"), 0);
    assert_eq!(b.records_for("rooms"), 2);
    assert_eq!(b.records_for("wall_specs"), 1);
    assert_eq!(b.records_for("wall_layers"), 2);
    assert!(b.missing_sheets.iter().any(|s| s == LIGHTING));
    assert!(b.error.is_none());
}

#[test]
fn test_blank_rows_contribute_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let rooms = rooms_sheet(&["R1"])
        .row(DATA_ROW + 1, &["", " ", "", "", "", "", "", "", "", "", "", ""])
        .row(DATA_ROW + 2, &["2F", "R2", "", "", "", "", "", "", "", "", "", ""]);
    write_fixture(&dir.path().join("only.xlsx"), &[basic_sheet("C棟"), rooms]);

    let result = run(dir.path(), OutputShape::Tables);
    let rooms = result.table("rooms").unwrap();
    assert_eq!(rooms.len(), 2);
    assert_eq!(rooms.records()[1].get_str("room_name"), "R2");
    assert_eq!(rooms.records()[1].get("is_ac_target"), Some(&CellValue::Int(0)));
}

#[test]
fn test_heat_source_units_link_to_their_group() {
    let dir = two_building_dir();
    let result = run(dir.path(), OutputShape::Tables);

    let groups = result.table("hs_groups").unwrap();
    let group_ids: Vec<String> = groups
        .records()
        .iter()
        .map(|r| r.get_str("hs_group_id"))
        .collect();
    assert_eq!(group_ids, vec!["001_HS-1", "001_HS-2"]);

    let units = result.table("hs_units").unwrap();
    let unit_ids: Vec<String> = units.records().iter().map(|r| r.get_str("hs_unit_id")).collect();
    assert_eq!(unit_ids, vec!["001_HS-1_U01", "001_HS-1_U02", "001_HS-2_U01"]);
    assert_eq!(units.records()[1].get("priority_cool"), Some(&CellValue::Int(2)));
}

#[test]
fn test_every_child_references_exactly_one_parent() {
    let dir = two_building_dir();
    let result = run(dir.path(), OutputShape::Tables);

    let pairs = [
        ("wall_specs", "wall_layers", "wall_spec_id"),
        ("hs_groups", "hs_units", "hs_group_id"),
        ("lighting_rooms", "lighting", "lighting_room_id"),
    ];
    for (parent, child, key) in pairs {
        let mut parent_ids: HashMap<String, usize> = HashMap::new();
        for record in result.table(parent).unwrap().records() {
            *parent_ids.entry(record.get_str(key)).or_default() += 1;
        }
        for record in result.table(child).unwrap().records() {
            let id = record.get_str(key);
            assert_eq!(parent_ids.get(&id), Some(&1), "{child} -> {parent} via {id}");
            assert!(id.starts_with(&record.get_str("file_id")));
        }
    }
}

#[test]
fn test_corrupt_file_is_isolated() {
    let dir = two_building_dir();
    // sorts between A.xlsx and B.xlsx
    fs::write(dir.path().join("AB_broken.xlsx"), b"this is not a workbook").unwrap();

    let result = run(dir.path(), OutputShape::Tables);
    assert_eq!(result.files.len(), 3);
    assert!(result.files[1].error.is_some());
    assert_eq!(result.files[1].total_records(), 0);

    let file_ids: HashSet<String> = result
        .table("rooms")
        .unwrap()
        .records()
        .iter()
        .map(|r| r.get_str("file_id"))
        .collect();
    assert_eq!(file_ids, HashSet::from(["001".to_string(), "003".to_string()]));

    let summary = result.summary();
    assert_eq!(summary.files_failed, 1);
}

#[test]
fn test_only_unreadable_files_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("A.xlsx"), b"garbage").unwrap();
    fs::write(dir.path().join("B.xlsx"), b"more garbage").unwrap();

    let result = run(dir.path(), OutputShape::Tables);
    assert_eq!(result.summary().files_failed, 2);
    assert!(matches!(
        result.ensure_readable(),
        Err(ConsolidateError::NoReadableInput { files: 2 })
    ));
}

#[test]
fn test_one_readable_file_is_enough() {
    let dir = two_building_dir();
    fs::write(dir.path().join("C.xlsx"), b"garbage").unwrap();
    assert!(run(dir.path(), OutputShape::Tables).ensure_readable().is_ok());
}

fn read_dir_bytes(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut files: Vec<(PathBuf, Vec<u8>)> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| {
            let path = entry.unwrap().path();
            let bytes = fs::read(&path).unwrap();
            (PathBuf::from(path.file_name().unwrap()), bytes)
        })
        .collect();
    files.sort();
    files
}

#[test]
fn test_csv_output_is_idempotent() {
    let dir = two_building_dir();
    let out = tempfile::tempdir().unwrap();

    let first = out.path().join("first");
    let second = out.path().join("second");
    write_output(&run(dir.path(), OutputShape::Tables).tables, OutputShape::Tables, &first).unwrap();
    write_output(&run(dir.path(), OutputShape::Tables).tables, OutputShape::Tables, &second).unwrap();

    let a = read_dir_bytes(&first);
    let b = read_dir_bytes(&second);
    assert!(!a.is_empty());
    assert_eq!(a, b);
    assert!(first.join("wall_layers.csv").exists());
    assert!(!first.join("pv.csv").exists());
}

#[test]
fn test_workbook_output_is_idempotent() {
    let dir = two_building_dir();
    let out = tempfile::tempdir().unwrap();

    let first = out.path().join("first.xlsx");
    let second = out.path().join("second.xlsx");
    write_output(&run(dir.path(), OutputShape::Workbook).tables, OutputShape::Workbook, &first).unwrap();
    // crosses a wall-clock second boundary
    std::thread::sleep(std::time::Duration::from_millis(1100));
    write_output(&run(dir.path(), OutputShape::Workbook).tables, OutputShape::Workbook, &second).unwrap();

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn test_wall_layers_csv_content() {
    let dir = two_building_dir();
    let out = tempfile::tempdir().unwrap();
    write_output(
        &run(dir.path(), OutputShape::Tables).tables,
        OutputShape::Tables,
        out.path(),
    )
    .unwrap();

    let mut reader = csv::Reader::from_path(out.path().join("wall_layers.csv")).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[0], "file_id");
    assert_eq!(&headers[2], "wall_layer_id");
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 4);
    assert_eq!(&rows[0][2], "001_W1_U01");
    assert_eq!(&rows[3][3], "002_W1");
}
