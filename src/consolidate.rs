// Cross-file accumulation
//
// Input files are processed one at a time in sorted path order. Each file
// gets a 3-digit `file_id` from its position, its basic information is read
// once, and every layout of the registry is run against it. Records are
// appended to per-entity tables; a file that fails to open contributes
// nothing and the run carries on.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::basic_info::{FileContext, COMMON_COLUMNS};
use crate::cell::CellValue;
use crate::extract::{assign_ids, dump_sheet, extract_records};
use crate::group::{assemble_groups, DropCounts};
use crate::layout::{LayoutRegistry, LayoutSpec};
use crate::output::{write_atomic, OutputError, OutputShape, WIDE_SHEET};
use crate::record::{Record, Table};
use crate::sheet::SheetGrid;
use crate::workbook::{CalamineWorkbook, WorkbookSource};

#[derive(Error, Debug)]
pub enum ConsolidateError {
    #[error("No input files matching '{pattern}' in {dir}")]
    NoInputFiles { dir: PathBuf, pattern: String },

    #[error("Invalid input pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("None of the {files} input files could be read")]
    NoReadableInput { files: usize },
}

/// Spreadsheet files under `dir` matching `pattern`, sorted and deduplicated
///
/// Excel lock files (`~$name.xlsx`) are skipped. Finding nothing is the one
/// condition that aborts a run.
pub fn discover_inputs(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, ConsolidateError> {
    let full = Path::new(&glob::Pattern::escape(&dir.to_string_lossy())).join(pattern);
    let mut paths: Vec<PathBuf> = glob::glob(&full.to_string_lossy())?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Skipping unreadable path: {}", e);
                None
            }
        })
        .filter(|path| path.is_file())
        .filter(|path| {
            !path
                .file_name()
                .map(|name| name.to_string_lossy().starts_with("~$"))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();
    paths.dedup();

    if paths.is_empty() {
        return Err(ConsolidateError::NoInputFiles {
            dir: dir.to_path_buf(),
            pattern: pattern.to_string(),
        });
    }
    debug!("Found {} input files in {}", paths.len(), dir.display());
    Ok(paths)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCount {
    pub entity_type: String,
    pub records: usize,
    /// Grouped-sheet rows dropped while building this (child) entity
    #[serde(default)]
    pub dropped: DropCounts,
}

/// What one input file contributed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileSummary {
    pub file_id: String,
    pub path: PathBuf,
    pub building_name: String,
    pub counts: Vec<EntityCount>,
    pub dropped: DropCounts,
    /// Layout sheets the workbook does not have
    pub missing_sheets: Vec<String>,
    /// Sheets that exist but could not be read
    pub sheet_errors: Vec<String>,
    /// Set when the file could not be opened at all
    pub error: Option<String>,
}

impl FileSummary {
    pub fn total_records(&self) -> usize {
        self.counts.iter().map(|c| c.records).sum()
    }

    pub fn records_for(&self, entity_type: &str) -> usize {
        self.counts
            .iter()
            .find(|c| c.entity_type == entity_type)
            .map_or(0, |c| c.records)
    }

    pub fn dropped_for(&self, entity_type: &str) -> DropCounts {
        self.counts
            .iter()
            .find(|c| c.entity_type == entity_type)
            .map(|c| c.dropped)
            .unwrap_or_default()
    }

    fn entry(&mut self, entity_type: &str) -> &mut EntityCount {
        let idx = match self.counts.iter().position(|c| c.entity_type == entity_type) {
            Some(idx) => idx,
            None => {
                self.counts.push(EntityCount {
                    entity_type: entity_type.to_string(),
                    records: 0,
                    dropped: DropCounts::default(),
                });
                self.counts.len() - 1
            }
        };
        &mut self.counts[idx]
    }

    fn add_count(&mut self, entity_type: &str, records: usize) {
        self.entry(entity_type).records += records;
    }

    fn add_dropped(&mut self, entity_type: &str, dropped: DropCounts) {
        self.entry(entity_type).dropped.add(dropped);
        self.dropped.add(dropped);
    }
}

/// End-of-run report, serializable for `--summary-json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub shape: OutputShape,
    pub files_processed: usize,
    pub files_failed: usize,
    pub totals: Vec<EntityCount>,
    pub dropped: DropCounts,
    pub files: Vec<FileSummary>,
}

/// Accumulated result of a run
#[derive(Debug, Clone)]
pub struct Consolidation {
    pub shape: OutputShape,
    pub tables: Vec<Table>,
    pub files: Vec<FileSummary>,
}

impl RunSummary {
    /// Write the summary as pretty JSON, replacing `path` atomically
    pub fn write_json(&self, path: &Path) -> Result<(), OutputError> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(path, json.as_bytes())
    }
}

impl Consolidation {
    pub fn table(&self, entity_type: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.entity_type == entity_type)
    }

    /// Fails when files were found but not a single one could be opened
    pub fn ensure_readable(&self) -> Result<(), ConsolidateError> {
        if !self.files.is_empty() && self.files.iter().all(|f| f.error.is_some()) {
            return Err(ConsolidateError::NoReadableInput {
                files: self.files.len(),
            });
        }
        Ok(())
    }

    pub fn summary(&self) -> RunSummary {
        let mut dropped = DropCounts::default();
        for file in &self.files {
            dropped.add(file.dropped);
        }
        RunSummary {
            shape: self.shape,
            files_processed: self.files.len(),
            files_failed: self.files.iter().filter(|f| f.error.is_some()).count(),
            totals: self
                .tables
                .iter()
                .map(|t| EntityCount {
                    entity_type: t.entity_type.clone(),
                    records: t.len(),
                    dropped: self.files.iter().fold(DropCounts::default(), |mut acc, f| {
                        acc.add(f.dropped_for(&t.entity_type));
                        acc
                    }),
                })
                .collect(),
            dropped,
            files: self.files.clone(),
        }
    }
}

/// Records one layout produced from one sheet
struct LayoutOutput {
    batches: Vec<(String, Vec<Record>)>,
    /// Rows dropped by grouping, charged to the child entity
    dropped: Option<(String, DropCounts)>,
}

fn run_layout(grid: &SheetGrid, layout: &LayoutSpec, file_id: &str) -> LayoutOutput {
    if let Some(group) = &layout.grouping {
        let grouped = assemble_groups(grid, layout, file_id);
        return LayoutOutput {
            batches: vec![
                (group.parent_entity.clone(), grouped.parents),
                (group.child_entity.clone(), grouped.children),
            ],
            dropped: Some((group.child_entity.clone(), grouped.dropped)),
        };
    }

    let records = if layout.header_fusion.is_some() {
        dump_sheet(grid, layout)
    } else {
        let mut records: Vec<Record> = extract_records(grid, layout).collect();
        assign_ids(&mut records, layout, file_id);
        records
    };
    LayoutOutput {
        batches: vec![(layout.entity_type.clone(), records)],
        dropped: None,
    }
}

/// Per-entity tables, appended to in file order
#[derive(Debug)]
struct Accumulator {
    shape: OutputShape,
    tables: Vec<Table>,
    table_index: HashMap<String, usize>,
}

impl Accumulator {
    fn new(registry: &LayoutRegistry, shape: OutputShape) -> Self {
        let tables: Vec<Table> = match shape {
            OutputShape::Wide => {
                let mut columns: Vec<String> =
                    COMMON_COLUMNS.iter().map(|c| c.to_string()).collect();
                columns.push("entity_type".to_string());
                columns.extend(registry.all_fields());
                vec![Table::with_columns(WIDE_SHEET, &columns)]
            }
            OutputShape::Workbook | OutputShape::Tables => registry
                .entity_types()
                .into_iter()
                .map(Table::new)
                .collect(),
        };
        let table_index = tables
            .iter()
            .enumerate()
            .map(|(idx, t)| (t.entity_type.clone(), idx))
            .collect();
        Self {
            shape,
            tables,
            table_index,
        }
    }

    fn table_mut(&mut self, name: &str) -> &mut Table {
        let idx = match self.table_index.get(name) {
            Some(idx) => *idx,
            None => {
                self.tables.push(Table::new(name));
                self.table_index.insert(name.to_string(), self.tables.len() - 1);
                self.tables.len() - 1
            }
        };
        &mut self.tables[idx]
    }

    /// Stamp file columns onto records and append them to their table
    fn append(
        &mut self,
        entity: &str,
        ctx: &FileContext,
        records: Vec<Record>,
        summary: &mut FileSummary,
    ) {
        summary.add_count(entity, records.len());
        if records.is_empty() {
            return;
        }

        let (table_name, leading) = match self.shape {
            OutputShape::Wide => {
                let mut leading = ctx.common_columns();
                leading.push(("entity_type".to_string(), CellValue::text(entity)));
                (WIDE_SHEET, leading)
            }
            OutputShape::Workbook | OutputShape::Tables => (entity, ctx.identity_columns()),
        };

        let table = self.table_mut(table_name);
        for mut record in records {
            record.prepend(leading.clone());
            table.push(record);
        }
    }
}

/// Runs a layout registry over input workbooks and accumulates the results
pub struct Consolidator {
    registry: LayoutRegistry,
    acc: Accumulator,
    files: Vec<FileSummary>,
}

impl Consolidator {
    pub fn new(registry: LayoutRegistry, shape: OutputShape) -> Self {
        let acc = Accumulator::new(&registry, shape);
        Self {
            registry,
            acc,
            files: Vec::new(),
        }
    }

    fn next_file_id(&self) -> String {
        format!("{:03}", self.files.len() + 1)
    }

    /// Open and process one file from disk; open failures are recorded, not returned
    pub fn add_path(&mut self, path: &Path) -> &FileSummary {
        match CalamineWorkbook::open(path) {
            Ok(mut workbook) => self.add_workbook(path, &mut workbook),
            Err(e) => self.add_failed(path, e.to_string()),
        }
    }

    /// Record a file that produced no data
    pub fn add_failed(&mut self, path: &Path, error: String) -> &FileSummary {
        let file_id = self.next_file_id();
        error!("[{}] Failed to process {}: {}", file_id, path.display(), error);
        self.files.push(FileSummary {
            file_id,
            path: path.to_path_buf(),
            error: Some(error),
            ..FileSummary::default()
        });
        &self.files[self.files.len() - 1]
    }

    /// Extract every layout from an opened workbook
    #[instrument(skip(self, path, source), fields(path = %path.display()))]
    pub fn add_workbook<W: WorkbookSource>(&mut self, path: &Path, source: &mut W) -> &FileSummary {
        let file_id = self.next_file_id();
        info!("Processing [{}] {}", file_id, path.display());

        let mut summary = FileSummary {
            file_id: file_id.clone(),
            path: path.to_path_buf(),
            ..FileSummary::default()
        };
        let ctx = read_context(&self.registry, source, &file_id, &mut summary);
        summary.building_name = ctx.building_name();

        if let Some(entity) = self
            .registry
            .basic_info
            .as_ref()
            .and_then(|info| info.entity_type.as_deref())
        {
            if self.acc.shape != OutputShape::Wide {
                self.acc
                    .append(entity, &ctx, vec![ctx.to_record()], &mut summary);
            }
        }

        for layout in &self.registry.layouts {
            let grid = match source.sheet(&layout.sheet_name) {
                Ok(Some(grid)) => grid,
                Ok(None) => {
                    debug!("Sheet '{}' not present", layout.sheet_name);
                    if !summary.missing_sheets.contains(&layout.sheet_name) {
                        summary.missing_sheets.push(layout.sheet_name.clone());
                    }
                    continue;
                }
                Err(e) => {
                    warn!("[{}] {}", file_id, e);
                    summary.sheet_errors.push(e.to_string());
                    continue;
                }
            };

            let output = run_layout(&grid, layout, &file_id);
            for (entity, records) in output.batches {
                self.acc.append(&entity, &ctx, records, &mut summary);
            }
            if let Some((entity, dropped)) = output.dropped {
                summary.add_dropped(&entity, dropped);
            }
        }

        debug!(
            "[{}] {} records, {} missing sheets",
            file_id,
            summary.total_records(),
            summary.missing_sheets.len()
        );
        self.files.push(summary);
        &self.files[self.files.len() - 1]
    }

    /// Process every path in order
    pub fn run(mut self, paths: &[PathBuf]) -> Consolidation {
        for path in paths {
            self.add_path(path);
        }
        self.finish()
    }

    pub fn finish(self) -> Consolidation {
        for file in self.files.iter().filter(|f| f.error.is_none()) {
            info!(
                "[{}] {}: {} records",
                file.file_id,
                file.building_name,
                file.total_records()
            );
        }
        Consolidation {
            shape: self.acc.shape,
            tables: self.acc.tables,
            files: self.files,
        }
    }
}

fn read_context<W: WorkbookSource>(
    registry: &LayoutRegistry,
    source: &mut W,
    file_id: &str,
    summary: &mut FileSummary,
) -> FileContext {
    let Some(info) = &registry.basic_info else {
        return FileContext::new(file_id);
    };
    match source.sheet(&info.sheet_name) {
        Ok(Some(grid)) => FileContext::from_sheet(file_id, &grid),
        Ok(None) => {
            debug!("No basic information sheet '{}'", info.sheet_name);
            summary.missing_sheets.push(info.sheet_name.clone());
            FileContext::new(file_id)
        }
        Err(e) => {
            warn!("[{}] {}", file_id, e);
            summary.sheet_errors.push(e.to_string());
            FileContext::new(file_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::webpro;
    use crate::workbook::MemoryWorkbook;

    fn room_sheet(start: usize, names: &[&str]) -> SheetGrid {
        let mut rows: Vec<Vec<&str>> = vec![vec![]; start];
        for name in names {
            rows.push(vec!["1F", *name, "事務所等", "事務室", "事務室", "50", "3.5", "2.7", "■"]);
        }
        let rows: Vec<&[&str]> = rows.iter().map(Vec::as_slice).collect();
        SheetGrid::from_strings(&rows)
    }

    fn basic_sheet(name: &str) -> SheetGrid {
        SheetGrid::from_strings(&[&["", "建物の名称", name]])
    }

    fn building(name: &str, rooms: &[&str]) -> MemoryWorkbook {
        MemoryWorkbook::new()
            .with_sheet(webpro::BASIC_INFO_SHEET, basic_sheet(name))
            .with_sheet("1) 室仕様", room_sheet(10, rooms))
    }

    #[test]
    fn test_rows_concatenate_in_file_order() {
        let mut consolidator = Consolidator::new(webpro::relational(), OutputShape::Tables);
        consolidator.add_workbook(Path::new("A.xlsx"), &mut building("A棟", &["A1", "A2", "A3"]));
        consolidator.add_workbook(Path::new("B.xlsx"), &mut building("B棟", &["B1", "B2"]));
        let result = consolidator.finish();

        let rooms = result.table("rooms").unwrap();
        let names: Vec<String> = rooms.records().iter().map(|r| r.get_str("room_name")).collect();
        assert_eq!(names, vec!["A1", "A2", "A3", "B1", "B2"]);
        assert_eq!(rooms.records()[3].get_str("file_id"), "002");
        assert_eq!(rooms.records()[3].get_str("room_id"), "002_R001");
        assert_eq!(rooms.records()[0].get_str("building_name"), "A棟");
        assert_eq!(&rooms.columns()[..3], &["file_id", "building_name", "room_id"]);

        let buildings = result.table("buildings").unwrap();
        assert_eq!(buildings.len(), 2);
    }

    #[test]
    fn test_missing_sheet_only_affects_its_entity() {
        let mut consolidator = Consolidator::new(webpro::relational(), OutputShape::Tables);
        let summary = consolidator
            .add_workbook(Path::new("A.xlsx"), &mut building("A棟", &["A1"]))
            .clone();

        assert_eq!(summary.records_for("rooms"), 1);
        assert_eq!(summary.records_for("lighting"), 0);
        assert!(summary.missing_sheets.contains(&"4) 照明".to_string()));
        assert!(summary.error.is_none());
    }

    #[test]
    fn test_failed_file_keeps_its_file_id_slot() {
        let mut consolidator = Consolidator::new(webpro::relational(), OutputShape::Tables);
        consolidator.add_failed(Path::new("bad.xlsx"), "corrupt".to_string());
        consolidator.add_workbook(Path::new("good.xlsx"), &mut building("C棟", &["C1"]));
        let result = consolidator.finish();

        assert_eq!(result.files[0].error.as_deref(), Some("corrupt"));
        let rooms = result.table("rooms").unwrap();
        assert_eq!(rooms.records()[0].get_str("file_id"), "002");

        let summary = result.summary();
        assert_eq!(summary.files_processed, 2);
        assert_eq!(summary.files_failed, 1);
    }

    #[test]
    fn test_wide_shape_merges_into_one_table() {
        let registry = webpro::wide();
        let mut consolidator = Consolidator::new(registry.clone(), OutputShape::Wide);
        let mut workbook = MemoryWorkbook::new()
            .with_sheet(webpro::BASIC_INFO_SHEET, basic_sheet("D棟"))
            .with_sheet("1) 室仕様", room_sheet(9, &["D1"]));
        consolidator.add_workbook(Path::new("D.xlsx"), &mut workbook);
        let result = consolidator.finish();

        assert_eq!(result.tables.len(), 1);
        let all = result.table(WIDE_SHEET).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all.columns().len(), COMMON_COLUMNS.len() + 1 + registry.all_fields().len());
        let record = &all.records()[0];
        assert_eq!(record.get_str("entity_type"), "room");
        assert_eq!(record.get_str("room_name"), "D1");
        assert_eq!(record.get_str("building_name"), "D棟");
        assert_eq!(record.get_str("region"), "");
    }

    #[test]
    fn test_workbook_shape_uses_sheet_headers() {
        let mut rows: Vec<Vec<&str>> = vec![vec![]; 9];
        rows[5] = vec!["階", "室名"];
        rows.push(vec!["1F", "事務室"]);
        rows.push(vec!["", "廊下"]);
        let rows: Vec<&[&str]> = rows.iter().map(Vec::as_slice).collect();
        let mut workbook = MemoryWorkbook::new().with_sheet("1) 室仕様", SheetGrid::from_strings(&rows));

        let mut consolidator = Consolidator::new(webpro::sheet_dump(), OutputShape::Workbook);
        consolidator.add_workbook(Path::new("E.xlsx"), &mut workbook);
        let result = consolidator.finish();

        let rooms = result.table("01_室仕様").unwrap();
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms.records()[0].get_str("室名"), "事務室");
        assert_eq!(&rooms.columns()[..2], &["file_id", "building_name"]);
        assert!(result.table("00_基本情報").unwrap().len() == 1);
    }

    fn padded(start: usize, rows: &[&[&str]]) -> SheetGrid {
        let mut all: Vec<&[&str]> = Vec::with_capacity(start + rows.len());
        all.resize(start, &[]);
        all.extend_from_slice(rows);
        SheetGrid::from_strings(&all)
    }

    #[test]
    fn test_dropped_rows_are_counted_per_entity() {
        let walls = padded(
            10,
            &[
                &["", "", "", "1", "plaster"],
                &["W1", "concrete", "0.5"],
                &["", "", "", "1", "plaster"],
            ],
        );
        let mut workbook = building("A棟", &["A1"]).with_sheet("2-2) 外壁構成 ", walls);

        let mut consolidator = Consolidator::new(webpro::relational(), OutputShape::Tables);
        consolidator.add_workbook(Path::new("A.xlsx"), &mut workbook);
        let result = consolidator.finish();

        let file = &result.files[0];
        assert_eq!(file.dropped_for("wall_layers").orphan_children, 1);
        assert_eq!(file.dropped_for("wall_specs"), DropCounts::default());
        assert_eq!(file.dropped.orphan_children, 1);
        assert_eq!(file.records_for("wall_layers"), 1);

        let summary = result.summary();
        let layers = summary
            .totals
            .iter()
            .find(|t| t.entity_type == "wall_layers")
            .unwrap();
        assert_eq!(layers.dropped.orphan_children, 1);
        assert_eq!(summary.dropped.total(), 1);
    }

    #[test]
    fn test_all_files_failing_is_not_readable() {
        let mut consolidator = Consolidator::new(webpro::relational(), OutputShape::Tables);
        consolidator.add_failed(Path::new("a.xlsx"), "corrupt".to_string());
        consolidator.add_failed(Path::new("b.xlsx"), "corrupt".to_string());
        let result = consolidator.finish();
        assert!(matches!(
            result.ensure_readable(),
            Err(ConsolidateError::NoReadableInput { files: 2 })
        ));

        let mut consolidator = Consolidator::new(webpro::relational(), OutputShape::Tables);
        consolidator.add_failed(Path::new("a.xlsx"), "corrupt".to_string());
        consolidator.add_workbook(Path::new("b.xlsx"), &mut building("B棟", &["B1"]));
        assert!(consolidator.finish().ensure_readable().is_ok());
    }

    #[test]
    fn test_summary_json_written_atomically() {
        let mut consolidator = Consolidator::new(webpro::relational(), OutputShape::Tables);
        consolidator.add_workbook(Path::new("A.xlsx"), &mut building("A棟", &["A1", "A2"]));
        let summary = consolidator.finish().summary();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("summary.json");
        summary.write_json(&path).unwrap();

        let loaded: RunSummary =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.files_processed, 1);
        assert_eq!(loaded.files[0].records_for("rooms"), 2);
        assert_eq!(std::fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn test_discover_inputs_sorts_and_skips_lock_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.xlsx", "a.xlsx", "~$a.xlsx", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let paths = discover_inputs(dir.path(), "*.xlsx").unwrap();
        let names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.xlsx", "b.xlsx"]);
    }

    #[test]
    fn test_discover_inputs_empty_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let result = discover_inputs(dir.path(), "*.xlsx");
        assert!(matches!(result, Err(ConsolidateError::NoInputFiles { .. })));
    }
}
