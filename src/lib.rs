pub mod basic_info;
pub mod cell;
pub mod config;
pub mod consolidate;
pub mod extract;
pub mod group;
pub mod layout;
pub mod output;
pub mod record;
pub mod sheet;
pub mod workbook;

pub use cell::CellValue;
pub use consolidate::{discover_inputs, Consolidation, Consolidator, FileSummary, RunSummary};
pub use layout::{LayoutRegistry, LayoutSpec};
pub use output::{write_output, OutputShape};
pub use record::{Record, Table};
pub use sheet::SheetGrid;
pub use workbook::{CalamineWorkbook, MemoryWorkbook, WorkbookSource};
