use clap::Parser;
use std::path::PathBuf;

use webpro_etl::layout::webpro::BASIC_INFO_SHEET;
use webpro_etl::workbook::{CalamineWorkbook, WorkbookSource};

#[derive(Parser)]
#[command(name = "inspect-sheet")]
#[command(about = "Dump one sheet of a WEBPRO workbook with absolute 0-based row/column indices", long_about = None)]
struct Cli {
    /// Workbook to inspect
    file: PathBuf,

    /// Sheet to dump
    #[arg(long, default_value = BASIC_INFO_SHEET)]
    sheet: String,

    /// First row to show
    #[arg(long, default_value = "0")]
    from_row: usize,

    /// Number of rows to show
    #[arg(long, default_value = "40")]
    rows: usize,

    /// Number of columns to show per row
    #[arg(long, default_value = "12")]
    cols: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    println!("Opening workbook: {}", cli.file.display());
    let mut workbook = CalamineWorkbook::open(&cli.file)?;

    println!("\nSheet names:");
    for (i, name) in workbook.sheet_names().iter().enumerate() {
        println!("  {i}: {name:?}");
    }

    let Some(grid) = workbook.sheet(&cli.sheet)? else {
        println!("\nSheet {:?} not found", cli.sheet);
        return Ok(());
    };

    println!("\nExamining sheet: {:?}", cli.sheet);
    println!("{}", "=".repeat(100));
    println!("Size (from A1): {} rows x {} cols", grid.height(), grid.width());
    println!("{}", "=".repeat(100));

    for (row_idx, row) in grid.rows_from(cli.from_row).take(cli.rows) {
        // Only print rows with data
        if !row.iter().any(|cell| cell.is_present()) {
            continue;
        }
        print!("Row {row_idx:3}: ");
        for (col_idx, cell) in row.iter().enumerate().take(cli.cols) {
            if cell.is_present() {
                print!("[{col_idx}:{cell}] ");
            }
        }
        println!();
    }

    Ok(())
}
