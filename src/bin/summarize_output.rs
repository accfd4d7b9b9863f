use clap::Parser;
use std::collections::BTreeMap;
use std::path::PathBuf;

use webpro_etl::workbook::{CalamineWorkbook, WorkbookSource};

#[derive(Parser)]
#[command(name = "summarize-output")]
#[command(about = "Print sheet sizes and per-file row counts of a consolidated workbook", long_about = None)]
struct Cli {
    /// Consolidated workbook written by webpro-etl
    file: PathBuf,

    /// Show per-file row counts for this sheet only
    #[arg(long)]
    sheet: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut workbook = CalamineWorkbook::open(&cli.file)?;

    println!("{}", "=".repeat(60));
    println!("Consolidated workbook: {}", cli.file.display());
    println!("{}", "=".repeat(60));

    let names = match &cli.sheet {
        Some(sheet) => vec![sheet.clone()],
        None => workbook.sheet_names(),
    };

    for name in names {
        let Some(grid) = workbook.sheet(&name)? else {
            println!("\n{name}: not found");
            continue;
        };
        let rows = grid.height().saturating_sub(1);
        println!("\n{name}: {rows} rows x {} columns", grid.width());

        // Header row is row 0; file_id is stamped first by the writer
        let file_id_col = grid
            .row(0)
            .iter()
            .position(|cell| cell.as_str() == Some("file_id"));
        let Some(col) = file_id_col else {
            continue;
        };

        let mut per_file: BTreeMap<String, usize> = BTreeMap::new();
        for (_, row) in grid.rows_from(1) {
            let file_id = row.get(col).map(|c| c.to_string()).unwrap_or_default();
            *per_file.entry(file_id).or_default() += 1;
        }
        for (file_id, count) in per_file {
            println!("  [{file_id}] {count}");
        }
    }

    Ok(())
}
