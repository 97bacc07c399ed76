//! Extract the bordered tables of a PDF document and print them as CSV.
//!
//! Usage: `cargo run --example extract_table -- <path-to-pdf>`

use pdf2csv::{ExtractOptions, Extractor, PageSource, Pdf, extract_page};

fn main() {
    let path = std::env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: extract_table <path-to-pdf>");
        std::process::exit(1);
    });

    let pdf = Pdf::open_file(&path).unwrap_or_else(|e| {
        eprintln!("Error opening PDF: {e}");
        std::process::exit(1);
    });

    let options = ExtractOptions::default();
    for index in 0..pdf.page_count() {
        let page = match pdf.load_page(index) {
            Ok(page) => page,
            Err(e) => {
                eprintln!("Skipping page {}: {e}", index + 1);
                continue;
            }
        };
        let extraction = extract_page(&page, &options.settings);
        if extraction.tables.is_empty() {
            continue;
        }
        println!(
            "--- Page {} ({} table(s), {} border segment(s)) ---",
            page.number,
            extraction.tables.len(),
            extraction.segments.len()
        );
        for (i, table) in extraction.tables.iter().enumerate() {
            let rows = table.rows();
            println!("  Table {}: {} row(s)", i + 1, rows.len());
            for row in &rows {
                println!("    {row:?}");
            }
        }
    }

    println!("--- CSV ---");
    let extractor = Extractor::new(options).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
    match extractor.run(&pdf, std::io::stdout().lock()) {
        Ok(summary) => {
            for warning in &summary.warnings {
                eprintln!("warning: {warning}");
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
