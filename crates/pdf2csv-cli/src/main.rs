mod cli;
mod logging;
mod page_range;

use std::fmt::Display;
use std::io::{self, BufWriter};

use clap::Parser;
use cli::Cli;
use pdf2csv::{AtomicOutput, Error, ExtractOptions, Extractor, Pdf, Settings, SvgPathTemplate};

use crate::page_range::parse_page_range;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    if let Err(code) = run(&cli) {
        std::process::exit(code);
    }
}

fn run(cli: &Cli) -> Result<(), i32> {
    // Configuration is fully validated before the document is touched.
    let extractor = options(cli).and_then(Extractor::new).map_err(fail)?;
    let pdf = Pdf::open_file(&cli.pdf).map_err(|e| fail(Error::Open(e)))?;

    let summary = match &cli.outfile {
        Some(path) => {
            let mut out = AtomicOutput::create(path).map_err(|e| fail(Error::OutputWrite(e)))?;
            let summary = extractor.run(&pdf, &mut out).map_err(fail)?;
            out.commit().map_err(|e| fail(Error::OutputWrite(e)))?;
            summary
        }
        None => extractor
            .run(&pdf, BufWriter::new(io::stdout().lock()))
            .map_err(fail)?,
    };

    tracing::info!(
        pages = summary.pages_processed,
        skipped = summary.pages_skipped,
        tables = summary.tables,
        rows = summary.rows,
        warnings = summary.warnings.len(),
        "done"
    );
    Ok(())
}

fn options(cli: &Cli) -> Result<ExtractOptions, Error> {
    let settings = Settings::new(cli.border_width)?;
    let page_range = match &cli.page_range {
        Some(range) => parse_page_range(range)?,
        None => Default::default(),
    };
    Ok(ExtractOptions {
        settings,
        page_range,
        debug_svg: cli.debug_dump_svg_path.clone().map(SvgPathTemplate::new),
        parallel: cli.parallel,
    })
}

fn fail(err: impl Display) -> i32 {
    eprintln!("Error: {err}");
    1
}
