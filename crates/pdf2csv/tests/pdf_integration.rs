//! End-to-end tests: PDF bytes → Pdf::open → Extractor → CSV.
//!
//! Test PDFs are created programmatically using lopdf.

mod common;

use common::{build_pdf, lattice, table, text};
use pdf2csv::{
    BackendError, ExtractOptions, Extractor, PageRange, PageSource, Pdf, Settings, WarningCode,
    extract_page,
};

fn extract(pdf: &Pdf, options: ExtractOptions) -> (String, pdf2csv::ExtractSummary) {
    let mut out = Vec::new();
    let summary = Extractor::new(options)
        .expect("valid options")
        .run(pdf, &mut out)
        .expect("extraction succeeds");
    (String::from_utf8(out).expect("utf-8 output"), summary)
}

#[test]
fn three_by_two_grid() {
    let content = table(
        &[50.0, 150.0, 250.0],
        &[700.0, 680.0, 660.0, 640.0],
        &["A", "B", "C", "D", "E", "F"],
    );
    let pdf = Pdf::open(&build_pdf(&[content])).unwrap();
    let (csv, summary) = extract(&pdf, ExtractOptions::default());
    assert_eq!(csv, "A,B\nC,D\nE,F\n");
    assert_eq!(summary.tables, 1);
    assert_eq!(summary.rows, 3);
    assert!(summary.warnings.is_empty());
}

#[test]
fn merged_header_leaves_empty_continuation_field() {
    // The middle vertical border only spans the second row.
    let content = [
        "0.5 w",
        "50 700 m 250 700 l S",
        "50 680 m 250 680 l S",
        "50 660 m 250 660 l S",
        "50 700 m 50 660 l S",
        "250 700 m 250 660 l S",
        "150 680 m 150 660 l S",
    ]
    .join("\n")
        + "\n"
        + &text(55.0, 686.0, "Header")
        + &text(55.0, 666.0, "X")
        + &text(155.0, 666.0, "Y");
    let pdf = Pdf::open(&build_pdf(&[content])).unwrap();
    let (csv, _) = extract(&pdf, ExtractOptions::default());
    assert_eq!(csv, "Header,\nX,Y\n");
}

#[test]
fn disconnected_tables_are_separated_by_one_blank_line() {
    let top = table(&[50.0, 150.0], &[700.0, 680.0], &["first"]);
    let bottom = table(&[50.0, 150.0, 250.0], &[400.0, 380.0], &["a", "b"]);
    let pdf = Pdf::open(&build_pdf(&[top + &bottom])).unwrap();
    let (csv, summary) = extract(&pdf, ExtractOptions::default());
    assert_eq!(csv, "first\n\na,b\n");
    assert_eq!(summary.tables, 2);
}

#[test]
fn kerned_row_in_one_tj_is_split_across_cells() {
    let content = lattice(&[50.0, 150.0, 250.0], &[700.0, 680.0, 660.0])
        + "BT /F1 10 Tf 55 686 Td [(A) -9500 (B)] TJ ET\n"
        + "BT /F1 10 Tf 55 666 Td [(Net) -600 (Sales)] TJ ET\n";
    let pdf = Pdf::open(&build_pdf(&[content])).unwrap();
    let (csv, summary) = extract(&pdf, ExtractOptions::default());
    assert_eq!(csv, "A,B\nNet Sales,\n");
    assert!(summary.warnings.is_empty());
}

#[test]
fn page_without_borders_emits_nothing() {
    let pdf = Pdf::open(&build_pdf(&[text(72.0, 700.0, "Just prose")])).unwrap();
    let (csv, summary) = extract(&pdf, ExtractOptions::default());
    assert_eq!(csv, "");
    assert_eq!(summary.pages_processed, 1);
    assert_eq!(summary.warnings.len(), 1);
    assert_eq!(summary.warnings[0].code, WarningCode::TextDropped);
}

#[test]
fn fields_needing_quotes_round_trip_through_a_csv_reader() {
    let content = table(
        &[50.0, 200.0, 350.0],
        &[700.0, 680.0, 660.0],
        &["1,000", "say \"hi\"", "plain", "x"],
    );
    let pdf = Pdf::open(&build_pdf(&[content])).unwrap();
    let (csv, _) = extract(&pdf, ExtractOptions::default());
    assert_eq!(csv, "\"1,000\",\"say \"\"hi\"\"\"\nplain,x\n");

    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(csv.as_bytes());
    let rows: Vec<Vec<String>> = reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect();
    assert_eq!(
        rows,
        vec![
            vec!["1,000".to_string(), "say \"hi\"".to_string()],
            vec!["plain".to_string(), "x".to_string()],
        ]
    );
}

#[test]
fn page_range_selects_single_page() {
    let pages: Vec<String> = (1..=5)
        .map(|n| table(&[50.0, 150.0], &[700.0, 680.0], &[format!("page{n}").as_str()]))
        .collect();
    let pdf = Pdf::open(&build_pdf(&pages)).unwrap();
    let options = ExtractOptions {
        page_range: PageRange::single(3).unwrap(),
        ..ExtractOptions::default()
    };
    let (csv, summary) = extract(&pdf, options);
    assert_eq!(csv, "page3\n");
    assert_eq!(summary.pages_processed, 1);
}

#[test]
fn tables_across_pages_keep_page_order() {
    let pages: Vec<String> = ["one", "two", "three"]
        .iter()
        .map(|t| table(&[50.0, 150.0], &[700.0, 680.0], &[*t]))
        .collect();
    let pdf = Pdf::open(&build_pdf(&pages)).unwrap();
    let (csv, _) = extract(&pdf, ExtractOptions::default());
    assert_eq!(csv, "one\n\ntwo\n\nthree\n");
}

#[test]
fn border_width_controls_line_merging() {
    // Two horizontal rules 1.5pt apart: one border at width 2, two at width 1.
    let content = lattice(&[50.0, 150.0], &[700.0, 680.0]) + "50 681.5 m 150 681.5 l S\n";
    let pdf = Pdf::open(&build_pdf(&[content])).unwrap();
    let page = pdf.load_page(0).unwrap();

    let narrow = extract_page(&page, &Settings::new(1.0).unwrap());
    assert_eq!(narrow.tables[0].table.horizontals.len(), 3);
    let wide = extract_page(&page, &Settings::new(2.0).unwrap());
    assert_eq!(wide.tables[0].table.horizontals.len(), 2);
}

#[test]
fn garbage_bytes_fail_to_open() {
    let err = Pdf::open(b"%PDF-1.4 but not really").unwrap_err();
    assert!(matches!(err, BackendError::Parse(_)));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = Pdf::open_file("/definitely/not/here.pdf").unwrap_err();
    assert!(matches!(err, BackendError::Io(_)));
}

#[test]
fn debug_svg_template_without_placeholder_on_multiple_pages() {
    let dir = tempfile::tempdir().unwrap();
    let pages: Vec<String> = ["a", "b"]
        .iter()
        .map(|t| table(&[50.0, 150.0], &[700.0, 680.0], &[*t]))
        .collect();
    let pdf = Pdf::open(&build_pdf(&pages)).unwrap();
    let options = ExtractOptions {
        debug_svg: Some(pdf2csv::SvgPathTemplate::new(
            dir.path().join("dump.svg").to_string_lossy(),
        )),
        ..ExtractOptions::default()
    };
    let (_, summary) = extract(&pdf, options);
    assert!(summary.warnings.is_empty());
    for n in 1..=2 {
        let svg = std::fs::read_to_string(dir.path().join(format!("dump_page{n}.svg"))).unwrap();
        assert!(svg.contains("class=\"cell\""));
    }
}
