//! Serde serialization/deserialization round-trip tests.
//!
//! These tests verify that the public data model can be serialized to JSON
//! and deserialized back, producing equal values.

#![cfg(feature = "serde")]

use pdf2csv_core::{
    BBox, ExtractWarning, LineSegment, Orientation, Page, PageRange, PaintOp, Point, Primitive,
    ResolvedTable, Settings, TextRun, WarningCode, build_tables, resolve_cells,
};

/// Helper: serialize to JSON string, deserialize back, assert equality.
fn roundtrip<T>(value: &T)
where
    T: serde::Serialize + serde::de::DeserializeOwned + PartialEq + std::fmt::Debug,
{
    let json = serde_json::to_string(value).expect("serialize failed");
    let restored: T = serde_json::from_str(&json).expect("deserialize failed");
    assert_eq!(*value, restored, "round-trip mismatch for JSON: {json}");
}

#[test]
fn test_serde_geometry() {
    roundtrip(&Point::new(3.5, 2.25));
    roundtrip(&BBox::new(1.0, 2.0, 3.0, 4.0));
    roundtrip(&Orientation::Horizontal);
    roundtrip(&Orientation::Vertical);
}

#[test]
fn test_serde_page_snapshot() {
    let mut page = Page::new(2, BBox::new(0.0, 0.0, 612.0, 792.0));
    page.primitives.push(Primitive::Rect {
        bbox: BBox::new(10.0, 10.0, 100.0, 40.0),
        paint: PaintOp::FillAndStroke,
        line_width: 0.75,
    });
    page.primitives.push(Primitive::Path {
        points: vec![Point::new(0.0, 5.0), Point::new(80.0, 5.0)],
        closed: false,
        paint: PaintOp::Stroke,
        line_width: 1.0,
    });
    page.runs.push(TextRun {
        text: "Total".to_string(),
        bbox: BBox::new(12.0, 12.0, 40.0, 22.0),
        baseline: 20.0,
        font_size: 10.0,
        font_name: "Helvetica".to_string(),
    });
    roundtrip(&page);
}

#[test]
fn test_serde_resolved_table() {
    let segments = vec![
        LineSegment::horizontal(10.0, 10.0, 110.0, 0.5),
        LineSegment::horizontal(30.0, 10.0, 110.0, 0.5),
        LineSegment::vertical(10.0, 10.0, 30.0, 0.5),
        LineSegment::vertical(60.0, 10.0, 30.0, 0.5),
        LineSegment::vertical(110.0, 10.0, 30.0, 0.5),
    ];
    let settings = Settings::default();
    let mut warnings = Vec::new();
    let tables: Vec<ResolvedTable> = build_tables(&segments, &settings)
        .iter()
        .map(|t| resolve_cells(t, &settings, 1, &mut warnings))
        .collect();
    assert_eq!(tables.len(), 1);
    roundtrip(&tables[0]);
    roundtrip(&segments[0]);
}

#[test]
fn test_serde_warning_and_page_range() {
    roundtrip(&ExtractWarning::on_page(WarningCode::TextDropped, "caption", 3));
    roundtrip(&PageRange::new(Some(2), None).expect("valid range"));
}
