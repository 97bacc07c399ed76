//! Shared PDF fixture builders for integration tests.
//!
//! Fixtures are generated with lopdf rather than checked in. Coordinates
//! passed to the builders are PDF user space (origin bottom-left).

#![allow(dead_code)]

use std::fmt::Write as _;

use lopdf::{Document, Object, Stream, dictionary};

/// Build a US Letter PDF with one page per content stream, all sharing a
/// Helvetica font named `/F1`.
pub fn build_pdf(contents: &[String]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for content in contents {
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.as_bytes().to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });
        kids.push(Object::Reference(page_id));
    }
    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("failed to save test PDF");
    buf
}

/// Stroke a full lattice: one horizontal line per `ys` entry spanning the
/// outer `xs`, one vertical line per `xs` entry spanning the outer `ys`.
pub fn lattice(xs: &[f64], ys: &[f64]) -> String {
    let (x0, x1) = (xs[0], xs[xs.len() - 1]);
    let (y0, y1) = (ys[0], ys[ys.len() - 1]);
    let mut out = String::from("0.5 w\n");
    for y in ys {
        let _ = writeln!(out, "{x0} {y} m {x1} {y} l S");
    }
    for x in xs {
        let _ = writeln!(out, "{x} {y0} m {x} {y1} l S");
    }
    out
}

/// Show `text` with its baseline at (`x`, `y`) in 10pt `/F1`.
pub fn text(x: f64, y: f64, text: &str) -> String {
    format!("BT /F1 10 Tf {x} {y} Td ({text}) Tj ET\n")
}

/// A lattice with one text run per cell, filled row by row from the top.
/// `ys` must be listed top to bottom (descending PDF y).
pub fn table(xs: &[f64], ys: &[f64], cells: &[&str]) -> String {
    let mut out = lattice(xs, ys);
    let mut cells = cells.iter();
    for row in ys.windows(2) {
        for col in xs.windows(2) {
            if let Some(cell) = cells.next() {
                out.push_str(&text(col[0] + 5.0, row[1] + 6.0, cell));
            }
        }
    }
    out
}
