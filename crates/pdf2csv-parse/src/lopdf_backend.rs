//! lopdf-based PDF parsing backend.
//!
//! Implements [`PdfBackend`] using the [lopdf](https://crates.io/crates/lopdf)
//! crate. Page boxes and resources are resolved through `/Parent`
//! inheritance; the content streams are handed to the interpreter.

use std::sync::LazyLock;

use pdf2csv_core::{BBox, Page};
use tracing::trace;

use crate::backend::PdfBackend;
use crate::error::BackendError;
use crate::interpreter::interpret_page;
use crate::page_geometry::PageGeometry;

/// US Letter, used when no `/MediaBox` can be found.
const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// A parsed PDF document backed by lopdf.
pub struct LopdfDocument {
    inner: lopdf::Document,
    /// Page object ids in document order.
    page_ids: Vec<lopdf::ObjectId>,
}

impl LopdfDocument {
    /// Access the underlying lopdf document.
    pub fn inner(&self) -> &lopdf::Document {
        &self.inner
    }
}

impl std::fmt::Debug for LopdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LopdfDocument")
            .field("page_count", &self.page_ids.len())
            .finish_non_exhaustive()
    }
}

/// The lopdf-based PDF backend.
///
/// # Example
///
/// ```ignore
/// use pdf2csv_parse::{LopdfBackend, PdfBackend};
///
/// let doc = LopdfBackend::open(pdf_bytes)?;
/// let page = LopdfBackend::load_page(&doc, 0)?;
/// ```
pub struct LopdfBackend;

impl PdfBackend for LopdfBackend {
    type Document = LopdfDocument;
    type Error = BackendError;

    fn open(bytes: &[u8]) -> Result<Self::Document, Self::Error> {
        let inner = lopdf::Document::load_mem(bytes)
            .map_err(|e| BackendError::Parse(format!("failed to parse PDF: {e}")))?;
        if inner.is_encrypted() {
            return Err(BackendError::Encrypted);
        }
        // get_pages() is keyed by 1-based page number, so values are ordered.
        let page_ids = inner.get_pages().into_values().collect();
        Ok(LopdfDocument { inner, page_ids })
    }

    fn page_count(doc: &Self::Document) -> usize {
        doc.page_ids.len()
    }

    fn load_page(doc: &Self::Document, index: usize) -> Result<Page, Self::Error> {
        let page_id = *doc
            .page_ids
            .get(index)
            .ok_or(BackendError::PageOutOfRange {
                index,
                count: doc.page_ids.len(),
            })?;
        let inner = &doc.inner;

        let media_box = match resolve_inherited(inner, page_id, b"MediaBox")? {
            Some(obj) => box_from_object(inner, obj)?,
            None => {
                let [x0, y0, x1, y1] = DEFAULT_MEDIA_BOX;
                BBox::new(x0, y0, x1, y1)
            }
        };
        // A malformed CropBox falls back to the MediaBox.
        let visible = resolve_inherited(inner, page_id, b"CropBox")?
            .and_then(|obj| box_from_object(inner, obj).ok())
            .unwrap_or(media_box);
        let rotation = resolve_inherited(inner, page_id, b"Rotate")?
            .and_then(|obj| obj.as_i64().ok())
            .unwrap_or(0);
        let geometry = PageGeometry::new(visible, rotation as i32);

        let page_dict = inner
            .get_dictionary(page_id)
            .map_err(|e| BackendError::Parse(format!("failed to get page dictionary: {e}")))?;
        let content = get_page_content_bytes(inner, page_dict)?;
        let resources = get_page_resources(inner, page_id)?;
        let decoded = interpret_page(inner, &content, resources, geometry)?;
        trace!(
            index,
            primitives = decoded.primitives.len(),
            runs = decoded.runs.len(),
            "decoded page"
        );

        let mut page = Page::new(index + 1, geometry.page_bbox());
        page.primitives = decoded.primitives;
        page.runs = decoded.runs;
        Ok(page)
    }
}

/// Convert a lopdf numeric object (Integer or Real) to f64.
pub(crate) fn object_to_f64(obj: &lopdf::Object) -> Result<f64, BackendError> {
    match obj {
        lopdf::Object::Integer(i) => Ok(*i as f64),
        lopdf::Object::Real(f) => Ok(f64::from(*f)),
        _ => Err(BackendError::Parse(format!("expected number, got {obj:?}"))),
    }
}

/// Follow an indirect reference; anything else is returned as is.
pub(crate) fn resolve_ref<'a>(doc: &'a lopdf::Document, obj: &'a lopdf::Object) -> &'a lopdf::Object {
    match obj {
        lopdf::Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Stream data with any `/Filter` applied.
pub(crate) fn decode_stream(stream: &lopdf::Stream) -> Result<Vec<u8>, BackendError> {
    if stream.dict.get(b"Filter").is_ok() {
        stream
            .decompressed_content()
            .map_err(|e| BackendError::Parse(format!("failed to decompress stream: {e}")))
    } else {
        Ok(stream.content.clone())
    }
}

/// Look up a key in the page dictionary, walking up the page tree
/// (via /Parent) if the key is not found on the page itself.
fn resolve_inherited<'a>(
    doc: &'a lopdf::Document,
    page_id: lopdf::ObjectId,
    key: &[u8],
) -> Result<Option<&'a lopdf::Object>, BackendError> {
    let mut current_id = page_id;
    // Bounded walk; a /Parent cycle must not hang the process.
    for _ in 0..64 {
        let dict = doc
            .get_dictionary(current_id)
            .map_err(|e| BackendError::Parse(format!("failed to get page dictionary: {e}")))?;
        if let Ok(value) = dict.get(key) {
            return Ok(Some(resolve_ref(doc, value)));
        }
        match dict.get(b"Parent") {
            Ok(parent) => {
                current_id = parent
                    .as_reference()
                    .map_err(|e| BackendError::Parse(format!("invalid /Parent reference: {e}")))?;
            }
            Err(_) => return Ok(None),
        }
    }
    Err(BackendError::Parse("page tree /Parent chain is too deep".into()))
}

/// Read a `[x0 y0 x1 y1]` box, normalizing corner order.
fn box_from_object(doc: &lopdf::Document, obj: &lopdf::Object) -> Result<BBox, BackendError> {
    let array = obj
        .as_array()
        .map_err(|e| BackendError::Parse(format!("page box is not an array: {e}")))?;
    let [x0, y0, x1, y1] = array.as_slice() else {
        return Err(BackendError::Parse(format!(
            "expected 4-element array for box, got {}",
            array.len()
        )));
    };
    let n = |o: &lopdf::Object| object_to_f64(resolve_ref(doc, o));
    let (x0, y0, x1, y1) = (n(x0)?, n(y0)?, n(x1)?, n(y1)?);
    Ok(BBox::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)))
}

/// Get the content stream bytes from a page dictionary.
///
/// Handles both single stream references and arrays of stream references.
fn get_page_content_bytes(
    doc: &lopdf::Document,
    page_dict: &lopdf::Dictionary,
) -> Result<Vec<u8>, BackendError> {
    let Ok(contents) = page_dict.get(b"Contents") else {
        return Ok(Vec::new());
    };
    match resolve_ref(doc, contents) {
        lopdf::Object::Stream(stream) => decode_stream(stream),
        lopdf::Object::Array(parts) => {
            let mut content = Vec::new();
            for part in parts {
                let stream = resolve_ref(doc, part).as_stream().map_err(|e| {
                    BackendError::Parse(format!("/Contents array item is not a stream: {e}"))
                })?;
                // Streams may split tokens only at whitespace boundaries.
                if !content.is_empty() {
                    content.push(b'\n');
                }
                content.extend_from_slice(&decode_stream(stream)?);
            }
            Ok(content)
        }
        _ => Err(BackendError::Parse(
            "/Contents is not a stream or array".to_string(),
        )),
    }
}

/// Get the resources dictionary for a page, handling inheritance.
fn get_page_resources(
    doc: &lopdf::Document,
    page_id: lopdf::ObjectId,
) -> Result<&lopdf::Dictionary, BackendError> {
    static EMPTY_DICT: LazyLock<lopdf::Dictionary> = LazyLock::new(lopdf::Dictionary::new);
    match resolve_inherited(doc, page_id, b"Resources")? {
        Some(obj) => obj
            .as_dict()
            .map_err(|_| BackendError::Parse("/Resources is not a dictionary".to_string())),
        None => Ok(&EMPTY_DICT),
    }
}
