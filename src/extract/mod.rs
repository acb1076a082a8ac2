//! Per-slide content extractors.
//!
//! Each extractor takes the container and a 1-based slide number and walks
//! that slide's XML independently. A missing or malformed slide part never
//! fails: the extractor logs it and returns an empty fragment.

mod images;
mod layout;
mod shapes;
mod text;

pub use images::extract_images;
pub use layout::detect_layout;
pub use shapes::count_shapes;
pub use text::{extract_text, word_count};

use crate::container::{DeckContainer, Relationships};
use quick_xml::events::BytesStart;

/// A slide part loaded for extraction.
pub(crate) struct SlidePart {
    pub path: String,
    pub xml: String,
    pub rels: Relationships,
}

/// Load a slide's XML and relationships, or `None` when absent.
pub(crate) fn load_slide(container: &DeckContainer, slide_number: usize) -> Option<SlidePart> {
    let Some(path) = container.slide_path(slide_number) else {
        log::debug!("slide {} does not exist", slide_number);
        return None;
    };
    let xml = match container.read_xml(&path) {
        Ok(xml) => xml,
        Err(e) => {
            log::debug!("slide {} unreadable: {}", slide_number, e);
            return None;
        }
    };
    let rels = container.read_relationships(&path).unwrap_or_else(|e| {
        log::debug!("slide {} relationships unreadable: {}", slide_number, e);
        Relationships::new()
    });
    Some(SlidePart { path, xml, rels })
}

/// Value of the attribute with the given local name.
pub(crate) fn attr(e: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == local)
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

/// Numeric attribute value with the given local name.
pub(crate) fn attr_i64(e: &BytesStart<'_>, local: &[u8]) -> Option<i64> {
    attr(e, local).and_then(|v| v.parse().ok())
}
