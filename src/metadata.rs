//! Deck metadata extraction.
//!
//! Reads the fixed-path descriptor parts. Missing or malformed parts leave
//! the corresponding defaults in place; extraction never fails.

use crate::container::{DeckContainer, PRESENTATION_PART};
use crate::model::{DeckMetadata, Dimensions};
use quick_xml::events::Event;

const CORE_PART: &str = "docProps/core.xml";
const APP_PART: &str = "docProps/app.xml";

/// Extract deck metadata with defaults for anything absent.
pub fn extract_metadata(container: &DeckContainer) -> DeckMetadata {
    let mut meta = DeckMetadata::default();

    match container.read_xml(CORE_PART) {
        Ok(xml) => apply_core_properties(&xml, &mut meta),
        Err(_) => log::debug!("{} absent, using default title and author", CORE_PART),
    }
    match container.read_xml(APP_PART) {
        Ok(xml) => apply_app_properties(&xml, &mut meta),
        Err(_) => log::debug!("{} absent, using default application", APP_PART),
    }
    meta.dimensions = canvas_size(container);

    meta
}

/// Canvas size from `p:sldSz`, or the default 4:3 canvas.
pub(crate) fn canvas_size(container: &DeckContainer) -> Dimensions {
    container
        .read_xml(PRESENTATION_PART)
        .ok()
        .and_then(|xml| slide_size(&xml))
        .unwrap_or_default()
}

/// Walk a flat property part and report (element local name, text) pairs.
fn for_each_property(xml: &str, mut apply: impl FnMut(&str, String)) {
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut current_element: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.name();
                current_element =
                    Some(String::from_utf8_lossy(name.local_name().as_ref()).to_string());
            }
            Ok(Event::Text(e)) => {
                if let Some(ref elem) = current_element {
                    let text = e.unescape().unwrap_or_default().trim().to_string();
                    if !text.is_empty() {
                        apply(elem, text);
                    }
                }
            }
            Ok(Event::End(_)) => {
                current_element = None;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::debug!("malformed property part: {}", e);
                break;
            }
            _ => {}
        }
        buf.clear();
    }
}

fn apply_core_properties(xml: &str, meta: &mut DeckMetadata) {
    for_each_property(xml, |elem, text| match elem {
        "title" => meta.title = text,
        "creator" => meta.author = text,
        "subject" => meta.subject = Some(text),
        "keywords" => {
            meta.keywords = text
                .split([',', ';'])
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        "created" => meta.created = text,
        "modified" => meta.modified = text,
        "revision" => meta.revision = Some(text),
        _ => {}
    });
}

fn apply_app_properties(xml: &str, meta: &mut DeckMetadata) {
    for_each_property(xml, |elem, text| match elem {
        "Application" => meta.application = text,
        "Company" => meta.company = Some(text),
        "Slides" => {
            if let Ok(n) = text.parse() {
                meta.total_slides = n;
            }
        }
        "Words" => {
            if let Ok(n) = text.parse() {
                meta.word_count = n;
            }
        }
        _ => {}
    });
}

/// Read `p:sldSz` from the presentation part.
fn slide_size(xml: &str) -> Option<Dimensions> {
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e))
                if e.name().local_name().as_ref() == b"sldSz" =>
            {
                let mut width = None;
                let mut height = None;
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value);
                    match attr.key.local_name().as_ref() {
                        b"cx" => width = value.parse::<u64>().ok(),
                        b"cy" => height = value.parse::<u64>().ok(),
                        _ => {}
                    }
                }
                return match (width, height) {
                    (Some(width), Some(height)) if width > 0 && height > 0 => {
                        Some(Dimensions { width, height })
                    }
                    _ => None,
                };
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
        buf.clear();
    }
}
