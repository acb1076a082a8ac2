//! Graphic object counts for statistics.

use super::{attr, load_slide};
use crate::container::DeckContainer;
use crate::model::ShapeCounts;
use quick_xml::events::Event;

/// Count a slide's autoshapes and connectors, charts and tables.
///
/// Pictures are counted by the image extractor, not here.
pub fn count_shapes(container: &DeckContainer, slide_number: usize) -> ShapeCounts {
    let Some(slide) = load_slide(container, slide_number) else {
        return ShapeCounts::default();
    };

    let mut reader = quick_xml::Reader::from_str(&slide.xml);
    reader.config_mut().trim_text(true);

    let mut counts = ShapeCounts::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                match e.name().local_name().as_ref() {
                    b"sp" | b"cxnSp" => counts.shapes += 1,
                    b"graphicData" => {
                        let uri = attr(e, b"uri").unwrap_or_default();
                        if uri.contains("chart") {
                            counts.charts += 1;
                        } else if uri.contains("table") {
                            counts.tables += 1;
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::debug!("slide {} shapes unreadable: {}", slide_number, e);
                return ShapeCounts::default();
            }
            _ => {}
        }
        buf.clear();
    }

    counts
}
