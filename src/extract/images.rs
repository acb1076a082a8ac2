//! Slide image extraction.

use super::{attr, load_slide};
use crate::container::DeckContainer;
use crate::model::{mime_from_filename, ExtractedImage};
use quick_xml::events::{BytesStart, Event};

/// A `p:pic` reference collected from slide XML.
#[derive(Default)]
struct PicRef {
    rel_id: Option<String>,
    name: Option<String>,
    description: Option<String>,
    width: Option<u64>,
    height: Option<u64>,
}

/// Enumerate the media parts a slide's pictures embed.
///
/// Follows `p:pic` / `a:blip r:embed` through the slide relationships.
/// A part referenced twice on the same slide is reported once. Broken
/// references are skipped.
pub fn extract_images(container: &DeckContainer, slide_number: usize) -> Vec<ExtractedImage> {
    let Some(slide) = load_slide(container, slide_number) else {
        return Vec::new();
    };

    let pics = match collect_pictures(&slide.xml) {
        Ok(pics) => pics,
        Err(e) => {
            log::debug!("slide {} pictures unreadable: {}", slide_number, e);
            return Vec::new();
        }
    };

    let mut images: Vec<ExtractedImage> = Vec::new();
    for pic in pics {
        let Some(rel) = pic.rel_id.as_deref().and_then(|id| slide.rels.get(id)) else {
            continue;
        };
        if rel.external {
            log::debug!("slide {} links external image {}", slide_number, rel.target);
            continue;
        }

        let part_path = DeckContainer::resolve_path(&slide.path, &rel.target);
        if images.iter().any(|i| i.part_path == part_path) {
            continue;
        }
        let data = match container.read_binary(&part_path) {
            Ok(data) => data.to_vec(),
            Err(e) => {
                log::debug!("slide {} image skipped: {}", slide_number, e);
                continue;
            }
        };

        let filename = part_path
            .rsplit('/')
            .next()
            .unwrap_or(part_path.as_str())
            .to_string();
        let content_type = mime_from_filename(&filename)
            .unwrap_or("application/octet-stream")
            .to_string();

        images.push(ExtractedImage {
            slide_number,
            filename,
            part_path,
            content_type,
            data,
            alt_text: pic.description.or(pic.name),
            width: pic.width,
            height: pic.height,
        });
    }

    images
}

fn collect_pictures(xml: &str) -> crate::Result<Vec<PicRef>> {
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut pics = Vec::new();
    let mut buf = Vec::new();
    let mut current: Option<PicRef> = None;
    let mut in_sppr = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if e.name().local_name().as_ref() == b"pic" {
                    current = Some(PicRef::default());
                } else if e.name().local_name().as_ref() == b"spPr" {
                    in_sppr = true;
                }
                if let Some(pic) = current.as_mut() {
                    inspect(pic, e, in_sppr);
                }
            }
            Ok(Event::Empty(ref e)) => {
                if let Some(pic) = current.as_mut() {
                    inspect(pic, e, in_sppr);
                }
            }
            Ok(Event::End(ref e)) => match e.name().local_name().as_ref() {
                b"pic" => {
                    if let Some(pic) = current.take() {
                        pics.push(pic);
                    }
                }
                b"spPr" => in_sppr = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(pics)
}

fn inspect(pic: &mut PicRef, e: &BytesStart<'_>, in_sppr: bool) {
    match e.name().local_name().as_ref() {
        b"cNvPr" => {
            pic.name = attr(e, b"name").filter(|s| !s.is_empty());
            pic.description = attr(e, b"descr").filter(|s| !s.is_empty());
        }
        b"blip" => pic.rel_id = attr(e, b"embed"),
        b"ext" if in_sppr => {
            pic.width = attr(e, b"cx").and_then(|v| v.parse().ok());
            pic.height = attr(e, b"cy").and_then(|v| v.parse().ok());
        }
        _ => {}
    }
}
