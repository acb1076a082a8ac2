//! Slide text extraction.

use super::{attr, load_slide};
use crate::container::{DeckContainer, Relationships};
use crate::model::{Hyperlink, PlaceholderType, SlideText};
use quick_xml::events::Event;
use unicode_normalization::UnicodeNormalization;

/// Extract text, bullets, hyperlinks and notes from one slide.
///
/// Paragraph order follows the document. Only paragraphs that declare
/// `a:buChar` or `a:buAutoNum` themselves count as bullets; inherited
/// master bullet styles are not resolved.
pub fn extract_text(container: &DeckContainer, slide_number: usize) -> SlideText {
    let Some(slide) = load_slide(container, slide_number) else {
        return SlideText::default();
    };

    let walk = match walk_text(&slide.xml, &slide.rels) {
        Ok(walk) => walk,
        Err(e) => {
            log::debug!("slide {} text unreadable: {}", slide_number, e);
            return SlideText::default();
        }
    };

    let title = walk.title.or_else(|| walk.paragraphs.first().cloned());
    SlideText {
        title,
        paragraphs: walk.paragraphs,
        bullets: walk.bullets,
        hyperlinks: walk.hyperlinks,
        notes: read_notes(container, &slide.path, &slide.rels),
    }
}

/// Whitespace-separated word count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[derive(Default)]
struct TextWalk {
    title: Option<String>,
    paragraphs: Vec<String>,
    bullets: Vec<String>,
    hyperlinks: Vec<Hyperlink>,
}

fn normalize(text: &str) -> String {
    text.nfc().collect::<String>().trim().to_string()
}

/// Walk every `a:p` under a text body, collecting paragraph text.
///
/// Slide chrome placeholders (slide number, date, footer, header) are skipped.
fn walk_text(xml: &str, rels: &Relationships) -> crate::Result<TextWalk> {
    let mut reader = quick_xml::Reader::from_str(xml);
    // xml:space="preserve" runs carry significant whitespace
    reader.config_mut().trim_text(false);

    let mut walk = TextWalk::default();
    let mut buf = Vec::new();

    let mut placeholder: Option<PlaceholderType> = None;
    let mut in_txbody = false;
    let mut in_paragraph = false;
    let mut in_run = false;
    let mut in_text = false;

    let mut is_bullet = false;
    let mut paragraph = String::new();
    let mut run_text = String::new();
    let mut run_link: Option<String> = None;
    let mut title_parts: Vec<String> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().local_name().as_ref() {
                b"ph" => placeholder = Some(placeholder_of(e)),
                b"sp" => {
                    placeholder = None;
                    title_parts.clear();
                }
                b"txBody" => in_txbody = true,
                b"p" if in_txbody => {
                    in_paragraph = true;
                    is_bullet = false;
                    paragraph.clear();
                }
                b"r" | b"fld" if in_paragraph => {
                    in_run = true;
                    run_text.clear();
                    run_link = None;
                }
                b"t" if in_run => in_text = true,
                b"hlinkClick" if in_run => run_link = resolve_link(e, rels),
                b"buChar" | b"buAutoNum" if in_paragraph => is_bullet = true,
                b"buNone" if in_paragraph => is_bullet = false,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.name().local_name().as_ref() {
                b"ph" => placeholder = Some(placeholder_of(e)),
                b"hlinkClick" if in_run => run_link = resolve_link(e, rels),
                b"buChar" | b"buAutoNum" if in_paragraph => is_bullet = true,
                b"buNone" if in_paragraph => is_bullet = false,
                b"br" if in_paragraph => paragraph.push(' '),
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_text => {
                let text = e.unescape().unwrap_or_default();
                run_text.push_str(&text);
            }
            Ok(Event::End(ref e)) => match e.name().local_name().as_ref() {
                b"t" => in_text = false,
                b"r" | b"fld" if in_run => {
                    in_run = false;
                    if let Some(url) = run_link.take() {
                        let text = normalize(&run_text);
                        if !text.is_empty() {
                            walk.hyperlinks.push(Hyperlink { text, url });
                        }
                    }
                    paragraph.push_str(&run_text);
                }
                b"p" if in_paragraph => {
                    in_paragraph = false;
                    let text = normalize(&paragraph);
                    let decoration = placeholder.is_some_and(|p| p.is_decoration());
                    if !text.is_empty() && !decoration {
                        if placeholder == Some(PlaceholderType::Title) {
                            title_parts.push(text.clone());
                        }
                        if is_bullet {
                            walk.bullets.push(text.clone());
                        }
                        walk.paragraphs.push(text);
                    }
                }
                b"txBody" => in_txbody = false,
                b"sp" => {
                    if walk.title.is_none() && !title_parts.is_empty() {
                        walk.title = Some(title_parts.join(" "));
                    }
                    title_parts.clear();
                    placeholder = None;
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(walk)
}

fn placeholder_of(e: &quick_xml::events::BytesStart<'_>) -> PlaceholderType {
    attr(e, b"type")
        .map(|t| PlaceholderType::from_ph_type(&t))
        .unwrap_or(PlaceholderType::Content)
}

fn resolve_link(e: &quick_xml::events::BytesStart<'_>, rels: &Relationships) -> Option<String> {
    let rel_id = attr(e, b"id")?;
    rels.get(&rel_id).map(|rel| rel.target.clone())
}

/// Speaker notes from the slide's notes part, if any.
fn read_notes(container: &DeckContainer, slide_path: &str, rels: &Relationships) -> Option<String> {
    let notes_path = rels
        .by_id
        .values()
        .find(|r| r.is_type("notesSlide"))
        .map(|r| DeckContainer::resolve_path(slide_path, &r.target))
        .unwrap_or_else(|| slide_path.replace("slides/slide", "notesSlides/notesSlide"));

    let xml = container.read_xml(&notes_path).ok()?;
    let notes_rels = container.read_relationships(&notes_path).unwrap_or_default();
    let walk = walk_text(&xml, &notes_rels).ok()?;

    // The slide image placeholder carries no text, so the body remains
    let text = walk.paragraphs.join("\n");
    (!text.is_empty()).then_some(text)
}
