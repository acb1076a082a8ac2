//! Heuristic slide layout classification.

use super::{attr, attr_i64, load_slide};
use crate::container::DeckContainer;
use crate::metadata::canvas_size;
use crate::model::{
    BoundingBox, Dimensions, LayoutAnalysis, LayoutElement, LayoutType, PlaceholderType,
    VisualKind,
};
use quick_xml::events::{BytesStart, Event};

/// Classify a slide's layout from its placeholders and graphic objects.
///
/// Never fails: a missing or malformed slide yields [`LayoutType::Unknown`]
/// with confidence 0.
pub fn detect_layout(container: &DeckContainer, slide_number: usize) -> LayoutAnalysis {
    let Some(slide) = load_slide(container, slide_number) else {
        return LayoutAnalysis::unknown();
    };

    let elements = match collect_elements(&slide.xml, canvas_size(container)) {
        Ok(elements) => elements,
        Err(e) => {
            log::debug!("slide {} layout unreadable: {}", slide_number, e);
            return LayoutAnalysis::unknown();
        }
    };

    classify(elements)
}

/// Per-kind tallies over a slide's elements.
#[derive(Debug, Default)]
struct Census {
    total: usize,
    text: usize,
    images: usize,
    charts: usize,
    tables: usize,
    has_title: bool,
    has_content: bool,
}

impl Census {
    fn of(elements: &[LayoutElement]) -> Self {
        let mut census = Census {
            total: elements.len(),
            ..Default::default()
        };
        for element in elements {
            match element.kind {
                VisualKind::Text => {
                    census.text += 1;
                    match element.placeholder {
                        Some(PlaceholderType::Title) => census.has_title = true,
                        Some(PlaceholderType::Subtitle) => {}
                        _ => census.has_content = true,
                    }
                }
                VisualKind::Image => census.images += 1,
                VisualKind::Chart => census.charts += 1,
                VisualKind::Table => census.tables += 1,
                VisualKind::Shape | VisualKind::Media => {}
            }
        }
        census
    }
}

fn classify(elements: Vec<LayoutElement>) -> LayoutAnalysis {
    let census = Census::of(&elements);
    let layout_type = label(&census, &elements);
    let confidence = confidence(layout_type, &census);
    LayoutAnalysis {
        layout_type,
        confidence,
        elements,
    }
}

fn label(census: &Census, elements: &[LayoutElement]) -> LayoutType {
    if census.total == 0 {
        return LayoutType::Blank;
    }
    if census.has_title && !census.has_content && census.images == 0 && census.total <= 2 {
        return LayoutType::Title;
    }
    if census.has_title && census.text == 1 && census.images == 0 {
        return LayoutType::SectionHeader;
    }
    if census.images == 1 && census.text >= 1 {
        return LayoutType::PictureCaption;
    }

    let bodies: Vec<&LayoutElement> = elements.iter().filter(|e| e.is_body_text()).collect();
    if bodies.len() >= 2 {
        let left = bodies.iter().any(|e| e.bounds.x < 0.5);
        let right = bodies.iter().any(|e| e.bounds.x >= 0.5);
        if left && right {
            return LayoutType::TwoContent;
        }
    }

    if census.has_content && (census.images > 0 || census.charts > 0) {
        return LayoutType::Comparison;
    }
    if census.has_content && census.tables > 0 {
        return LayoutType::ContentCaption;
    }
    if census.has_title || census.has_content {
        return LayoutType::TitleContent;
    }
    LayoutType::Unknown
}

fn confidence(layout_type: LayoutType, census: &Census) -> f64 {
    match layout_type {
        LayoutType::Blank => 1.0,
        LayoutType::Title => 0.9,
        LayoutType::TitleContent if census.has_title && census.has_content => 0.8,
        LayoutType::TitleContent => 0.7,
        LayoutType::TwoContent => 0.8,
        LayoutType::PictureCaption if census.has_content => 0.85,
        LayoutType::PictureCaption => 0.5,
        LayoutType::Unknown => 0.0,
        LayoutType::SectionHeader | LayoutType::Comparison | LayoutType::ContentCaption => 0.6,
    }
}

/// Element under construction while walking the shape tree.
struct Pending {
    kind: VisualKind,
    placeholder: Option<PlaceholderType>,
    offset: (i64, i64),
    extent: (i64, i64),
    has_text: bool,
}

impl Pending {
    fn new(kind: VisualKind) -> Self {
        Self {
            kind,
            placeholder: None,
            offset: (0, 0),
            extent: (0, 0),
            has_text: false,
        }
    }

    fn finish(self, canvas: Dimensions) -> LayoutElement {
        let mut kind = self.kind;
        if kind == VisualKind::Shape
            && (self.has_text
                || matches!(
                    self.placeholder,
                    Some(PlaceholderType::Title) | Some(PlaceholderType::Subtitle)
                ))
        {
            kind = VisualKind::Text;
        }
        let w = canvas.width.max(1) as f64;
        let h = canvas.height.max(1) as f64;
        LayoutElement {
            kind,
            bounds: BoundingBox {
                x: self.offset.0 as f64 / w,
                y: self.offset.1 as f64 / h,
                width: self.extent.0 as f64 / w,
                height: self.extent.1 as f64 / h,
            },
            placeholder: self.placeholder,
        }
    }
}

/// Gather typed elements (groups flattened) in document order.
///
/// Slide chrome placeholders are left out so footers and slide numbers do
/// not count as content.
fn collect_elements(xml: &str, canvas: Dimensions) -> crate::Result<Vec<LayoutElement>> {
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut elements = Vec::new();
    let mut buf = Vec::new();
    let mut current: Option<Pending> = None;
    let mut in_xfrm = false;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().local_name().as_ref() {
                b"sp" => current = Some(Pending::new(VisualKind::Shape)),
                b"pic" => current = Some(Pending::new(VisualKind::Image)),
                b"graphicFrame" => current = Some(Pending::new(VisualKind::Shape)),
                b"xfrm" => in_xfrm = true,
                b"t" => in_text = true,
                _ => {
                    if let Some(pending) = current.as_mut() {
                        inspect(pending, e, in_xfrm);
                    }
                }
            },
            Ok(Event::Empty(ref e)) => {
                if let Some(pending) = current.as_mut() {
                    inspect(pending, e, in_xfrm);
                }
            }
            Ok(Event::Text(ref e)) if in_text => {
                if let Some(pending) = current.as_mut() {
                    if !e.unescape().unwrap_or_default().trim().is_empty() {
                        pending.has_text = true;
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.name().local_name().as_ref() {
                b"sp" | b"pic" | b"graphicFrame" => {
                    if let Some(pending) = current.take() {
                        if !pending.placeholder.is_some_and(|p| p.is_decoration()) {
                            elements.push(pending.finish(canvas));
                        }
                    }
                }
                b"xfrm" => in_xfrm = false,
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(elements)
}

fn inspect(pending: &mut Pending, e: &BytesStart<'_>, in_xfrm: bool) {
    match e.name().local_name().as_ref() {
        b"ph" => {
            pending.placeholder = Some(
                attr(e, b"type")
                    .map(|t| PlaceholderType::from_ph_type(&t))
                    .unwrap_or(PlaceholderType::Content),
            );
        }
        b"off" if in_xfrm => {
            pending.offset = (
                attr_i64(e, b"x").unwrap_or(0),
                attr_i64(e, b"y").unwrap_or(0),
            );
        }
        b"ext" if in_xfrm => {
            pending.extent = (
                attr_i64(e, b"cx").unwrap_or(0),
                attr_i64(e, b"cy").unwrap_or(0),
            );
        }
        b"graphicData" => {
            let uri = attr(e, b"uri").unwrap_or_default();
            if uri.contains("chart") {
                pending.kind = VisualKind::Chart;
            } else if uri.contains("table") {
                pending.kind = VisualKind::Table;
            }
        }
        b"videoFile" | b"audioFile" => pending.kind = VisualKind::Media,
        _ => {}
    }
}
