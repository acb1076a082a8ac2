//! Synthetic deck builder shared by the integration tests.
#![allow(dead_code)]

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const PNG_BYTES: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// One animation effect on a slide.
#[derive(Debug, Clone)]
pub struct TimedEffect {
    pub class: &'static str,
    pub preset: u32,
    pub subtype: u32,
    pub filter: &'static str,
    pub spid: u32,
    pub duration: u64,
}

impl TimedEffect {
    pub fn fade_in(spid: u32) -> Self {
        Self {
            class: "entr",
            preset: 10,
            subtype: 0,
            filter: "fade",
            spid,
            duration: 500,
        }
    }

    /// An entrance with no keyframe mapping.
    pub fn blinds(spid: u32) -> Self {
        Self {
            class: "entr",
            preset: 3,
            subtype: 10,
            filter: "blinds(horizontal)",
            spid,
            duration: 500,
        }
    }
}

/// Content of one slide. Shape ids: title 2, body 3, picture 4.
#[derive(Debug, Clone, Default)]
pub struct SlideContent {
    pub title: Option<String>,
    pub paragraphs: Vec<String>,
    pub bullets: Vec<String>,
    pub notes: Option<String>,
    pub image: bool,
    pub effects: Vec<TimedEffect>,
}

impl SlideContent {
    pub fn titled(title: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    pub fn paragraph(mut self, text: &str) -> Self {
        self.paragraphs.push(text.to_string());
        self
    }

    pub fn bullet(mut self, text: &str) -> Self {
        self.bullets.push(text.to_string());
        self
    }

    pub fn notes(mut self, text: &str) -> Self {
        self.notes = Some(text.to_string());
        self
    }

    pub fn with_image(mut self) -> Self {
        self.image = true;
        self
    }

    pub fn effect(mut self, effect: TimedEffect) -> Self {
        self.effects.push(effect);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeckBuilder {
    title: Option<String>,
    author: Option<String>,
    slides: Vec<SlideContent>,
}

impl DeckBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn author(mut self, author: &str) -> Self {
        self.author = Some(author.to_string());
        self
    }

    pub fn slide(mut self, slide: SlideContent) -> Self {
        self.slides.push(slide);
        self
    }

    /// `count` slides titled "Slide n" with one sentence each.
    pub fn simple(count: usize) -> Self {
        (1..=count).fold(Self::new().title("Synthetic deck"), |deck, n| {
            deck.slide(
                SlideContent::titled(&format!("Slide {}", n))
                    .paragraph("The quick brown fox jumps over the lazy dog."),
            )
        })
    }

    pub fn build(&self) -> Vec<u8> {
        let mut parts: Vec<(String, Vec<u8>)> = Vec::new();
        parts.push(("[Content_Types].xml".into(), CONTENT_TYPES.into()));
        parts.push(("_rels/.rels".into(), ROOT_RELS.into()));
        parts.push(("docProps/core.xml".into(), self.core_xml().into_bytes()));
        parts.push(("docProps/app.xml".into(), self.app_xml().into_bytes()));
        parts.push(("ppt/presentation.xml".into(), self.presentation_xml().into_bytes()));
        parts.push((
            "ppt/_rels/presentation.xml.rels".into(),
            self.presentation_rels().into_bytes(),
        ));

        for (i, slide) in self.slides.iter().enumerate() {
            let n = i + 1;
            parts.push((format!("ppt/slides/slide{}.xml", n), slide_xml(slide).into_bytes()));
            parts.push((
                format!("ppt/slides/_rels/slide{}.xml.rels", n),
                slide_rels(slide, n).into_bytes(),
            ));
            if slide.image {
                parts.push((format!("ppt/media/image{}.png", n), PNG_BYTES.to_vec()));
            }
            if let Some(notes) = &slide.notes {
                parts.push((
                    format!("ppt/notesSlides/notesSlide{}.xml", n),
                    notes_xml(notes).into_bytes(),
                ));
            }
        }

        let mut buffer = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
            let options =
                SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
            for (path, content) in &parts {
                zip.start_file(path.as_str(), options).unwrap();
                zip.write_all(content).unwrap();
            }
            zip.finish().unwrap();
        }
        buffer
    }

    fn core_xml(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
<dc:title>{}</dc:title><dc:creator>{}</dc:creator>
<dcterms:created xsi:type="dcterms:W3CDTF">2024-03-01T09:00:00Z</dcterms:created>
<dcterms:modified xsi:type="dcterms:W3CDTF">2024-03-02T10:30:00Z</dcterms:modified>
</cp:coreProperties>"#,
            self.title.as_deref().unwrap_or(""),
            self.author.as_deref().unwrap_or("")
        )
    }

    fn app_xml(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"><Application>Microsoft Office PowerPoint</Application><Slides>{}</Slides></Properties>"#,
            self.slides.len()
        )
    }

    fn presentation_xml(&self) -> String {
        let ids: String = (0..self.slides.len())
            .map(|i| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, i + 2))
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<p:sldIdLst>{}</p:sldIdLst><p:sldSz cx="12192000" cy="6858000"/></p:presentation>"#,
            ids
        )
    }

    fn presentation_rels(&self) -> String {
        let rels: String = (0..self.slides.len())
            .map(|i| {
                format!(
                    r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide{}.xml"/>"#,
                    i + 2,
                    i + 1
                )
            })
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
            rels
        )
    }
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Default Extension="png" ContentType="image/png"/>
<Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
</Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#;

fn xfrm(x: i64, y: i64, cx: i64, cy: i64) -> String {
    format!(
        r#"<p:spPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm></p:spPr>"#,
        x, y, cx, cy
    )
}

fn slide_xml(slide: &SlideContent) -> String {
    let mut tree = String::new();

    if let Some(title) = &slide.title {
        tree.push_str(&format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr>{}<p:txBody><a:bodyPr/><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>"#,
            xfrm(838200, 365125, 10515600, 1325563),
            title
        ));
    }

    if !slide.paragraphs.is_empty() || !slide.bullets.is_empty() {
        let mut body = String::new();
        for text in &slide.paragraphs {
            body.push_str(&format!(
                r#"<a:p><a:pPr><a:buNone/></a:pPr><a:r><a:t>{}</a:t></a:r></a:p>"#,
                text
            ));
        }
        for text in &slide.bullets {
            body.push_str(&format!(
                r#"<a:p><a:pPr><a:buChar char="•"/></a:pPr><a:r><a:t>{}</a:t></a:r></a:p>"#,
                text
            ));
        }
        tree.push_str(&format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="3" name="Content 2"/><p:cNvSpPr/><p:nvPr><p:ph idx="1"/></p:nvPr></p:nvSpPr>{}<p:txBody><a:bodyPr/>{}</p:txBody></p:sp>"#,
            xfrm(838200, 1825625, 10515600, 4351338),
            body
        ));
    }

    if slide.image {
        tree.push_str(&format!(
            r#"<p:pic><p:nvPicPr><p:cNvPr id="4" name="Picture 3" descr="Chart export"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="rId2"/></p:blipFill>{}</p:pic>"#,
            xfrm(7000000, 2000000, 3000000, 2000000)
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:spTree></p:cSld>{}</p:sld>"#,
        tree,
        timing_xml(&slide.effects)
    )
}

fn timing_xml(effects: &[TimedEffect]) -> String {
    if effects.is_empty() {
        return String::new();
    }
    let nodes: String = effects
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let id = 5 + i * 3;
            format!(
                r#"<p:par><p:cTn id="{id}" presetID="{preset}" presetClass="{class}" presetSubtype="{subtype}" fill="hold" nodeType="{node}">
<p:stCondLst><p:cond delay="0"/></p:stCondLst><p:childTnLst>
<p:set><p:cBhvr><p:cTn id="{set}" dur="1" fill="hold"><p:stCondLst><p:cond delay="0"/></p:stCondLst></p:cTn><p:tgtEl><p:spTgt spid="{spid}"/></p:tgtEl><p:attrNameLst><p:attrName>style.visibility</p:attrName></p:attrNameLst></p:cBhvr><p:to><p:strVal val="visible"/></p:to></p:set>
<p:animEffect transition="in" filter="{filter}"><p:cBhvr><p:cTn id="{anim}" dur="{dur}"/><p:tgtEl><p:spTgt spid="{spid}"/></p:tgtEl></p:cBhvr></p:animEffect>
</p:childTnLst></p:cTn></p:par>"#,
                id = id,
                preset = e.preset,
                class = e.class,
                subtype = e.subtype,
                node = if i == 0 { "clickEffect" } else { "afterEffect" },
                set = id + 1,
                anim = id + 2,
                spid = e.spid,
                filter = e.filter,
                dur = e.duration,
            )
        })
        .collect();

    format!(
        r#"<p:timing><p:tnLst><p:par><p:cTn id="1" dur="indefinite" restart="never" nodeType="tmRoot"><p:childTnLst>
<p:seq concurrent="1" nextAc="seek"><p:cTn id="2" dur="indefinite" nodeType="mainSeq"><p:childTnLst>
<p:par><p:cTn id="3" fill="hold"><p:stCondLst><p:cond delay="indefinite"/></p:stCondLst><p:childTnLst>
<p:par><p:cTn id="4" fill="hold"><p:stCondLst><p:cond delay="0"/></p:stCondLst><p:childTnLst>
{}
</p:childTnLst></p:cTn></p:par>
</p:childTnLst></p:cTn></p:par>
</p:childTnLst></p:cTn></p:seq>
</p:childTnLst></p:cTn></p:par></p:tnLst></p:timing>"#,
        nodes
    )
}

fn slide_rels(slide: &SlideContent, n: usize) -> String {
    let mut rels = String::from(
        r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>"#,
    );
    if slide.image {
        rels.push_str(&format!(
            r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image{}.png"/>"#,
            n
        ));
    }
    if slide.notes.is_some() {
        rels.push_str(&format!(
            r#"<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide" Target="../notesSlides/notesSlide{}.xml"/>"#,
            n
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
        rels
    )
}

fn notes_xml(notes: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:notes xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
<p:cSld><p:spTree>
<p:sp><p:nvSpPr><p:cNvPr id="2" name="Slide Image"/><p:cNvSpPr/><p:nvPr><p:ph type="sldImg"/></p:nvPr></p:nvSpPr></p:sp>
<p:sp><p:nvSpPr><p:cNvPr id="3" name="Notes"/><p:cNvSpPr/><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr><p:txBody><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>
</p:spTree></p:cSld></p:notes>"#,
        notes
    )
}
