//! ZIP container abstraction for presentation packages.

use crate::detect::{is_presentation, is_zip_file};
use crate::error::{Error, Result};
use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Read};
use std::path::Path;

/// Mandatory presentation descriptor part.
pub const PRESENTATION_PART: &str = "ppt/presentation.xml";

/// Relationships of the presentation part (slide order lives here).
const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";

/// Upper bound on the buffer reserved up front for one part. The declared
/// size comes from the archive itself.
const MAX_PREALLOC: usize = 16 * 1024 * 1024;

/// A relationship entry from a .rels file.
#[derive(Debug, Clone)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1")
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target path (relative or absolute)
    pub target: String,
    /// Whether the target is external
    pub external: bool,
}

impl Relationship {
    /// Whether the relationship type URI ends with the given short name
    /// (e.g. "slide", "image", "hyperlink").
    pub fn is_type(&self, short: &str) -> bool {
        self.rel_type.rsplit('/').next() == Some(short)
    }
}

/// Collection of relationships parsed from a .rels file.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    /// Map from relationship ID to relationship data
    pub by_id: HashMap<String, Relationship>,
    /// Map from relationship type to list of relationships
    pub by_type: HashMap<String, Vec<Relationship>>,
}

impl Relationships {
    /// Create a new empty relationships collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a relationship by ID.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.by_id.get(id)
    }

    /// Get relationships by type.
    pub fn get_by_type(&self, rel_type: &str) -> Vec<&Relationship> {
        self.by_type
            .get(rel_type)
            .map(|v| v.iter().collect())
            .unwrap_or_default()
    }

    /// Add a relationship.
    pub fn add(&mut self, rel: Relationship) {
        self.by_type
            .entry(rel.rel_type.clone())
            .or_default()
            .push(rel.clone());
        self.by_id.insert(rel.id.clone(), rel);
    }

    /// Number of relationships.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Fix XML encoding declaration from UTF-16 to UTF-8.
///
/// After decoding UTF-16 bytes into a Rust String the declaration still
/// says encoding="UTF-16", which makes quick-xml misread the content.
fn fix_xml_encoding_declaration(content: &str) -> String {
    if content.starts_with("<?xml") {
        if let Some(end_decl) = content.find("?>") {
            let decl = &content[..end_decl + 2];
            let rest = &content[end_decl + 2..];

            let fixed_decl = decl
                .replace("encoding=\"UTF-16\"", "encoding=\"UTF-8\"")
                .replace("encoding='UTF-16'", "encoding='UTF-8'")
                .replace("encoding=\"utf-16\"", "encoding=\"UTF-8\"")
                .replace("encoding='utf-16'", "encoding='UTF-8'");

            return format!("{}{}", fixed_decl, rest);
        }
    }
    content.to_string()
}

/// Decode XML bytes handling different encodings (UTF-8, UTF-16 LE/BE).
pub fn decode_xml_bytes(bytes: &[u8]) -> Result<String> {
    // UTF-8 BOM: EF BB BF
    if bytes.len() >= 3 && bytes[0] == 0xEF && bytes[1] == 0xBB && bytes[2] == 0xBF {
        return String::from_utf8(bytes[3..].to_vec())
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)));
    }

    // UTF-16 LE BOM: FF FE
    if bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] == 0xFE {
        let content = decode_utf16_le(&bytes[2..])?;
        return Ok(fix_xml_encoding_declaration(&content));
    }

    // UTF-16 BE BOM: FE FF
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let content = decode_utf16_be(&bytes[2..])?;
        return Ok(fix_xml_encoding_declaration(&content));
    }

    match String::from_utf8(bytes.to_vec()) {
        Ok(s) => Ok(s),
        Err(_) => {
            // ASCII in UTF-16 LE has nulls in odd positions
            if bytes.len() >= 4 && bytes[1] == 0 && bytes[3] == 0 {
                decode_utf16_le(bytes)
            } else if bytes.len() >= 4 && bytes[0] == 0 && bytes[2] == 0 {
                decode_utf16_be(bytes)
            } else {
                Ok(String::from_utf8_lossy(bytes).into_owned())
            }
        }
    }
}

fn decode_utf16_le(bytes: &[u8]) -> Result<String> {
    let len = bytes.len() & !1;
    let u16_iter = (0..len)
        .step_by(2)
        .map(|i| u16::from_le_bytes([bytes[i], bytes[i + 1]]));

    char::decode_utf16(u16_iter)
        .collect::<std::result::Result<String, _>>()
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

fn decode_utf16_be(bytes: &[u8]) -> Result<String> {
    let len = bytes.len() & !1;
    let u16_iter = (0..len)
        .step_by(2)
        .map(|i| u16::from_be_bytes([bytes[i], bytes[i + 1]]));

    char::decode_utf16(u16_iter)
        .collect::<std::result::Result<String, _>>()
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// An opened presentation package.
///
/// Every part is inflated when the container is opened, so the container
/// is immutable afterwards and can be shared across threads by reference.
pub struct DeckContainer {
    parts: BTreeMap<String, Vec<u8>>,
    slides: Vec<String>,
}

impl DeckContainer {
    /// Open a container from raw bytes.
    ///
    /// Fails with [`Error::ContainerFormat`] when the buffer is not a ZIP
    /// archive, lacks `ppt/presentation.xml` or belongs to another Office
    /// format. Slide order is resolved here once.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use deckflow::container::DeckContainer;
    ///
    /// let data = std::fs::read("deck.pptx")?;
    /// let container = DeckContainer::open(data)?;
    /// println!("{} slides", container.slide_paths().len());
    /// # Ok::<(), deckflow::Error>(())
    /// ```
    pub fn open(data: Vec<u8>) -> Result<Self> {
        if !is_zip_file(&data) {
            return Err(Error::ContainerFormat(
                "buffer does not start with a ZIP signature".to_string(),
            ));
        }

        let mut archive = zip::ZipArchive::new(Cursor::new(data))?;
        let mut parts = BTreeMap::new();

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let declared = usize::try_from(file.size()).unwrap_or(MAX_PREALLOC);
            let mut bytes = Vec::with_capacity(declared.min(MAX_PREALLOC));
            file.read_to_end(&mut bytes)
                .map_err(|e| Error::ContainerFormat(format!("{}: {}", name, e)))?;
            parts.insert(name, bytes);
        }

        if !parts.contains_key(PRESENTATION_PART) {
            return Err(Error::ContainerFormat(format!(
                "mandatory part {} is missing",
                PRESENTATION_PART
            )));
        }

        let mut container = Self {
            parts,
            slides: Vec::new(),
        };
        if !is_presentation(&container) {
            return Err(Error::ContainerFormat(
                "package is not a presentation".to_string(),
            ));
        }
        container.slides = container.resolve_slide_paths();
        Ok(container)
    }

    /// Open a container from a file path.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::open(data)
    }

    /// Read an XML part as a string, decoding UTF-8 or UTF-16.
    pub fn read_xml(&self, path: &str) -> Result<String> {
        let bytes = self
            .parts
            .get(path)
            .ok_or_else(|| Error::MissingPart(path.to_string()))?;
        decode_xml_bytes(bytes)
    }

    /// Borrow the raw bytes of a part.
    pub fn read_binary(&self, path: &str) -> Result<&[u8]> {
        self.parts
            .get(path)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::MissingPart(path.to_string()))
    }

    /// Check if a part exists.
    pub fn exists(&self, path: &str) -> bool {
        self.parts.contains_key(path)
    }

    /// List all part names.
    pub fn list_files(&self) -> Vec<String> {
        self.parts.keys().cloned().collect()
    }

    /// List part names matching a prefix.
    pub fn list_files_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.parts
            .keys()
            .filter(|n| n.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Read and parse the relationships of a part.
    ///
    /// `ppt/slides/slide1.xml` maps to `ppt/slides/_rels/slide1.xml.rels`.
    /// A missing .rels part yields an empty collection.
    pub fn read_relationships(&self, part_path: &str) -> Result<Relationships> {
        let rels_path = if part_path.is_empty() || part_path == "/" {
            "_rels/.rels".to_string()
        } else if let Some(last_slash) = part_path.rfind('/') {
            let dir = &part_path[..last_slash];
            let file = &part_path[last_slash + 1..];
            format!("{}/_rels/{}.rels", dir, file)
        } else {
            format!("_rels/{}.rels", part_path)
        };

        self.parse_relationships(&rels_path)
    }

    /// Ordered slide part paths.
    ///
    /// Follows `p:sldIdLst` through the presentation relationships and
    /// falls back to `ppt/slides/slideN.xml` sorted by N.
    pub fn slide_paths(&self) -> &[String] {
        &self.slides
    }

    /// Path of the slide with the given 1-based number, if present.
    pub fn slide_path(&self, slide_number: usize) -> Option<String> {
        slide_number
            .checked_sub(1)
            .and_then(|idx| self.slides.get(idx).cloned())
    }

    fn resolve_slide_paths(&self) -> Vec<String> {
        let ordered = self.slide_paths_from_presentation();
        if !ordered.is_empty() {
            return ordered;
        }

        let mut numbered: Vec<(u32, String)> = self
            .parts
            .keys()
            .filter_map(|name| {
                let rest = name.strip_prefix("ppt/slides/slide")?;
                let number = rest.strip_suffix(".xml")?.parse::<u32>().ok()?;
                Some((number, name.clone()))
            })
            .collect();
        numbered.sort_by_key(|(n, _)| *n);
        numbered.into_iter().map(|(_, path)| path).collect()
    }

    fn slide_paths_from_presentation(&self) -> Vec<String> {
        let Ok(xml) = self.read_xml(PRESENTATION_PART) else {
            return Vec::new();
        };
        let Ok(rels) = self.parse_relationships(PRESENTATION_RELS) else {
            return Vec::new();
        };

        let mut paths = Vec::new();
        let mut reader = quick_xml::Reader::from_str(&xml);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Empty(e))
                | Ok(quick_xml::events::Event::Start(e)) => {
                    if e.name().local_name().as_ref() == b"sldId" {
                        // r:id attribute
                        let rel_id = e
                            .attributes()
                            .flatten()
                            .find(|a| {
                                a.key.as_ref() != b"id" && a.key.local_name().as_ref() == b"id"
                            })
                            .map(|a| String::from_utf8_lossy(&a.value).to_string());

                        if let Some(rel) = rel_id.and_then(|id| rels.get(&id)) {
                            if !rel.external {
                                paths.push(Self::resolve_path(PRESENTATION_PART, &rel.target));
                            }
                        }
                    }
                }
                Ok(quick_xml::events::Event::Eof) => break,
                Err(_) => break,
                _ => {}
            }
            buf.clear();
        }

        paths.retain(|p| self.exists(p));
        paths
    }

    fn parse_relationships(&self, rels_path: &str) -> Result<Relationships> {
        let content = match self.read_xml(rels_path) {
            Ok(c) => c,
            Err(_) => return Ok(Relationships::new()),
        };

        if content.trim().is_empty() {
            return Ok(Relationships::new());
        }

        let mut rels = Relationships::new();
        let mut reader = quick_xml::Reader::from_str(&content);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Empty(e))
                | Ok(quick_xml::events::Event::Start(e))
                    if e.name().local_name().as_ref() == b"Relationship" =>
                {
                    let mut id = String::new();
                    let mut rel_type = String::new();
                    let mut target = String::new();
                    let mut external = false;

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"Id" => id = String::from_utf8_lossy(&attr.value).to_string(),
                            b"Type" => rel_type = String::from_utf8_lossy(&attr.value).to_string(),
                            b"Target" => target = String::from_utf8_lossy(&attr.value).to_string(),
                            b"TargetMode" => {
                                external = String::from_utf8_lossy(&attr.value).to_lowercase()
                                    == "external"
                            }
                            _ => {}
                        }
                    }

                    if !id.is_empty() {
                        rels.add(Relationship {
                            id,
                            rel_type,
                            target,
                            external,
                        });
                    }
                }
                Ok(quick_xml::events::Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Resolve a relative path from a base part path.
    pub fn resolve_path(base: &str, relative: &str) -> String {
        if let Some(stripped) = relative.strip_prefix('/') {
            return stripped.to_string();
        }

        let base_path = Path::new(base);
        let base_dir = base_path.parent().unwrap_or(Path::new(""));

        let mut result = base_dir.to_path_buf();
        for component in Path::new(relative).components() {
            match component {
                std::path::Component::ParentDir => {
                    result.pop();
                }
                std::path::Component::Normal(c) => {
                    result.push(c);
                }
                _ => {}
            }
        }

        result.to_string_lossy().replace('\\', "/")
    }
}

impl std::fmt::Debug for DeckContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeckContainer")
            .field("parts", &self.parts.len())
            .field("slides", &self.slides.len())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    /// Build an archive from (path, content) pairs.
    pub fn build_zip(parts: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buffer = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
            let options =
                SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
            for (path, content) in parts {
                zip.start_file(*path, options).unwrap();
                zip.write_all(content).unwrap();
            }
            zip.finish().unwrap();
        }
        buffer
    }

    pub const PNG_BYTES: [u8; 6] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A];

    pub const PRESENTATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <p:sldIdLst><p:sldId id="256" r:id="rId2"/><p:sldId id="257" r:id="rId3"/></p:sldIdLst>
  <p:sldSz cx="12192000" cy="6858000"/>
</p:presentation>"#;

    pub const PRESENTATION_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide2.xml"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide1.xml"/>
</Relationships>"#;

    /// Wrap slide XML bodies (spTree children) into a container.
    pub fn container_with_slide(sp_tree: &str, timing: &str, rels: &str) -> crate::DeckContainer {
        let slide = slide_xml(sp_tree, timing);
        let slide_rels = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
            rels
        );
        let presentation = r#"<p:presentation xmlns:p="p" xmlns:r="r"><p:sldIdLst><p:sldId id="256" r:id="rId1"/></p:sldIdLst><p:sldSz cx="9144000" cy="6858000"/></p:presentation>"#;
        let pres_rels = r#"<Relationships><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide1.xml"/></Relationships>"#;
        let data = build_zip(&[
            ("ppt/presentation.xml", presentation.as_bytes()),
            ("ppt/_rels/presentation.xml.rels", pres_rels.as_bytes()),
            ("ppt/slides/slide1.xml", slide.as_bytes()),
            ("ppt/slides/_rels/slide1.xml.rels", slide_rels.as_bytes()),
            ("ppt/media/image1.png", &PNG_BYTES[..]),
        ]);
        crate::DeckContainer::open(data).unwrap()
    }

    pub fn slide_xml(sp_tree: &str, timing: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<p:cSld><p:spTree>{}</p:spTree></p:cSld>{}</p:sld>"#,
            sp_tree, timing
        )
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use super::test_support::PRESENTATION_RELS;

    #[test]
    fn test_resolve_path() {
        assert_eq!(
            DeckContainer::resolve_path("ppt/slides/slide1.xml", "../media/image1.png"),
            "ppt/media/image1.png"
        );
        assert_eq!(
            DeckContainer::resolve_path("ppt/presentation.xml", "slides/slide3.xml"),
            "ppt/slides/slide3.xml"
        );
        assert_eq!(
            DeckContainer::resolve_path("ppt/slides/slide1.xml", "/ppt/media/image1.png"),
            "ppt/media/image1.png"
        );
    }

    #[test]
    fn test_relationships_collection() {
        let mut rels = Relationships::new();
        rels.add(Relationship {
            id: "rId1".to_string(),
            rel_type: "http://test/image".to_string(),
            target: "../media/image1.png".to_string(),
            external: false,
        });
        rels.add(Relationship {
            id: "rId2".to_string(),
            rel_type: "http://test/image".to_string(),
            target: "../media/image2.png".to_string(),
            external: false,
        });

        assert!(rels.get("rId1").is_some());
        assert!(rels.get("rId3").is_none());
        assert_eq!(rels.get_by_type("http://test/image").len(), 2);
        assert!(rels.get("rId1").unwrap().is_type("image"));
        assert_eq!(rels.len(), 2);
    }

    #[test]
    fn test_open_rejects_non_zip() {
        let err = DeckContainer::open(b"definitely not a zip".to_vec()).unwrap_err();
        assert!(matches!(err, Error::ContainerFormat(_)));
    }

    #[test]
    fn test_open_rejects_truncated_zip() {
        let mut data = build_zip(&[("ppt/presentation.xml", PRESENTATION.as_bytes())]);
        data.truncate(12);
        assert!(matches!(
            DeckContainer::open(data),
            Err(Error::ContainerFormat(_))
        ));
    }

    #[test]
    fn test_open_requires_presentation_part() {
        let data = build_zip(&[("docProps/core.xml", "<cp:coreProperties/>".as_bytes())]);
        let err = DeckContainer::open(data).unwrap_err();
        assert!(err.to_string().contains("ppt/presentation.xml"));
    }

    #[test]
    fn test_slide_order_follows_sld_id_list() {
        let data = build_zip(&[
            ("ppt/presentation.xml", PRESENTATION.as_bytes()),
            ("ppt/_rels/presentation.xml.rels", PRESENTATION_RELS.as_bytes()),
            ("ppt/slides/slide1.xml", "<p:sld/>".as_bytes()),
            ("ppt/slides/slide2.xml", "<p:sld/>".as_bytes()),
        ]);
        let container = DeckContainer::open(data).unwrap();
        assert_eq!(
            container.slide_paths(),
            vec!["ppt/slides/slide2.xml", "ppt/slides/slide1.xml"]
        );
        assert_eq!(
            container.slide_path(2).as_deref(),
            Some("ppt/slides/slide1.xml")
        );
        assert_eq!(container.slide_path(0), None);
        assert_eq!(container.slide_path(3), None);
    }

    #[test]
    fn test_declared_size_does_not_drive_allocation() {
        let mut data = build_zip(&[("ppt/presentation.xml", PRESENTATION.as_bytes())]);
        // Claim a 2 GB uncompressed size in the local and central headers
        let huge = 0x7FFF_FFFFu32.to_le_bytes();
        for (signature, offset) in [(b"PK\x03\x04", 22), (b"PK\x01\x02", 24)] {
            if let Some(at) = data.windows(4).position(|w| w == signature) {
                data[at + offset..at + offset + 4].copy_from_slice(&huge);
            }
        }

        let opened = DeckContainer::open(data.clone());
        assert_eq!(crate::detect::validate(&data), opened.is_ok());
        if let Ok(container) = opened {
            assert!(container.read_binary(PRESENTATION_PART).unwrap().len() < 4096);
        }
    }

    #[test]
    fn test_slide_order_falls_back_to_numbering() {
        let data = build_zip(&[
            ("ppt/presentation.xml", "<p:presentation/>".as_bytes()),
            ("ppt/slides/slide10.xml", "<p:sld/>".as_bytes()),
            ("ppt/slides/slide2.xml", "<p:sld/>".as_bytes()),
            ("ppt/slides/_rels/slide2.xml.rels", "<Relationships/>".as_bytes()),
        ]);
        let container = DeckContainer::open(data).unwrap();
        assert_eq!(
            container.slide_paths(),
            vec!["ppt/slides/slide2.xml", "ppt/slides/slide10.xml"]
        );
    }

    #[test]
    fn test_missing_part_is_reported() {
        let data = build_zip(&[("ppt/presentation.xml", PRESENTATION.as_bytes())]);
        let container = DeckContainer::open(data).unwrap();
        assert!(matches!(
            container.read_xml("docProps/app.xml"),
            Err(Error::MissingPart(_))
        ));
        assert!(container.read_relationships("ppt/slides/slide1.xml").unwrap().is_empty());
    }

    #[test]
    fn test_utf16_decoding_function() {
        let utf16_le = b"\xFF\xFE<\0?\0x\0m\0l\0>\0";
        assert_eq!(decode_xml_bytes(utf16_le).unwrap(), "<?xml>");

        let utf16_be = b"\xFE\xFF\0<\0?\0x\0m\0l\0>";
        assert_eq!(decode_xml_bytes(utf16_be).unwrap(), "<?xml>");

        let utf8_bom = b"\xEF\xBB\xBF<?xml>";
        assert_eq!(decode_xml_bytes(utf8_bom).unwrap(), "<?xml>");

        assert_eq!(decode_xml_bytes(b"<?xml>").unwrap(), "<?xml>");
    }

    #[test]
    fn test_container_is_shareable_across_threads() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<DeckContainer>();
    }
}
