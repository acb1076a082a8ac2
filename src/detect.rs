//! Structural checks for presentation packages.

use crate::container::DeckContainer;

/// ZIP file magic bytes: PK\x03\x04
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Content type for the PPTX presentation part.
const PPTX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";

/// Content type for macro-enabled presentations.
const PPTM_CONTENT_TYPE: &str = "application/vnd.ms-powerpoint.presentation.macroEnabled.main+xml";

/// Check if data starts with ZIP magic bytes.
pub fn is_zip_file(data: &[u8]) -> bool {
    data.len() >= 4 && data[..4] == ZIP_MAGIC
}

/// Whether a container declares itself as a presentation.
///
/// Checks `[Content_Types].xml` first and falls back to the folder
/// structure when the content types part is absent or unhelpful.
pub fn is_presentation(container: &DeckContainer) -> bool {
    if let Ok(content_types) = container.read_xml("[Content_Types].xml") {
        if content_types.contains(PPTX_CONTENT_TYPE) || content_types.contains(PPTM_CONTENT_TYPE)
        {
            return true;
        }
    }

    let names = container.list_files();
    let has_word = names.iter().any(|n| n.starts_with("word/"));
    let has_xl = names.iter().any(|n| n.starts_with("xl/"));
    let has_ppt = names.iter().any(|n| n.starts_with("ppt/"));
    has_ppt && !has_word && !has_xl
}

/// Validate a byte buffer as a presentation package.
///
/// Performs the same structural checks as [`DeckContainer::open`] and
/// never fails: any problem yields `false`.
///
/// # Example
///
/// ```
/// assert!(!deckflow::validate(b"not a deck"));
/// ```
pub fn validate(data: &[u8]) -> bool {
    if !is_zip_file(data) {
        return false;
    }
    match DeckContainer::open(data.to_vec()) {
        Ok(_) => true,
        Err(e) => {
            log::debug!("validation rejected buffer: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::test_support::{build_zip, PRESENTATION};

    #[test]
    fn test_is_zip_file() {
        assert!(is_zip_file(&[0x50, 0x4B, 0x03, 0x04, 0x00]));
        assert!(!is_zip_file(&[0x00, 0x00, 0x00, 0x00]));
        assert!(!is_zip_file(&[0x50, 0x4B])); // Too short
    }

    #[test]
    fn test_validate_rejects_garbage() {
        assert!(!validate(&[]));
        assert!(!validate(b"invalid data"));
        assert!(!validate(&[0x50, 0x4B, 0x03, 0x04, 0xFF, 0xFF]));
    }

    #[test]
    fn test_validate_rejects_archive_without_presentation() {
        let data = build_zip(&[("word/document.xml", "<w:document/>".as_bytes())]);
        assert!(!validate(&data));
    }

    #[test]
    fn test_validate_accepts_minimal_deck() {
        let content_types = format!(
            r#"<Types><Override PartName="/ppt/presentation.xml" ContentType="{}"/></Types>"#,
            PPTX_CONTENT_TYPE
        );
        let data = build_zip(&[
            ("[Content_Types].xml", content_types.as_bytes()),
            ("ppt/presentation.xml", PRESENTATION.as_bytes()),
        ]);
        assert!(validate(&data));
    }

    #[test]
    fn test_validate_agrees_with_open() {
        let content_types = format!(
            r#"<Types><Override PartName="/ppt/presentation.xml" ContentType="{}"/></Types>"#,
            PPTX_CONTENT_TYPE
        );
        let buffers = vec![
            build_zip(&[("ppt/presentation.xml", PRESENTATION.as_bytes())]),
            build_zip(&[
                ("ppt/presentation.xml", PRESENTATION.as_bytes()),
                ("xl/workbook.xml", "<workbook/>".as_bytes()),
            ]),
            build_zip(&[
                ("[Content_Types].xml", content_types.as_bytes()),
                ("ppt/presentation.xml", PRESENTATION.as_bytes()),
                ("xl/workbook.xml", "<workbook/>".as_bytes()),
            ]),
            build_zip(&[("word/document.xml", "<w:document/>".as_bytes())]),
            b"not a deck".to_vec(),
        ];

        for data in buffers {
            assert_eq!(validate(&data), DeckContainer::open(data.clone()).is_ok());
        }
    }

    #[test]
    fn test_spreadsheet_with_stray_presentation_part_is_rejected() {
        let data = build_zip(&[
            ("ppt/presentation.xml", PRESENTATION.as_bytes()),
            ("xl/workbook.xml", "<workbook/>".as_bytes()),
        ]);
        assert!(!validate(&data));
        assert!(matches!(
            DeckContainer::open(data),
            Err(crate::Error::ContainerFormat(_))
        ));
    }

    #[test]
    fn test_folder_fallback() {
        let data = build_zip(&[("ppt/presentation.xml", PRESENTATION.as_bytes())]);
        let container = DeckContainer::open(data).unwrap();
        assert!(is_presentation(&container));
    }
}
