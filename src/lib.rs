//! # deckflow
//!
//! Slide-deck ingestion into a keyframe-animated timeline model.
//!
//! This library opens PPTX containers, extracts metadata and per-slide
//! content (text, images, layout), converts slide animations into generic
//! keyframes and lays the deck out on a timeline. Many decks can be
//! processed at once as a managed batch.
//!
//! ## Quick Start
//!
//! ```no_run
//! use deckflow::{process_file, ProcessOptions};
//!
//! let result = process_file("deck.pptx", &ProcessOptions::default())?;
//! println!("Slides: {}", result.slides.len());
//! println!("Duration: {} ms", result.timeline.total_duration);
//!
//! // Editable timeline with layers, elements and keyframes
//! let project = result.to_project();
//! println!("Layers: {}", project.layers().len());
//! # Ok::<(), deckflow::Error>(())
//! ```
//!
//! ## Building Blocks
//!
//! ```no_run
//! use deckflow::animation::extract_and_convert;
//! use deckflow::extract::{detect_layout, extract_text};
//! use deckflow::DeckContainer;
//!
//! let container = DeckContainer::open_path("deck.pptx")?;
//! let text = extract_text(&container, 1);
//! let layout = detect_layout(&container, 1);
//! let animations = extract_and_convert(&container, 1);
//! println!("{:?} {} {}", text.title, layout.layout_type, animations.total);
//! # Ok::<(), deckflow::Error>(())
//! ```
//!
//! ## Batches
//!
//! [`batch::BatchProcessor`] runs many decks under a concurrency cap with
//! retries, cancellation and per-file progress. It needs a Tokio runtime.

pub mod animation;
pub mod batch;
pub mod container;
pub mod detect;
pub mod error;
pub mod extract;
pub mod metadata;
pub mod model;
pub mod pipeline;
pub mod timeline;

// Re-exports
pub use container::{DeckContainer, Relationship, Relationships};
pub use detect::validate;
pub use error::{Error, Result};
pub use metadata::extract_metadata;
pub use model::{
    DeckMetadata, DeckStats, Dimensions, ExtractedSlide, ImageAsset, LayoutAnalysis, LayoutType,
};
pub use pipeline::{process_deck, DeckProcessor, DeckResult, ProcessOptions};
pub use timeline::{generate_timeline, DeckTimeline, TimelineProject};

use std::path::Path;

/// Process a deck file with default collaborators.
///
/// The project id is the file stem.
///
/// # Example
///
/// ```no_run
/// use deckflow::{process_file, ProcessOptions};
///
/// let options = ProcessOptions::default().with_images(false);
/// let result = process_file("deck.pptx", &options)?;
/// println!("{}", result.to_json()?);
/// # Ok::<(), deckflow::Error>(())
/// ```
pub fn process_file(path: impl AsRef<Path>, options: &ProcessOptions) -> Result<DeckResult> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;
    let project_id = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "deck".to_string());
    process_deck(data, &project_id, options, &mut |_, _| {})
}

/// Read only the metadata of a deck file.
///
/// # Example
///
/// ```no_run
/// let metadata = deckflow::read_metadata("deck.pptx")?;
/// println!("{} by {}", metadata.title, metadata.author);
/// # Ok::<(), deckflow::Error>(())
/// ```
pub fn read_metadata(path: impl AsRef<Path>) -> Result<DeckMetadata> {
    let container = DeckContainer::open_path(path)?;
    let mut metadata = extract_metadata(&container);
    metadata.reconcile_slide_count(container.slide_paths().len());
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_sample_file() {
        let path = "test-files/file_example_PPT_1MB.pptx";
        if Path::new(path).exists() {
            let result = process_file(path, &ProcessOptions::default()).unwrap();
            assert_eq!(result.timeline.scenes.len(), result.slides.len());
            assert_eq!(result.project_id, "file_example_PPT_1MB");
        }
    }

    #[test]
    fn test_process_file_from_disk() {
        use crate::container::test_support::{build_zip, slide_xml, PRESENTATION};
        use std::io::Write;

        let rels = r#"<Relationships><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide1.xml"/></Relationships>"#;
        let presentation = PRESENTATION.replace(r#"<p:sldId id="257" r:id="rId3"/>"#, "");
        let slide = slide_xml(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:txBody><a:p><a:r><a:t>Roadmap</a:t></a:r></a:p></p:txBody></p:sp>"#,
            "",
        );
        let data = build_zip(&[
            ("ppt/presentation.xml", presentation.as_bytes()),
            ("ppt/_rels/presentation.xml.rels", rels.as_bytes()),
            ("ppt/slides/slide1.xml", slide.as_bytes()),
        ]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roadmap.pptx");
        std::fs::File::create(&path).unwrap().write_all(&data).unwrap();

        let result = process_file(&path, &ProcessOptions::default()).unwrap();
        assert_eq!(result.project_id, "roadmap");
        assert_eq!(result.slides[0].title.as_deref(), Some("Roadmap"));

        let metadata = read_metadata(&path).unwrap();
        assert_eq!(metadata.total_slides, 1);
        assert_eq!(metadata.dimensions.width, 12192000);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_metadata("test-files/does-not-exist.pptx").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
