//! Deck-level metadata and statistics.

use super::{ExtractedSlide, ImageAsset};
use serde::{Deserialize, Serialize};

/// Default canvas width in EMUs (10 inches).
pub const DEFAULT_SLIDE_WIDTH: u64 = 9_144_000;

/// Default canvas height in EMUs (7.5 inches).
pub const DEFAULT_SLIDE_HEIGHT: u64 = 6_858_000;

/// Deck metadata extracted from docProps/core.xml, docProps/app.xml
/// and ppt/presentation.xml.
///
/// Every field has a documented default, so a record is complete even
/// when the descriptor parts are missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckMetadata {
    /// Deck title
    pub title: String,

    /// Author/creator
    pub author: String,

    /// Creation date (ISO 8601), empty when unknown
    pub created: String,

    /// Last modification date (ISO 8601), empty when unknown
    pub modified: String,

    /// Number of slides
    pub total_slides: usize,

    /// Application that wrote the deck
    pub application: String,

    /// Canvas size in EMUs
    pub dimensions: Dimensions,

    /// Word count reported by the authoring application
    pub word_count: usize,

    /// Subject
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// Company
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    /// Revision number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,

    /// Keywords/tags
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub keywords: Vec<String>,
}

impl Default for DeckMetadata {
    fn default() -> Self {
        Self {
            title: "Untitled Presentation".to_string(),
            author: "Unknown".to_string(),
            created: String::new(),
            modified: String::new(),
            total_slides: 0,
            application: "Unknown".to_string(),
            dimensions: Dimensions::default(),
            word_count: 0,
            subject: None,
            company: None,
            revision: None,
            keywords: Vec::new(),
        }
    }
}

impl DeckMetadata {
    /// Align the slide count with the number of slides actually extracted.
    pub fn reconcile_slide_count(&mut self, extracted: usize) {
        if self.total_slides != extracted {
            log::debug!(
                "metadata reports {} slides, extracted {}",
                self.total_slides,
                extracted
            );
            self.total_slides = extracted;
        }
    }
}

/// Canvas dimensions in EMUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u64,
    pub height: u64,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            width: DEFAULT_SLIDE_WIDTH,
            height: DEFAULT_SLIDE_HEIGHT,
        }
    }
}

/// Counts of a slide's graphic objects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeCounts {
    pub shapes: usize,
    pub charts: usize,
    pub tables: usize,
}

impl std::ops::AddAssign for ShapeCounts {
    fn add_assign(&mut self, other: Self) {
        self.shapes += other.shapes;
        self.charts += other.charts;
        self.tables += other.tables;
    }
}

/// Processing statistics for one deck.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckStats {
    /// One text block per slide
    pub text_blocks: usize,
    /// Images extracted
    pub images: usize,
    pub shapes: usize,
    pub charts: usize,
    pub tables: usize,
    /// Wall-clock processing time in milliseconds
    pub processing_time: u64,
}

/// Compute statistics from extracted slides and images.
///
/// Shape, chart and table counts start at zero; the pipeline adds them
/// when it counts graphic objects.
pub fn calculate_stats(
    slides: &[ExtractedSlide],
    images: &[ImageAsset],
    processing_time: u64,
) -> DeckStats {
    DeckStats {
        text_blocks: slides.len(),
        images: images.len(),
        processing_time,
        ..Default::default()
    }
}
