//! Slide content models.

use super::{ImageAsset, LayoutAnalysis};
use serde::{Deserialize, Serialize};

/// A hyperlink found in slide text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hyperlink {
    /// Anchor text of the link
    pub text: String,
    /// Resolved link target
    pub url: String,
}

/// Text fragment produced by the text extractor for one slide.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideText {
    /// Slide title (title placeholder, else first paragraph)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Paragraphs in document order
    pub paragraphs: Vec<String>,
    /// Bullet-styled paragraphs in document order
    pub bullets: Vec<String>,
    /// Hyperlinks in document order
    pub hyperlinks: Vec<Hyperlink>,
    /// Speaker notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl SlideText {
    /// All paragraphs joined by newlines.
    pub fn plain_text(&self) -> String {
        self.paragraphs.join("\n")
    }

    /// Whether the fragment carries no text at all.
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty() && self.notes.is_none()
    }
}

/// One extracted slide.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedSlide {
    /// 1-based slide number
    pub slide_number: usize,

    /// Slide title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Text content, paragraphs separated by newlines
    pub text: String,

    /// Bullet list
    #[serde(default)]
    pub bullet_points: Vec<String>,

    /// Hyperlinks
    #[serde(default)]
    pub hyperlinks: Vec<Hyperlink>,

    /// Speaker notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Layout classification
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutAnalysis>,

    /// Images placed on this slide
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageAsset>>,
}

impl ExtractedSlide {
    /// Create an empty slide with the given number.
    pub fn new(slide_number: usize) -> Self {
        Self {
            slide_number,
            ..Default::default()
        }
    }

    /// Fill the text fields from an extracted fragment.
    pub fn with_text(mut self, text: SlideText) -> Self {
        self.text = text.plain_text();
        self.title = text.title;
        self.bullet_points = text.bullets;
        self.hyperlinks = text.hyperlinks;
        self.notes = text.notes;
        self
    }

    /// Number of whitespace-separated words in text and notes.
    pub fn word_count(&self) -> usize {
        let notes = self.notes.as_deref().unwrap_or_default();
        self.text.split_whitespace().count() + notes.split_whitespace().count()
    }

    /// Number of images on the slide.
    pub fn image_count(&self) -> usize {
        self.images.as_ref().map_or(0, Vec::len)
    }
}
