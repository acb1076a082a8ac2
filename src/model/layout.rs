//! Layout classification models.

use serde::{Deserialize, Serialize};

/// Layout label assigned to a slide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutType {
    /// No visual elements
    Blank,
    /// Title (and optional subtitle) only
    Title,
    /// Single title, nothing else
    SectionHeader,
    /// Title plus body content
    TitleContent,
    /// Two bodies side by side
    TwoContent,
    /// Body content next to an image or chart
    Comparison,
    /// Content with a table, image or chart caption
    ContentCaption,
    /// One picture with a caption
    PictureCaption,
    /// Could not be classified
    #[default]
    Unknown,
}

impl LayoutType {
    /// Stable label string.
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutType::Blank => "blank",
            LayoutType::Title => "title",
            LayoutType::SectionHeader => "section-header",
            LayoutType::TitleContent => "title-content",
            LayoutType::TwoContent => "two-content",
            LayoutType::Comparison => "comparison",
            LayoutType::ContentCaption => "content-caption",
            LayoutType::PictureCaption => "picture-caption",
            LayoutType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for LayoutType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of visual element found on a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualKind {
    Text,
    Image,
    Chart,
    Table,
    Shape,
    Media,
}

/// Placeholder role declared by `p:ph`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlaceholderType {
    Title,
    Subtitle,
    Content,
    Image,
    Chart,
    Table,
    Media,
    SlideNumber,
    Date,
    Footer,
    Header,
}

impl PlaceholderType {
    /// Map a `p:ph@type` value. A placeholder without a type is a body.
    pub fn from_ph_type(value: &str) -> Self {
        match value {
            "title" | "ctrTitle" => PlaceholderType::Title,
            "subTitle" => PlaceholderType::Subtitle,
            "pic" => PlaceholderType::Image,
            "chart" => PlaceholderType::Chart,
            "tbl" => PlaceholderType::Table,
            "media" => PlaceholderType::Media,
            "sldNum" => PlaceholderType::SlideNumber,
            "dt" => PlaceholderType::Date,
            "ftr" => PlaceholderType::Footer,
            "hdr" => PlaceholderType::Header,
            _ => PlaceholderType::Content,
        }
    }

    /// Whether the placeholder is slide chrome rather than content.
    pub fn is_decoration(&self) -> bool {
        matches!(
            self,
            PlaceholderType::SlideNumber
                | PlaceholderType::Date
                | PlaceholderType::Footer
                | PlaceholderType::Header
        )
    }
}

/// Bounding box normalized to the slide canvas (0..1 on both axes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Horizontal centre.
    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }
}

/// One typed element on the slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutElement {
    /// Element kind
    #[serde(rename = "type")]
    pub kind: VisualKind,
    /// Normalized bounds
    pub bounds: BoundingBox,
    /// Placeholder role, when the shape is a placeholder
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<PlaceholderType>,
}

impl LayoutElement {
    /// Whether this is body text (text that is neither title nor subtitle).
    pub fn is_body_text(&self) -> bool {
        self.kind == VisualKind::Text
            && !matches!(
                self.placeholder,
                Some(PlaceholderType::Title) | Some(PlaceholderType::Subtitle)
            )
    }
}

/// Result of layout detection for one slide.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutAnalysis {
    /// Layout label
    pub layout_type: LayoutType,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Elements in document order
    pub elements: Vec<LayoutElement>,
}

impl LayoutAnalysis {
    /// The result for a slide that could not be classified.
    pub fn unknown() -> Self {
        Self::default()
    }
}
