//! Image asset models.

use serde::{Deserialize, Serialize};

/// An image part referenced by a slide, with its bytes.
///
/// Produced by the image extractor and handed to an external storage
/// collaborator; the bytes never leave the process through the core.
#[derive(Debug, Clone)]
pub struct ExtractedImage {
    /// 1-based slide number where the image is placed
    pub slide_number: usize,
    /// File name of the media part (e.g. "image1.png")
    pub filename: String,
    /// Full part path inside the container
    pub part_path: String,
    /// MIME type derived from the extension
    pub content_type: String,
    /// Binary data
    pub data: Vec<u8>,
    /// Alt text / description
    pub alt_text: Option<String>,
    /// Width in EMUs
    pub width: Option<u64>,
    /// Height in EMUs
    pub height: Option<u64>,
}

impl ExtractedImage {
    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Location assigned to an image by a storage collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAsset {
    /// Storage key
    pub key: String,
    /// Public URL, when the store exposes one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// An image as reported in processing results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAsset {
    /// Original file name
    pub original_name: String,
    /// Slide the image belongs to
    pub slide_number: usize,
    /// MIME type
    #[serde(rename = "type")]
    pub content_type: String,
    /// Size in bytes
    pub size: usize,
    /// Storage key assigned externally
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,
    /// URL assigned externally
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Alt text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

impl ImageAsset {
    /// Describe an extracted image, optionally with its stored location.
    pub fn from_extracted(image: &ExtractedImage, stored: Option<StoredAsset>) -> Self {
        let (storage_key, url) = match stored {
            Some(s) => (Some(s.key), s.url),
            None => (None, None),
        };
        Self {
            original_name: image.filename.clone(),
            slide_number: image.slide_number,
            content_type: image.content_type.clone(),
            size: image.size(),
            storage_key,
            url,
            alt_text: image.alt_text.clone(),
        }
    }
}

/// Determine MIME type from a file name.
pub fn mime_from_filename(filename: &str) -> Option<&'static str> {
    let ext = filename.rsplit('.').next()?.to_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tiff" | "tif" => "image/tiff",
        "svg" => "image/svg+xml",
        "wmf" => "image/x-wmf",
        "emf" => "image/x-emf",
        "webp" => "image/webp",
        _ => return None,
    };
    Some(mime)
}
