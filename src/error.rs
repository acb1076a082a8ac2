//! Error types for the deckflow library.

use std::io;
use thiserror::Error;

/// Result type alias for deckflow operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while ingesting decks, editing timelines or
/// running batches.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The byte buffer is not a readable archive, or the mandatory
    /// presentation part is absent.
    #[error("Container format error: {0}")]
    ContainerFormat(String),

    /// Error parsing XML content.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// An optional part is absent. Extractors absorb this into defaults.
    #[error("Missing part: {0}")]
    MissingPart(String),

    /// A timeline operation named a layer that does not exist.
    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    /// A timeline operation named an element that does not exist.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// An element with the same id already lives in the project.
    #[error("Duplicate element id: {0}")]
    DuplicateElement(String),

    /// A layer with the same id already lives in the project.
    #[error("Duplicate layer id: {0}")]
    DuplicateLayer(String),

    /// A timeline edit whose arguments do not fit the element.
    #[error("Invalid edit: {0}")]
    InvalidEdit(String),

    /// No batch job with this id is registered.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// No batch with this id is registered.
    #[error("Batch not found: {0}")]
    BatchNotFound(String),

    /// A stage of one file's pipeline failed after all retries.
    #[error("Processing failed for {filename}: {message}")]
    Processing {
        /// Input file name
        filename: String,
        /// Failure description
        message: String,
    },

    /// The job was cancelled by the caller.
    #[error("Job cancelled: {0}")]
    Cancelled(String),

    /// An external collaborator (storage, narration, persistence) failed.
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(String),
}

impl Error {
    /// Whether retrying the failed stage could succeed.
    ///
    /// Malformed input fails the same way on every attempt; only transient
    /// failures qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Io(_) | Error::Collaborator(_) | Error::Processing { .. }
        )
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ContainerFormat(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err.to_string())
    }
}
