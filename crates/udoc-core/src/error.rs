//! Error types for pipeline operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the udoc pipeline crates.
///
/// Recovery policy is layered: box-level problems (`MalformedInput`) are
/// recovered inside the page, unit-level problems (`MissingAsset`) are
/// recovered inside the batch loop, and only `Persistence` is fatal to a
/// batch since a lost state file compromises resumability.
#[derive(Error, Debug)]
pub enum UdocError {
    /// A box record is missing its coordinate or label.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A referenced source asset (page image, layout JSON) is absent.
    #[error("missing asset: {0}")]
    MissingAsset(PathBuf),

    /// The processing-state file could not be written.
    #[error("state persistence failed: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Type alias for [`Result<T, UdocError>`].
pub type Result<T> = std::result::Result<T, UdocError>;
