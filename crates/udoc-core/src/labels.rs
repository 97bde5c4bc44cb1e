//! Well-known layout labels.
//!
//! The upstream layout detector emits an open label set, so labels stay
//! plain strings throughout the pipeline; these constants only name the
//! labels the default policies refer to.

/// Section heading inside the body text.
pub const PARAGRAPH_TITLE: &str = "paragraph_title";
/// Document-level title.
pub const DOC_TITLE: &str = "doc_title";
/// Body text.
pub const TEXT: &str = "text";
/// Caption attached to a figure or chart.
pub const FIGURE_TITLE: &str = "figure_title";
/// Page footer; its text doubles as the page index value.
pub const FOOTER: &str = "footer";
/// Raster image region.
pub const IMAGE: &str = "image";
/// Chart region.
pub const CHART: &str = "chart";

/// Labels treated as text content by default.
pub const DEFAULT_CONTENT_LABELS: &[&str] =
    &[TEXT, "content", "reference", "reference_content", "aside_text"];

/// Labels treated as titles by default.
pub const DEFAULT_TITLE_LABELS: &[&str] = &[PARAGRAPH_TITLE, DOC_TITLE];

/// Labels kept when ingesting a page for the text flow.
pub const DEFAULT_INCLUDE_LABELS: &[&str] = &[
    TEXT,
    PARAGRAPH_TITLE,
    FOOTER,
    "content",
    "reference",
    DOC_TITLE,
    "aside_text",
    "reference_content",
];

/// Labels eligible for crop extraction.
pub const DEFAULT_CROP_LABELS: &[&str] = &[IMAGE, CHART];
