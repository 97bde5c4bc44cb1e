//! # udoc-core
//!
//! Core data model for the udoc document-ingestion pipeline: bounding-box
//! geometry, layout box/page records, per-object metadata records, and the
//! shared error type.
//!
//! Upstream layout detection and OCR are external collaborators; this crate
//! only models their input/output contracts. See `udoc-layout` for the
//! reading-order and association algorithms built on these types.

pub mod error;
pub mod geometry;
pub mod labels;
pub mod types;

pub use error::{Result, UdocError};
pub use geometry::BoundingBox;
pub use types::{
    date_stamp, LayoutBox, MetadataRecord, ObjectMetadata, PageRecord, SortedBox, SortedPage,
};
