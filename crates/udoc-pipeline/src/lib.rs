//! # udoc-pipeline
//!
//! Stage drivers for the udoc ingestion pipeline. Each stage consumes the
//! artifacts an external collaborator produced (layout JSON, page images,
//! OCR markdown) and emits the next set of whole-file artifacts:
//!
//! - [`ingest`]: tolerant layout-JSON reader
//! - [`textflow`]: per-page reading-order output + page metadata
//! - [`crop`]: cropped visual objects + per-object metadata
//! - [`markdown`]: document-level markdown export
//! - [`merge`]: per-document metadata aggregation
//! - [`state`] / [`driver`]: resumable, idempotent batch execution
//!
//! The per-page computation is pure, so the driver fans pages across a rayon
//! pool; the persisted processing state has a single writer (the driver
//! thread), with workers reporting completion events over a channel.

pub mod crop;
pub mod driver;
pub mod ingest;
pub mod markdown;
pub mod merge;
pub mod state;
pub mod textflow;

pub use driver::{BatchDriver, BatchOptions, BatchSummary, WorkUnit};
pub use state::{ProcessingState, UnitStatus};
