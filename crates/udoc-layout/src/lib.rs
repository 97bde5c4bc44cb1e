//! # udoc-layout
//!
//! Layout-aware reading-order reconstruction and geometric metadata
//! association.
//!
//! The segmentation engine groups a page's labeled boxes into reading blocks
//! (column clustering + vertical-gap + label-transition heuristics), the
//! sorter linearizes blocks for markdown emission, and the association engine
//! links cropped objects to their nearest titles and page footers. All of it
//! is pure and single-threaded over in-memory box lists; callers may fan out
//! across pages freely.

pub mod associate;
pub mod order;
pub mod segment;

pub use associate::{Association, AssociationConfig, SequenceCounter, SizeFilter};
pub use order::{reading_order, OrderedBox};
pub use segment::{assign_blocks, SegmentConfig};
