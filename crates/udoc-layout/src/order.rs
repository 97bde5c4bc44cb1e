//! Reading-order sorter.
//!
//! Produces the final linear ordering of one page's boxes: a coarse vertical
//! pre-sort feeds the block segmentation, and the result is stable-sorted by
//! `(block_id, y1)` so boxes within a block keep their column-derived
//! relative order.

use udoc_core::{LayoutBox, SortedBox};

use crate::segment::{assign_blocks, SegmentConfig};

/// A box with its assigned reading block.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedBox {
    pub block_id: usize,
    pub item: LayoutBox,
}

impl OrderedBox {
    /// Converts into the wire record for the per-page sorted output.
    #[must_use]
    pub fn into_sorted(self) -> SortedBox {
        SortedBox {
            text: self.item.text.unwrap_or_default(),
            label: self.item.label,
            coordinate: self.item.coordinate,
            block_id: self.block_id,
        }
    }
}

/// Orders one page's boxes for emission.
///
/// Stable and idempotent: ordering an already-ordered page returns the same
/// sequence. Takes the box list by value; the transform attaches block ids
/// without mutating any box.
#[must_use]
pub fn reading_order(mut boxes: Vec<LayoutBox>, cfg: &SegmentConfig) -> Vec<OrderedBox> {
    if boxes.is_empty() {
        return Vec::new();
    }

    boxes.sort_by(|a, b| a.coordinate.y1.total_cmp(&b.coordinate.y1));

    let ids = assign_blocks(&boxes, cfg);
    let mut ordered: Vec<OrderedBox> = boxes
        .into_iter()
        .zip(ids)
        .map(|(item, block_id)| OrderedBox { block_id, item })
        .collect();

    ordered.sort_by(|a, b| {
        a.block_id
            .cmp(&b.block_id)
            .then_with(|| a.item.coordinate.y1.total_cmp(&b.item.coordinate.y1))
    });

    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use udoc_core::BoundingBox;

    fn tb(label: &str, x1: f32, y1: f32, x2: f32, y2: f32, text: &str) -> LayoutBox {
        LayoutBox::new(label, BoundingBox::new(x1, y1, x2, y2)).with_text(text)
    }

    fn two_column_page() -> Vec<LayoutBox> {
        vec![
            tb("text", 400.0, 10.0, 500.0, 40.0, "right top"),
            tb("paragraph_title", 0.0, 0.0, 100.0, 20.0, "Title"),
            tb("text", 0.0, 25.0, 100.0, 80.0, "left body"),
            tb("text", 400.0, 320.0, 500.0, 360.0, "right bottom"),
        ]
    }

    #[test]
    fn ordering_keeps_title_with_its_paragraph() {
        let ordered = reading_order(two_column_page(), &SegmentConfig::default());
        let texts: Vec<&str> = ordered
            .iter()
            .map(|o| o.item.text_or_empty())
            .collect();
        let title_pos = texts.iter().position(|t| *t == "Title").unwrap();
        assert_eq!(texts[title_pos + 1], "left body");
        assert_eq!(ordered[title_pos].block_id, ordered[title_pos + 1].block_id);
    }

    #[test]
    fn ordering_is_total() {
        let page = two_column_page();
        let ordered = reading_order(page.clone(), &SegmentConfig::default());
        assert_eq!(ordered.len(), page.len());
    }

    #[test]
    fn ordering_is_idempotent() {
        let cfg = SegmentConfig::default();
        let once: Vec<LayoutBox> = reading_order(two_column_page(), &cfg)
            .into_iter()
            .map(|o| o.item)
            .collect();
        let twice: Vec<LayoutBox> = reading_order(once.clone(), &cfg)
            .into_iter()
            .map(|o| o.item)
            .collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_page_orders_to_empty() {
        assert!(reading_order(Vec::new(), &SegmentConfig::default()).is_empty());
    }

    #[test]
    fn columns_do_not_interleave() {
        let ordered = reading_order(two_column_page(), &SegmentConfig::default());
        let lefts: Vec<usize> = ordered
            .iter()
            .enumerate()
            .filter(|(_, o)| o.item.coordinate.x1 < 200.0)
            .map(|(i, _)| i)
            .collect();
        // Left-column boxes occupy consecutive positions.
        assert_eq!(lefts.len(), 2);
        assert_eq!(lefts[1], lefts[0] + 1);
    }

    #[test]
    fn into_sorted_carries_block_id() {
        let ordered = reading_order(two_column_page(), &SegmentConfig::default());
        let first = ordered[0].clone();
        let id = first.block_id;
        let sorted = first.into_sorted();
        assert_eq!(sorted.block_id, id);
    }
}
