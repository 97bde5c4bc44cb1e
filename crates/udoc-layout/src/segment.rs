//! Block segmentation engine.
//!
//! Groups one page's boxes into reading blocks. Multi-column pages are
//! handled by clustering boxes on their left edge; single-column pages rely
//! on the vertical-gap and label-transition heuristics so a title stays
//! attached to its paragraph while a caption glued under an image does not
//! merge with unrelated neighbors.

use once_cell::sync::Lazy;
use regex::Regex;
use udoc_core::LayoutBox;

/// Text starting with a numbered-list marker: circled digits, `(n)`, `n.`,
/// or `n)`.
static NUMBERED_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[①②③④⑤⑥⑦⑧⑨⑩]|\([0-9]+\)|[0-9]+\.|[0-9]+\))")
        .expect("valid numbered-marker regex")
});

/// Tuning knobs for block segmentation.
///
/// The thresholds are layout policy, not algorithm: documents rendered at a
/// different scale or from a different template override them while the
/// segmentation core stays unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentConfig {
    /// Two boxes whose left edges differ by less than this belong to the
    /// same column group (px).
    pub x_cluster_threshold: f32,
    /// Boxes whose top edges differ by less than this are treated as the
    /// same visual row even across a gap or label change (px).
    pub y_similarity_threshold: f32,
    /// Vertical gap between consecutive boxes that opens a new block (px).
    pub gap_threshold: f32,
    /// Labels considered titles.
    pub title_labels: Vec<String>,
    /// Labels considered body content.
    pub content_labels: Vec<String>,
    /// `(previous, current)` label pairs that stay in one block across a
    /// label change, e.g. a title followed by its paragraph.
    pub bridge_pairs: Vec<(String, String)>,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            x_cluster_threshold: 100.0,
            y_similarity_threshold: 250.0,
            gap_threshold: 50.0,
            title_labels: udoc_core::labels::DEFAULT_TITLE_LABELS
                .iter()
                .map(ToString::to_string)
                .collect(),
            content_labels: udoc_core::labels::DEFAULT_CONTENT_LABELS
                .iter()
                .map(ToString::to_string)
                .collect(),
            bridge_pairs: vec![(
                udoc_core::labels::PARAGRAPH_TITLE.to_string(),
                udoc_core::labels::TEXT.to_string(),
            )],
        }
    }
}

impl SegmentConfig {
    fn is_bridge(&self, prev: &str, curr: &str) -> bool {
        self.bridge_pairs
            .iter()
            .any(|(title, content)| prev == title && curr == content)
    }

    /// True for labels rendered as headings by the exporters.
    #[must_use]
    pub fn is_title_label(&self, label: &str) -> bool {
        self.title_labels.iter().any(|t| t == label)
    }
}

/// Assigns a block id to every box of one page.
///
/// The result is parallel to `boxes`: `out[i]` is the block id of `boxes[i]`.
/// Ids are unique within the page, allocated globally increasing across
/// column groups so a later `(block_id, y1)` sort cannot interleave unrelated
/// columns. Total: every box receives exactly one id; an empty input yields
/// an empty assignment.
#[must_use]
pub fn assign_blocks(boxes: &[LayoutBox], cfg: &SegmentConfig) -> Vec<usize> {
    // Column clustering: first-fit against the left edge of each group's
    // first member.
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (i, b) in boxes.iter().enumerate() {
        let x0 = b.coordinate.x1;
        let found = groups
            .iter_mut()
            .find(|g| (x0 - boxes[g[0]].coordinate.x1).abs() < cfg.x_cluster_threshold);
        match found {
            Some(group) => group.push(i),
            None => groups.push(vec![i]),
        }
    }

    // Within-column ordering by top edge.
    for group in &mut groups {
        group.sort_by(|&a, &b| boxes[a].coordinate.y1.total_cmp(&boxes[b].coordinate.y1));
    }

    const UNASSIGNED: usize = usize::MAX;
    let mut ids = vec![UNASSIGNED; boxes.len()];
    let mut next_id = 0usize;

    for group in &groups {
        let mut current = next_id;
        ids[group[0]] = current;

        for pair in group.windows(2) {
            let prev = &boxes[pair[0]];
            let curr = &boxes[pair[1]];

            let gap = curr.coordinate.y1 - prev.coordinate.y2;
            let y_similar =
                (curr.coordinate.y1 - prev.coordinate.y1).abs() < cfg.y_similarity_threshold;

            let mut new_block = false;
            if gap > cfg.gap_threshold && !y_similar {
                new_block = true;
            } else if curr.label != prev.label
                && !cfg.is_bridge(&prev.label, &curr.label)
                && !y_similar
            {
                new_block = true;
            }

            // A numbered-list marker opens its own block unless the boxes sit
            // on the same visual row.
            let text = curr.text_or_empty();
            if !text.is_empty() && NUMBERED_MARKER.is_match(text) && !y_similar {
                new_block = true;
            }

            if new_block {
                current += 1;
            }
            ids[pair[1]] = current;
        }

        next_id = current + 1;
    }

    // Defensive fallback: any box the column walk missed becomes a singleton
    // block, preserving total coverage.
    for id in &mut ids {
        if *id == UNASSIGNED {
            log::warn!("box escaped column clustering, assigning singleton block {next_id}");
            *id = next_id;
            next_id += 1;
        }
    }

    ids
}
