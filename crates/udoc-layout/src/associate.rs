//! Geometric metadata association.
//!
//! For a cropped object, finds the nearest title within a distance budget and
//! the page's footer/index text, and gates crop eligibility on per-label size
//! limits. Association misses are absent values, never errors.

use std::collections::HashMap;

use udoc_core::{labels, BoundingBox, LayoutBox};

/// Policy for linking cropped objects to surrounding text.
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationConfig {
    /// Labels eligible as nearest-title candidates.
    pub title_labels: Vec<String>,
    /// Label whose text is the page index value.
    pub footer_label: String,
    /// Maximum distance (px) at which a title is still associated.
    pub max_title_distance: f32,
}

impl Default for AssociationConfig {
    fn default() -> Self {
        Self {
            title_labels: vec![labels::FIGURE_TITLE.to_string()],
            footer_label: labels::FOOTER.to_string(),
            max_title_distance: 50.0,
        }
    }
}

/// Result of associating one target box with its page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Association {
    /// Text of the nearest title within budget.
    pub subtitle: Option<String>,
    /// Text of the page footer.
    pub index: Option<String>,
}

/// Nearest title-labeled box within the configured distance budget.
///
/// Strictly-less comparison: the first candidate seen at the minimum distance
/// wins. A candidate at exactly the budget is accepted; none within budget
/// means no association.
#[must_use]
pub fn nearest_title<'a>(
    target: &BoundingBox,
    boxes: &'a [LayoutBox],
    cfg: &AssociationConfig,
) -> Option<&'a LayoutBox> {
    let mut best: Option<&LayoutBox> = None;
    let mut best_distance = f32::INFINITY;

    for candidate in boxes {
        if !cfg.title_labels.iter().any(|t| t == &candidate.label) {
            continue;
        }
        let d = target.distance(&candidate.coordinate);
        if d < best_distance {
            best_distance = d;
            best = Some(candidate);
        }
    }

    if best_distance <= cfg.max_title_distance {
        best
    } else {
        None
    }
}

/// First footer-labeled box on the page, in scan order.
///
/// Footers are assumed unique per page, so no distance reasoning is applied.
#[must_use]
pub fn page_footer<'a>(boxes: &'a [LayoutBox], cfg: &AssociationConfig) -> Option<&'a LayoutBox> {
    boxes.iter().find(|b| b.label == cfg.footer_label)
}

/// Builds the association record for one target box.
#[must_use]
pub fn associate(
    target: &BoundingBox,
    boxes: &[LayoutBox],
    cfg: &AssociationConfig,
) -> Association {
    Association {
        subtitle: nearest_title(target, boxes, cfg)
            .and_then(|b| b.text.clone())
            .filter(|t| !t.is_empty()),
        index: page_footer(boxes, cfg)
            .and_then(|b| b.text.clone())
            .filter(|t| !t.is_empty()),
    }
}

/// Per-label crop eligibility limits.
///
/// The minimum check is an OR: a box is rejected only when width AND height
/// are both under the minimum, so content that is small in one dimension but
/// large in the other is kept. The maximum check is an AND on acceptance:
/// either dimension exceeding its limit rejects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SizeFilter {
    min: HashMap<String, (f32, f32)>,
    max: HashMap<String, (f32, f32)>,
}

impl SizeFilter {
    /// Default policy for crop targets: no minimums, 800x850 maximums for
    /// `image` and `chart`.
    #[must_use]
    pub fn crop_defaults() -> Self {
        let mut filter = Self::default();
        for label in labels::DEFAULT_CROP_LABELS {
            filter.set_max(label, 800.0, 850.0);
        }
        filter
    }

    pub fn set_min(&mut self, label: &str, width: f32, height: f32) {
        self.min.insert(label.to_string(), (width, height));
    }

    pub fn set_max(&mut self, label: &str, width: f32, height: f32) {
        self.max.insert(label.to_string(), (width, height));
    }

    /// Applies the same limits to every label in `labels`.
    pub fn set_uniform(
        &mut self,
        labels: &[impl AsRef<str>],
        min: (f32, f32),
        max: (f32, f32),
    ) {
        for label in labels {
            self.set_min(label.as_ref(), min.0, min.1);
            self.set_max(label.as_ref(), max.0, max.1);
        }
    }

    /// Whether a box of the given label passes the size gate.
    #[must_use]
    pub fn admits(&self, label: &str, bbox: &BoundingBox) -> bool {
        let (width, height) = bbox.size();

        let (min_w, min_h) = self.min.get(label).copied().unwrap_or((0.0, 0.0));
        if width < min_w && height < min_h {
            log::debug!("box below minimum size: {width}x{height} < {min_w}x{min_h}");
            return false;
        }

        let (max_w, max_h) = self
            .max
            .get(label)
            .copied()
            .unwrap_or((f32::INFINITY, f32::INFINITY));
        if width > max_w || height > max_h {
            log::debug!("box above maximum size: {width}x{height} > {max_w}x{max_h}");
            return false;
        }

        true
    }
}

/// Sequence numbers for output file naming.
///
/// Objects sharing a `(page, subtitle-or-none, label)` key are numbered 1, 2,
/// ... in processing order; the numbers are unique and monotonic within the
/// key for the lifetime of the counter (one page's crop pass).
#[derive(Debug, Default)]
pub struct SequenceCounter {
    counters: HashMap<String, u32>,
}

impl SequenceCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Next sequence number for the group, starting at 1.
    pub fn next(&mut self, page: &str, subtitle: Option<&str>, label: &str) -> u32 {
        let key = format!("{page}_{}_{label}", subtitle.unwrap_or("none"));
        let counter = self.counters.entry(key).or_insert(0);
        *counter += 1;
        *counter
    }
}
