//! Layout-JSON ingest.
//!
//! The layout detector writes one JSON per page, with the box list under a
//! `boxes` key (`coordinate` arrays) or, for hand-labeled pages, a `shapes`
//! key (`points` arrays). Individual malformed boxes are skipped with a
//! warning rather than failing the page.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use udoc_core::{labels, BoundingBox, LayoutBox, PageRecord, Result, UdocError};

static PAGE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"layout_([0-9]+)").expect("valid page-number regex"));

/// Label filtering applied while reading a page.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestConfig {
    /// Labels to keep; `None` keeps every label.
    pub include_labels: Option<Vec<String>>,
    pub exclude_labels: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            include_labels: Some(
                labels::DEFAULT_INCLUDE_LABELS
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
            ),
            exclude_labels: Vec::new(),
        }
    }
}

impl IngestConfig {
    /// Keeps every label; used by stages that need titles and footers too.
    #[must_use]
    pub fn unfiltered() -> Self {
        Self {
            include_labels: None,
            exclude_labels: Vec::new(),
        }
    }

    fn keeps(&self, label: &str) -> bool {
        if self.exclude_labels.iter().any(|l| l == label) {
            return false;
        }
        match &self.include_labels {
            Some(included) => included.iter().any(|l| l == label),
            None => true,
        }
    }
}

/// Page number encoded in a layout file stem (`layout_012` → `"012"`).
///
/// The digits are kept as a string so zero-padding survives into ids and
/// file names.
#[must_use]
pub fn page_number_from_stem(stem: &str) -> Option<&str> {
    PAGE_NUMBER
        .captures(stem)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Reads one layout-detection JSON into a [`PageRecord`].
///
/// A box missing its label or a 4-element coordinate array is dropped with a
/// warning (recovered locally, the page survives). A record with neither
/// `boxes` nor `shapes` yields an empty page.
pub fn load_page(path: &Path, cfg: &IngestConfig) -> Result<PageRecord> {
    let raw = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&raw)?;
    Ok(page_from_value(&value, path, cfg))
}

fn page_from_value(value: &Value, path: &Path, cfg: &IngestConfig) -> PageRecord {
    let (items, coord_key) = if let Some(items) = value.get("boxes").and_then(Value::as_array) {
        (items.as_slice(), "coordinate")
    } else if let Some(items) = value.get("shapes").and_then(Value::as_array) {
        (items.as_slice(), "points")
    } else {
        log::warn!("layout record {} has neither 'boxes' nor 'shapes'", path.display());
        (&[] as &[Value], "coordinate")
    };

    let mut boxes = Vec::with_capacity(items.len());
    for item in items {
        match parse_box(item, coord_key) {
            Ok(b) => {
                if cfg.keeps(&b.label) {
                    boxes.push(b);
                }
            }
            Err(err) => log::warn!("skipping box in {}: {err}", path.display()),
        }
    }

    PageRecord {
        input_path: value
            .get("input_path")
            .and_then(Value::as_str)
            .map(Into::into),
        page_index: value
            .get("page_index")
            .and_then(Value::as_u64)
            .map(|n| n as u32),
        image_width: value
            .get("imageWidth")
            .and_then(Value::as_u64)
            .map(|n| n as u32),
        image_height: value
            .get("imageHeight")
            .and_then(Value::as_u64)
            .map(|n| n as u32),
        boxes,
    }
}

fn parse_box(item: &Value, coord_key: &str) -> Result<LayoutBox> {
    let label = item
        .get("label")
        .and_then(Value::as_str)
        .ok_or_else(|| UdocError::MalformedInput("box without a label".into()))?;

    let coords = item
        .get(coord_key)
        .and_then(Value::as_array)
        .filter(|c| c.len() == 4)
        .ok_or_else(|| {
            UdocError::MalformedInput(format!("box '{label}' without a 4-element {coord_key}"))
        })?;

    let mut c = [0.0f32; 4];
    for (slot, v) in c.iter_mut().zip(coords) {
        *slot = v.as_f64().ok_or_else(|| {
            UdocError::MalformedInput(format!("box '{label}' has a non-numeric coordinate"))
        })? as f32;
    }

    let mut layout_box = LayoutBox::new(label, BoundingBox::from(c));
    if let Some(text) = item.get("text").and_then(Value::as_str) {
        layout_box = layout_box.with_text(text);
    }
    Ok(layout_box)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_json(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn reads_boxes_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(
            &dir,
            "layout_001.json",
            r#"{
                "input_path": "/img/page.png",
                "page_index": 1,
                "imageWidth": 1280,
                "imageHeight": 960,
                "boxes": [
                    {"label": "text", "coordinate": [0, 0, 100, 20], "text": "hello"},
                    {"label": "footer", "coordinate": [0, 900, 100, 920], "text": "7"}
                ]
            }"#,
        );
        let page = load_page(&path, &IngestConfig::default()).unwrap();
        assert_eq!(page.boxes.len(), 2);
        assert_eq!(page.page_index, Some(1));
        assert_eq!(page.image_width, Some(1280));
        assert_eq!(page.boxes[0].text_or_empty(), "hello");
    }

    #[test]
    fn reads_shapes_key_with_points() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(
            &dir,
            "layout_002.json",
            r#"{"shapes": [{"label": "text", "points": [1, 2, 3, 4]}]}"#,
        );
        let page = load_page(&path, &IngestConfig::default()).unwrap();
        assert_eq!(page.boxes.len(), 1);
        assert_eq!(page.boxes[0].coordinate, BoundingBox::new(1.0, 2.0, 3.0, 4.0));
    }

    #[test]
    fn malformed_box_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(
            &dir,
            "layout_003.json",
            r#"{"boxes": [
                {"coordinate": [0, 0, 1, 1]},
                {"label": "text", "coordinate": [0, 0]},
                {"label": "text", "coordinate": [0, 0, 10, 10], "text": "kept"}
            ]}"#,
        );
        let page = load_page(&path, &IngestConfig::default()).unwrap();
        assert_eq!(page.boxes.len(), 1);
        assert_eq!(page.boxes[0].text_or_empty(), "kept");
    }

    #[test]
    fn label_filter_applies() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(
            &dir,
            "layout_004.json",
            r#"{"boxes": [
                {"label": "image", "coordinate": [0, 0, 10, 10]},
                {"label": "text", "coordinate": [0, 20, 10, 30]}
            ]}"#,
        );
        let page = load_page(&path, &IngestConfig::default()).unwrap();
        assert_eq!(page.boxes.len(), 1);
        assert_eq!(page.boxes[0].label, "text");

        let all = load_page(&path, &IngestConfig::unfiltered()).unwrap();
        assert_eq!(all.boxes.len(), 2);
    }

    #[test]
    fn missing_box_keys_yield_empty_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(&dir, "layout_005.json", r#"{"page_index": 5}"#);
        let page = load_page(&path, &IngestConfig::default()).unwrap();
        assert!(page.boxes.is_empty());
    }

    #[test]
    fn page_number_keeps_zero_padding() {
        assert_eq!(page_number_from_stem("layout_007"), Some("007"));
        assert_eq!(page_number_from_stem("layout_12"), Some("12"));
        assert_eq!(page_number_from_stem("rendered"), None);
    }
}
