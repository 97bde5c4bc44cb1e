//! Record types exchanged with the external pipeline stages.
//!
//! The layout detector, OCR, and transcription collaborators are opaque; the
//! structs here model only their wire contracts. `LayoutBox` is an immutable
//! input value: segmentation results (block ids) are attached in derived
//! records, never written back into the input.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::geometry::BoundingBox;

/// One detected region of a page, as delivered by the layout detector.
///
/// `text` is absent until the external OCR step has run over the region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutBox {
    pub label: String,
    pub coordinate: BoundingBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl LayoutBox {
    #[must_use]
    pub fn new(label: impl Into<String>, coordinate: BoundingBox) -> Self {
        Self {
            label: label.into(),
            coordinate,
            text: None,
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Recognized text, or `""` when OCR has not populated the box.
    #[must_use]
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// One page of layout-detection output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Source image the boxes were detected on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_path: Option<PathBuf>,
    /// Page number; absent for non-paginated inputs such as a rendered image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_height: Option<u32>,
    #[serde(default)]
    pub boxes: Vec<LayoutBox>,
}

/// One entry of the per-page sorted output record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortedBox {
    pub label: String,
    pub text: String,
    pub coordinate: BoundingBox,
    pub block_id: usize,
}

/// Per-page "sorted" record consumed by the markdown/export collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortedPage {
    pub input_path: String,
    #[serde(default)]
    pub page_index: Option<u32>,
    pub sorted_texts: Vec<SortedBox>,
}

/// Per-object metadata record, one JSON file per extracted unit.
///
/// Field set and naming follow the downstream search/RAG consumer contract;
/// `page_num` is the string `"none"` for non-paginated sources. Never mutated
/// after it is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    pub created_at: String,
    pub modified_at: String,
    /// Source document name (folder name of the converted document).
    pub title: String,
    pub page_num: String,
    /// Page index value (footer text), or the run-wide output number.
    pub index: Option<String>,
    /// `"<page_num>_<label>"`, or `"none_<label>"` when unpaginated.
    pub id: String,
    /// `"<doc>_<page>_<NN>"` with a 2-digit sequence number.
    pub file_name: String,
    pub file_path: String,
    pub text: Option<String>,
    pub tags: Option<Vec<String>>,
    pub con_type: String,
    pub subtitle: Option<String>,
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub box_coords: Option<BoundingBox>,
}

/// On-disk envelope: metadata files nest the record under a `metadata` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub metadata: ObjectMetadata,
}

/// Timestamp in the `YYYY.MM.DD` form the metadata records carry.
#[must_use]
pub fn date_stamp() -> String {
    chrono::Local::now().format("%Y.%m.%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_box_without_text_serializes_compactly() {
        let b = LayoutBox::new("text", BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        let json = serde_json::to_value(&b).unwrap();
        assert!(json.get("text").is_none());
    }

    #[test]
    fn metadata_record_roundtrip_keeps_contract_fields() {
        let record = MetadataRecord {
            metadata: ObjectMetadata {
                created_at: "2026.08.07".into(),
                modified_at: "2026.08.07".into(),
                title: "report".into(),
                page_num: "005".into(),
                index: Some("12".into()),
                id: "005_image".into(),
                file_name: "report_005_01".into(),
                file_path: "/out/report_005_01.png".into(),
                text: None,
                tags: None,
                con_type: "image".into(),
                subtitle: Some("Figure 3".into()),
                caption: None,
                box_coords: Some(BoundingBox::new(1.0, 2.0, 3.0, 4.0)),
            },
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: MetadataRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
        assert!(json.contains("\"metadata\""));
        assert!(json.contains("\"con_type\""));
    }

    #[test]
    fn date_stamp_is_dotted() {
        let stamp = date_stamp();
        assert_eq!(stamp.len(), 10);
        assert_eq!(stamp.matches('.').count(), 2);
    }
}
