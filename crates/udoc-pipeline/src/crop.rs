//! Crop extraction: visual objects to files + metadata records.
//!
//! For every eligible image/chart box on a page this stage crops the source
//! image (with a small padding, clamped to the image bounds), writes the crop
//! as `<doc>_<page>_<NN>.png`, and writes the sibling metadata record linking
//! the object to its nearest title and page footer.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use udoc_core::{
    date_stamp, labels, BoundingBox, MetadataRecord, ObjectMetadata, Result, UdocError,
};
use udoc_layout::{associate, AssociationConfig, SequenceCounter, SizeFilter};

use crate::ingest::{load_page, page_number_from_stem, IngestConfig};

static OCR_PAGE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#{3,4}[0-9]{3}\.png").expect("valid OCR marker regex"));

/// Configuration for the crop stage.
#[derive(Debug, Clone, PartialEq)]
pub struct CropConfig {
    /// Labels eligible for cropping.
    pub target_labels: Vec<String>,
    /// Padding added around the bounding box before cropping (px).
    pub padding: f32,
    pub size_filter: SizeFilter,
    pub association: AssociationConfig,
    /// Stamp the run-wide output number into the `index` field instead of
    /// the footer text.
    pub add_numbering: bool,
    /// Directory of per-document OCR markdown (`<doc>.md`), used to fill the
    /// record's `text` field.
    pub ocr_results_dir: Option<PathBuf>,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            target_labels: labels::DEFAULT_CROP_LABELS
                .iter()
                .map(ToString::to_string)
                .collect(),
            padding: 5.0,
            size_filter: SizeFilter::crop_defaults(),
            association: AssociationConfig::default(),
            add_numbering: true,
            ocr_results_dir: None,
        }
    }
}

/// Result of cropping one page.
#[derive(Debug, Clone, PartialEq)]
pub struct CropOutcome {
    pub records: Vec<MetadataRecord>,
    /// Run-wide numbering counter after this page; advanced only for crops
    /// that were actually written.
    pub next_number: u32,
}

/// Extracts the OCR text for one page from a per-document OCR markdown file.
///
/// Pages are delimited by `###NNN.png` (or `####NNN.png`) markers. Returns
/// `None` when the page's marker is absent or its section is empty.
#[must_use]
pub fn page_ocr_text(content: &str, page_num: &str) -> Option<String> {
    let formatted = format!("{page_num:0>3}");
    let target = format!("###{formatted}.png");

    let markers: Vec<regex::Match<'_>> = OCR_PAGE_MARKER.find_iter(content).collect();
    let position = markers.iter().position(|m| m.as_str().ends_with(&target))?;

    let start = markers[position].start();
    let end = markers
        .get(position + 1)
        .map_or(content.len(), regex::Match::start);

    let section = content[start..end].trim();
    if section.is_empty() || section == markers[position].as_str() {
        None
    } else {
        Some(section.to_string())
    }
}

/// Crops every eligible object on one page.
///
/// `start_number` is the run-wide numbering counter; the returned
/// `next_number` reflects only confirmed written outputs. The page image is
/// resolved from the record's `input_path` when it exists, falling back to
/// the layout image next to the JSON; neither existing is a `MissingAsset`
/// failure for the unit.
pub fn crop_page(
    json_path: &Path,
    output_dir: &Path,
    doc_name: &str,
    cfg: &CropConfig,
    start_number: u32,
) -> Result<CropOutcome> {
    let page = load_page(json_path, &IngestConfig::unfiltered())?;

    let stem = json_path
        .file_stem()
        .map_or_else(String::new, |s| s.to_string_lossy().into_owned());
    let page_num = page_number_from_stem(&stem)
        .map_or_else(|| "none".to_string(), ToString::to_string);
    let display_page = if page_num == "none" { "0" } else { page_num.as_str() };

    let layout_image = json_path.with_extension("png");
    let source_image = match &page.input_path {
        Some(original) if original.exists() => original.clone(),
        _ if layout_image.exists() => layout_image.clone(),
        _ => return Err(UdocError::MissingAsset(layout_image)),
    };
    let img = image::open(&source_image).map_err(image_error)?;

    let ocr_text = match (&cfg.ocr_results_dir, page_num.as_str()) {
        (Some(dir), num) if num != "none" => std::fs::read_to_string(dir.join(format!("{doc_name}.md")))
            .ok()
            .and_then(|content| page_ocr_text(&content, num)),
        _ => None,
    };

    std::fs::create_dir_all(output_dir)?;

    let mut sequence = SequenceCounter::new();
    let mut number = start_number;
    let mut records = Vec::new();
    let stamp = date_stamp();

    for object in &page.boxes {
        if !cfg.target_labels.iter().any(|t| t == &object.label) {
            continue;
        }
        if !cfg.size_filter.admits(&object.label, &object.coordinate) {
            continue;
        }

        let linked = associate::associate(&object.coordinate, &page.boxes, &cfg.association);
        let seq = sequence.next(&page_num, linked.subtitle.as_deref(), &object.label);

        let file_name = format!("{doc_name}_{display_page}_{seq:02}");
        let crop_path = output_dir.join(format!("{file_name}.png"));

        let region = padded_region(&object.coordinate, cfg.padding, img.width(), img.height());
        let Some((x, y, w, h)) = region else {
            log::warn!("degenerate crop region for {file_name}, skipping");
            continue;
        };
        img.crop_imm(x, y, w, h)
            .save(&crop_path)
            .map_err(image_error)?;
        log::info!("cropped {} -> {}", object.label, crop_path.display());

        let index = if cfg.add_numbering {
            Some(number.to_string())
        } else {
            linked.index.clone()
        };

        let record = MetadataRecord {
            metadata: ObjectMetadata {
                created_at: stamp.clone(),
                modified_at: stamp.clone(),
                title: doc_name.to_string(),
                page_num: page_num.clone(),
                index,
                id: format!("{page_num}_{}", object.label),
                file_name: file_name.clone(),
                file_path: crop_path.display().to_string(),
                text: ocr_text.clone(),
                tags: None,
                con_type: object.label.clone(),
                subtitle: linked.subtitle.clone(),
                caption: None,
                box_coords: Some(object.coordinate),
            },
        };

        let metadata_path = output_dir.join(format!("{file_name}_metadata.json"));
        std::fs::write(&metadata_path, serde_json::to_string_pretty(&record)?)?;

        // Confirmed output: only now does the run-wide number advance.
        number += 1;
        records.push(record);
    }

    Ok(CropOutcome {
        records,
        next_number: number,
    })
}

/// Crop window with padding, clamped to the image; `None` when the box lies
/// outside the image entirely.
fn padded_region(
    bbox: &BoundingBox,
    padding: f32,
    img_width: u32,
    img_height: u32,
) -> Option<(u32, u32, u32, u32)> {
    let b = bbox.normalized();
    let x1 = (b.x1 - padding).max(0.0) as u32;
    let y1 = (b.y1 - padding).max(0.0) as u32;
    let x2 = ((b.x2 + padding).min(img_width as f32)).max(0.0) as u32;
    let y2 = ((b.y2 + padding).min(img_height as f32)).max(0.0) as u32;
    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    Some((x1, y1, x2 - x1, y2 - y1))
}

fn image_error(err: image::ImageError) -> UdocError {
    match err {
        image::ImageError::IoError(io) => UdocError::Io(io),
        other => UdocError::MalformedInput(format!("image: {other}")),
    }
}
