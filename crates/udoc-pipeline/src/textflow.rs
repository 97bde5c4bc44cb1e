//! Per-page text flow: reading order + page metadata.
//!
//! For each layout JSON this stage emits the `*_sorted.json` record consumed
//! by the markdown exporter, plus a page-level metadata record for the
//! downstream index. Both files are written whole; a failed page leaves no
//! partial output behind.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use udoc_core::{date_stamp, labels, MetadataRecord, ObjectMetadata, Result, SortedPage};
use udoc_layout::{associate, reading_order, AssociationConfig, SegmentConfig};

use crate::ingest::{load_page, IngestConfig};

/// 3-digit page number embedded in a file stem (`layout_005` → `005`).
static PAGE_IN_STEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_([0-9]{3})_?").expect("valid page regex"));

/// Trailing page-number suffix, stripped to recover the document base name.
static PAGE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_[0-9]{3}(?:_[0-9]+)?$").expect("valid page-suffix regex"));

/// Configuration for the text flow stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextFlowConfig {
    pub ingest: IngestConfig,
    pub segment: SegmentConfig,
    pub association: AssociationConfig,
}

/// Artifacts written for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFlowOutput {
    pub sorted_path: PathBuf,
    pub metadata_path: PathBuf,
    pub page: SortedPage,
}

/// Path of the sorted record a page will produce; the skip-existing probe.
#[must_use]
pub fn sorted_output_path(json_path: &Path, output_dir: &Path) -> PathBuf {
    let stem = file_stem(json_path);
    output_dir.join(format!("{stem}_sorted.json"))
}

/// Orders one page and writes its sorted record and page metadata.
pub fn process_layout_file(
    json_path: &Path,
    output_dir: &Path,
    doc_name: &str,
    cfg: &TextFlowConfig,
) -> Result<TextFlowOutput> {
    let record = load_page(json_path, &cfg.ingest)?;
    let page_index = record.page_index;

    // Footer text doubles as the page index value in the metadata record.
    let footer_text = associate::page_footer(&record.boxes, &cfg.association)
        .and_then(|b| b.text.clone())
        .filter(|t| !t.is_empty());

    let sorted_texts = reading_order(record.boxes, &cfg.segment)
        .into_iter()
        .map(udoc_layout::OrderedBox::into_sorted)
        .collect();

    let page = SortedPage {
        input_path: json_path.display().to_string(),
        page_index,
        sorted_texts,
    };

    std::fs::create_dir_all(output_dir)?;

    let sorted_path = sorted_output_path(json_path, output_dir);
    write_whole(&sorted_path, &serde_json::to_string_pretty(&page)?)?;
    log::info!("wrote sorted page {}", sorted_path.display());

    let stem = file_stem(json_path);
    let page_num = PAGE_IN_STEM
        .captures(&stem)
        .and_then(|c| c.get(1))
        .map_or_else(|| "000".to_string(), |m| m.as_str().to_string());
    let base_name = PAGE_SUFFIX.replace(&stem, "").into_owned();
    let image_path = json_path.with_extension("png");

    let stamp = date_stamp();
    let metadata = MetadataRecord {
        metadata: ObjectMetadata {
            created_at: stamp.clone(),
            modified_at: stamp,
            title: doc_name.to_string(),
            page_num: page_num.clone(),
            index: footer_text,
            id: format!("{page_num}_{}", labels::TEXT),
            file_name: stem,
            file_path: image_path.display().to_string(),
            text: None,
            tags: None,
            con_type: labels::TEXT.to_string(),
            subtitle: None,
            caption: None,
            box_coords: None,
        },
    };

    let metadata_path = output_dir.join(format!("{base_name}_{page_num}_01_metadata.json"));
    write_whole(&metadata_path, &serde_json::to_string_pretty(&metadata)?)?;
    log::info!("wrote page metadata {}", metadata_path.display());

    Ok(TextFlowOutput {
        sorted_path,
        metadata_path,
        page,
    })
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map_or_else(String::new, |s| s.to_string_lossy().into_owned())
}

fn write_whole(path: &Path, body: &str) -> Result<()> {
    std::fs::write(path, body)?;
    Ok(())
}
