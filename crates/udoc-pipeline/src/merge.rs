//! Per-document metadata aggregation.
//!
//! The crop and text stages leave one `*_metadata.json` per object scattered
//! through the output tree; downstream indexing wants one array per document.
//! Records are grouped by their `title` field (the document name), falling
//! back to the containing folder when a record carries no title.

use std::collections::BTreeMap;
use std::path::Path;

use udoc_core::{MetadataRecord, Result, UdocError};

/// Counters reported by a merge run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Metadata files successfully read.
    pub processed_files: usize,
    /// Merged per-document files written.
    pub created_files: usize,
}

/// Merges every `*_metadata.json` under `root` into one `<title>.json` array
/// per document in `output_dir`.
///
/// Unreadable member files are logged and skipped; they never fail the merge.
pub fn merge_metadata(root: &Path, output_dir: &Path) -> Result<MergeStats> {
    let pattern = root.join("**").join("*_metadata.json");
    let pattern = pattern.to_string_lossy().into_owned();

    let mut groups: BTreeMap<String, Vec<MetadataRecord>> = BTreeMap::new();
    let mut stats = MergeStats::default();

    let mut paths: Vec<_> = glob::glob(&pattern)
        .map_err(|e| UdocError::MalformedInput(format!("bad glob pattern: {e}")))?
        .filter_map(std::result::Result::ok)
        .collect();
    paths.sort();

    for path in paths {
        let record: MetadataRecord = match std::fs::read_to_string(&path)
            .map_err(UdocError::from)
            .and_then(|raw| serde_json::from_str(&raw).map_err(UdocError::from))
        {
            Ok(record) => record,
            Err(err) => {
                log::warn!("skipping unreadable metadata {}: {err}", path.display());
                continue;
            }
        };

        let title = if record.metadata.title.is_empty() {
            path.parent()
                .and_then(Path::file_name)
                .map_or_else(|| "unknown".to_string(), |n| n.to_string_lossy().into_owned())
        } else {
            record.metadata.title.clone()
        };

        groups.entry(title).or_default().push(record);
        stats.processed_files += 1;
    }

    std::fs::create_dir_all(output_dir)?;
    for (title, records) in &groups {
        let out_path = output_dir.join(format!("{title}.json"));
        std::fs::write(&out_path, serde_json::to_string_pretty(records)?)?;
        log::info!("merged {} records into {}", records.len(), out_path.display());
        stats.created_files += 1;
    }

    Ok(stats)
}
