//! Document markdown export.
//!
//! Merges a document's per-page sorted records into one markdown file:
//! pages in page-number order, boxes grouped by reading block, footers kept
//! out of the body, title labels rendered bold. Pages with almost no text
//! (decorative or empty scans) are dropped, and long OCR texts pass through
//! a repeated-phrase collapse since recognition models tend to stutter on
//! ornamental regions.

use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use udoc_core::{labels, Result, SortedPage, UdocError};

static PAGE_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"layout_([0-9]+)").expect("valid page-digits regex"));

/// Longest phrase length (in words) considered by the repetition collapse.
const MAX_PHRASE_WORDS: usize = 15;
/// Texts shorter than this skip the repetition collapse.
const LONG_TEXT_CHARS: usize = 100;

/// Configuration for markdown export.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkdownConfig {
    /// Minimum accumulated text length for a page to be emitted.
    pub min_page_length: usize,
    /// Consecutive occurrences required before a phrase is collapsed.
    pub min_repetitions: usize,
    /// Labels rendered bold.
    pub title_labels: Vec<String>,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            min_page_length: 50,
            min_repetitions: 4,
            title_labels: vec![labels::PARAGRAPH_TITLE.to_string()],
        }
    }
}

/// Groups `*_sorted.json` files by document folder, pages in number order.
pub fn collect_sorted_pages(root: &Path) -> Result<BTreeMap<String, Vec<PathBuf>>> {
    let pattern = root.join("**").join("*_sorted.json");
    let pattern = pattern.to_string_lossy().into_owned();

    let mut documents: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for entry in glob::glob(&pattern)
        .map_err(|e| UdocError::MalformedInput(format!("bad glob pattern: {e}")))?
        .filter_map(std::result::Result::ok)
    {
        let doc = entry
            .parent()
            .and_then(Path::file_name)
            .map_or_else(|| "unknown".to_string(), |n| n.to_string_lossy().into_owned());
        documents.entry(doc).or_default().push(entry);
    }

    for files in documents.values_mut() {
        files.sort_by_key(|p| page_number_of(p));
    }
    Ok(documents)
}

fn page_number_of(path: &Path) -> u32 {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .and_then(|stem| {
            PAGE_DIGITS
                .captures(&stem)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse().ok())
        })
        .unwrap_or(0)
}

/// Collapses a phrase of 2..=15 words repeated `min_repetitions`-or-more
/// times consecutively down to a single occurrence.
///
/// Longer phrases are tried first so a repeating sentence collapses as a
/// whole rather than word by word. Whitespace is normalized to single
/// spaces, matching the word-level pass of the original cleanup.
#[must_use]
pub fn collapse_repeated_phrases(text: &str, min_repetitions: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if min_repetitions == 0 || words.len() < min_repetitions * 2 {
        return text.to_string();
    }

    let top = MAX_PHRASE_WORDS.min(words.len() / min_repetitions);
    let mut result: Vec<&str> = Vec::with_capacity(words.len());
    let mut i = 0;

    while i < words.len() {
        let mut matched = false;
        for phrase_len in (2..=top).rev() {
            if i + phrase_len * min_repetitions > words.len() {
                continue;
            }
            let phrase = &words[i..i + phrase_len];
            let mut count = 1;
            let mut j = i + phrase_len;
            while j + phrase_len <= words.len() && &words[j..j + phrase_len] == phrase {
                count += 1;
                j += phrase_len;
            }
            if count >= min_repetitions {
                result.extend_from_slice(phrase);
                i = j;
                matched = true;
                break;
            }
        }
        if !matched {
            result.push(words[i]);
            i += 1;
        }
    }

    result.join(" ")
}

/// Renders one document's pages to markdown.
#[must_use]
pub fn document_markdown(
    doc_name: &str,
    pages: &[(u32, SortedPage)],
    cfg: &MarkdownConfig,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {doc_name}\n");

    let mut emitted_any = false;
    for (page_number, page) in pages {
        if page.sorted_texts.is_empty() {
            continue;
        }

        let total_length: usize = page
            .sorted_texts
            .iter()
            .map(|t| {
                let trimmed = t.text.trim();
                if trimmed.is_empty() {
                    0
                } else {
                    trimmed.chars().count() + 1
                }
            })
            .sum();
        if total_length < cfg.min_page_length {
            log::debug!("page {page_number}: {total_length} chars below minimum, dropped");
            continue;
        }

        if emitted_any {
            out.push_str("---\n\n");
        }
        emitted_any = true;
        let _ = writeln!(out, "## Page {page_number}\n");

        // Group by reading block; insertion order inside a block is already
        // the reading order.
        let mut blocks: BTreeMap<usize, Vec<&udoc_core::SortedBox>> = BTreeMap::new();
        for item in &page.sorted_texts {
            blocks.entry(item.block_id).or_default().push(item);
        }

        let mut seen: HashSet<String> = HashSet::new();
        for items in blocks.values() {
            for item in items {
                let content = item.text.trim();
                if content.is_empty() || seen.contains(content) {
                    continue;
                }
                if item.label == labels::FOOTER {
                    // Footer text lives in the metadata record, not the body.
                    continue;
                }
                seen.insert(content.to_string());

                let mut content = content.to_string();
                if content.chars().count() > LONG_TEXT_CHARS {
                    let cleaned = collapse_repeated_phrases(&content, cfg.min_repetitions);
                    if cleaned != content {
                        log::debug!(
                            "page {page_number}: collapsed repetition {} -> {} chars",
                            content.chars().count(),
                            cleaned.chars().count()
                        );
                        content = cleaned;
                    }
                }

                if cfg.title_labels.iter().any(|t| t == &item.label) {
                    let _ = writeln!(out, "**{content}**\n");
                } else {
                    let _ = writeln!(out, "{content}\n");
                }
            }
        }
    }

    out
}

/// Loads a document's sorted pages and writes `<doc>.md`.
pub fn export_document(
    doc_name: &str,
    files: &[PathBuf],
    output_dir: &Path,
    cfg: &MarkdownConfig,
) -> Result<PathBuf> {
    let mut pages = Vec::with_capacity(files.len());
    for path in files {
        let raw = std::fs::read_to_string(path)?;
        match serde_json::from_str::<SortedPage>(&raw) {
            Ok(page) => pages.push((page_number_of(path), page)),
            Err(err) => log::warn!("skipping unreadable sorted page {}: {err}", path.display()),
        }
    }

    std::fs::create_dir_all(output_dir)?;
    let out_path = output_dir.join(format!("{doc_name}.md"));
    std::fs::write(&out_path, document_markdown(doc_name, &pages, cfg))?;
    log::info!("wrote markdown {}", out_path.display());
    Ok(out_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use udoc_core::{BoundingBox, SortedBox};

    fn sb(label: &str, text: &str, block_id: usize, y: f32) -> SortedBox {
        SortedBox {
            label: label.to_string(),
            text: text.to_string(),
            coordinate: BoundingBox::new(0.0, y, 100.0, y + 20.0),
            block_id,
        }
    }

    fn page(texts: Vec<SortedBox>) -> SortedPage {
        SortedPage {
            input_path: "layout_001.json".into(),
            page_index: Some(1),
            sorted_texts: texts,
        }
    }

    #[test]
    fn collapse_folds_repeated_phrases() {
        let text = "lorem ipsum lorem ipsum lorem ipsum lorem ipsum tail";
        assert_eq!(collapse_repeated_phrases(text, 4), "lorem ipsum tail");
    }

    #[test]
    fn collapse_leaves_short_repetition_alone() {
        let text = "lorem ipsum lorem ipsum tail";
        assert_eq!(collapse_repeated_phrases(text, 4), text);
    }

    #[test]
    fn collapse_prefers_longer_phrases() {
        let text = "a b c a b c a b c a b c";
        assert_eq!(collapse_repeated_phrases(text, 4), "a b c");
    }

    #[test]
    fn footer_is_excluded_and_titles_are_bold() {
        let long_body = "body text that is long enough to pass the minimum page length gate for sure";
        let pages = vec![(
            1,
            page(vec![
                sb("paragraph_title", "Heading", 0, 0.0),
                sb("text", long_body, 0, 25.0),
                sb("footer", "41", 1, 900.0),
            ]),
        )];
        let md = document_markdown("report", &pages, &MarkdownConfig::default());
        assert!(md.contains("# report"));
        assert!(md.contains("## Page 1"));
        assert!(md.contains("**Heading**"));
        assert!(md.contains(long_body));
        assert!(!md.contains("41"));
    }

    #[test]
    fn short_pages_are_dropped() {
        let pages = vec![(1, page(vec![sb("text", "tiny", 0, 0.0)]))];
        let md = document_markdown("report", &pages, &MarkdownConfig::default());
        assert!(!md.contains("## Page 1"));
    }

    #[test]
    fn duplicate_texts_emit_once_per_page() {
        let repeated = "the same ornamental header repeated across columns on this page body";
        let pages = vec![(
            1,
            page(vec![
                sb("text", repeated, 0, 0.0),
                sb("text", repeated, 1, 100.0),
            ]),
        )];
        let md = document_markdown("report", &pages, &MarkdownConfig::default());
        assert_eq!(md.matches(repeated).count(), 1);
    }

    #[test]
    fn separator_only_between_surviving_pages() {
        let body = "a page body comfortably longer than the fifty character minimum threshold";
        let pages = vec![
            (1, page(vec![sb("text", body, 0, 0.0)])),
            (2, page(vec![sb("text", "tiny", 0, 0.0)])),
            (3, page(vec![sb("text", body, 0, 0.0)])),
        ];
        let md = document_markdown("report", &pages, &MarkdownConfig::default());
        assert_eq!(md.matches("---").count(), 1);
        assert!(md.contains("## Page 1"));
        assert!(!md.contains("## Page 2"));
        assert!(md.contains("## Page 3"));
    }

    #[test]
    fn collect_orders_pages_numerically() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("report");
        std::fs::create_dir_all(&doc).unwrap();
        for stem in ["layout_010", "layout_002"] {
            std::fs::write(
                doc.join(format!("{stem}_sorted.json")),
                r#"{"input_path": "x", "page_index": null, "sorted_texts": []}"#,
            )
            .unwrap();
        }

        let collected = collect_sorted_pages(dir.path()).unwrap();
        let files = &collected["report"];
        assert_eq!(page_number_of(&files[0]), 2);
        assert_eq!(page_number_of(&files[1]), 10);
    }
}
