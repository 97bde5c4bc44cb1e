//! udoc - document ingestion pipeline CLI
//!
//! One subcommand per pipeline stage. Per-unit failures are logged and
//! reflected in the end-of-run summary; only top-level errors (bad
//! arguments, unreadable input roots, state persistence failure) exit
//! non-zero.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use udoc_layout::SizeFilter;
use udoc_pipeline::crop::{crop_page, CropConfig};
use udoc_pipeline::driver::{enumerate_layout_units, BatchDriver, BatchOptions, WorkUnit};
use udoc_pipeline::markdown::{collect_sorted_pages, export_document, MarkdownConfig};
use udoc_pipeline::merge::merge_metadata;
use udoc_pipeline::textflow::{process_layout_file, sorted_output_path, TextFlowConfig};

#[derive(Parser)]
#[command(
    name = "udoc",
    version,
    about = "Layout-aware document ingestion: reading order, crops, markdown, metadata"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Flags shared by the batch-driven stages.
#[derive(Args, Debug)]
struct BatchFlags {
    /// Skip units whose outputs already exist (default)
    #[arg(long = "skip_existing", overrides_with = "no_skip_existing")]
    skip_existing: bool,
    /// Reprocess units even when outputs already exist
    #[arg(long = "no_skip_existing")]
    no_skip_existing: bool,
    /// Continue after the last processed unit (default)
    #[arg(long = "resume", overrides_with = "no_resume")]
    resume: bool,
    /// Process from the start of the unit list
    #[arg(long = "no_resume")]
    no_resume: bool,
    /// Processing-state file (default: <output_dir>/<stage>_status.json)
    #[arg(long = "state_file")]
    state_file: Option<PathBuf>,
}

impl BatchFlags {
    fn options(&self) -> BatchOptions {
        BatchOptions {
            skip_existing: self.skip_existing || !self.no_skip_existing,
            resume: self.resume || !self.no_resume,
        }
    }

    fn state_path(&self, output_dir: &Path, stage: &str) -> PathBuf {
        self.state_file
            .clone()
            .unwrap_or_else(|| output_dir.join(format!("{stage}_status.json")))
    }
}

#[derive(Subcommand)]
enum Command {
    /// Order each page's boxes into reading blocks and write sorted records
    Text {
        /// Directory of layout-detection results (layout_*.json per document)
        #[arg(long = "input_dir")]
        input_dir: PathBuf,
        /// Directory for sorted records and page metadata
        #[arg(long = "output_dir")]
        output_dir: PathBuf,
        #[command(flatten)]
        batch: BatchFlags,
    },
    /// Crop image/chart regions and write per-object metadata
    Crop {
        #[arg(long = "input_dir")]
        input_dir: PathBuf,
        #[arg(long = "output_dir")]
        output_dir: PathBuf,
        /// Minimum bounding-box width (px); boxes under both minimums are skipped
        #[arg(long = "min_width", default_value_t = 200.0)]
        min_width: f32,
        /// Minimum bounding-box height (px)
        #[arg(long = "min_height", default_value_t = 200.0)]
        min_height: f32,
        /// Maximum bounding-box width (px); either maximum exceeded skips the box
        #[arg(long = "max_width", default_value_t = 800.0)]
        max_width: f32,
        /// Maximum bounding-box height (px)
        #[arg(long = "max_height", default_value_t = 850.0)]
        max_height: f32,
        /// Stamp run-wide output numbers into the metadata index field (default)
        #[arg(long = "add_numbering", overrides_with = "no_add_numbering")]
        add_numbering: bool,
        /// Use the page footer text as the index field instead
        #[arg(long = "no_add_numbering")]
        no_add_numbering: bool,
        /// Directory of per-document OCR markdown used to fill record text
        #[arg(long = "ocr_dir")]
        ocr_dir: Option<PathBuf>,
        #[command(flatten)]
        batch: BatchFlags,
    },
    /// Merge sorted pages into one markdown file per document
    Markdown {
        /// Directory containing *_sorted.json records
        #[arg(long = "input_dir", short = 'i')]
        input_dir: PathBuf,
        #[arg(long = "output_dir", short = 'o')]
        output_dir: PathBuf,
        /// Minimum text length for a page to be emitted
        #[arg(long = "min_page_length", default_value_t = 50)]
        min_page_length: usize,
        /// Consecutive repetitions before a phrase is collapsed
        #[arg(long = "min_repetition", default_value_t = 4)]
        min_repetition: usize,
        #[command(flatten)]
        batch: BatchFlags,
    },
    /// Merge per-object metadata files into per-document arrays
    Merge {
        /// Root directory searched for *_metadata.json files
        #[arg(long, short = 'i')]
        input: PathBuf,
        /// Directory for the merged per-document files
        #[arg(long, short = 'o')]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Text {
            input_dir,
            output_dir,
            batch,
        } => run_text(&input_dir, &output_dir, &batch),
        Command::Crop {
            input_dir,
            output_dir,
            min_width,
            min_height,
            max_width,
            max_height,
            add_numbering,
            no_add_numbering,
            ocr_dir,
            batch,
        } => {
            let mut size_filter = SizeFilter::default();
            size_filter.set_uniform(
                udoc_core::labels::DEFAULT_CROP_LABELS,
                (min_width, min_height),
                (max_width, max_height),
            );
            let cfg = CropConfig {
                size_filter,
                add_numbering: add_numbering || !no_add_numbering,
                ocr_results_dir: ocr_dir,
                ..CropConfig::default()
            };
            run_crop(&input_dir, &output_dir, &cfg, &batch)
        }
        Command::Markdown {
            input_dir,
            output_dir,
            min_page_length,
            min_repetition,
            batch,
        } => {
            let cfg = MarkdownConfig {
                min_page_length,
                min_repetitions: min_repetition,
                ..MarkdownConfig::default()
            };
            run_markdown(&input_dir, &output_dir, &cfg, &batch)
        }
        Command::Merge { input, output } => {
            let stats = merge_metadata(&input, &output)
                .with_context(|| format!("merging metadata under {}", input.display()))?;
            println!(
                "{} {} files merged into {} documents",
                "done:".green().bold(),
                stats.processed_files,
                stats.created_files
            );
            Ok(())
        }
    }
}

fn run_text(input_dir: &Path, output_dir: &Path, batch: &BatchFlags) -> Result<()> {
    let units = enumerate_layout_units(input_dir)
        .with_context(|| format!("enumerating layout files under {}", input_dir.display()))?;
    log::info!("found {} layout pages under {}", units.len(), input_dir.display());

    std::fs::create_dir_all(output_dir)?;
    let cfg = TextFlowConfig::default();
    let mut driver = BatchDriver::new(&batch.state_path(output_dir, "text"), batch.options());

    let summary = driver.run_parallel(
        units,
        |unit| sorted_output_path(&unit.path, &output_dir.join(&unit.doc)).exists(),
        |unit| {
            process_layout_file(&unit.path, &output_dir.join(&unit.doc), &unit.doc, &cfg)
                .map(|_| ())
        },
    )?;

    println!("{} {summary}", "text:".green().bold());
    Ok(())
}

fn run_crop(input_dir: &Path, output_dir: &Path, cfg: &CropConfig, batch: &BatchFlags) -> Result<()> {
    let units = enumerate_layout_units(input_dir)
        .with_context(|| format!("enumerating layout files under {}", input_dir.display()))?;

    std::fs::create_dir_all(output_dir)?;
    let mut driver = BatchDriver::new(&batch.state_path(output_dir, "crop"), batch.options());

    // Run-wide output numbering follows unit order, so this stage stays
    // sequential.
    let mut number: u32 = 1;
    let summary = driver.run_sequential(units, |_| false, |unit| {
        let outcome = crop_page(
            &unit.path,
            &output_dir.join(&unit.doc),
            &unit.doc,
            cfg,
            number,
        )?;
        number = outcome.next_number;
        Ok(())
    })?;

    println!("{} {summary}", "crop:".green().bold());
    if number > 1 {
        println!("numbered {} cropped objects", number - 1);
    }
    Ok(())
}

fn run_markdown(
    input_dir: &Path,
    output_dir: &Path,
    cfg: &MarkdownConfig,
    batch: &BatchFlags,
) -> Result<()> {
    let documents: BTreeMap<String, Vec<PathBuf>> = collect_sorted_pages(input_dir)
        .with_context(|| format!("collecting sorted pages under {}", input_dir.display()))?;
    log::info!("found {} documents under {}", documents.len(), input_dir.display());

    std::fs::create_dir_all(output_dir)?;
    let units: Vec<WorkUnit> = documents
        .keys()
        .map(|doc| WorkUnit {
            id: doc.clone(),
            path: output_dir.join(format!("{doc}.md")),
            doc: doc.clone(),
        })
        .collect();

    let mut driver = BatchDriver::new(&batch.state_path(output_dir, "markdown"), batch.options());
    let summary = driver.run_sequential(
        units,
        |unit| unit.path.exists(),
        |unit| {
            export_document(&unit.doc, &documents[&unit.doc], output_dir, cfg).map(|_| ())
        },
    )?;

    println!("{} {summary}", "markdown:".green().bold());
    Ok(())
}
