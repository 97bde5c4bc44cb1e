//! Resumable batch execution.
//!
//! The driver enumerates units, applies resume/skip decisions, and runs the
//! per-unit work either across a rayon pool (page-pure stages) or in order
//! (stages whose output numbering follows unit order). In the parallel path
//! workers only report completion events over a channel; the driver thread
//! alone owns the state file, persisting after every event. A unit failure is
//! recorded and the loop continues; only a state-persistence failure aborts
//! the batch.

use std::path::{Path, PathBuf};
use std::sync::mpsc;

use rayon::prelude::*;
use udoc_core::Result;

use crate::state::ProcessingState;

/// One schedulable unit of work: a layout JSON belonging to a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnit {
    /// Stable id used in the state file (`<doc>/<file-stem>`).
    pub id: String,
    pub path: PathBuf,
    /// Name of the document folder the unit belongs to.
    pub doc: String,
}

/// Batch-level behavior flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Skip units already done or whose output artifacts exist.
    pub skip_existing: bool,
    /// Continue after the persisted cursor instead of from the start.
    pub resume: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            skip_existing: true,
            resume: true,
        }
    }
}

/// Counts reported at the end of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} processed, {} skipped, {} failed",
            self.processed, self.skipped, self.failed
        )
    }
}

/// Owns the processing state for one batch run.
pub struct BatchDriver {
    state_path: PathBuf,
    state: ProcessingState,
    options: BatchOptions,
}

impl BatchDriver {
    /// Loads (or initializes) the state file and prepares a run.
    #[must_use]
    pub fn new(state_path: &Path, options: BatchOptions) -> Self {
        Self {
            state_path: state_path.to_path_buf(),
            state: ProcessingState::load(state_path),
            options,
        }
    }

    #[must_use]
    pub fn state(&self) -> &ProcessingState {
        &self.state
    }

    /// Runs page-pure work across the rayon pool.
    ///
    /// `artifacts_exist` is the skip-existing probe: a unit whose outputs are
    /// already on disk is not reprocessed. Completion order is whatever the
    /// pool produces; each completion is persisted before the next is read.
    pub fn run_parallel<F>(
        &mut self,
        units: Vec<WorkUnit>,
        artifacts_exist: impl Fn(&WorkUnit) -> bool,
        work: F,
    ) -> Result<BatchSummary>
    where
        F: Fn(&WorkUnit) -> Result<()> + Send + Sync,
    {
        let (pending, mut summary) = self.plan(units, &artifacts_exist)?;
        if pending.is_empty() {
            log::info!("batch finished: {summary}");
            return Ok(summary);
        }

        let (tx, rx) = mpsc::channel::<(String, std::result::Result<(), String>)>();
        let mut persist_result: Result<()> = Ok(());

        std::thread::scope(|s| {
            // Single writer: this thread owns every state mutation, the pool
            // only computes and reports. The loop ends when the last worker
            // drops its sender; a persistence failure drops the receiver
            // instead, letting in-flight units finish unrecorded.
            s.spawn(|| {
                for (id, outcome) in rx {
                    self.record(&id, outcome, &mut summary);
                    if let Err(err) = self.state.save(&self.state_path) {
                        persist_result = Err(err);
                        break;
                    }
                }
            });

            pending.par_iter().for_each_with(tx, |tx, unit| {
                let outcome = work(unit).map_err(|e| e.to_string());
                let _ = tx.send((unit.id.clone(), outcome));
            });
        });

        persist_result?;
        log::info!("batch finished: {summary}");
        Ok(summary)
    }

    /// Runs work in unit order on the driver thread.
    ///
    /// Used by stages whose run-wide numbering must follow enumeration order.
    pub fn run_sequential<F>(
        &mut self,
        units: Vec<WorkUnit>,
        artifacts_exist: impl Fn(&WorkUnit) -> bool,
        mut work: F,
    ) -> Result<BatchSummary>
    where
        F: FnMut(&WorkUnit) -> Result<()>,
    {
        let (pending, mut summary) = self.plan(units, &artifacts_exist)?;

        for unit in &pending {
            let outcome = work(unit).map_err(|e| e.to_string());
            self.record(&unit.id, outcome, &mut summary);
            self.state.save(&self.state_path)?;
        }

        log::info!("batch finished: {summary}");
        Ok(summary)
    }

    /// Applies resume and skip-existing policy, marks the survivors
    /// in-progress, and checkpoints once before work starts.
    fn plan(
        &mut self,
        units: Vec<WorkUnit>,
        artifacts_exist: &impl Fn(&WorkUnit) -> bool,
    ) -> Result<(Vec<WorkUnit>, BatchSummary)> {
        let mut summary = BatchSummary::default();

        let start = if self.options.resume {
            let ids: Vec<String> = units.iter().map(|u| u.id.clone()).collect();
            self.state.resume_position(&ids)
        } else {
            0
        };
        if start > 0 {
            log::info!("resuming: skipping {start} previously processed units");
            summary.skipped += start;
        }

        let mut pending = Vec::new();
        for unit in units.into_iter().skip(start) {
            if self.options.skip_existing
                && (self.state.is_done(&unit.id) || artifacts_exist(&unit))
            {
                log::debug!("skipping already-processed unit {}", unit.id);
                summary.skipped += 1;
            } else {
                pending.push(unit);
            }
        }

        for unit in &pending {
            self.state.mark_in_progress(&unit.id);
        }
        if !pending.is_empty() {
            self.state.save(&self.state_path)?;
        }

        Ok((pending, summary))
    }

    fn record(
        &mut self,
        id: &str,
        outcome: std::result::Result<(), String>,
        summary: &mut BatchSummary,
    ) {
        match outcome {
            Ok(()) => {
                self.state.mark_done(id);
                summary.processed += 1;
            }
            Err(message) => {
                log::error!("unit {id} failed: {message}");
                self.state.mark_failed(id, &message);
                summary.failed += 1;
            }
        }
    }
}

/// Enumerates `layout_*.json` units under a converted-documents tree.
///
/// Each document folder contributes its layout files in name order, so page
/// numbering and resume cursors are stable across runs.
pub fn enumerate_layout_units(root: &Path) -> Result<Vec<WorkUnit>> {
    let pattern = root.join("**").join("layout_*.json");
    let pattern = pattern.to_string_lossy().into_owned();

    let mut paths: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| udoc_core::UdocError::MalformedInput(format!("bad glob pattern: {e}")))?
        .filter_map(std::result::Result::ok)
        .collect();
    paths.sort();

    let units = paths
        .into_iter()
        .map(|path| {
            let doc = path
                .parent()
                .and_then(Path::file_name)
                .map_or_else(|| "unknown".to_string(), |n| n.to_string_lossy().into_owned());
            let stem = path
                .file_stem()
                .map_or_else(String::new, |s| s.to_string_lossy().into_owned());
            WorkUnit {
                id: format!("{doc}/{stem}"),
                path,
                doc,
            }
        })
        .collect();
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn unit(id: &str) -> WorkUnit {
        WorkUnit {
            id: id.to_string(),
            path: PathBuf::from(format!("{id}.json")),
            doc: "doc".to_string(),
        }
    }

    fn units(ids: &[&str]) -> Vec<WorkUnit> {
        ids.iter().map(|id| unit(id)).collect()
    }

    #[test]
    fn resumed_run_processes_only_the_tail() {
        let dir = tempfile::tempdir().unwrap();
        let state_path = dir.path().join("state.json");

        // First run: complete units 1-3.
        {
            let mut driver = BatchDriver::new(&state_path, BatchOptions::default());
            driver
                .run_sequential(units(&["1", "2", "3"]), |_| false, |_| Ok(()))
                .unwrap();
        }

        // Resumed run over 1-5 processes exactly {4, 5}.
        let mut driver = BatchDriver::new(&state_path, BatchOptions::default());
        let seen = Mutex::new(Vec::new());
        let summary = driver
            .run_sequential(
                units(&["1", "2", "3", "4", "5"]),
                |_| false,
                |u| {
                    seen.lock().unwrap().push(u.id.clone());
                    Ok(())
                },
            )
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["4".to_string(), "5".to_string()]);
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.skipped, 3);
    }

    #[test]
    fn one_failure_does_not_stop_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let state_path = dir.path().join("state.json");

        let mut driver = BatchDriver::new(&state_path, BatchOptions::default());
        let summary = driver
            .run_sequential(units(&["a", "b", "c"]), |_| false, |u| {
                if u.id == "b" {
                    Err(udoc_core::UdocError::MissingAsset(u.path.clone()))
                } else {
                    Ok(())
                }
            })
            .unwrap();

        assert_eq!(summary.processed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(driver.state().failures().len(), 1);
        assert_eq!(driver.state().failures()[0].unit, "b");
    }

    #[test]
    fn skip_existing_honors_artifact_probe() {
        let dir = tempfile::tempdir().unwrap();
        let state_path = dir.path().join("state.json");

        let mut driver = BatchDriver::new(&state_path, BatchOptions::default());
        let summary = driver
            .run_sequential(
                units(&["a", "b"]),
                |u| u.id == "a", // a's outputs already on disk
                |_| Ok(()),
            )
            .unwrap();

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn no_skip_existing_reprocesses_everything() {
        let dir = tempfile::tempdir().unwrap();
        let state_path = dir.path().join("state.json");

        let options = BatchOptions {
            skip_existing: false,
            resume: false,
        };
        let mut driver = BatchDriver::new(&state_path, options);
        let summary = driver
            .run_sequential(units(&["a", "b"]), |_| true, |_| Ok(()))
            .unwrap();
        assert_eq!(summary.processed, 2);
    }

    #[test]
    fn parallel_run_processes_every_unit_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let state_path = dir.path().join("state.json");

        let count = AtomicUsize::new(0);
        let mut driver = BatchDriver::new(&state_path, BatchOptions::default());
        let summary = driver
            .run_parallel(units(&["a", "b", "c", "d"]), |_| false, |_| {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 4);
        assert_eq!(summary.processed, 4);

        let reloaded = ProcessingState::load(&state_path);
        for id in ["a", "b", "c", "d"] {
            assert!(reloaded.is_done(id));
        }
    }

    #[test]
    fn enumerate_orders_layout_files_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("report");
        std::fs::create_dir_all(&doc).unwrap();
        for name in ["layout_002.json", "layout_001.json", "notes.txt"] {
            std::fs::write(doc.join(name), "{}").unwrap();
        }

        let units = enumerate_layout_units(dir.path()).unwrap();
        let ids: Vec<&str> = units.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["report/layout_001", "report/layout_002"]);
        assert_eq!(units[0].doc, "report");
    }
}
