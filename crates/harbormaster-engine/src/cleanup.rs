// crates/harbormaster-engine/src/cleanup.rs
// ============================================================================
// Module: Layout Cleanup
// Description: One-shot migration from the flat layout to the hybrid layout.
// Purpose: Move legacy windows into archive-rooted form, rename-only.
// Dependencies: harbormaster-core, harbormaster-store, tracing
// ============================================================================

//! ## Overview
//! Cleanup converts flat-layout windows (files and sidecars at the window
//! root) into the hybrid layout. Every operation is a rename, never a
//! copy-plus-delete, and the conversion is idempotent: a window showing any
//! hybrid or legacy subfolder is skipped outright, so a second invocation is
//! a no-op. Dry-run produces the full plan without touching the filesystem.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use harbormaster_core::TaskRef;
use harbormaster_store::ARCHIVE_DIR;
use harbormaster_store::EvidenceStore;
use harbormaster_store::GENERATION_DIR;
use harbormaster_store::SUBMISSION_DIR;
use harbormaster_store::SUBMISSION_FILE;
use harbormaster_store::SUBMITTED_DIR;
use harbormaster_store::StoreError;
use harbormaster_store::layout::COLLECTION_PLAN_PREFIX;
use harbormaster_store::layout::LEGACY_SUBFOLDERS;
use serde::Serialize;

// ============================================================================
// SECTION: Plans
// ============================================================================

/// One intended rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedMove {
    /// Source path.
    pub from: PathBuf,
    /// Destination path.
    pub to: PathBuf,
}

/// Migration plan for one window.
#[derive(Debug, Clone, Serialize)]
pub struct WindowPlan {
    /// Window directory the plan applies to.
    pub window_dir: PathBuf,
    /// Whether the window was skipped as already hybrid.
    pub skipped: bool,
    /// Human-readable reason for skipping or the chosen target.
    pub reason: String,
    /// Intended renames, in execution order.
    pub moves: Vec<PlannedMove>,
}

/// Aggregate cleanup outcome.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    /// Windows inspected.
    pub windows_scanned: u32,
    /// Windows migrated (or that would migrate, under dry-run).
    pub windows_migrated: u32,
    /// Windows skipped as already hybrid.
    pub windows_skipped: u32,
    /// Per-window plans.
    pub plans: Vec<WindowPlan>,
}

// ============================================================================
// SECTION: Cleanup Engine
// ============================================================================

/// Flat-to-hybrid layout migration.
#[derive(Debug, Clone)]
pub struct CleanupEngine {
    /// Evidence tree access.
    evidence: EvidenceStore,
}

impl CleanupEngine {
    /// Creates a cleanup engine over an evidence store.
    #[must_use]
    pub const fn new(evidence: EvidenceStore) -> Self {
        Self {
            evidence,
        }
    }

    /// Runs cleanup across every task window.
    ///
    /// With `dry_run` the report carries the plans and nothing moves.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when enumeration or a rename fails.
    pub fn run(&self, dry_run: bool) -> Result<CleanupReport, StoreError> {
        let mut report = CleanupReport::default();
        for (_, task_dir) in self.evidence.list_task_dirs()? {
            self.run_task_dir(&task_dir, dry_run, &mut report)?;
        }
        Ok(report)
    }

    /// Runs cleanup for a single task.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the task directory cannot be resolved or
    /// a rename fails.
    pub fn run_task(&self, task_ref: &TaskRef, dry_run: bool) -> Result<CleanupReport, StoreError> {
        let mut report = CleanupReport::default();
        let dir = self
            .evidence
            .find_task_dir(task_ref)?
            .ok_or_else(|| StoreError::NotFound(format!("evidence task {task_ref}")))?;
        self.run_task_dir(&dir, dry_run, &mut report)?;
        Ok(report)
    }

    /// Plans and optionally applies cleanup for every window of one task.
    fn run_task_dir(
        &self,
        task_dir: &Path,
        dry_run: bool,
        report: &mut CleanupReport,
    ) -> Result<(), StoreError> {
        for (_, window_dir) in self.evidence.list_windows(task_dir)? {
            report.windows_scanned += 1;
            let plan = self.plan_window(&window_dir)?;
            if plan.skipped {
                report.windows_skipped += 1;
            } else {
                if !dry_run {
                    apply_plan(&plan)?;
                }
                if plan.moves.is_empty() {
                    report.windows_skipped += 1;
                } else {
                    report.windows_migrated += 1;
                }
            }
            report.plans.push(plan);
        }
        Ok(())
    }

    /// Builds the migration plan for one window without touching disk.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the window cannot be enumerated.
    pub fn plan_window(&self, window_dir: &Path) -> Result<WindowPlan, StoreError> {
        for marker in [ARCHIVE_DIR, SUBMITTED_DIR]
            .iter()
            .chain(LEGACY_SUBFOLDERS.iter())
        {
            if window_dir.join(marker).is_dir() {
                return Ok(WindowPlan {
                    window_dir: window_dir.to_path_buf(),
                    skipped: true,
                    reason: format!("already hybrid ({marker}/ present)"),
                    moves: Vec::new(),
                });
            }
        }

        let has_submission =
            window_dir.join(SUBMISSION_DIR).join(SUBMISSION_FILE).is_file();
        if !has_submission {
            // Generation or validation sidecars alone keep files at the root.
            return Ok(WindowPlan {
                window_dir: window_dir.to_path_buf(),
                skipped: false,
                reason: "no submission sidecar; files stay at the window root".to_string(),
                moves: Vec::new(),
            });
        }

        let archive = window_dir.join(ARCHIVE_DIR);
        let mut moves = Vec::new();
        for file in self.evidence.evidence_files(window_dir, "")? {
            if file.filename.starts_with(COLLECTION_PLAN_PREFIX) {
                continue;
            }
            moves.push(PlannedMove {
                from: window_dir.join(&file.filename),
                to: archive.join(&file.filename),
            });
        }
        // Generation and submission metadata travel with the archive;
        // validation and context never move.
        for metadata_dir in [GENERATION_DIR, SUBMISSION_DIR] {
            let from = window_dir.join(metadata_dir);
            if from.is_dir() {
                moves.push(PlannedMove {
                    from,
                    to: archive.join(metadata_dir),
                });
            }
        }
        Ok(WindowPlan {
            window_dir: window_dir.to_path_buf(),
            skipped: false,
            reason: "submission sidecar present; archiving window".to_string(),
            moves,
        })
    }
}

// ============================================================================
// SECTION: Application
// ============================================================================

/// Applies a plan with rename-only moves.
fn apply_plan(plan: &WindowPlan) -> Result<(), StoreError> {
    if plan.moves.is_empty() {
        return Ok(());
    }
    let archive = plan.window_dir.join(ARCHIVE_DIR);
    fs::create_dir_all(&archive)
        .map_err(|err| StoreError::Io(format!("{}: {err}", archive.display())))?;
    for planned in &plan.moves {
        fs::rename(&planned.from, &planned.to).map_err(|err| {
            StoreError::Io(format!(
                "{} -> {}: {err}",
                planned.from.display(),
                planned.to.display()
            ))
        })?;
    }
    Ok(())
}
