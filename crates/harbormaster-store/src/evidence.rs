// crates/harbormaster-store/src/evidence.rs
// ============================================================================
// Module: Evidence Tree Store
// Description: Window paths, evidence file enumeration, and sidecar IO.
// Purpose: Give the engine one owner for every evidence-tree read and write.
// Dependencies: harbormaster-core, serde_yaml, thiserror, time, tracing
// ============================================================================

//! ## Overview
//! The evidence tree lives at `<data_root>/evidence/<task_dir>/<window>/`.
//! This store resolves task directories by reference, enumerates windows and
//! evidence files with statistics, and reads and writes the four sidecar
//! documents at any of their legal locations (window root, `archive/`,
//! `.submitted/`). Sidecar reads are tolerant; writes are atomic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use harbormaster_core::EvidenceFile;
use harbormaster_core::EvidenceSubmission;
use harbormaster_core::GenerationMetadata;
use harbormaster_core::HistoryEntry;
use harbormaster_core::SubmissionHistory;
use harbormaster_core::TaskRef;
use harbormaster_core::ValidationResult;
use harbormaster_core::Window;
use harbormaster_core::parse_task_dir_name;
use harbormaster_core::task_dir_name;
use time::OffsetDateTime;

use crate::documents::StoreError;
use crate::fsio::read_yaml_tolerant;
use crate::fsio::write_yaml_atomic;
use crate::layout::GENERATION_DIR;
use crate::layout::GENERATION_FILE;
use crate::layout::HISTORY_FILE;
use crate::layout::SUBMISSION_DIR;
use crate::layout::SUBMISSION_FILE;
use crate::layout::VALIDATION_DIR;
use crate::layout::VALIDATION_FILE;

// ============================================================================
// SECTION: Evidence Store
// ============================================================================

/// Filesystem access to the evidence tree.
///
/// # Invariants
/// - Directory enumeration is lexicographic for reproducibility.
#[derive(Debug, Clone)]
pub struct EvidenceStore {
    /// Evidence tree root (`<data_root>/evidence`).
    root: PathBuf,
}

impl EvidenceStore {
    /// Creates a store over an evidence tree root.
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self {
            root,
        }
    }

    /// Creates a store at the default location under a data root.
    #[must_use]
    pub fn with_data_root(data_dir: &Path) -> Self {
        Self::new(data_dir.join("evidence"))
    }

    /// Returns the evidence tree root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ------------------------------------------------------------------
    // Task directories
    // ------------------------------------------------------------------

    /// Returns the canonical directory path for a task, creating nothing.
    #[must_use]
    pub fn task_dir_path(&self, task_ref: &TaskRef, task_name: &str) -> PathBuf {
        self.root.join(task_dir_name(task_ref, task_name))
    }

    /// Lists task directories in lexicographic order.
    ///
    /// Entries that do not parse as task directories are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the root cannot be read.
    pub fn list_task_dirs(&self) -> Result<Vec<(TaskRef, PathBuf)>, StoreError> {
        let mut dirs = Vec::new();
        for (name, path) in sorted_dir_entries(&self.root)? {
            if let Some(task_ref) = parse_task_dir_name(&name) {
                dirs.push((task_ref, path));
            }
        }
        Ok(dirs)
    }

    /// Finds the directory for a task reference, when one exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the root cannot be read.
    pub fn find_task_dir(&self, task_ref: &TaskRef) -> Result<Option<PathBuf>, StoreError> {
        Ok(self
            .list_task_dirs()?
            .into_iter()
            .find(|(candidate, _)| candidate == task_ref)
            .map(|(_, path)| path))
    }

    // ------------------------------------------------------------------
    // Windows
    // ------------------------------------------------------------------

    /// Lists window directories under a task directory, lexicographic.
    ///
    /// Hidden directories are never windows.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the task directory cannot be read.
    pub fn list_windows(&self, task_dir: &Path) -> Result<Vec<(String, PathBuf)>, StoreError> {
        let mut windows = Vec::new();
        for (name, path) in sorted_dir_entries(task_dir)? {
            if name.starts_with('.') {
                continue;
            }
            if name.parse::<Window>().is_ok() {
                windows.push((name, path));
            }
        }
        Ok(windows)
    }

    // ------------------------------------------------------------------
    // Evidence files
    // ------------------------------------------------------------------

    /// Enumerates a window's working-root evidence files by task reference.
    ///
    /// A missing task directory or window yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when enumeration fails.
    pub fn evidence_files_for(
        &self,
        task_ref: &TaskRef,
        window: &str,
    ) -> Result<Vec<EvidenceFile>, StoreError> {
        match self.find_task_dir(task_ref)? {
            Some(dir) => self.evidence_files(&dir.join(window), ""),
            None => Ok(Vec::new()),
        }
    }

    /// Enumerates a window subfolder's evidence files by task reference.
    ///
    /// `subfolder` is `archive` or `.submitted`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when enumeration fails.
    pub fn evidence_files_in_subfolder(
        &self,
        task_ref: &TaskRef,
        window: &str,
        subfolder: &str,
    ) -> Result<Vec<EvidenceFile>, StoreError> {
        match self.find_task_dir(task_ref)? {
            Some(dir) => self.evidence_files(&dir.join(window).join(subfolder), subfolder),
            None => Ok(Vec::new()),
        }
    }

    /// Enumerates evidence files directly under `dir`, lexicographic.
    ///
    /// Hidden files, temp files, and subdirectories are skipped.
    /// `relative_prefix` is prepended to each file's relative path (empty for
    /// the working root, the subfolder name for `archive/` or `.submitted/`).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the directory cannot be read or a
    /// file's metadata is unavailable.
    pub fn evidence_files(
        &self,
        dir: &Path,
        relative_prefix: &str,
    ) -> Result<Vec<EvidenceFile>, StoreError> {
        let mut files = Vec::new();
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(files),
            Err(err) => return Err(StoreError::Io(format!("{}: {err}", dir.display()))),
        };
        let mut names: Vec<String> = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|err| StoreError::Io(format!("{}: {err}", dir.display())))?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.starts_with('.') || name.ends_with(".tmp") {
                continue;
            }
            let file_type = entry
                .file_type()
                .map_err(|err| StoreError::Io(format!("{}: {err}", dir.display())))?;
            if file_type.is_file() {
                names.push(name);
            }
        }
        names.sort();
        for name in names {
            let path = dir.join(&name);
            let metadata = fs::metadata(&path)
                .map_err(|err| StoreError::Io(format!("{}: {err}", path.display())))?;
            let modified_at = metadata
                .modified()
                .map(OffsetDateTime::from)
                .unwrap_or(OffsetDateTime::UNIX_EPOCH);
            let relative_path = if relative_prefix.is_empty() {
                name.clone()
            } else {
                format!("{relative_prefix}/{name}")
            };
            let title = name.rsplit_once('.').map_or(name.as_str(), |(stem, _)| stem).to_string();
            files.push(EvidenceFile {
                filename: name,
                relative_path,
                size_bytes: metadata.len(),
                modified_at,
                checksum: None,
                is_generated: false,
                tampered: false,
                source: "manual".to_string(),
                controls_satisfied: std::collections::BTreeSet::new(),
                title,
            });
        }
        Ok(files)
    }

    // ------------------------------------------------------------------
    // Sidecars
    // ------------------------------------------------------------------

    /// Reads the generation sidecar under `base`, tolerant of absence.
    #[must_use]
    pub fn read_generation(&self, base: &Path) -> Option<GenerationMetadata> {
        read_yaml_tolerant(&base.join(GENERATION_DIR).join(GENERATION_FILE))
    }

    /// Writes the generation sidecar under `base`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when serialization or the write fails.
    pub fn write_generation(
        &self,
        base: &Path,
        metadata: &GenerationMetadata,
    ) -> Result<(), StoreError> {
        write_yaml_atomic(&base.join(GENERATION_DIR).join(GENERATION_FILE), metadata)
    }

    /// Reads the validation sidecar under `base`, tolerant of absence.
    #[must_use]
    pub fn read_validation(&self, base: &Path) -> Option<ValidationResult> {
        read_yaml_tolerant(&base.join(VALIDATION_DIR).join(VALIDATION_FILE))
    }

    /// Writes the validation sidecar under `base`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when serialization or the write fails.
    pub fn write_validation(
        &self,
        base: &Path,
        result: &ValidationResult,
    ) -> Result<(), StoreError> {
        write_yaml_atomic(&base.join(VALIDATION_DIR).join(VALIDATION_FILE), result)
    }

    /// Reads the submission sidecar under `base`, tolerant of absence.
    #[must_use]
    pub fn read_submission(&self, base: &Path) -> Option<EvidenceSubmission> {
        read_yaml_tolerant(&base.join(SUBMISSION_DIR).join(SUBMISSION_FILE))
    }

    /// Writes the submission sidecar under `base`.
    ///
    /// A corrupted write here is fatal to the enclosing submission.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when serialization or the write fails.
    pub fn write_submission(
        &self,
        base: &Path,
        submission: &EvidenceSubmission,
    ) -> Result<(), StoreError> {
        write_yaml_atomic(&base.join(SUBMISSION_DIR).join(SUBMISSION_FILE), submission)
    }

    /// Reads the submission history under `base`, tolerant of absence.
    #[must_use]
    pub fn read_history(&self, base: &Path) -> Option<SubmissionHistory> {
        read_yaml_tolerant(&base.join(SUBMISSION_DIR).join(HISTORY_FILE))
    }

    /// Appends one entry to the submission history under `base`.
    ///
    /// The history is created when absent; entries are never rewritten.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    pub fn append_history(
        &self,
        base: &Path,
        task_ref: &str,
        window: &str,
        entry: HistoryEntry,
    ) -> Result<(), StoreError> {
        let mut history = self.read_history(base).unwrap_or_else(|| {
            SubmissionHistory::new(task_ref.to_string(), window.to_string())
        });
        history.entries.push(entry);
        write_yaml_atomic(&base.join(SUBMISSION_DIR).join(HISTORY_FILE), &history)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Lists subdirectories of `dir` as `(name, path)` in lexicographic order.
fn sorted_dir_entries(dir: &Path) -> Result<Vec<(String, PathBuf)>, StoreError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(StoreError::Io(format!("{}: {err}", dir.display()))),
    };
    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| StoreError::Io(format!("{}: {err}", dir.display())))?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let file_type = entry
            .file_type()
            .map_err(|err| StoreError::Io(format!("{}: {err}", dir.display())))?;
        if file_type.is_dir() {
            dirs.push((name, entry.path()));
        }
    }
    dirs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(dirs)
}

#[cfg(test)]
mod tests;
