// crates/harbormaster-store/src/documents.rs
// ============================================================================
// Module: Document Store
// Description: Filesystem persistence for policies, controls, and tasks.
// Purpose: Keep canonical JSON records with Markdown companions on disk.
// Dependencies: harbormaster-core, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! Documents are stored one JSON file per entity under the per-kind
//! directories, named `<REF>-<numeric_id>-<short_slug>.json`, with an
//! optional Markdown companion beside each record. Lookups accept either a
//! reference identifier or a numeric identifier. Listing skips unparseable
//! records with a warning; the sync engine owns all writes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use harbormaster_core::Control;
use harbormaster_core::ControlRef;
use harbormaster_core::ErrorKind;
use harbormaster_core::EvidenceTask;
use harbormaster_core::Policy;
use harbormaster_core::RefKind;
use harbormaster_core::document_file_stem;
use harbormaster_core::normalize_reference;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::fsio::write_atomic;
use crate::fsio::write_json_atomic;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Document and evidence store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("store io error: {0}")]
    Io(String),
    /// Stored data failed to parse or serialize.
    #[error("store parse error: {0}")]
    Parse(String),
    /// No document matches the requested key.
    #[error("store record not found: {0}")]
    NotFound(String),
    /// Caller-supplied key or path is invalid.
    #[error("store invalid input: {0}")]
    Invalid(String),
}

impl StoreError {
    /// Maps the error onto its domain-level kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::IoError,
            Self::Parse(_) => ErrorKind::ParseError,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Invalid(_) => ErrorKind::InvalidInput,
        }
    }
}

// ============================================================================
// SECTION: Document Store
// ============================================================================

/// Filesystem-backed store for the three document kinds.
///
/// # Invariants
/// - The sync engine is the only writer; everything else reads.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    /// Policy documents directory.
    policies_dir: PathBuf,
    /// Control documents directory.
    controls_dir: PathBuf,
    /// Evidence-task documents directory.
    tasks_dir: PathBuf,
}

impl DocumentStore {
    /// Creates a store rooted at the given per-kind directories.
    #[must_use]
    pub const fn new(policies_dir: PathBuf, controls_dir: PathBuf, tasks_dir: PathBuf) -> Self {
        Self {
            policies_dir,
            controls_dir,
            tasks_dir,
        }
    }

    /// Creates a store using the default layout under a data root.
    #[must_use]
    pub fn with_data_root(data_dir: &Path) -> Self {
        Self::new(
            data_dir.join("docs/policies"),
            data_dir.join("docs/controls"),
            data_dir.join("docs/evidence_tasks"),
        )
    }

    // ------------------------------------------------------------------
    // Policies
    // ------------------------------------------------------------------

    /// Saves a policy record, returning the JSON path written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when serialization or the write fails.
    pub fn save_policy(&self, policy: &Policy) -> Result<PathBuf, StoreError> {
        let stem = document_file_stem(&policy.reference_id, &policy.id, &policy.name);
        let path = self.policies_dir.join(format!("{stem}.json"));
        write_json_atomic(&path, policy)?;
        Ok(path)
    }

    /// Fetches a policy by reference identifier or opaque remote identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no record matches.
    pub fn get_policy(&self, key: &str) -> Result<Policy, StoreError> {
        let canonical = normalize_reference(RefKind::Policy, key);
        self.get_all_policies()?
            .into_iter()
            .find(|policy| {
                policy.id == key
                    || policy.reference_id == key
                    || canonical.as_deref() == Some(policy.reference_id.as_str())
            })
            .ok_or_else(|| StoreError::NotFound(format!("policy {key}")))
    }

    /// Lists every policy, ordered by reference identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the directory cannot be read.
    pub fn get_all_policies(&self) -> Result<Vec<Policy>, StoreError> {
        let mut policies: Vec<Policy> = read_documents(&self.policies_dir)?;
        policies.sort_by(|a, b| a.reference_id.cmp(&b.reference_id).then(a.id.cmp(&b.id)));
        Ok(policies)
    }

    // ------------------------------------------------------------------
    // Controls
    // ------------------------------------------------------------------

    /// Saves a control record, returning the JSON path written.
    ///
    /// Filenames use the underscore control form (`CC-06_8`).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when serialization or the write fails.
    pub fn save_control(&self, control: &Control) -> Result<PathBuf, StoreError> {
        let file_ref = ControlRef::new(&control.reference_id)
            .map_or_else(|| control.reference_id.replace('.', "_"), |r| r.file_form());
        let stem = document_file_stem(&file_ref, &control.id.to_string(), &control.name);
        let path = self.controls_dir.join(format!("{stem}.json"));
        write_json_atomic(&path, control)?;
        Ok(path)
    }

    /// Fetches a control by reference identifier or numeric identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no record matches.
    pub fn get_control(&self, key: &str) -> Result<Control, StoreError> {
        let canonical = normalize_reference(RefKind::Control, key);
        self.get_all_controls()?
            .into_iter()
            .find(|control| {
                control.id.to_string() == key
                    || control.reference_id == key
                    || canonical.as_deref() == Some(control.reference_id.as_str())
            })
            .ok_or_else(|| StoreError::NotFound(format!("control {key}")))
    }

    /// Lists every control, ordered by ascending numeric identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the directory cannot be read.
    pub fn get_all_controls(&self) -> Result<Vec<Control>, StoreError> {
        let mut controls: Vec<Control> = read_documents(&self.controls_dir)?;
        controls.sort_by_key(|control| control.id);
        Ok(controls)
    }

    // ------------------------------------------------------------------
    // Evidence tasks
    // ------------------------------------------------------------------

    /// Saves an evidence-task record, returning the JSON path written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when serialization or the write fails.
    pub fn save_task(&self, task: &EvidenceTask) -> Result<PathBuf, StoreError> {
        let stem = document_file_stem(&task.reference_id, &task.id.to_string(), &task.name);
        let path = self.tasks_dir.join(format!("{stem}.json"));
        write_json_atomic(&path, task)?;
        Ok(path)
    }

    /// Fetches an evidence task by reference identifier or numeric identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no record matches.
    pub fn get_task(&self, key: &str) -> Result<EvidenceTask, StoreError> {
        let canonical = normalize_reference(RefKind::EvidenceTask, key);
        self.get_all_tasks()?
            .into_iter()
            .find(|task| {
                task.id.to_string() == key
                    || task.reference_id == key
                    || canonical.as_deref() == Some(task.reference_id.as_str())
            })
            .ok_or_else(|| StoreError::NotFound(format!("evidence task {key}")))
    }

    /// Lists every evidence task, ordered by ascending numeric identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the directory cannot be read.
    pub fn get_all_tasks(&self) -> Result<Vec<EvidenceTask>, StoreError> {
        let mut tasks: Vec<EvidenceTask> = read_documents(&self.tasks_dir)?;
        tasks.sort_by_key(|task| task.id);
        Ok(tasks)
    }

    // ------------------------------------------------------------------
    // Markdown companions
    // ------------------------------------------------------------------

    /// Writes a Markdown companion beside a JSON record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    pub fn save_companion_markdown(
        &self,
        json_path: &Path,
        markdown: &str,
    ) -> Result<PathBuf, StoreError> {
        let path = json_path.with_extension("md");
        write_atomic(&path, markdown.as_bytes())?;
        Ok(path)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads every parseable JSON document in a directory.
///
/// Unparseable records are skipped with a warning so one damaged file never
/// hides the rest.
fn read_documents<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>, StoreError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(StoreError::Io(format!("{}: {err}", dir.display()))),
    };
    let mut records = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| StoreError::Io(format!("{}: {err}", dir.display())))?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "document unreadable");
                continue;
            }
        };
        match serde_json::from_str::<T>(&text) {
            Ok(record) => records.push(record),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "document corrupt");
            }
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests;
