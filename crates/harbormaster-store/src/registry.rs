// crates/harbormaster-store/src/registry.rs
// ============================================================================
// Module: Reference-ID Registry
// Description: Stable mapping from remote numeric ids to task references.
// Purpose: Assign each numeric id a reference exactly once, forever.
// Dependencies: harbormaster-core, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The registry owns the `numeric id -> reference id` mapping for evidence
//! tasks, persisted at `.registry/evidence_tasks.json` under the data root.
//! Once a numeric id is assigned a reference, that reference is never reused
//! for a different numeric id across any sequence of runs. The sync engine
//! is the single writer; saves are atomic and a save failure is reported
//! without aborting the enclosing sync.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use harbormaster_core::ErrorKind;
use harbormaster_core::TaskRef;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::documents::StoreError;
use crate::fsio::write_json_atomic;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Registry file path relative to the data root.
pub const REGISTRY_RELATIVE_PATH: &str = ".registry/evidence_tasks.json";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Registry load and save errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Filesystem operation failed.
    #[error("registry io error: {0}")]
    Io(String),
    /// Registry contents failed to parse.
    #[error("registry parse error: {0}")]
    Parse(String),
    /// Registry contents violate reference uniqueness.
    #[error("registry conflict: {0}")]
    Conflict(String),
}

impl RegistryError {
    /// Maps the error onto its domain-level kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::IoError,
            Self::Parse(_) => ErrorKind::ParseError,
            Self::Conflict(_) => ErrorKind::Conflict,
        }
    }
}

// ============================================================================
// SECTION: Persisted Form
// ============================================================================

/// Registry document as persisted on disk.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryDocument {
    /// Mapping from remote numeric id to canonical reference id.
    #[serde(default)]
    assignments: BTreeMap<i64, String>,
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// In-memory reference registry with atomic persistence.
///
/// # Invariants
/// - `reverse` always mirrors `assignments`; no reference maps to two ids.
/// - Mutation is confined to the sync engine, serialized by the caller.
#[derive(Debug)]
pub struct ReferenceRegistry {
    /// Path the registry persists to.
    path: PathBuf,
    /// Mapping from numeric id to canonical reference.
    assignments: BTreeMap<i64, String>,
    /// Reverse index enforcing reference uniqueness.
    reverse: BTreeMap<String, i64>,
}

impl ReferenceRegistry {
    /// Loads the registry from disk, starting empty when the file is absent.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the file exists but cannot be read,
    /// parsed, or violates uniqueness. A corrupt registry fails closed.
    pub fn load(path: PathBuf) -> Result<Self, RegistryError> {
        let document = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str::<RegistryDocument>(&text)
                .map_err(|err| RegistryError::Parse(format!("{}: {err}", path.display())))?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => RegistryDocument::default(),
            Err(err) => return Err(RegistryError::Io(format!("{}: {err}", path.display()))),
        };
        let mut reverse = BTreeMap::new();
        for (id, reference) in &document.assignments {
            if TaskRef::new(reference).is_none_or(|r| r.as_str() != reference) {
                return Err(RegistryError::Parse(format!(
                    "non-canonical reference {reference} for id {id}"
                )));
            }
            if let Some(previous) = reverse.insert(reference.clone(), *id) {
                return Err(RegistryError::Conflict(format!(
                    "reference {reference} assigned to both {previous} and {id}"
                )));
            }
        }
        Ok(Self {
            path,
            assignments: document.assignments,
            reverse,
        })
    }

    /// Loads the registry at its well-known path under a data root.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] as [`Self::load`] does.
    pub fn load_under(data_dir: &Path) -> Result<Self, RegistryError> {
        Self::load(data_dir.join(REGISTRY_RELATIVE_PATH))
    }

    /// Returns the reference assigned to a numeric id, when one exists.
    #[must_use]
    pub fn get(&self, numeric_id: i64) -> Option<&str> {
        self.assignments.get(&numeric_id).map(String::as_str)
    }

    /// Returns the numeric id holding a reference, when one exists.
    #[must_use]
    pub fn lookup(&self, reference: &str) -> Option<i64> {
        self.reverse.get(reference).copied()
    }

    /// Resolves the reference for a numeric id, assigning one when new.
    ///
    /// A previously registered reference for the same numeric id always
    /// wins. Otherwise the remote-supplied reference is adopted when it
    /// normalizes and is unclaimed; failing that, the smallest unused
    /// ordinal is assigned.
    pub fn resolve(&mut self, numeric_id: i64, remote_reference: Option<&TaskRef>) -> TaskRef {
        if let Some(reference) = self.assignments.get(&numeric_id).and_then(|r| TaskRef::new(r)) {
            return reference;
        }
        let reference = match remote_reference {
            Some(candidate) if !self.reverse.contains_key(candidate.as_str()) => candidate.clone(),
            _ => TaskRef::from_ordinal(smallest_unused(&self.reverse)),
        };
        self.assignments.insert(numeric_id, reference.as_str().to_string());
        self.reverse.insert(reference.as_str().to_string(), numeric_id);
        reference
    }

    /// Returns the number of assignments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Returns true when no assignments exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Persists the registry atomically to its path.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Io`] when the write fails.
    pub fn save(&self) -> Result<(), RegistryError> {
        let document = RegistryDocument {
            assignments: self.assignments.clone(),
        };
        write_json_atomic(&self.path, &document).map_err(|err| match err {
            StoreError::Parse(message) => RegistryError::Parse(message),
            other => RegistryError::Io(other.to_string()),
        })
    }
}

/// Finds the smallest unused task ordinal in the reverse index.
fn smallest_unused(reverse: &BTreeMap<String, i64>) -> u64 {
    let mut candidate = 1u64;
    while reverse.contains_key(TaskRef::from_ordinal(candidate).as_str()) {
        candidate += 1;
    }
    candidate
}

#[cfg(test)]
mod tests;
