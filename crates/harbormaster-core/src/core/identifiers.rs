// crates/harbormaster-core/src/core/identifiers.rs
// ============================================================================
// Module: Reference Identifiers
// Description: Canonical human-readable reference identifiers and normalization.
// Purpose: Provide strongly typed reference IDs with deterministic canonical forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Remote records carry loosely formatted reference identifiers (`ET1`,
//! `P12`, `CC6.8`). This module normalizes them into the canonical forms used
//! everywhere on disk and in memory: `ET-0001`, `POL-0012`, `CC-06.8`.
//! Normalization is deterministic, idempotent, and never panics; input that
//! does not match a kind's grammar yields `None` and callers keep the
//! original string flagged as unrecognized.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Reference Kinds
// ============================================================================

/// Kinds of reference identifiers tracked by Harbormaster.
///
/// # Invariants
/// - Variants are stable for serialization and registry bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefKind {
    /// Evidence task references (`ET-0001`).
    EvidenceTask,
    /// Policy references (`POL-0001`).
    Policy,
    /// Control references (`CC-06` / `CC-06.8`).
    Control,
}

impl RefKind {
    /// Returns the canonical prefix for the kind, where one exists.
    ///
    /// Controls carry a record-specific two-letter prefix and have no single
    /// canonical prefix.
    #[must_use]
    pub const fn prefix(self) -> Option<&'static str> {
        match self {
            Self::EvidenceTask => Some("ET"),
            Self::Policy => Some("POL"),
            Self::Control => None,
        }
    }
}

// ============================================================================
// SECTION: Normalization
// ============================================================================

/// Normalizes a reference identifier into its canonical form.
///
/// Returns `None` when the input does not match the kind's grammar. The
/// function is idempotent: normalizing a canonical form yields the same
/// string.
#[must_use]
pub fn normalize_reference(kind: RefKind, input: &str) -> Option<String> {
    let trimmed = input.trim().to_ascii_uppercase();
    match kind {
        RefKind::EvidenceTask => {
            normalize_prefixed(&trimmed, &["ET"]).map(|n| format!("ET-{n:04}"))
        }
        RefKind::Policy => {
            normalize_prefixed(&trimmed, &["POL", "P"]).map(|n| format!("POL-{n:04}"))
        }
        RefKind::Control => normalize_control(&trimmed),
    }
}

/// Parses `<PREFIX>-?<digits>` for the first matching prefix.
fn normalize_prefixed(input: &str, prefixes: &[&str]) -> Option<u64> {
    for prefix in prefixes {
        if let Some(rest) = input.strip_prefix(prefix) {
            let digits = rest.strip_prefix('-').unwrap_or(rest);
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                return digits.parse::<u64>().ok();
            }
        }
    }
    None
}

/// Parses `XX-?NN(.M)?` into the canonical dotted control form.
fn normalize_control(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    if bytes.len() < 3 || !bytes[0].is_ascii_uppercase() || !bytes[1].is_ascii_uppercase() {
        return None;
    }
    let prefix = &input[..2];
    let rest = input[2..].strip_prefix('-').unwrap_or(&input[2..]);
    let (major_digits, minor_digits) = match rest.split_once('.') {
        Some((major, minor)) => (major, Some(minor)),
        None => (rest, None),
    };
    if major_digits.is_empty() || !major_digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let major = major_digits.parse::<u32>().ok()?;
    match minor_digits {
        Some(minor) => {
            if minor.is_empty() || !minor.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let minor = minor.parse::<u32>().ok()?;
            Some(format!("{prefix}-{major:02}.{minor}"))
        }
        None => Some(format!("{prefix}-{major:02}")),
    }
}

// ============================================================================
// SECTION: Typed References
// ============================================================================

/// Canonical evidence-task reference (`ET-0001`).
///
/// # Invariants
/// - The wrapped string is always in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskRef(String);

impl TaskRef {
    /// Normalizes an input into a canonical task reference.
    #[must_use]
    pub fn new(input: &str) -> Option<Self> {
        normalize_reference(RefKind::EvidenceTask, input).map(Self)
    }

    /// Builds a canonical task reference from an assigned ordinal.
    #[must_use]
    pub fn from_ordinal(ordinal: u64) -> Self {
        Self(format!("ET-{ordinal:04}"))
    }

    /// Returns the reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Canonical policy reference (`POL-0001`).
///
/// # Invariants
/// - The wrapped string is always in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyRef(String);

impl PolicyRef {
    /// Normalizes an input into a canonical policy reference.
    #[must_use]
    pub fn new(input: &str) -> Option<Self> {
        normalize_reference(RefKind::Policy, input).map(Self)
    }

    /// Builds a canonical policy reference from an assigned ordinal.
    #[must_use]
    pub fn from_ordinal(ordinal: u64) -> Self {
        Self(format!("POL-{ordinal:04}"))
    }

    /// Returns the reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PolicyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Canonical control reference (`CC-06` or `CC-06.8`).
///
/// In-memory and in-document forms keep the dot; filenames swap the dot for
/// an underscore (`CC-06_8`).
///
/// # Invariants
/// - The wrapped string is always in canonical dotted form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControlRef(String);

impl ControlRef {
    /// Normalizes an input into a canonical control reference.
    #[must_use]
    pub fn new(input: &str) -> Option<Self> {
        normalize_reference(RefKind::Control, input).map(Self)
    }

    /// Parses the underscore filename form (`CC-06_8`) back to dotted form.
    #[must_use]
    pub fn from_file_form(input: &str) -> Option<Self> {
        Self::new(&input.replace('_', "."))
    }

    /// Returns the underscore form used in filenames.
    #[must_use]
    pub fn file_form(&self) -> String {
        self.0.replace('.', "_")
    }

    /// Returns the reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ControlRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests;
