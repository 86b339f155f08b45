// crates/harbormaster-core/src/core/state.rs
// ============================================================================
// Module: Derived Evidence State
// Description: Window and task state reconstructed by the scanner.
// Purpose: Capture lifecycle state as a pure function of on-disk inputs.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Nothing in Harbormaster persists a state machine. The scanner rebuilds
//! [`WindowState`] and [`EvidenceTaskState`] from evidence files and sidecars
//! on every pass, and [`derive_local_state`] maps a task's windows onto the
//! lifecycle states. Re-scanning without disk changes always yields the same
//! state.
//!
//! Invariants:
//! - Derived state is serializable for display but never written back.
//! - [`derive_local_state`] is pure: same windows in, same state out.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

use crate::core::domain::EvidenceFile;
use crate::core::sidecar::GenerationMethod;
use crate::core::sidecar::SubmissionStatus;

// ============================================================================
// SECTION: Lifecycle States
// ============================================================================

/// Local lifecycle state of an evidence task.
///
/// # Invariants
/// - Variants are stable for serialization and CLI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalState {
    /// No window holds evidence.
    NoEvidence,
    /// Evidence exists; validation has not passed.
    Generated,
    /// Validation passed and the window is submittable.
    Validated,
    /// A submission batch was sent.
    Submitted,
    /// The platform accepted the evidence (or archived it remotely).
    Accepted,
    /// The platform rejected the submission.
    Rejected,
}

impl LocalState {
    /// Returns the stable snake_case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoEvidence => "no_evidence",
            Self::Generated => "generated",
            Self::Validated => "validated",
            Self::Submitted => "submitted",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

/// Degree of collection automation inferred for a task.
///
/// # Invariants
/// - Variants are stable for serialization and CLI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutomationLevel {
    /// Observed tooling covers the task.
    FullyAutomated,
    /// Some but not all of the task is covered by tooling.
    PartiallyAutomated,
    /// The task description implies human-only activity.
    ManualOnly,
    /// Not enough signal to classify.
    Unknown,
}

// ============================================================================
// SECTION: Window State
// ============================================================================

/// Derived state of a single evidence window.
///
/// Flattened metadata fields follow scan priority: `archive/` first, then
/// `.submitted/`, then the working root; the first value encountered wins and
/// conflicting timestamps are never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowState {
    /// Canonical window string.
    pub window: String,
    /// Number of evidence files in the window.
    pub file_count: u32,
    /// Total evidence bytes in the window.
    pub total_bytes: u64,
    /// Oldest file modification time, when files exist.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub oldest_file: Option<OffsetDateTime>,
    /// Newest file modification time, when files exist.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub newest_file: Option<OffsetDateTime>,
    /// Evidence files, in lexicographic filename order.
    #[serde(default)]
    pub files: Vec<EvidenceFile>,
    /// Whether a generation sidecar was found.
    #[serde(default)]
    pub has_generation_meta: bool,
    /// Whether a submission sidecar was found.
    #[serde(default)]
    pub has_submission_meta: bool,
    /// Whether a validation sidecar was found.
    #[serde(default)]
    pub has_validation_meta: bool,
    /// Whether the validation sidecar marks the window submittable.
    #[serde(default)]
    pub validation_ready: bool,
    /// Whether the submission sidecar was found under `archive/`.
    #[serde(default)]
    pub submission_in_archive: bool,
    /// Generation method, when recorded.
    #[serde(default)]
    pub generation_method: Option<GenerationMethod>,
    /// Generation time, when recorded.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub generated_at: Option<OffsetDateTime>,
    /// Generating operator or service, when recorded.
    #[serde(default)]
    pub generated_by: Option<String>,
    /// Tools observed in the generation sidecar.
    #[serde(default)]
    pub tools_used: Vec<String>,
    /// Submission status, when a submission sidecar exists.
    #[serde(default)]
    pub submission_status: Option<SubmissionStatus>,
    /// Submission time, when recorded.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub submitted_at: Option<OffsetDateTime>,
    /// Locally synthesized submission identifier, when recorded.
    #[serde(default)]
    pub submission_id: Option<String>,
}

impl WindowState {
    /// Creates an empty state for a window.
    #[must_use]
    pub const fn empty(window: String) -> Self {
        Self {
            window,
            file_count: 0,
            total_bytes: 0,
            oldest_file: None,
            newest_file: None,
            files: Vec::new(),
            has_generation_meta: false,
            has_submission_meta: false,
            has_validation_meta: false,
            validation_ready: false,
            submission_in_archive: false,
            generation_method: None,
            generated_at: None,
            generated_by: None,
            tools_used: Vec::new(),
            submission_status: None,
            submitted_at: None,
            submission_id: None,
        }
    }

    /// Returns true when the window holds no files and no metadata.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.file_count == 0 && !self.has_generation_meta && !self.has_submission_meta
    }
}

// ============================================================================
// SECTION: State Derivation
// ============================================================================

/// Derives a task's local lifecycle state from its window states.
///
/// This is the canonical state machine: a pure function, not an event bus.
/// Precedence runs accepted > rejected > submitted > validated > generated,
/// so the strongest signal across windows wins.
#[must_use]
pub fn derive_local_state(windows: &BTreeMap<String, WindowState>) -> LocalState {
    if windows.values().all(WindowState::is_empty) {
        return LocalState::NoEvidence;
    }
    let mut state = LocalState::Generated;
    for window in windows.values() {
        if window.submission_in_archive
            || window.submission_status == Some(SubmissionStatus::Accepted)
        {
            return LocalState::Accepted;
        }
        if window.submission_status == Some(SubmissionStatus::Rejected) {
            state = LocalState::Rejected;
        } else if window.submission_status == Some(SubmissionStatus::Submitted)
            && state != LocalState::Rejected
        {
            state = LocalState::Submitted;
        } else if window.validation_ready
            && matches!(state, LocalState::Generated | LocalState::Validated)
        {
            state = LocalState::Validated;
        }
    }
    state
}

// ============================================================================
// SECTION: Task State
// ============================================================================

/// Derived state of an evidence task across all of its windows.
///
/// # Invariants
/// - `windows` keys are canonical window strings in lexicographic order.
/// - Never persisted; rebuilt from disk on every scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceTaskState {
    /// Canonical task reference.
    pub task_ref: String,
    /// Remote numeric task identifier, when the task document is known.
    #[serde(default)]
    pub task_id: Option<i64>,
    /// Task name.
    #[serde(default)]
    pub task_name: String,
    /// Compliance framework.
    #[serde(default)]
    pub framework: String,
    /// Remote status label reported by the platform.
    #[serde(default)]
    pub tugboat_status: String,
    /// Whether the platform marks the task completed.
    #[serde(default)]
    pub tugboat_completed: bool,
    /// Derived local lifecycle state.
    pub local_state: LocalState,
    /// Window states keyed by canonical window string.
    #[serde(default)]
    pub windows: BTreeMap<String, WindowState>,
    /// Most recent generation time across windows.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_generated_at: Option<OffsetDateTime>,
    /// Most recent submission time across windows.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_submitted_at: Option<OffsetDateTime>,
    /// Inferred automation level.
    pub automation_level: AutomationLevel,
    /// Tool families applicable to the task.
    #[serde(default)]
    pub applicable_tools: Vec<String>,
    /// Time of the scan that produced this state.
    #[serde(with = "time::serde::rfc3339")]
    pub last_scanned_at: OffsetDateTime,
}
