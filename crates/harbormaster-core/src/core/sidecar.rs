// crates/harbormaster-core/src/core/sidecar.rs
// ============================================================================
// Module: Sidecar Metadata Documents
// Description: Generation, validation, submission, and history sidecars.
// Purpose: Persist the evidence lifecycle without a separate status database.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Sidecars are small YAML documents colocated with evidence files:
//! `.generation/metadata.yaml`, `.validation/validation.yaml`,
//! `.submission/submission.yaml`, and `.submission/history.yaml`. The scanner
//! derives window and task state purely from these documents plus the files
//! on disk; nothing else records lifecycle state.
//!
//! Invariants:
//! - A file listed in `files_generated` of a colocated generation sidecar
//!   must have a matching filename.
//! - `SubmissionHistory.entries` is append-only.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

use crate::core::domain::EvidenceFile;

// ============================================================================
// SECTION: Generation Sidecar
// ============================================================================

/// How a window's evidence was produced.
///
/// # Invariants
/// - Variants are stable for serialization and state derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMethod {
    /// Produced with model assistance.
    Assisted,
    /// Produced by coordinated collection tooling.
    ToolCoordination,
    /// Produced by a direct CLI invocation.
    Cli,
    /// Collected by hand.
    Manual,
}

/// Lifecycle status recorded by the generation sidecar.
///
/// # Invariants
/// - Variants are stable for serialization and state derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    /// Generation started but incomplete.
    Draft,
    /// Files generated, not yet validated.
    Generated,
    /// Files validated against requirements.
    Validated,
}

/// Record of a single generated file.
///
/// # Invariants
/// - `checksum` is the lowercase SHA-256 hex of the file at generation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFileRecord {
    /// Path relative to the window directory.
    pub path: String,
    /// SHA-256 checksum at generation time.
    pub checksum: String,
    /// File size in bytes at generation time.
    pub size_bytes: u64,
    /// Generation time for this file.
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
}

/// Generation sidecar (`.generation/metadata.yaml`).
///
/// # Invariants
/// - `files_generated` paths resolve relative to the window directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Generation time for the window.
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
    /// Operator or service that generated the evidence.
    pub generated_by: String,
    /// Generation method.
    pub generation_method: GenerationMethod,
    /// Remote numeric task identifier.
    pub task_id: i64,
    /// Canonical task reference.
    pub task_ref: String,
    /// Canonical window string.
    pub window: String,
    /// Tools used during generation, in invocation order.
    #[serde(default)]
    pub tools_used: Vec<String>,
    /// Files generated into the window.
    #[serde(default)]
    pub files_generated: Vec<GeneratedFileRecord>,
    /// Sidecar lifecycle status.
    pub status: GenerationStatus,
}

// ============================================================================
// SECTION: Validation Sidecar
// ============================================================================

/// Validation strictness mode.
///
/// # Invariants
/// - `Strict` treats warnings as blocking; `Lenient` permits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Warnings block submission.
    #[default]
    Strict,
    /// Warnings are reported but do not block.
    Lenient,
}

/// Per-file validation check outcome.
///
/// # Invariants
/// - `detail` is empty when the check passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCheck {
    /// File name the check applies to.
    pub filename: String,
    /// Whether every check passed for the file.
    pub passed: bool,
    /// Failure detail, empty on success.
    #[serde(default)]
    pub detail: String,
}

/// Validation sidecar (`.validation/validation.yaml`).
///
/// # Invariants
/// - `ready_for_submission` is true iff `errors` is empty and, under strict
///   mode, `warnings` is empty too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Canonical task reference.
    pub task_ref: String,
    /// Canonical window string.
    pub window: String,
    /// Validation mode used.
    #[serde(default)]
    pub mode: ValidationMode,
    /// Summary status label (`passed`, `failed`, `passed_with_warnings`).
    pub status: String,
    /// Completeness score in `[0, 1]`.
    pub completeness_score: f64,
    /// Whether the window may be submitted.
    pub ready_for_submission: bool,
    /// Number of failed checks.
    pub failed_checks: u32,
    /// Blocking errors, formatted `<check>: <detail>`.
    #[serde(default)]
    pub errors: Vec<String>,
    /// Non-blocking warnings.
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Per-file check outcomes.
    #[serde(default)]
    pub file_checks: Vec<FileCheck>,
    /// Validation time.
    #[serde(with = "time::serde::rfc3339")]
    pub validated_at: OffsetDateTime,
}

// ============================================================================
// SECTION: Submission Sidecar
// ============================================================================

/// Submission lifecycle status.
///
/// # Invariants
/// - Variants are stable for serialization and state derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Submission assembled but not sent.
    Draft,
    /// At least one file was accepted by the collector endpoint.
    Submitted,
    /// The platform accepted the submission (or it was archived remotely).
    Accepted,
    /// The platform rejected the submission.
    Rejected,
    /// No file succeeded.
    SubmissionFailed,
}

/// Collector acknowledgement metadata.
///
/// # Invariants
/// - `files_submitted + files_failed` equals the attempted file count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TugboatResponseMetadata {
    /// Files the collector accepted.
    pub files_submitted: u32,
    /// Files that failed locally or remotely.
    pub files_failed: u32,
    /// Failure details, formatted `<filename>: <reason>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_files: Option<Vec<String>>,
}

/// Fire-and-forget acknowledgement recorded from the collector endpoint.
///
/// The endpoint returns no durable identifier; `submission_id` here is the
/// locally synthesized batch identifier, never a remote handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TugboatResponse {
    /// Locally synthesized batch identifier.
    #[serde(default)]
    pub submission_id: Option<String>,
    /// Acknowledgement status label.
    pub status: String,
    /// Human-readable acknowledgement message.
    #[serde(default)]
    pub message: String,
    /// Time the collector acknowledged receipt.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub received_at: Option<OffsetDateTime>,
    /// Per-batch outcome counters.
    pub metadata: TugboatResponseMetadata,
}

/// Submission sidecar (`.submission/submission.yaml`).
///
/// # Invariants
/// - `total_file_count` equals `files_submitted + files_failed` for any
///   attempt that reached the upload loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSubmission {
    /// Remote numeric task identifier.
    pub task_id: i64,
    /// Canonical task reference.
    pub task_ref: String,
    /// Canonical window string.
    pub window: String,
    /// Locally synthesized submission identifier.
    pub submission_id: String,
    /// Submission lifecycle status.
    pub status: SubmissionStatus,
    /// Time the submission record was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Time the upload batch completed, when it ran.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub submitted_at: Option<OffsetDateTime>,
    /// Time the platform accepted the submission, when known.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub accepted_at: Option<OffsetDateTime>,
    /// Evidence files included in the submission.
    #[serde(default)]
    pub evidence_files: Vec<EvidenceFile>,
    /// Total files considered for the submission.
    pub total_file_count: u32,
    /// Total bytes across considered files.
    pub total_size_bytes: u64,
    /// Operator or service that submitted.
    #[serde(default)]
    pub submitted_by: String,
    /// Free-form notes.
    #[serde(default)]
    pub notes: String,
    /// Validation summary status at submission time.
    #[serde(default)]
    pub validation_status: String,
    /// Validation errors at submission time.
    #[serde(default)]
    pub validation_errors: Vec<String>,
    /// Validation warnings at submission time.
    #[serde(default)]
    pub validation_warnings: Vec<String>,
    /// Completeness score at submission time, in `[0, 1]`.
    #[serde(default)]
    pub completeness_score: f64,
    /// Collector acknowledgement, when the upload loop ran.
    #[serde(default)]
    pub tugboat_response: Option<TugboatResponse>,
}

// ============================================================================
// SECTION: Submission History
// ============================================================================

/// One submission attempt in the append-only history.
///
/// # Invariants
/// - `file_count` counts files that succeeded in the attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Locally synthesized submission identifier.
    pub submission_id: String,
    /// Time of the attempt.
    #[serde(with = "time::serde::rfc3339")]
    pub submitted_at: OffsetDateTime,
    /// Operator or service that submitted.
    pub submitted_by: String,
    /// Outcome status of the attempt.
    pub status: SubmissionStatus,
    /// Files that succeeded in the attempt.
    pub file_count: u32,
    /// Free-form notes.
    #[serde(default)]
    pub notes: String,
}

/// Submission history sidecar (`.submission/history.yaml`).
///
/// # Invariants
/// - `entries` is append-only and ordered by attempt time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionHistory {
    /// Canonical task reference.
    pub task_ref: String,
    /// Canonical window string.
    pub window: String,
    /// Attempts, oldest first.
    #[serde(default)]
    pub entries: Vec<HistoryEntry>,
}

impl SubmissionHistory {
    /// Creates an empty history for a task window.
    #[must_use]
    pub const fn new(task_ref: String, window: String) -> Self {
        Self {
            task_ref,
            window,
            entries: Vec::new(),
        }
    }
}
