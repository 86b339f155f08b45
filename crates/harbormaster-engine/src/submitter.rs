// crates/harbormaster-engine/src/submitter.rs
// ============================================================================
// Module: Evidence Submitter
// Description: Per-file upload to the collector endpoint with local records.
// Purpose: Submit a window's evidence and durably record the outcome.
// Dependencies: harbormaster-core, harbormaster-store, time, tracing
// ============================================================================

//! ## Overview
//! The submitter validates (unless skipped), then uploads the working root's
//! files strictly sequentially in ascending filename order. The collector
//! endpoint is fire-and-forget, so the submission identifier is synthesized
//! locally (`batch-<unix_ts>-files-<ok_count>`) and the outcome is persisted
//! as a submission sidecar plus an append-only history entry under
//! `.submitted/`. A submission succeeds iff at least one file uploaded; the
//! submitter never re-queries remote state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use harbormaster_core::CancelToken;
use harbormaster_core::ComplianceRemote;
use harbormaster_core::ErrorKind;
use harbormaster_core::EvidenceFile;
use harbormaster_core::EvidenceSubmission;
use harbormaster_core::HistoryEntry;
use harbormaster_core::RemoteError;
use harbormaster_core::SubmissionStatus;
use harbormaster_core::SubmitUpload;
use harbormaster_core::TaskRef;
use harbormaster_core::TugboatResponse;
use harbormaster_core::TugboatResponseMetadata;
use harbormaster_core::ValidationMode;
use harbormaster_core::ValidationResult;
use harbormaster_store::DocumentStore;
use harbormaster_store::EvidenceStore;
use harbormaster_store::SUBMITTED_DIR;
use harbormaster_store::StoreError;
use thiserror::Error;
use time::OffsetDateTime;

use crate::filetypes::content_type_for;
use crate::filetypes::is_accepted_extension;
use crate::validator::Validator;

// ============================================================================
// SECTION: Request and Response
// ============================================================================

/// Submission request for one task window.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    /// Canonical task reference.
    pub task_ref: TaskRef,
    /// Canonical window string.
    pub window: String,
    /// Free-form notes recorded with the submission.
    pub notes: String,
    /// Skip the pre-submission validation gate.
    pub skip_validation: bool,
    /// Validation strictness when the gate runs.
    pub validation_mode: ValidationMode,
    /// Operator or service submitting.
    pub submitted_by: String,
}

/// Submission outcome returned to the caller.
///
/// # Invariants
/// - `files_submitted + files_failed` equals the attempted file count for
///   completed (non-cancelled) attempts.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SubmitResponse {
    /// Whether at least one file was uploaded.
    pub success: bool,
    /// Stable status label (`submitted`, `validation_failed`).
    pub status: String,
    /// Locally synthesized submission identifier, when a batch ran.
    pub submission_id: Option<String>,
    /// Files the collector accepted.
    pub files_submitted: u32,
    /// Files that failed locally or remotely.
    pub files_failed: u32,
    /// Failure details, formatted `<filename>: <reason>`.
    pub failed_files: Vec<String>,
    /// Validation result when the gate ran.
    pub validation: Option<ValidationResult>,
    /// Human-readable summary.
    pub message: String,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Submitter errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Document or evidence store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// No collector URL is configured for the task.
    #[error("no collector url configured for {0}")]
    CollectorUrlMissing(String),
    /// The request cannot be satisfied as stated.
    #[error("invalid submission request: {0}")]
    Invalid(String),
    /// Every file failed; the first failure is carried.
    #[error("submission failed: {first}")]
    AllFilesFailed {
        /// First recorded failure, formatted `<filename>: <reason>`.
        first: String,
    },
    /// The operation was cancelled between per-file uploads.
    #[error("submission cancelled")]
    Cancelled,
}

impl SubmitError {
    /// Maps the error onto its domain-level kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Store(err) => err.kind(),
            Self::CollectorUrlMissing(_) => ErrorKind::CollectorUrlMissing,
            Self::Invalid(_) => ErrorKind::InvalidInput,
            Self::AllFilesFailed { .. } => ErrorKind::RemoteReject,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}

// ============================================================================
// SECTION: Submitter
// ============================================================================

/// Evidence submitter over the remote collector endpoint.
pub struct Submitter {
    /// Evidence tree access.
    evidence: EvidenceStore,
    /// Document store for task lookups.
    documents: DocumentStore,
    /// Remote platform client.
    remote: Arc<dyn ComplianceRemote>,
    /// Collector URLs keyed by canonical task reference.
    collector_urls: BTreeMap<String, String>,
}

impl Submitter {
    /// Creates a submitter.
    #[must_use]
    pub const fn new(
        evidence: EvidenceStore,
        documents: DocumentStore,
        remote: Arc<dyn ComplianceRemote>,
        collector_urls: BTreeMap<String, String>,
    ) -> Self {
        Self {
            evidence,
            documents,
            remote,
            collector_urls,
        }
    }

    /// Submits a window's working-root evidence file by file.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError`] for infrastructure failures, a missing
    /// collector URL, cancellation, or a batch in which no file succeeded.
    /// A failed validation gate is a response, not an error.
    pub fn submit(
        &self,
        request: &SubmitRequest,
        cancel: &CancelToken,
        now: OffsetDateTime,
    ) -> Result<SubmitResponse, SubmitError> {
        // Step 1: the validation gate runs before anything touches disk.
        let validation = if request.skip_validation {
            None
        } else {
            let result = Validator::new(self.evidence.clone()).validate(
                &request.task_ref,
                &request.window,
                request.validation_mode,
                now,
            )?;
            if !result.ready_for_submission {
                return Ok(SubmitResponse {
                    success: false,
                    status: "validation_failed".to_string(),
                    submission_id: None,
                    files_submitted: 0,
                    files_failed: 0,
                    failed_files: Vec::new(),
                    validation: Some(result),
                    message: "validation gate rejected the window".to_string(),
                });
            }
            Some(result)
        };

        // Step 2: resolve the task record for its numeric identifier.
        let task = self.documents.get_task(request.task_ref.as_str())?;

        // Step 3: enumerate the working root, ascending filename order.
        let window_dir = self
            .evidence
            .find_task_dir(&request.task_ref)?
            .map(|dir| dir.join(&request.window))
            .filter(|dir| dir.is_dir())
            .ok_or_else(|| {
                StoreError::NotFound(format!(
                    "window {} of {}",
                    request.window, request.task_ref
                ))
            })?;
        let files = self.evidence.evidence_files(&window_dir, "")?;
        if files.is_empty() {
            return Err(SubmitError::Invalid(format!(
                "window {} has no evidence files",
                request.window
            )));
        }
        let total_file_count = u32::try_from(files.len()).unwrap_or(u32::MAX);
        let total_size_bytes: u64 = files.iter().map(|f| f.size_bytes).sum();

        // Step 4: the collector URL must be configured for the task.
        let collector_url = self
            .collector_urls
            .get(request.task_ref.as_str())
            .cloned()
            .ok_or_else(|| SubmitError::CollectorUrlMissing(request.task_ref.to_string()))?;

        // Step 5: strictly sequential per-file uploads.
        let mut files_submitted = 0u32;
        let mut failed_files: Vec<String> = Vec::new();
        let mut last_received_at: Option<OffsetDateTime> = None;
        for file in &files {
            if cancel.is_cancelled() {
                self.persist_best_effort(
                    &window_dir,
                    request,
                    task.id,
                    &files,
                    total_file_count,
                    total_size_bytes,
                    files_submitted,
                    &failed_files,
                    last_received_at,
                    validation.as_ref(),
                    now,
                    true,
                );
                return Err(SubmitError::Cancelled);
            }
            if !is_accepted_extension(&file.filename) {
                failed_files.push(format!("{}: unsupported_file_type", file.filename));
                continue;
            }
            let upload = SubmitUpload {
                collector_url: collector_url.clone(),
                file_path: window_dir.join(&file.relative_path),
                collected_date: now.date(),
                content_type: content_type_for(&file.filename).to_string(),
            };
            match self.remote.submit_evidence(&upload, cancel) {
                Ok(receipt) => {
                    files_submitted += 1;
                    if receipt.received_at.is_some() {
                        last_received_at = receipt.received_at;
                    }
                }
                Err(RemoteError::Cancelled) => {
                    self.persist_best_effort(
                        &window_dir,
                        request,
                        task.id,
                        &files,
                        total_file_count,
                        total_size_bytes,
                        files_submitted,
                        &failed_files,
                        last_received_at,
                        validation.as_ref(),
                        now,
                        true,
                    );
                    return Err(SubmitError::Cancelled);
                }
                Err(err) => {
                    failed_files.push(format!("{}: {}", file.filename, err.kind().as_str()));
                }
            }
        }

        let files_failed = u32::try_from(failed_files.len()).unwrap_or(u32::MAX);

        // Steps 6 and 7: persist the outcome and report. A sidecar write
        // failure on the success path is fatal to the submission.
        if files_submitted > 0 {
            let submission_id = self.persist_outcome(
                &window_dir,
                request,
                task.id,
                &files,
                total_file_count,
                total_size_bytes,
                files_submitted,
                &failed_files,
                last_received_at,
                validation.as_ref(),
                now,
                false,
            )?;
            Ok(SubmitResponse {
                success: true,
                status: "submitted".to_string(),
                submission_id: Some(submission_id),
                files_submitted,
                files_failed,
                failed_files,
                validation,
                message: format!(
                    "submitted {files_submitted} of {total_file_count} files"
                ),
            })
        } else {
            self.persist_best_effort(
                &window_dir,
                request,
                task.id,
                &files,
                total_file_count,
                total_size_bytes,
                0,
                &failed_files,
                last_received_at,
                validation.as_ref(),
                now,
                false,
            );
            let first = failed_files
                .first()
                .cloned()
                .unwrap_or_else(|| "no file reached the collector".to_string());
            Err(SubmitError::AllFilesFailed {
                first,
            })
        }
    }

    /// Persists a failed or cancelled attempt, logging rather than raising.
    #[allow(
        clippy::too_many_arguments,
        reason = "Outcome persistence threads the full batch context once."
    )]
    fn persist_best_effort(
        &self,
        window_dir: &Path,
        request: &SubmitRequest,
        task_id: i64,
        files: &[EvidenceFile],
        total_file_count: u32,
        total_size_bytes: u64,
        files_submitted: u32,
        failed_files: &[String],
        received_at: Option<OffsetDateTime>,
        validation: Option<&ValidationResult>,
        now: OffsetDateTime,
        cancelled: bool,
    ) {
        if let Err(err) = self.persist_outcome(
            window_dir,
            request,
            task_id,
            files,
            total_file_count,
            total_size_bytes,
            files_submitted,
            failed_files,
            received_at,
            validation,
            now,
            cancelled,
        ) {
            tracing::warn!(error = %err, "failed to persist submission attempt");
        }
    }

    /// Persists the submission sidecar and history entry under `.submitted/`.
    #[allow(
        clippy::too_many_arguments,
        reason = "Outcome persistence threads the full batch context once."
    )]
    fn persist_outcome(
        &self,
        window_dir: &Path,
        request: &SubmitRequest,
        task_id: i64,
        files: &[EvidenceFile],
        total_file_count: u32,
        total_size_bytes: u64,
        files_submitted: u32,
        failed_files: &[String],
        received_at: Option<OffsetDateTime>,
        validation: Option<&ValidationResult>,
        now: OffsetDateTime,
        cancelled: bool,
    ) -> Result<String, StoreError> {
        let files_failed = u32::try_from(failed_files.len()).unwrap_or(u32::MAX);
        let status = if files_submitted > 0 {
            SubmissionStatus::Submitted
        } else {
            SubmissionStatus::SubmissionFailed
        };
        let submission_id =
            format!("batch-{}-files-{files_submitted}", now.unix_timestamp());
        let submission = EvidenceSubmission {
            task_id,
            task_ref: request.task_ref.as_str().to_string(),
            window: request.window.clone(),
            submission_id: submission_id.clone(),
            status,
            created_at: now,
            submitted_at: (files_submitted > 0).then_some(now),
            accepted_at: None,
            evidence_files: files.to_vec(),
            total_file_count,
            total_size_bytes,
            submitted_by: request.submitted_by.clone(),
            notes: request.notes.clone(),
            validation_status: validation.map_or_else(String::new, |v| v.status.clone()),
            validation_errors: validation.map_or_else(Vec::new, |v| v.errors.clone()),
            validation_warnings: validation.map_or_else(Vec::new, |v| v.warnings.clone()),
            completeness_score: validation.map_or(0.0, |v| v.completeness_score),
            tugboat_response: Some(TugboatResponse {
                submission_id: Some(submission_id.clone()),
                status: if cancelled {
                    "cancelled".to_string()
                } else if files_submitted > 0 {
                    "received".to_string()
                } else {
                    "failed".to_string()
                },
                message: String::new(),
                received_at,
                metadata: TugboatResponseMetadata {
                    files_submitted,
                    files_failed,
                    failed_files: (!failed_files.is_empty())
                        .then(|| failed_files.to_vec()),
                },
            }),
        };

        let base = window_dir.join(SUBMITTED_DIR);
        self.evidence.write_submission(&base, &submission)?;
        let entry = HistoryEntry {
            submission_id: submission_id.clone(),
            submitted_at: now,
            submitted_by: request.submitted_by.clone(),
            status,
            file_count: files_submitted,
            notes: request.notes.clone(),
        };
        self.evidence.append_history(&base, request.task_ref.as_str(), &request.window, entry)?;
        Ok(submission_id)
    }
}
