// crates/harbormaster-core/src/interfaces/mod.rs
// ============================================================================
// Module: Harbormaster Interfaces
// Description: Backend-agnostic interfaces for the remote platform and collaborators.
// Purpose: Define the contract surfaces consumed by the evidence engine.
// Dependencies: crate::core, serde, thiserror, time
// ============================================================================

//! ## Overview
//! Interfaces define how the engine reaches external systems without
//! embedding backend details. The remote platform client is a trait so tests
//! substitute an in-memory fake; Markdown rendering and context generation
//! are collaborator seams the engine threads through without knowing the
//! backend. Implementations must redact credentials from every error they
//! surface.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use time::Date;
use time::OffsetDateTime;

use crate::cancel::CancelToken;
use crate::core::domain::Control;
use crate::core::domain::EvidenceTask;
use crate::core::domain::Policy;
use crate::core::errors::ErrorKind;

// ============================================================================
// SECTION: Remote Errors
// ============================================================================

/// Remote platform client errors.
///
/// # Invariants
/// - Messages never contain credentials; implementations redact before
///   constructing a variant.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The platform could not be reached.
    #[error("remote unavailable: {0}")]
    Unavailable(String),
    /// The platform rejected the credentials.
    #[error("remote authentication failed: {0}")]
    Auth(String),
    /// The platform rejected the request.
    #[error("remote rejected request ({status}): {message}")]
    Reject {
        /// HTTP status code.
        status: u16,
        /// Redacted response message.
        message: String,
    },
    /// A response body failed to decode.
    #[error("remote response parse error: {0}")]
    Parse(String),
    /// A local filesystem step of a transfer failed.
    #[error("remote transfer io error: {0}")]
    Io(String),
    /// The operation was cancelled.
    #[error("remote operation cancelled")]
    Cancelled,
}

impl RemoteError {
    /// Maps the error onto its domain-level kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unavailable(_) => ErrorKind::RemoteUnavailable,
            Self::Auth(_) => ErrorKind::RemoteAuth,
            Self::Reject { .. } => ErrorKind::RemoteReject,
            Self::Parse(_) => ErrorKind::ParseError,
            Self::Io(_) => ErrorKind::IoError,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}

// ============================================================================
// SECTION: Remote Scope and Summaries
// ============================================================================

/// Scope filter applied to remote list calls.
///
/// # Invariants
/// - `framework` filters server-side when set; `None` lists everything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteScope {
    /// Organization identifier.
    pub org_id: String,
    /// Optional framework filter.
    #[serde(default)]
    pub framework: Option<String>,
}

/// Policy list-entry summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySummary {
    /// Stable opaque remote identifier.
    pub id: String,
    /// Raw reference identifier as reported by the platform.
    #[serde(default)]
    pub reference_id: String,
    /// Policy name.
    pub name: String,
}

/// Control list-entry summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSummary {
    /// Stable remote identifier.
    pub id: i64,
    /// Raw reference identifier as reported by the platform.
    #[serde(default)]
    pub reference_id: String,
    /// Control name.
    pub name: String,
}

/// Evidence-task list-entry summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    /// Stable remote identifier.
    pub id: i64,
    /// Raw reference identifier as reported by the platform.
    #[serde(default)]
    pub reference_id: String,
    /// Task name.
    pub name: String,
}

// ============================================================================
// SECTION: Attachments
// ============================================================================

/// Kind of a submitted attachment tracked by the platform.
///
/// # Invariants
/// - Unknown kinds are preserved verbatim and counted as skipped by sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    /// A binary file download.
    File,
    /// A URL reference.
    Url,
    /// Any other kind, preserved verbatim.
    #[serde(untagged)]
    Other(String),
}

/// Attachment metadata for a task's submitted evidence.
///
/// # Invariants
/// - `collected_date` buckets the attachment into a window when present; a
///   missing or unparseable date is preserved as `None` so the sync engine
///   can account for the attachment instead of dropping it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Stable remote identifier.
    pub id: i64,
    /// Owning task identifier.
    pub task_id: i64,
    /// Attachment kind.
    pub kind: AttachmentKind,
    /// Original filename, when the platform recorded one.
    #[serde(default)]
    pub filename: Option<String>,
    /// Referenced URL for `url` attachments.
    #[serde(default)]
    pub url: Option<String>,
    /// Free-form notes.
    #[serde(default)]
    pub notes: String,
    /// Date the evidence was collected, when the platform reported a
    /// parseable one.
    #[serde(default)]
    pub collected_date: Option<Date>,
}

// ============================================================================
// SECTION: Submission Upload
// ============================================================================

/// One-file upload request for the collector endpoint.
///
/// # Invariants
/// - `content_type` comes from the static extension table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitUpload {
    /// Per-task collector URL.
    pub collector_url: String,
    /// Local path of the file to upload.
    pub file_path: PathBuf,
    /// Collection date recorded with the upload.
    pub collected_date: Date,
    /// MIME content type for the file part.
    pub content_type: String,
}

/// Fire-and-forget collector acknowledgement.
///
/// The endpoint returns no durable identifier; callers persist local
/// submission state themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    /// Time the collector acknowledged receipt, when reported.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub received_at: Option<OffsetDateTime>,
    /// Acknowledgement status label.
    #[serde(default)]
    pub status: String,
    /// Acknowledgement message.
    #[serde(default)]
    pub message: String,
}

// ============================================================================
// SECTION: Remote Client
// ============================================================================

/// Typed client for the compliance platform.
///
/// Implementations are thread-safe, connection-pooled, and check the cancel
/// token before each request.
pub trait ComplianceRemote: Send + Sync {
    /// Lists policy summaries in scope.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when the list call fails.
    fn list_policies(
        &self,
        scope: &RemoteScope,
        cancel: &CancelToken,
    ) -> Result<Vec<PolicySummary>, RemoteError>;

    /// Fetches one policy in detail.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when the fetch fails.
    fn get_policy(&self, id: &str, cancel: &CancelToken) -> Result<Policy, RemoteError>;

    /// Lists control summaries in scope.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when the list call fails.
    fn list_controls(
        &self,
        scope: &RemoteScope,
        cancel: &CancelToken,
    ) -> Result<Vec<ControlSummary>, RemoteError>;

    /// Fetches one control in detail.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when the fetch fails.
    fn get_control(&self, id: i64, cancel: &CancelToken) -> Result<Control, RemoteError>;

    /// Lists evidence-task summaries in scope.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when the list call fails.
    fn list_evidence_tasks(
        &self,
        scope: &RemoteScope,
        cancel: &CancelToken,
    ) -> Result<Vec<TaskSummary>, RemoteError>;

    /// Fetches one evidence task in detail.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when the fetch fails.
    fn get_evidence_task(&self, id: i64, cancel: &CancelToken)
    -> Result<EvidenceTask, RemoteError>;

    /// Lists submitted attachments for a task.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when the list call fails.
    fn list_attachments(
        &self,
        task_id: i64,
        cancel: &CancelToken,
    ) -> Result<Vec<Attachment>, RemoteError>;

    /// Downloads an attachment body to `dest`, returning bytes written.
    ///
    /// The write goes through a temp file plus rename so a cancelled or
    /// failed download never leaves a partial file at `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when the download or write fails.
    fn download_attachment(
        &self,
        attachment: &Attachment,
        dest: &Path,
        cancel: &CancelToken,
    ) -> Result<u64, RemoteError>;

    /// Uploads exactly one file to the task's collector endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when the upload fails.
    fn submit_evidence(
        &self,
        upload: &SubmitUpload,
        cancel: &CancelToken,
    ) -> Result<SubmitReceipt, RemoteError>;
}

// ============================================================================
// SECTION: Document Renderer
// ============================================================================

/// Renders domain records into user-facing Markdown documents.
///
/// Rendering is pure; `variables` come from the interpolation configuration
/// and substitute `{{name}}` placeholders.
pub trait DocumentRenderer: Send + Sync {
    /// Renders a policy document.
    fn render_policy(&self, policy: &Policy, variables: &BTreeMap<String, String>) -> String;

    /// Renders a control document.
    fn render_control(&self, control: &Control, variables: &BTreeMap<String, String>) -> String;

    /// Renders an evidence-task document.
    fn render_task(&self, task: &EvidenceTask, variables: &BTreeMap<String, String>) -> String;
}

// ============================================================================
// SECTION: Context Generator
// ============================================================================

/// Context-generation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ContextError {
    /// The generator backend reported an error.
    #[error("context generator error: {0}")]
    Generator(String),
}

/// Request handed to the opaque context generator.
///
/// # Invariants
/// - `output_path` is the fixed `<window>/.context/generation-context.md`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextRequest {
    /// Task the context is generated for.
    pub task: EvidenceTask,
    /// Canonical window string.
    pub window: String,
    /// Fixed output path for the generated context document.
    pub output_path: PathBuf,
}

/// Opaque collaborator that writes a generation-context document.
pub trait ContextGenerator: Send + Sync {
    /// Generates the context document at the request's output path.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError`] when generation fails.
    fn generate(&self, request: &ContextRequest) -> Result<(), ContextError>;
}
