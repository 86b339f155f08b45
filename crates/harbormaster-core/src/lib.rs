// crates/harbormaster-core/src/lib.rs
// ============================================================================
// Module: Harbormaster Core
// Description: Domain model, naming, windows, sidecars, and derived state.
// Purpose: Provide the shared vocabulary for the evidence lifecycle engine.
// Dependencies: serde, thiserror, time
// ============================================================================

//! ## Overview
//! This crate defines the canonical domain model for Harbormaster: compliance
//! entities (policies, controls, evidence tasks), reference-identifier
//! normalization and naming, evidence windows, sidecar metadata documents,
//! and the derived window/task state model the scanner reconstructs from
//! disk. It also defines the backend-agnostic interfaces the engine consumes
//! (remote platform client, document renderer, context generator) and the
//! cancellation token threaded through long-running operations.
//!
//! Invariants:
//! - Reference identifiers are normalized deterministically and idempotently.
//! - Derived state is a pure function of on-disk inputs at scan time.
//! - Core never reads wall-clock time on behalf of callers; timestamps are
//!   supplied explicitly at the boundaries that need them.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod cancel;
pub mod core;
pub mod interfaces;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cancel::CancelToken;
pub use crate::core::domain::AecStatus;
pub use crate::core::domain::Control;
pub use crate::core::domain::EvidenceFile;
pub use crate::core::domain::EvidenceTask;
pub use crate::core::domain::FrameworkCode;
pub use crate::core::domain::Policy;
pub use crate::core::errors::ErrorKind;
pub use crate::core::evaluation::Dimension;
pub use crate::core::evaluation::DimensionScore;
pub use crate::core::evaluation::DimensionStatus;
pub use crate::core::evaluation::EvaluationResult;
pub use crate::core::evaluation::Issue;
pub use crate::core::evaluation::OverallStatus;
pub use crate::core::evaluation::Severity;
pub use crate::core::identifiers::ControlRef;
pub use crate::core::identifiers::PolicyRef;
pub use crate::core::identifiers::RefKind;
pub use crate::core::identifiers::TaskRef;
pub use crate::core::identifiers::normalize_reference;
pub use crate::core::naming::document_file_stem;
pub use crate::core::naming::parse_task_dir_name;
pub use crate::core::naming::sanitize_task_dir_component;
pub use crate::core::naming::short_slug;
pub use crate::core::naming::task_dir_name;
pub use crate::core::sidecar::FileCheck;
pub use crate::core::sidecar::GeneratedFileRecord;
pub use crate::core::sidecar::GenerationMetadata;
pub use crate::core::sidecar::GenerationMethod;
pub use crate::core::sidecar::GenerationStatus;
pub use crate::core::sidecar::EvidenceSubmission;
pub use crate::core::sidecar::HistoryEntry;
pub use crate::core::sidecar::SubmissionHistory;
pub use crate::core::sidecar::SubmissionStatus;
pub use crate::core::sidecar::TugboatResponse;
pub use crate::core::sidecar::TugboatResponseMetadata;
pub use crate::core::sidecar::ValidationMode;
pub use crate::core::sidecar::ValidationResult;
pub use crate::core::state::AutomationLevel;
pub use crate::core::state::EvidenceTaskState;
pub use crate::core::state::LocalState;
pub use crate::core::state::WindowState;
pub use crate::core::state::derive_local_state;
pub use crate::core::window::CollectionInterval;
pub use crate::core::window::Window;
pub use crate::core::window::WindowParseError;
pub use interfaces::Attachment;
pub use interfaces::AttachmentKind;
pub use interfaces::ComplianceRemote;
pub use interfaces::ContextError;
pub use interfaces::ContextGenerator;
pub use interfaces::ContextRequest;
pub use interfaces::ControlSummary;
pub use interfaces::DocumentRenderer;
pub use interfaces::PolicySummary;
pub use interfaces::RemoteError;
pub use interfaces::RemoteScope;
pub use interfaces::SubmitReceipt;
pub use interfaces::SubmitUpload;
pub use interfaces::TaskSummary;
