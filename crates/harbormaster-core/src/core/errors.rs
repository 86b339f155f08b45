// crates/harbormaster-core/src/core/errors.rs
// ============================================================================
// Module: Domain Error Kinds
// Description: Stable domain-level error classification.
// Purpose: Let every surface error map onto one renderable kind.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Each crate defines its own `thiserror` enums; all of them map into
//! [`ErrorKind`] so the CLI can render a structured failure report without
//! inspecting concrete error types. Kinds are domain-level, not language
//! types, and their labels are stable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Error Kinds
// ============================================================================

/// Domain-level error classification.
///
/// # Invariants
/// - Labels are stable for user-visible reports and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A referenced entity does not exist.
    NotFound,
    /// Caller-supplied input is invalid.
    InvalidInput,
    /// Stored data failed to parse.
    ParseError,
    /// Filesystem operation failed.
    IoError,
    /// The remote platform is unreachable.
    RemoteUnavailable,
    /// The remote platform rejected the credentials.
    RemoteAuth,
    /// The remote platform rejected the request.
    RemoteReject,
    /// Pre-submission validation failed.
    ValidationFailed,
    /// No collector URL is configured for the task.
    CollectorUrlMissing,
    /// A file exceeds the remote size limit.
    FileTooLarge,
    /// A file extension is not accepted by the remote platform.
    UnsupportedFileType,
    /// A recorded checksum does not match the file on disk.
    ChecksumMismatch,
    /// The operation was cancelled.
    Cancelled,
    /// Concurrent state conflicts with the requested change.
    Conflict,
}

impl ErrorKind {
    /// Returns the stable snake_case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::InvalidInput => "invalid_input",
            Self::ParseError => "parse_error",
            Self::IoError => "io_error",
            Self::RemoteUnavailable => "remote_unavailable",
            Self::RemoteAuth => "remote_auth",
            Self::RemoteReject => "remote_reject",
            Self::ValidationFailed => "validation_failed",
            Self::CollectorUrlMissing => "collector_url_missing",
            Self::FileTooLarge => "file_too_large",
            Self::UnsupportedFileType => "unsupported_file_type",
            Self::ChecksumMismatch => "checksum_mismatch",
            Self::Cancelled => "cancelled",
            Self::Conflict => "conflict",
        }
    }
}
