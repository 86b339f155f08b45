// crates/harbormaster-store/src/layout.rs
// ============================================================================
// Module: Evidence Tree Layout
// Description: Directory and file names of the on-disk evidence layout.
// Purpose: Keep every layout name in one place for store, scanner, and cleanup.
// Dependencies: none
// ============================================================================

//! ## Overview
//! The hybrid window layout places working files at the window root,
//! locally submitted copies under `.submitted/`, and the authoritative
//! remote-archived copies under `archive/`. Sidecar directories
//! (`.generation/`, `.validation/`, `.submission/`, `.context/`) may sit at
//! the window root or inside `archive/`.

// ============================================================================
// SECTION: Subfolder Names
// ============================================================================

/// Authoritative copies mirrored from the platform.
pub const ARCHIVE_DIR: &str = "archive";
/// Locally submitted copies.
pub const SUBMITTED_DIR: &str = ".submitted";
/// Generation sidecar directory.
pub const GENERATION_DIR: &str = ".generation";
/// Validation sidecar directory.
pub const VALIDATION_DIR: &str = ".validation";
/// Submission sidecar directory.
pub const SUBMISSION_DIR: &str = ".submission";
/// Context-generator output directory.
pub const CONTEXT_DIR: &str = ".context";

// ============================================================================
// SECTION: Sidecar File Names
// ============================================================================

/// Generation sidecar filename.
pub const GENERATION_FILE: &str = "metadata.yaml";
/// Validation sidecar filename.
pub const VALIDATION_FILE: &str = "validation.yaml";
/// Submission sidecar filename.
pub const SUBMISSION_FILE: &str = "submission.yaml";
/// Submission history filename.
pub const HISTORY_FILE: &str = "history.yaml";

// ============================================================================
// SECTION: Legacy Names
// ============================================================================

/// Legacy subfolder names that mark a window as already migrated.
pub const LEGACY_SUBFOLDERS: &[&str] = &["wip", "ready", "submitted"];

/// Collection-plan file prefix excluded from evidence moves.
pub const COLLECTION_PLAN_PREFIX: &str = "collection_plan.";
