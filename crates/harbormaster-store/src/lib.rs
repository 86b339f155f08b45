// crates/harbormaster-store/src/lib.rs
// ============================================================================
// Module: Harbormaster Store
// Description: Filesystem persistence for documents, registry, and evidence.
// Purpose: Own every on-disk layout the engine reads and writes.
// Dependencies: harbormaster-core, serde, serde_json, serde_yaml, sha2, thiserror, tracing
// ============================================================================

//! ## Overview
//! This crate persists the three document kinds (policies, controls,
//! evidence tasks) as canonical JSON-plus-Markdown pairs, owns the
//! reference-ID registry with atomic saves, and provides evidence-tree IO:
//! window paths, file enumeration with statistics, and tolerant sidecar
//! reads. Every write goes through temp-plus-rename so a crash or
//! cancellation never leaves a half-written file.
//!
//! Invariants:
//! - Writes are atomic per file.
//! - Sidecar reads are tolerant: absent or corrupt yields `None` plus a
//!   warning, never an error, for scanner purposes.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod documents;
pub mod evidence;
pub mod fsio;
pub mod layout;
pub mod registry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use documents::DocumentStore;
pub use documents::StoreError;
pub use evidence::EvidenceStore;
pub use fsio::sha256_hex_file;
pub use fsio::write_atomic;
pub use layout::ARCHIVE_DIR;
pub use layout::CONTEXT_DIR;
pub use layout::GENERATION_DIR;
pub use layout::GENERATION_FILE;
pub use layout::HISTORY_FILE;
pub use layout::SUBMISSION_DIR;
pub use layout::SUBMISSION_FILE;
pub use layout::SUBMITTED_DIR;
pub use layout::VALIDATION_DIR;
pub use layout::VALIDATION_FILE;
pub use registry::ReferenceRegistry;
pub use registry::RegistryError;
