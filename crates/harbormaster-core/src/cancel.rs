// crates/harbormaster-core/src/cancel.rs
// ============================================================================
// Module: Cancellation Token
// Description: Cooperative cancellation for long-running operations.
// Purpose: Let callers abort sync, scan, and submission work promptly.
// Dependencies: std::sync
// ============================================================================

//! ## Overview
//! Every long-running operation accepts a [`CancelToken`]. The token is a
//! cheaply clonable flag checked at suspension points: before remote
//! requests, between per-file uploads, and between per-entity sync steps.
//! Partially completed work must leave the filesystem consistent; writers
//! use temp-plus-rename so either the old or the new file exists.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

// ============================================================================
// SECTION: Cancel Token
// ============================================================================

/// Cooperative cancellation flag shared across threads.
///
/// # Invariants
/// - Once cancelled, the token never resets.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    /// Shared cancellation flag.
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a fresh, uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation for every clone of the token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Returns true when cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
