// crates/harbormaster-core/src/core/domain.rs
// ============================================================================
// Module: Compliance Entities
// Description: Policies, controls, evidence tasks, and evidence files.
// Purpose: Canonical domain representation persisted by the document store.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! These are the domain-side records the sync engine materializes from remote
//! summaries and details. Remote payloads are converted through pure adapters
//! in the remote crate; nothing here knows about the wire shape. Optional
//! timestamps stay optional because remote data is frequently incomplete.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use time::Date;
use time::OffsetDateTime;

use crate::core::window::CollectionInterval;

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Compliance policy document.
///
/// # Invariants
/// - `reference_id` is canonical (`POL-NNNN`) when `reference_recognized`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Stable opaque remote identifier.
    pub id: String,
    /// Human-readable reference identifier (`POL-NNNN`).
    pub reference_id: String,
    /// Whether `reference_id` parsed into canonical form.
    #[serde(default = "default_true")]
    pub reference_recognized: bool,
    /// Policy name.
    pub name: String,
    /// Policy content, possibly Markdown.
    #[serde(default)]
    pub content: String,
    /// Compliance framework the policy belongs to.
    #[serde(default)]
    pub framework: String,
    /// Policy version label.
    #[serde(default)]
    pub version: String,
    /// Remote status label.
    #[serde(default)]
    pub status: String,
    /// Creation time, when known.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    /// Last update time, when known.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

// ============================================================================
// SECTION: Control
// ============================================================================

/// Framework code attached to a control.
///
/// # Invariants
/// - Order is preserved as received from the remote platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkCode {
    /// Code within the framework (for example `CC6.8`).
    pub code: String,
    /// Framework the code belongs to.
    pub framework: String,
}

/// Compliance control record.
///
/// # Invariants
/// - `reference_id` keeps the dotted form (`CC-06.8`) when recognized;
///   filenames use the underscore form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Control {
    /// Stable remote identifier.
    pub id: i64,
    /// Human-readable reference identifier (`XX-NN` or `XX-NN.M`).
    pub reference_id: String,
    /// Whether `reference_id` parsed into canonical form.
    #[serde(default = "default_true")]
    pub reference_recognized: bool,
    /// Control name.
    pub name: String,
    /// Control description.
    #[serde(default)]
    pub description: String,
    /// Compliance framework the control belongs to.
    #[serde(default)]
    pub framework: String,
    /// Control category label.
    #[serde(default)]
    pub category: String,
    /// Remote status label.
    #[serde(default)]
    pub status: String,
    /// Framework codes mapped onto this control, in remote order.
    #[serde(default)]
    pub framework_codes: Vec<FrameworkCode>,
    /// Date the control was implemented, when known.
    #[serde(default)]
    pub implemented_date: Option<Date>,
    /// Date the control was last tested, when known.
    #[serde(default)]
    pub tested_date: Option<Date>,
}

// ============================================================================
// SECTION: Evidence Task
// ============================================================================

/// Automated-evidence-collection status reported by the remote platform.
///
/// Passed through untouched; scoring never reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AecStatus {
    /// Remote AEC status label.
    #[serde(default)]
    pub status: String,
    /// Last execution time, when known.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_executed: Option<OffsetDateTime>,
    /// Next scheduled execution, when known.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub next_scheduled: Option<OffsetDateTime>,
}

/// Evidence collection task.
///
/// # Invariants
/// - `reference_id` is canonical (`ET-NNNN`) when `reference_recognized`.
/// - `controls` and `policies` are sets of canonical reference identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceTask {
    /// Stable remote identifier.
    pub id: i64,
    /// Human-readable reference identifier (`ET-NNNN`).
    pub reference_id: String,
    /// Whether `reference_id` parsed into canonical form.
    #[serde(default = "default_true")]
    pub reference_recognized: bool,
    /// Task name.
    pub name: String,
    /// Task description.
    #[serde(default)]
    pub description: String,
    /// Collection guidance supplied by the platform.
    #[serde(default)]
    pub guidance: String,
    /// Compliance framework the task belongs to.
    #[serde(default)]
    pub framework: String,
    /// Remote priority label.
    #[serde(default)]
    pub priority: String,
    /// Remote status label.
    #[serde(default)]
    pub status: String,
    /// Whether the remote platform marks the task completed.
    #[serde(default)]
    pub completed: bool,
    /// Control reference identifiers this task satisfies.
    #[serde(default)]
    pub controls: BTreeSet<String>,
    /// Policy identifiers this task relates to.
    #[serde(default)]
    pub policies: BTreeSet<String>,
    /// Evidence collection cadence.
    #[serde(default)]
    pub collection_interval: CollectionInterval,
    /// Next due time, when known.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub next_due: Option<OffsetDateTime>,
    /// Whether the task handles sensitive evidence.
    #[serde(default)]
    pub sensitive: bool,
    /// Automated-collection status, when reported.
    #[serde(default)]
    pub aec_status: Option<AecStatus>,
    /// Embedded snapshots of related controls, in remote order.
    #[serde(default)]
    pub related_controls: Vec<Control>,
}

// ============================================================================
// SECTION: Evidence Files
// ============================================================================

/// A single evidence file observed in a window.
///
/// # Invariants
/// - `checksum` is lowercase SHA-256 hex when present.
/// - `relative_path` is relative to the window directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceFile {
    /// File name without directories.
    pub filename: String,
    /// Path relative to the window directory.
    pub relative_path: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Last modification time.
    #[serde(with = "time::serde::rfc3339")]
    pub modified_at: OffsetDateTime,
    /// SHA-256 checksum, when recorded by a generation sidecar.
    #[serde(default)]
    pub checksum: Option<String>,
    /// Whether a generation sidecar claims this file.
    #[serde(default)]
    pub is_generated: bool,
    /// Whether the on-disk bytes no longer match the recorded checksum.
    #[serde(default)]
    pub tampered: bool,
    /// Producing tool name, or `manual`.
    #[serde(default)]
    pub source: String,
    /// Control reference identifiers the file satisfies.
    #[serde(default)]
    pub controls_satisfied: BTreeSet<String>,
    /// Human-readable title.
    #[serde(default)]
    pub title: String,
}

/// Serde default helper for boolean fields that default to `true`.
const fn default_true() -> bool {
    true
}
