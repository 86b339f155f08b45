// crates/harbormaster-core/src/core/evaluation.rs
// ============================================================================
// Module: Evaluation Results
// Description: Four-dimension scoring output for an evidence window.
// Purpose: Represent evaluator output with fixed thresholds and taxonomy.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The evaluator scores a window along four dimensions (completeness,
//! requirements match, quality, control alignment), each in `[0, 100]`. The
//! overall score is the equal-weighted mean and maps to pass (>= 80),
//! warning (50..=79), or fail (< 50). Weights and thresholds are fixed by
//! design and must not be re-tuned silently.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Overall score at or above which a window passes.
pub const PASS_THRESHOLD: f64 = 80.0;
/// Overall score at or above which a window warns instead of failing.
pub const WARNING_THRESHOLD: f64 = 50.0;

// ============================================================================
// SECTION: Dimensions
// ============================================================================

/// Scoring dimensions, doubling as issue categories.
///
/// # Invariants
/// - Variants are stable for serialization and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Enough evidence exists and is recent.
    Completeness,
    /// Evidence matches task requirements.
    Requirements,
    /// Evidence files follow conventions and sane formats.
    Quality,
    /// Evidence aligns with related controls.
    ControlAlignment,
}

impl Dimension {
    /// Returns the stable snake_case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completeness => "completeness",
            Self::Requirements => "requirements",
            Self::Quality => "quality",
            Self::ControlAlignment => "control_alignment",
        }
    }
}

/// Status of a single dimension score.
///
/// # Invariants
/// - Derived from the dimension score with the fixed thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionStatus {
    /// Score at or above the pass threshold.
    Pass,
    /// Score between the warning and pass thresholds.
    Warning,
    /// Score below the warning threshold.
    Fail,
}

/// Score for one dimension.
///
/// # Invariants
/// - `score` is in `[0, max_score]`; `max_score` is 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    /// Achieved score.
    pub score: f64,
    /// Maximum achievable score.
    pub max_score: f64,
    /// Status derived from the score.
    pub status: DimensionStatus,
    /// Human-readable scoring details.
    #[serde(default)]
    pub details: Vec<String>,
}

impl DimensionScore {
    /// Builds a dimension score, clamping into `[0, 100]` and deriving status.
    #[must_use]
    pub fn from_score(score: f64, details: Vec<String>) -> Self {
        let clamped = score.clamp(0.0, 100.0);
        Self {
            score: clamped,
            max_score: 100.0,
            status: status_for(clamped),
            details,
        }
    }
}

/// Maps a score onto the fixed pass/warning/fail thresholds.
#[must_use]
fn status_for(score: f64) -> DimensionStatus {
    if score >= PASS_THRESHOLD {
        DimensionStatus::Pass
    } else if score >= WARNING_THRESHOLD {
        DimensionStatus::Warning
    } else {
        DimensionStatus::Fail
    }
}

// ============================================================================
// SECTION: Issues
// ============================================================================

/// Issue severity levels.
///
/// # Invariants
/// - Variants are ordered most severe first for report sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Blocks submission outright.
    Critical,
    /// Likely to cause rejection.
    High,
    /// Should be addressed before submission.
    Medium,
    /// Cosmetic or advisory.
    Low,
}

/// A single evaluation finding.
///
/// Issues are reported, never auto-remediated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Issue severity.
    pub severity: Severity,
    /// Dimension the issue belongs to.
    pub category: Dimension,
    /// Human-readable message.
    pub message: String,
    /// Offending file, when the issue is file-specific.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Suggested remediation.
    #[serde(default)]
    pub remediation: String,
}

// ============================================================================
// SECTION: Overall Result
// ============================================================================

/// Overall evaluation status.
///
/// # Invariants
/// - Derived from the overall score with the fixed thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    /// Overall score at or above 80.
    Pass,
    /// Overall score in 50..=79.
    Warning,
    /// Overall score below 50.
    Fail,
}

/// Evaluation result for one task window.
///
/// # Invariants
/// - `overall_score` is the equal-weighted mean of the four dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Canonical task reference.
    pub task_ref: String,
    /// Remote numeric task identifier, when known.
    #[serde(default)]
    pub task_id: Option<i64>,
    /// Canonical window string.
    pub window: String,
    /// Subfolder the evaluation was scoped to, when any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subfolder_scope: Option<String>,
    /// Number of files considered.
    pub file_count: u32,
    /// Total bytes considered.
    pub total_bytes: u64,
    /// Completeness dimension.
    pub completeness: DimensionScore,
    /// Requirements-match dimension.
    pub requirements: DimensionScore,
    /// Quality dimension.
    pub quality: DimensionScore,
    /// Control-alignment dimension.
    pub control_alignment: DimensionScore,
    /// Equal-weighted mean of the four dimensions.
    pub overall_score: f64,
    /// Overall status mapped from the overall score.
    pub overall_status: OverallStatus,
    /// Findings, most severe first.
    #[serde(default)]
    pub issues: Vec<Issue>,
    /// Threshold-driven recommendations.
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl EvaluationResult {
    /// Maps an overall score onto the fixed status thresholds.
    #[must_use]
    pub fn overall_status_for(score: f64) -> OverallStatus {
        if score >= PASS_THRESHOLD {
            OverallStatus::Pass
        } else if score >= WARNING_THRESHOLD {
            OverallStatus::Warning
        } else {
            OverallStatus::Fail
        }
    }
}
