// crates/harbormaster-engine/src/evaluator/tests.rs
// ============================================================================
// Module: Evaluator Unit Tests
// Description: Dimension scoring, thresholds, and issue generation.
// Purpose: Pin the fixed 80/50 thresholds and the expected-file heuristic.
// Dependencies: harbormaster-engine, time
// ============================================================================

//! ## Overview
//! Builds synthetic window states and asserts dimension scores, the overall
//! equal-weighted mean, the fixed status thresholds, issue severities, and
//! the expected-file-count heuristic.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

use std::collections::BTreeSet;

use harbormaster_core::CollectionInterval;
use harbormaster_core::Control;
use harbormaster_core::Dimension;
use harbormaster_core::EvidenceFile;
use harbormaster_core::EvidenceTask;
use harbormaster_core::OverallStatus;
use harbormaster_core::Severity;
use harbormaster_core::WindowState;
use time::OffsetDateTime;
use time::macros::datetime;

use super::Evaluator;
use super::expected_file_count;

const NOW: OffsetDateTime = datetime!(2025-11-01 12:00 UTC);

fn task_with_controls(control_names: &[&str], description: &str) -> EvidenceTask {
    EvidenceTask {
        id: 47,
        reference_id: "ET-0047".to_string(),
        reference_recognized: true,
        name: "GitHub Access Review".to_string(),
        description: description.to_string(),
        guidance: "Export the member list and review admin access.".to_string(),
        framework: "SOC2".to_string(),
        priority: "high".to_string(),
        status: "open".to_string(),
        completed: false,
        controls: BTreeSet::new(),
        policies: BTreeSet::new(),
        collection_interval: CollectionInterval::Quarterly,
        next_due: None,
        sensitive: false,
        aec_status: None,
        related_controls: control_names
            .iter()
            .enumerate()
            .map(|(index, name)| Control {
                id: i64::try_from(index).unwrap() + 1,
                reference_id: format!("CC-0{}", index + 1),
                reference_recognized: true,
                name: (*name).to_string(),
                description: String::new(),
                framework: "SOC2".to_string(),
                category: String::new(),
                status: String::new(),
                framework_codes: Vec::new(),
                implemented_date: None,
                tested_date: None,
            })
            .collect(),
    }
}

fn file(name: &str, size: u64) -> EvidenceFile {
    EvidenceFile {
        filename: name.to_string(),
        relative_path: name.to_string(),
        size_bytes: size,
        modified_at: datetime!(2025-10-20 08:00 UTC),
        checksum: None,
        is_generated: false,
        tampered: false,
        source: "manual".to_string(),
        controls_satisfied: BTreeSet::new(),
        title: name.to_string(),
    }
}

fn window_with(files: Vec<EvidenceFile>) -> WindowState {
    let mut state = WindowState::empty("2025-Q4".to_string());
    state.file_count = u32::try_from(files.len()).unwrap();
    state.total_bytes = files.iter().map(|f| f.size_bytes).sum();
    state.oldest_file = files.iter().map(|f| f.modified_at).min();
    state.newest_file = files.iter().map(|f| f.modified_at).max();
    state.files = files;
    state.has_generation_meta = true;
    state
}

#[test]
fn empty_windows_fail_with_a_critical_issue() {
    let task = task_with_controls(&["Access"], "desc");
    let window = WindowState::empty("2025-Q4".to_string());
    let result = Evaluator.evaluate(&task, &window, None, NOW);
    assert_eq!(result.overall_status, OverallStatus::Fail);
    assert_eq!(result.completeness.score, 0.0);
    assert!(result.issues.iter().any(|issue| {
        issue.severity == Severity::Critical && issue.category == Dimension::Completeness
    }));
    assert!(!result.recommendations.is_empty());
}

#[test]
fn complete_recent_evidence_passes() {
    let task = task_with_controls(&["Access Review"], "Review all GitHub access quarterly.");
    let window = window_with(vec![
        file("github_access_review.csv", 4096),
        file("github_access_notes.md", 2048),
    ]);
    let result = Evaluator.evaluate(&task, &window, None, NOW);
    assert_eq!(result.overall_status, OverallStatus::Pass, "score {}", result.overall_score);
    assert!(result.completeness.score >= 80.0);
    assert!(result.issues.iter().all(|i| i.severity != Severity::Critical));
}

#[test]
fn overall_score_is_the_equal_weighted_mean() {
    let task = task_with_controls(&[], "short");
    let window = window_with(vec![file("evidence_export.csv", 4096)]);
    let result = Evaluator.evaluate(&task, &window, None, NOW);
    let mean = (result.completeness.score
        + result.requirements.score
        + result.quality.score
        + result.control_alignment.score)
        / 4.0;
    assert!((result.overall_score - mean).abs() < f64::EPSILON);
}

#[test]
fn unaccepted_formats_draw_high_severity_issues() {
    let task = task_with_controls(&["Access"], "desc");
    let window = window_with(vec![file("dump.sql", 4096)]);
    let result = Evaluator.evaluate(&task, &window, None, NOW);
    assert!(result.issues.iter().any(|issue| {
        issue.severity == Severity::High && issue.category == Dimension::Requirements
    }));
}

#[test]
fn stale_evidence_loses_recency_credit() {
    let task = task_with_controls(&["Access Review"], "Review access.");
    let mut window = window_with(vec![file("github_access_review.csv", 4096)]);
    let old = datetime!(2023-01-01 00:00 UTC);
    window.newest_file = Some(old);
    window.oldest_file = Some(old);
    for f in &mut window.files {
        f.modified_at = old;
    }
    let result = Evaluator.evaluate(&task, &window, None, NOW);
    assert!(result.issues.iter().any(|issue| {
        issue.category == Dimension::Completeness && issue.message.contains("over a year old")
    }));
}

#[test]
fn expected_file_count_follows_the_heuristic() {
    assert_eq!(expected_file_count(&task_with_controls(&[], "short")), 1);
    assert_eq!(expected_file_count(&task_with_controls(&["a", "b"], "short")), 2);
    assert_eq!(
        expected_file_count(&task_with_controls(&["a", "b", "c", "d"], "short")),
        3
    );
    let long_description = "x".repeat(501);
    assert_eq!(
        expected_file_count(&task_with_controls(&["a", "b", "c", "d"], &long_description)),
        4
    );
}

#[test]
fn status_thresholds_are_fixed_at_eighty_and_fifty() {
    use harbormaster_core::EvaluationResult;
    assert_eq!(EvaluationResult::overall_status_for(80.0), OverallStatus::Pass);
    assert_eq!(EvaluationResult::overall_status_for(79.9), OverallStatus::Warning);
    assert_eq!(EvaluationResult::overall_status_for(50.0), OverallStatus::Warning);
    assert_eq!(EvaluationResult::overall_status_for(49.9), OverallStatus::Fail);
}
