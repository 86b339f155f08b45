// crates/harbormaster-core/src/core/naming/tests.rs
// ============================================================================
// Module: Canonical Naming Tests
// Description: Unit tests for slugs, file stems, and task directory names.
// Purpose: Pin the naming bijection between metadata and on-disk names.
// Dependencies: harbormaster-core
// ============================================================================

//! ## Overview
//! Covers slug stop-word filtering and truncation, document file stems, and
//! the task-directory round trip the scanner depends on.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

use crate::core::identifiers::TaskRef;

use super::document_file_stem;
use super::parse_task_dir_name;
use super::sanitize_task_dir_component;
use super::short_slug;
use super::task_dir_name;

#[test]
fn slugs_filter_stop_words_and_lowercase() {
    assert_eq!(short_slug("Review of the GitHub Access Logs"), "review_github_access_logs");
    assert_eq!(short_slug("IAM Policy for Production"), "iam_policy_production");
}

#[test]
fn slugs_truncate_on_underscore_boundaries() {
    let slug = short_slug("quarterly infrastructure vulnerability assessment evidence");
    assert!(slug.len() <= 40, "slug too long: {slug}");
    assert!(!slug.ends_with('_'));
    assert_eq!(slug, "quarterly_infrastructure_vulnerability");
}

#[test]
fn empty_names_fall_back_to_placeholder() {
    assert_eq!(short_slug(""), "untitled");
    assert_eq!(short_slug("   "), "untitled");
    assert_eq!(short_slug("of the"), "untitled");
}

#[test]
fn oversized_single_tokens_are_truncated() {
    let slug = short_slug(&"x".repeat(60));
    assert_eq!(slug.len(), 40);
}

#[test]
fn document_file_stems_join_reference_id_and_slug() {
    assert_eq!(
        document_file_stem("ET-0047", "47", "GitHub Access Review"),
        "ET-0047-47-github_access_review"
    );
    assert_eq!(
        document_file_stem("CC-06_8", "1234", "Logical Access"),
        "CC-06_8-1234-logical_access"
    );
}

#[test]
fn task_dir_names_round_trip_to_the_same_reference() {
    let task_ref = TaskRef::new("ET-47").unwrap();
    let dir = task_dir_name(&task_ref, "GitHub Access Review");
    assert_eq!(dir, "ET-0047_GitHub_Access_Review");
    assert_eq!(parse_task_dir_name(&dir).unwrap(), task_ref);
}

#[test]
fn sanitization_collapses_hostile_characters() {
    assert_eq!(sanitize_task_dir_component("A/B\\C: D*E"), "A_B_C_D_E");
    assert_eq!(sanitize_task_dir_component("  spaced  name  "), "spaced_name");
    assert_eq!(sanitize_task_dir_component("keep-dash.dot"), "keep-dash.dot");
}

#[test]
fn parse_rejects_non_task_directories() {
    assert!(parse_task_dir_name("2025-Q4").is_none());
    assert!(parse_task_dir_name(".registry").is_none());
    assert!(parse_task_dir_name("ET-_x").is_none());
    assert!(parse_task_dir_name("POL-0001_x").is_none());
}

#[test]
fn bare_reference_directories_parse() {
    assert_eq!(parse_task_dir_name("ET-0001").unwrap().as_str(), "ET-0001");
}
