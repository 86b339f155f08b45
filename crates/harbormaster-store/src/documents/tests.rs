// crates/harbormaster-store/src/documents/tests.rs
// ============================================================================
// Module: Document Store Tests
// Description: Unit tests for document persistence and lookup.
// Purpose: Pin canonical filenames, tolerant listing, and lookups by key.
// Dependencies: harbormaster-store, tempfile
// ============================================================================

//! ## Overview
//! Covers save/get round trips for every document kind, lookup by reference
//! and numeric id, corrupt-record tolerance, and Markdown companions.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

use std::collections::BTreeSet;
use std::fs;

use harbormaster_core::Control;
use harbormaster_core::EvidenceTask;
use harbormaster_core::Policy;
use tempfile::TempDir;

use super::DocumentStore;
use super::StoreError;

fn store() -> (TempDir, DocumentStore) {
    let dir = TempDir::new().unwrap();
    let store = DocumentStore::with_data_root(dir.path());
    (dir, store)
}

fn sample_policy(id: &str, reference: &str, name: &str) -> Policy {
    Policy {
        id: id.to_string(),
        reference_id: reference.to_string(),
        reference_recognized: true,
        name: name.to_string(),
        content: "All access must be reviewed.".to_string(),
        framework: "SOC2".to_string(),
        version: "1.2".to_string(),
        status: "approved".to_string(),
        created_at: None,
        updated_at: None,
    }
}

fn sample_control(id: i64, reference: &str, name: &str) -> Control {
    Control {
        id,
        reference_id: reference.to_string(),
        reference_recognized: true,
        name: name.to_string(),
        description: String::new(),
        framework: "SOC2".to_string(),
        category: "access".to_string(),
        status: "implemented".to_string(),
        framework_codes: Vec::new(),
        implemented_date: None,
        tested_date: None,
    }
}

fn sample_task(id: i64, reference: &str, name: &str) -> EvidenceTask {
    EvidenceTask {
        id,
        reference_id: reference.to_string(),
        reference_recognized: true,
        name: name.to_string(),
        description: String::new(),
        guidance: String::new(),
        framework: "SOC2".to_string(),
        priority: "high".to_string(),
        status: "open".to_string(),
        completed: false,
        controls: BTreeSet::new(),
        policies: BTreeSet::new(),
        collection_interval: harbormaster_core::CollectionInterval::Quarterly,
        next_due: None,
        sensitive: false,
        aec_status: None,
        related_controls: Vec::new(),
    }
}

#[test]
fn policy_filenames_follow_the_canonical_stem() {
    let (_dir, store) = store();
    let path = store.save_policy(&sample_policy("91", "POL-0012", "Access Control Policy")).unwrap();
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "POL-0012-91-access_control_policy.json"
    );
}

#[test]
fn control_filenames_use_the_underscore_form() {
    let (_dir, store) = store();
    let path = store.save_control(&sample_control(1234, "CC-06.8", "Logical Access")).unwrap();
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "CC-06_8-1234-logical_access.json"
    );
}

#[test]
fn tasks_round_trip_and_look_up_by_any_key() {
    let (_dir, store) = store();
    let task = sample_task(47, "ET-0047", "GitHub Access Review");
    store.save_task(&task).unwrap();
    assert_eq!(store.get_task("ET-0047").unwrap(), task);
    assert_eq!(store.get_task("47").unwrap(), task);
    assert_eq!(store.get_task("et47").unwrap(), task);
    assert!(matches!(store.get_task("ET-0099"), Err(StoreError::NotFound(_))));
}

#[test]
fn get_all_tasks_orders_by_ascending_numeric_id() {
    let (_dir, store) = store();
    store.save_task(&sample_task(9, "ET-0009", "Nine")).unwrap();
    store.save_task(&sample_task(2, "ET-0002", "Two")).unwrap();
    store.save_task(&sample_task(5, "ET-0005", "Five")).unwrap();
    let ids: Vec<i64> = store.get_all_tasks().unwrap().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![2, 5, 9]);
}

#[test]
fn corrupt_documents_are_skipped_not_fatal() {
    let (dir, store) = store();
    store.save_task(&sample_task(1, "ET-0001", "Good")).unwrap();
    fs::write(dir.path().join("docs/evidence_tasks/broken.json"), b"{not json").unwrap();
    let tasks = store.get_all_tasks().unwrap();
    assert_eq!(tasks.len(), 1);
}

#[test]
fn empty_store_lists_nothing() {
    let (_dir, store) = store();
    assert!(store.get_all_policies().unwrap().is_empty());
    assert!(store.get_all_controls().unwrap().is_empty());
    assert!(store.get_all_tasks().unwrap().is_empty());
}

#[test]
fn markdown_companions_sit_beside_the_json_record() {
    let (_dir, store) = store();
    let json_path = store.save_policy(&sample_policy("7", "POL-0007", "Retention")).unwrap();
    let md_path = store.save_companion_markdown(&json_path, "# Retention\n").unwrap();
    assert_eq!(md_path.extension().unwrap(), "md");
    assert_eq!(fs::read_to_string(md_path).unwrap(), "# Retention\n");
}
