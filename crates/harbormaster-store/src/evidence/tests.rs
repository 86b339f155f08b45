// crates/harbormaster-store/src/evidence/tests.rs
// ============================================================================
// Module: Evidence Store Tests
// Description: Unit tests for evidence-tree enumeration and sidecar IO.
// Purpose: Pin path resolution, file statistics, and tolerant sidecars.
// Dependencies: harbormaster-store, tempfile
// ============================================================================

//! ## Overview
//! Covers task-directory resolution, window listing, working-root and
//! subfolder file enumeration, and the append-only history sidecar.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

use std::fs;

use harbormaster_core::HistoryEntry;
use harbormaster_core::SubmissionStatus;
use harbormaster_core::TaskRef;
use tempfile::TempDir;
use time::macros::datetime;

use super::EvidenceStore;

fn store_with_window(files: &[&str]) -> (TempDir, EvidenceStore, TaskRef) {
    let root = TempDir::new().unwrap();
    let window = root.path().join("evidence/ET-0047_GitHub/2025-Q4");
    fs::create_dir_all(window.join("archive")).unwrap();
    for name in files {
        fs::write(window.join(name), b"body").unwrap();
    }
    fs::write(window.join("archive/accepted.csv"), b"remote").unwrap();
    let store = EvidenceStore::with_data_root(root.path());
    (root, store, TaskRef::new("ET-0047").unwrap())
}

#[test]
fn task_dirs_resolve_by_reference() {
    let (_root, store, task_ref) = store_with_window(&[]);
    let dir = store.find_task_dir(&task_ref).unwrap().unwrap();
    assert!(dir.ends_with("ET-0047_GitHub"));
    assert!(store.find_task_dir(&TaskRef::new("ET-0099").unwrap()).unwrap().is_none());
}

#[test]
fn windows_list_lexicographically_and_skip_hidden() {
    let (root, store, task_ref) = store_with_window(&[]);
    let task_dir = root.path().join("evidence/ET-0047_GitHub");
    fs::create_dir_all(task_dir.join("2025-Q1")).unwrap();
    fs::create_dir_all(task_dir.join(".context")).unwrap();
    let windows = store.list_windows(&store.find_task_dir(&task_ref).unwrap().unwrap()).unwrap();
    let names: Vec<&str> = windows.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["2025-Q1", "2025-Q4"]);
}

#[test]
fn working_root_files_exclude_subfolders_and_hidden() {
    let (_root, store, task_ref) = store_with_window(&["b.json", "a.csv", ".hidden", "c.tmp"]);
    let files = store.evidence_files_for(&task_ref, "2025-Q4").unwrap();
    let names: Vec<&str> = files.iter().map(|f| f.filename.as_str()).collect();
    assert_eq!(names, vec!["a.csv", "b.json"]);
    assert!(files.iter().all(|f| f.size_bytes == 4));
}

#[test]
fn subfolder_files_carry_prefixed_relative_paths() {
    let (_root, store, task_ref) = store_with_window(&[]);
    let files = store.evidence_files_in_subfolder(&task_ref, "2025-Q4", "archive").unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].relative_path, "archive/accepted.csv");
}

#[test]
fn missing_tasks_enumerate_empty() {
    let root = TempDir::new().unwrap();
    let store = EvidenceStore::with_data_root(root.path());
    let task_ref = TaskRef::new("ET-0001").unwrap();
    assert!(store.evidence_files_for(&task_ref, "2025-Q4").unwrap().is_empty());
}

#[test]
fn history_appends_without_rewriting() {
    let (root, store, _task_ref) = store_with_window(&[]);
    let base = root.path().join("evidence/ET-0047_GitHub/2025-Q4/archive");
    for (id, count) in [("batch-1", 1), ("batch-2", 2)] {
        store
            .append_history(
                &base,
                "ET-0047",
                "2025-Q4",
                HistoryEntry {
                    submission_id: id.to_string(),
                    submitted_at: datetime!(2025-10-27 10:00 UTC),
                    submitted_by: "ops".to_string(),
                    status: SubmissionStatus::Submitted,
                    file_count: count,
                    notes: String::new(),
                },
            )
            .unwrap();
    }
    let history = store.read_history(&base).unwrap();
    assert_eq!(history.entries.len(), 2);
    assert_eq!(history.entries[0].submission_id, "batch-1");
    assert_eq!(history.entries[1].submission_id, "batch-2");
}
