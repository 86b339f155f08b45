//! Submitter integration tests over the in-memory remote fake.
// crates/harbormaster-engine/tests/submission_flow.rs
// ============================================================================
// Module: Submission Flow Tests
// Description: Validation gate, partial success, ordering, and cancellation.
// Purpose: Pin the per-file upload procedure and its durable records.
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use harbormaster_core::CancelToken;
use harbormaster_core::SubmissionStatus;
use harbormaster_core::TaskRef;
use harbormaster_core::ValidationMode;
use harbormaster_engine::SubmitError;
use harbormaster_engine::SubmitRequest;
use harbormaster_engine::Submitter;
use harbormaster_store::DocumentStore;
use harbormaster_store::EvidenceStore;
use tempfile::TempDir;
use time::OffsetDateTime;
use time::macros::datetime;

use crate::common::FakeRemote;
use crate::common::task;

const NOW: OffsetDateTime = datetime!(2025-11-01 12:00 UTC);

/// Prepares a task document and a window directory with the given files.
fn prepare(root: &Path, files: &[(&str, &[u8])]) -> PathBuf {
    let documents = DocumentStore::with_data_root(root);
    documents.save_task(&task(47, "ET-0047", "GitHub Access Review")).unwrap();
    let window = root.join("evidence/ET-0047_GitHub_Access_Review/2025-Q4");
    fs::create_dir_all(&window).unwrap();
    for (name, body) in files {
        fs::write(window.join(name), body).unwrap();
    }
    window
}

fn submitter_over(root: &Path, remote: Arc<FakeRemote>) -> Submitter {
    let mut collector_urls = BTreeMap::new();
    collector_urls
        .insert("ET-0047".to_string(), "https://collector.example/i/abc".to_string());
    Submitter::new(
        EvidenceStore::with_data_root(root),
        DocumentStore::with_data_root(root),
        remote,
        collector_urls,
    )
}

fn request(skip_validation: bool) -> SubmitRequest {
    SubmitRequest {
        task_ref: TaskRef::new("ET-0047").unwrap(),
        window: "2025-Q4".to_string(),
        notes: "quarterly batch".to_string(),
        skip_validation,
        validation_mode: ValidationMode::Strict,
        submitted_by: "ops@example.com".to_string(),
    }
}

#[test]
fn oversized_files_fail_validation_and_nothing_is_written() {
    let root = TempDir::new().unwrap();
    let big = vec![0u8; 25 * 1024 * 1024];
    let window = prepare(root.path(), &[("foo.csv", big.as_slice()), ("bar.json", b"{}1234")]);

    let remote = Arc::new(FakeRemote::default());
    let submitter = submitter_over(root.path(), Arc::clone(&remote));
    let response = submitter.submit(&request(false), &CancelToken::new(), NOW).unwrap();

    assert!(!response.success);
    assert_eq!(response.status, "validation_failed");
    let validation = response.validation.unwrap();
    assert!(!validation.ready_for_submission);
    assert!(
        validation.errors.iter().any(|e| e.starts_with("file_too_large: foo.csv")),
        "errors: {:?}",
        validation.errors
    );

    // The gate writes nothing and uploads nothing.
    assert!(!window.join(".submitted").exists());
    assert!(!window.join(".validation").exists());
    assert!(remote.upload_log.lock().unwrap().is_empty());
}

#[test]
fn partial_success_records_submitted_with_failure_details() {
    let root = TempDir::new().unwrap();
    let window =
        prepare(root.path(), &[("01_report.csv", b"rows".as_slice()), ("02_dump.sql", b"sql")]);

    let remote = Arc::new(FakeRemote::default());
    let submitter = submitter_over(root.path(), Arc::clone(&remote));
    let response = submitter.submit(&request(true), &CancelToken::new(), NOW).unwrap();

    assert!(response.success);
    assert_eq!(response.status, "submitted");
    assert_eq!(response.files_submitted, 1);
    assert_eq!(response.files_failed, 1);
    assert_eq!(response.failed_files, vec!["02_dump.sql: unsupported_file_type".to_string()]);

    let evidence = EvidenceStore::with_data_root(root.path());
    let submission = evidence.read_submission(&window.join(".submitted")).unwrap();
    assert_eq!(submission.status, SubmissionStatus::Submitted);
    assert_eq!(submission.total_file_count, 2);
    let tugboat = submission.tugboat_response.unwrap();
    assert_eq!(tugboat.metadata.files_submitted, 1);
    assert_eq!(tugboat.metadata.files_failed, 1);
    assert_eq!(
        submission.total_file_count,
        tugboat.metadata.files_submitted + tugboat.metadata.files_failed
    );

    let history = evidence.read_history(&window.join(".submitted")).unwrap();
    assert_eq!(history.entries.len(), 1);
    assert_eq!(history.entries[0].file_count, 1);
    assert_eq!(history.entries[0].submission_id, response.submission_id.unwrap());
}

#[test]
fn uploads_run_in_ascending_filename_order() {
    let root = TempDir::new().unwrap();
    prepare(
        root.path(),
        &[
            ("03_third.csv", b"3".as_slice()),
            ("01_first.csv", b"1"),
            ("02_second.csv", b"2"),
        ],
    );

    let remote = Arc::new(FakeRemote::default());
    let submitter = submitter_over(root.path(), Arc::clone(&remote));
    submitter.submit(&request(true), &CancelToken::new(), NOW).unwrap();

    let log = remote.upload_log.lock().unwrap();
    assert_eq!(
        log.as_slice(),
        ["01_first.csv", "02_second.csv", "03_third.csv"]
    );
}

#[test]
fn missing_collector_url_fails_without_uploading() {
    let root = TempDir::new().unwrap();
    prepare(root.path(), &[("01_report.csv", b"rows".as_slice())]);

    let remote = Arc::new(FakeRemote::default());
    let submitter = Submitter::new(
        EvidenceStore::with_data_root(root.path()),
        DocumentStore::with_data_root(root.path()),
        Arc::clone(&remote) as Arc<dyn harbormaster_core::ComplianceRemote>,
        BTreeMap::new(),
    );
    let err = submitter.submit(&request(true), &CancelToken::new(), NOW).unwrap_err();
    assert!(matches!(err, SubmitError::CollectorUrlMissing(_)));
    assert!(remote.upload_log.lock().unwrap().is_empty());
}

#[test]
fn every_file_failing_reports_the_first_failure() {
    let root = TempDir::new().unwrap();
    let window = prepare(root.path(), &[("01_a.exe", b"x".as_slice()), ("02_b.bin", b"y")]);

    let remote = Arc::new(FakeRemote::default());
    let submitter = submitter_over(root.path(), Arc::clone(&remote));
    let err = submitter.submit(&request(true), &CancelToken::new(), NOW).unwrap_err();
    match err {
        SubmitError::AllFilesFailed { first } => {
            assert_eq!(first, "01_a.exe: unsupported_file_type");
        }
        other => panic!("expected AllFilesFailed, got {other:?}"),
    }

    // The failed attempt is still persisted, best effort.
    let evidence = EvidenceStore::with_data_root(root.path());
    let submission = evidence.read_submission(&window.join(".submitted")).unwrap();
    assert_eq!(submission.status, SubmissionStatus::SubmissionFailed);
}

#[test]
fn cancellation_mid_batch_persists_the_partial_outcome() {
    let root = TempDir::new().unwrap();
    let window = prepare(
        root.path(),
        &[
            ("01_a.csv", b"1".as_slice()),
            ("02_b.csv", b"2"),
            ("03_c.csv", b"3"),
        ],
    );

    let cancel = CancelToken::new();
    let remote = Arc::new(FakeRemote {
        cancel_after_uploads: Some((1, cancel.clone())),
        ..FakeRemote::default()
    });
    let submitter = submitter_over(root.path(), Arc::clone(&remote));
    let err = submitter.submit(&request(true), &cancel, NOW).unwrap_err();
    assert!(matches!(err, SubmitError::Cancelled));

    assert_eq!(remote.upload_log.lock().unwrap().len(), 1);
    let evidence = EvidenceStore::with_data_root(root.path());
    let submission = evidence.read_submission(&window.join(".submitted")).unwrap();
    assert_eq!(submission.tugboat_response.unwrap().status, "cancelled");
    assert_eq!(submission.status, SubmissionStatus::Submitted);
}

#[test]
fn resubmission_appends_history_and_updates_the_sidecar() {
    let root = TempDir::new().unwrap();
    let window = prepare(root.path(), &[("01_report.csv", b"rows".as_slice())]);

    let remote = Arc::new(FakeRemote::default());
    let submitter = submitter_over(root.path(), Arc::clone(&remote));
    let first = submitter.submit(&request(true), &CancelToken::new(), NOW).unwrap();
    let later = datetime!(2025-11-01 13:00 UTC);
    let second = submitter.submit(&request(true), &CancelToken::new(), later).unwrap();

    let evidence = EvidenceStore::with_data_root(root.path());
    let history = evidence.read_history(&window.join(".submitted")).unwrap();
    assert_eq!(history.entries.len(), 2);
    let submission = evidence.read_submission(&window.join(".submitted")).unwrap();
    assert_eq!(Some(submission.submission_id), second.submission_id);
    assert_ne!(first.submission_id, second.submission_id);
}
