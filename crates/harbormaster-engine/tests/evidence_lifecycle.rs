//! End-to-end lifecycle tests: sync, scan, validate, submit, re-scan.
// crates/harbormaster-engine/tests/evidence_lifecycle.rs
// ============================================================================
// Module: Evidence Lifecycle Tests
// Description: Drive a window through the full derived-state lifecycle.
// Purpose: Pin the interplay of sync, scanner, validator, and submitter.
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
use std::sync::Arc;

use harbormaster_core::Attachment;
use harbormaster_core::AttachmentKind;
use harbormaster_core::CancelToken;
use harbormaster_core::GeneratedFileRecord;
use harbormaster_core::GenerationMetadata;
use harbormaster_core::GenerationMethod;
use harbormaster_core::GenerationStatus;
use harbormaster_core::LocalState;
use harbormaster_core::TaskRef;
use harbormaster_core::ValidationMode;
use harbormaster_engine::BasicRenderer;
use harbormaster_engine::Scanner;
use harbormaster_engine::SubmitRequest;
use harbormaster_engine::Submitter;
use harbormaster_engine::SyncEngine;
use harbormaster_engine::SyncOptions;
use harbormaster_engine::Validator;
use harbormaster_store::DocumentStore;
use harbormaster_store::EvidenceStore;
use harbormaster_store::ReferenceRegistry;
use harbormaster_store::sha256_hex_file;
use tempfile::TempDir;
use time::Date;
use time::Month;
use time::OffsetDateTime;
use time::macros::datetime;

use crate::common::FakeRemote;
use crate::common::task;

const NOW: OffsetDateTime = datetime!(2025-11-01 12:00 UTC);

fn scanner(root: &Path) -> Scanner {
    Scanner::new(EvidenceStore::with_data_root(root), DocumentStore::with_data_root(root))
}

fn write_generation(window: &Path, files: &[&str]) {
    let records: Vec<GeneratedFileRecord> = files
        .iter()
        .map(|name| GeneratedFileRecord {
            path: (*name).to_string(),
            checksum: sha256_hex_file(&window.join(name)).unwrap(),
            size_bytes: fs::metadata(window.join(name)).unwrap().len(),
            generated_at: datetime!(2025-10-27 09:00 UTC),
        })
        .collect();
    let metadata = GenerationMetadata {
        generated_at: datetime!(2025-10-27 09:00 UTC),
        generated_by: "ops@example.com".to_string(),
        generation_method: GenerationMethod::Cli,
        task_id: 47,
        task_ref: "ET-0047".to_string(),
        window: "2025-Q4".to_string(),
        tools_used: vec!["github-audit".to_string()],
        files_generated: records,
        status: GenerationStatus::Generated,
    };
    let dir = window.join(".generation");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("metadata.yaml"), serde_yaml::to_string(&metadata).unwrap()).unwrap();
}

#[test]
fn a_window_walks_generated_validated_submitted() {
    let root = TempDir::new().unwrap();
    let documents = DocumentStore::with_data_root(root.path());
    documents.save_task(&task(47, "ET-0047", "GitHub Access Review")).unwrap();
    let window = root.path().join("evidence/ET-0047_GitHub_Access_Review/2025-Q4");
    fs::create_dir_all(&window).unwrap();
    fs::write(window.join("01_members.csv"), b"user,role\nalice,admin\n").unwrap();
    write_generation(&window, &["01_members.csv"]);

    let task_ref = TaskRef::new("ET-0047").unwrap();
    let scan = scanner(root.path());
    assert_eq!(scan.scan_task(&task_ref, NOW).unwrap().local_state, LocalState::Generated);

    // Validation passes lenient mode and its sidecar flips the state.
    let evidence = EvidenceStore::with_data_root(root.path());
    let validation = Validator::new(evidence.clone())
        .validate(&task_ref, "2025-Q4", ValidationMode::Lenient, NOW)
        .unwrap();
    assert!(validation.ready_for_submission, "errors: {:?}", validation.errors);
    evidence.write_validation(&window, &validation).unwrap();
    assert_eq!(scan.scan_task(&task_ref, NOW).unwrap().local_state, LocalState::Validated);

    // Submission writes the sidecar the next scan derives `submitted` from.
    let mut collector_urls = BTreeMap::new();
    collector_urls
        .insert("ET-0047".to_string(), "https://collector.example/i/abc".to_string());
    let submitter = Submitter::new(
        evidence.clone(),
        documents,
        Arc::new(FakeRemote::default()),
        collector_urls,
    );
    let response = submitter
        .submit(
            &SubmitRequest {
                task_ref: task_ref.clone(),
                window: "2025-Q4".to_string(),
                notes: String::new(),
                skip_validation: false,
                validation_mode: ValidationMode::Lenient,
                submitted_by: "ops@example.com".to_string(),
            },
            &CancelToken::new(),
            NOW,
        )
        .unwrap();
    assert!(response.success);

    let state = scan.scan_task(&task_ref, NOW).unwrap();
    assert_eq!(state.local_state, LocalState::Submitted);
    assert!(state.last_submitted_at.is_some());
}

#[test]
fn synced_archives_scan_as_accepted() {
    let root = TempDir::new().unwrap();
    let mut remote = FakeRemote::default();
    remote.tasks.push(task(47, "ET-0047", "GitHub Access Review"));
    remote.attachments.insert(
        47,
        vec![Attachment {
            id: 1,
            task_id: 47,
            kind: AttachmentKind::File,
            filename: Some("audit.csv".to_string()),
            url: None,
            notes: String::new(),
            collected_date: Some(Date::from_calendar_date(2025, Month::October, 27).unwrap()),
        }],
    );

    let engine = SyncEngine::new(
        Arc::new(remote),
        DocumentStore::with_data_root(root.path()),
        EvidenceStore::with_data_root(root.path()),
        ReferenceRegistry::load_under(root.path()).unwrap(),
        Arc::new(BasicRenderer),
        BTreeMap::new(),
    );
    engine
        .sync(
            &SyncOptions::everything("org-1".to_string(), None),
            &CancelToken::new(),
            NOW,
        )
        .unwrap();

    let task_ref = TaskRef::new("ET-0047").unwrap();
    let state = scanner(root.path()).scan_task(&task_ref, NOW).unwrap();
    assert_eq!(state.local_state, LocalState::Accepted);
    assert_eq!(state.windows["2025-Q4"].file_count, 1);
}

#[test]
fn manually_collected_windows_pass_strict_validation() {
    // No generation sidecar and a 12 MiB file: both legal, neither blocks.
    let root = TempDir::new().unwrap();
    let window = root.path().join("evidence/ET-0049_Manual/2025-Q4");
    fs::create_dir_all(&window).unwrap();
    fs::write(window.join("01_export.csv"), vec![b'x'; 12 * 1024 * 1024]).unwrap();
    fs::write(window.join("02_notes.md"), b"reviewed by hand\n").unwrap();

    let validation = Validator::new(EvidenceStore::with_data_root(root.path()))
        .validate(&TaskRef::new("ET-0049").unwrap(), "2025-Q4", ValidationMode::Strict, NOW)
        .unwrap();
    assert!(validation.ready_for_submission, "errors: {:?}", validation.errors);
    assert!(validation.warnings.is_empty(), "warnings: {:?}", validation.warnings);
    assert_eq!(validation.status, "passed");
}

#[test]
fn checksum_mismatch_blocks_validation() {
    let root = TempDir::new().unwrap();
    DocumentStore::with_data_root(root.path())
        .save_task(&task(47, "ET-0047", "GitHub Access Review"))
        .unwrap();
    let window = root.path().join("evidence/ET-0047_GitHub_Access_Review/2025-Q4");
    fs::create_dir_all(&window).unwrap();
    fs::write(window.join("01_members.csv"), b"original").unwrap();
    write_generation(&window, &["01_members.csv"]);
    // The file changes after generation; the recorded checksum goes stale.
    fs::write(window.join("01_members.csv"), b"tampered").unwrap();

    let validation = Validator::new(EvidenceStore::with_data_root(root.path()))
        .validate(
            &TaskRef::new("ET-0047").unwrap(),
            "2025-Q4",
            ValidationMode::Lenient,
            NOW,
        )
        .unwrap();
    assert!(!validation.ready_for_submission);
    assert!(
        validation.errors.iter().any(|e| e.starts_with("checksum_mismatch")),
        "errors: {:?}",
        validation.errors
    );
}

#[test]
fn empty_windows_never_validate() {
    let root = TempDir::new().unwrap();
    let window = root.path().join("evidence/ET-0048_Empty/2025-Q1");
    fs::create_dir_all(&window).unwrap();

    let validation = Validator::new(EvidenceStore::with_data_root(root.path()))
        .validate(&TaskRef::new("ET-0048").unwrap(), "2025-Q1", ValidationMode::Lenient, NOW)
        .unwrap();
    assert!(!validation.ready_for_submission);
    assert!(validation.errors.iter().any(|e| e.starts_with("no_evidence_files")));
}
