// crates/harbormaster-remote/src/wire/tests.rs
// ============================================================================
// Module: Wire Adapter Tests
// Description: Unit tests for DTO decoding and domain conversion.
// Purpose: Pin wire tolerance and pure adapter behavior.
// Dependencies: harbormaster-remote, serde_json
// ============================================================================

//! ## Overview
//! Covers tolerant decoding of partial payloads, timestamp and date parsing,
//! interval mapping, and attachment conversion including date-less drops.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

use harbormaster_core::AttachmentKind;
use harbormaster_core::CollectionInterval;

use super::AttachmentDto;
use super::EvidenceTaskDto;
use super::attachment_from_wire;
use super::interval_from_wire;
use super::parse_date;
use super::parse_timestamp;
use super::task_from_wire;

#[test]
fn partial_task_payloads_decode_with_defaults() {
    let dto: EvidenceTaskDto =
        serde_json::from_str(r#"{"id": 47, "name": "GitHub Access Review"}"#).unwrap();
    let task = task_from_wire(dto);
    assert_eq!(task.id, 47);
    assert_eq!(task.collection_interval, CollectionInterval::Quarterly);
    assert!(task.controls.is_empty());
    assert!(task.aec_status.is_none());
}

#[test]
fn interval_labels_map_onto_the_enum() {
    assert_eq!(interval_from_wire(Some("annual")), CollectionInterval::Annual);
    assert_eq!(interval_from_wire(Some("Monthly")), CollectionInterval::Monthly);
    assert_eq!(interval_from_wire(Some("semi-annual")), CollectionInterval::SemiAnnual);
    assert_eq!(interval_from_wire(Some("whenever")), CollectionInterval::Quarterly);
    assert_eq!(interval_from_wire(None), CollectionInterval::Quarterly);
}

#[test]
fn timestamps_and_dates_parse_tolerantly() {
    assert!(parse_timestamp(Some("2025-10-27T09:30:00Z")).is_some());
    assert!(parse_timestamp(Some("yesterday")).is_none());
    assert!(parse_timestamp(None).is_none());
    assert!(parse_date(Some("2025-10-27")).is_some());
    assert!(parse_date(Some("27/10/2025")).is_none());
}

#[test]
fn attachments_map_kinds_and_keep_undatable_entries() {
    let file: AttachmentDto = serde_json::from_str(
        r#"{"id": 1, "task_id": 47, "type": "file", "filename": "audit.csv",
            "collected_date": "2025-10-27"}"#,
    )
    .unwrap();
    let attachment = attachment_from_wire(file);
    assert_eq!(attachment.kind, AttachmentKind::File);
    assert!(attachment.collected_date.is_some());

    let link: AttachmentDto = serde_json::from_str(
        r#"{"id": 2, "task_id": 47, "type": "url", "url": "https://example.com",
            "collected_date": "2025-01-01"}"#,
    )
    .unwrap();
    assert_eq!(attachment_from_wire(link).kind, AttachmentKind::Url);

    let odd: AttachmentDto = serde_json::from_str(
        r#"{"id": 3, "task_id": 47, "type": "screenshot", "collected_date": "2025-01-01"}"#,
    )
    .unwrap();
    assert_eq!(
        attachment_from_wire(odd).kind,
        AttachmentKind::Other("screenshot".to_string())
    );

    // A missing or malformed date converts rather than disappearing; the
    // sync engine accounts for the entry.
    let dateless: AttachmentDto =
        serde_json::from_str(r#"{"id": 4, "task_id": 47, "type": "file"}"#).unwrap();
    let kept = attachment_from_wire(dateless);
    assert_eq!(kept.id, 4);
    assert!(kept.collected_date.is_none());

    let malformed: AttachmentDto = serde_json::from_str(
        r#"{"id": 5, "task_id": 47, "type": "file", "collected_date": "27/10/2025"}"#,
    )
    .unwrap();
    assert!(attachment_from_wire(malformed).collected_date.is_none());
}
