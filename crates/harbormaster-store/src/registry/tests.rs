// crates/harbormaster-store/src/registry/tests.rs
// ============================================================================
// Module: Reference Registry Tests
// Description: Unit tests for reference assignment and persistence.
// Purpose: Pin uniqueness, stability, and atomic save behavior.
// Dependencies: harbormaster-store, tempfile
// ============================================================================

//! ## Overview
//! Covers first-seen assignment, reuse of previously registered references,
//! smallest-unused ordinal selection, collision fallback, and load/save
//! round trips including corrupt-registry rejection.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

use std::fs;

use harbormaster_core::TaskRef;
use tempfile::TempDir;

use super::ReferenceRegistry;
use super::RegistryError;

fn registry_in(dir: &TempDir) -> ReferenceRegistry {
    ReferenceRegistry::load(dir.path().join("evidence_tasks.json")).unwrap()
}

#[test]
fn remote_reference_is_adopted_when_unclaimed() {
    let dir = TempDir::new().unwrap();
    let mut registry = registry_in(&dir);
    let remote = TaskRef::new("ET-47").unwrap();
    let assigned = registry.resolve(47, Some(&remote));
    assert_eq!(assigned.as_str(), "ET-0047");
}

#[test]
fn existing_assignment_always_wins() {
    let dir = TempDir::new().unwrap();
    let mut registry = registry_in(&dir);
    let first = registry.resolve(47, TaskRef::new("ET-0047").as_ref());
    let second = registry.resolve(47, TaskRef::new("ET-0099").as_ref());
    assert_eq!(first, second);
}

#[test]
fn claimed_references_are_never_reassigned() {
    let dir = TempDir::new().unwrap();
    let mut registry = registry_in(&dir);
    let reference = TaskRef::new("ET-0001").unwrap();
    registry.resolve(10, Some(&reference));
    let other = registry.resolve(11, Some(&reference));
    assert_ne!(other.as_str(), "ET-0001");
    assert_eq!(registry.lookup("ET-0001"), Some(10));
}

#[test]
fn missing_remote_reference_gets_smallest_unused_ordinal() {
    let dir = TempDir::new().unwrap();
    let mut registry = registry_in(&dir);
    registry.resolve(100, TaskRef::new("ET-0001").as_ref());
    registry.resolve(101, TaskRef::new("ET-0003").as_ref());
    let assigned = registry.resolve(102, None);
    assert_eq!(assigned.as_str(), "ET-0002");
    let next = registry.resolve(103, None);
    assert_eq!(next.as_str(), "ET-0004");
}

#[test]
fn save_and_reload_preserve_assignments() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("evidence_tasks.json");
    let mut registry = ReferenceRegistry::load(path.clone()).unwrap();
    registry.resolve(47, TaskRef::new("ET-0047").as_ref());
    registry.resolve(12, None);
    registry.save().unwrap();

    let reloaded = ReferenceRegistry::load(path).unwrap();
    assert_eq!(reloaded.get(47), Some("ET-0047"));
    assert_eq!(reloaded.get(12), Some("ET-0001"));
    assert_eq!(reloaded.len(), 2);
}

#[test]
fn corrupt_registry_fails_closed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("evidence_tasks.json");
    fs::write(&path, b"{broken").unwrap();
    assert!(matches!(ReferenceRegistry::load(path), Err(RegistryError::Parse(_))));
}

#[test]
fn duplicate_references_fail_closed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("evidence_tasks.json");
    fs::write(&path, br#"{"assignments": {"1": "ET-0001", "2": "ET-0001"}}"#).unwrap();
    assert!(matches!(ReferenceRegistry::load(path), Err(RegistryError::Conflict(_))));
}

#[test]
fn non_canonical_registry_entries_fail_closed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("evidence_tasks.json");
    fs::write(&path, br#"{"assignments": {"1": "ET1"}}"#).unwrap();
    assert!(matches!(ReferenceRegistry::load(path), Err(RegistryError::Parse(_))));
}

#[test]
fn missing_registry_starts_empty() {
    let dir = TempDir::new().unwrap();
    let registry = registry_in(&dir);
    assert!(registry.is_empty());
}
