// crates/harbormaster-remote/src/lib.rs
// ============================================================================
// Module: Harbormaster Remote
// Description: Typed HTTP client for the Tugboat compliance platform.
// Purpose: Implement the ComplianceRemote interface over reqwest.
// Dependencies: harbormaster-core, reqwest, serde, time, url
// ============================================================================

//! ## Overview
//! This crate ships the production [`TugboatClient`]: basic-auth JSON reads
//! for policies, controls, evidence tasks, and attachments; streamed
//! attachment downloads with temp-plus-rename; and the fire-and-forget
//! multipart evidence upload authenticated by an API-key header against a
//! per-task collector URL.
//!
//! Invariants:
//! - Credentials never appear in errors or logs; every message passes
//!   through redaction first.
//! - Every operation checks its cancel token before touching the network.
//! - The upload endpoint returns no durable identifier; callers persist
//!   submission state locally.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;
pub mod wire;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::TugboatClient;
pub use client::TugboatClientConfig;
