// crates/harbormaster-engine/src/render.rs
// ============================================================================
// Module: Basic Document Renderer
// Description: Minimal Markdown rendering for synced documents.
// Purpose: Ship a default DocumentRenderer behind the collaborator seam.
// Dependencies: harbormaster-core
// ============================================================================

//! ## Overview
//! The sync engine writes a Markdown companion beside every JSON record.
//! This renderer produces a small front-matter-plus-sections document and
//! substitutes `{{name}}` placeholders from the interpolation variables.
//! Richer formatting is an external concern behind the same trait.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt::Write;

use harbormaster_core::Control;
use harbormaster_core::DocumentRenderer;
use harbormaster_core::EvidenceTask;
use harbormaster_core::Policy;

// ============================================================================
// SECTION: Interpolation
// ============================================================================

/// Substitutes `{{name}}` placeholders from the variable map.
///
/// Unknown placeholders are left untouched.
#[must_use]
pub fn interpolate(text: &str, variables: &BTreeMap<String, String>) -> String {
    let mut out = text.to_string();
    for (name, value) in variables {
        out = out.replace(&format!("{{{{{name}}}}}"), value);
    }
    out
}

// ============================================================================
// SECTION: Renderer
// ============================================================================

/// Minimal front-matter Markdown renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicRenderer;

impl DocumentRenderer for BasicRenderer {
    fn render_policy(&self, policy: &Policy, variables: &BTreeMap<String, String>) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "---");
        let _ = writeln!(out, "reference: {}", policy.reference_id);
        let _ = writeln!(out, "framework: {}", policy.framework);
        let _ = writeln!(out, "version: {}", policy.version);
        let _ = writeln!(out, "status: {}", policy.status);
        let _ = writeln!(out, "---");
        let _ = writeln!(out);
        let _ = writeln!(out, "# {} — {}", policy.reference_id, policy.name);
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", interpolate(&policy.content, variables));
        out
    }

    fn render_control(&self, control: &Control, variables: &BTreeMap<String, String>) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "---");
        let _ = writeln!(out, "reference: {}", control.reference_id);
        let _ = writeln!(out, "framework: {}", control.framework);
        let _ = writeln!(out, "category: {}", control.category);
        let _ = writeln!(out, "status: {}", control.status);
        let _ = writeln!(out, "---");
        let _ = writeln!(out);
        let _ = writeln!(out, "# {} — {}", control.reference_id, control.name);
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", interpolate(&control.description, variables));
        if !control.framework_codes.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "## Framework codes");
            let _ = writeln!(out);
            for code in &control.framework_codes {
                let _ = writeln!(out, "- {} ({})", code.code, code.framework);
            }
        }
        out
    }

    fn render_task(&self, task: &EvidenceTask, variables: &BTreeMap<String, String>) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "---");
        let _ = writeln!(out, "reference: {}", task.reference_id);
        let _ = writeln!(out, "framework: {}", task.framework);
        let _ = writeln!(out, "priority: {}", task.priority);
        let _ = writeln!(out, "status: {}", task.status);
        let _ = writeln!(out, "---");
        let _ = writeln!(out);
        let _ = writeln!(out, "# {} — {}", task.reference_id, task.name);
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", interpolate(&task.description, variables));
        if !task.guidance.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "## Guidance");
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", interpolate(&task.guidance, variables));
        }
        if !task.controls.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "## Controls");
            let _ = writeln!(out);
            for control in &task.controls {
                let _ = writeln!(out, "- {control}");
            }
        }
        out
    }
}
