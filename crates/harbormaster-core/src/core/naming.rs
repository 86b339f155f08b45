// crates/harbormaster-core/src/core/naming.rs
// ============================================================================
// Module: Canonical Naming
// Description: Slugs, document filenames, and evidence-task directory names.
// Purpose: Keep on-disk names derivable from entity metadata and parseable back.
// Dependencies: crate::core::identifiers
// ============================================================================

//! ## Overview
//! Documents are persisted as `<REF>-<numeric_id>-<short_slug>.json` and
//! evidence tasks live under `<REF>_<sanitized_name>/` directories. Naming is
//! deterministic: the directory name is derivable from the task metadata and
//! the inverse parse recovers the same reference identifier.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::identifiers::TaskRef;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum length of a document slug.
const MAX_SLUG_LENGTH: usize = 40;

/// Stop words filtered out of slugs.
const SLUG_STOP_WORDS: &[&str] =
    &["the", "a", "an", "of", "for", "and", "or", "to", "in", "on", "with"];

/// Fallback slug for names that filter down to nothing.
const EMPTY_SLUG: &str = "untitled";

// ============================================================================
// SECTION: Slugs
// ============================================================================

/// Derives a lowercase, underscore-separated slug from an entity name.
///
/// Stop words are filtered, non-alphanumeric runs collapse to single
/// underscores, and the result is truncated to at most 40 characters on an
/// underscore boundary.
#[must_use]
pub fn short_slug(name: &str) -> String {
    let tokens: Vec<String> = name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_ascii_lowercase)
        .filter(|token| !SLUG_STOP_WORDS.contains(&token.as_str()))
        .collect();
    if tokens.is_empty() {
        return EMPTY_SLUG.to_string();
    }
    let mut slug = String::new();
    for token in tokens {
        let projected = if slug.is_empty() { token.len() } else { slug.len() + 1 + token.len() };
        if projected > MAX_SLUG_LENGTH {
            break;
        }
        if !slug.is_empty() {
            slug.push('_');
        }
        slug.push_str(&token);
    }
    if slug.is_empty() {
        // A single token longer than the cap is truncated rather than dropped.
        name.split(|c: char| !c.is_ascii_alphanumeric())
            .find(|token| !token.is_empty())
            .map_or_else(|| EMPTY_SLUG.to_string(), |token| {
                token.to_ascii_lowercase().chars().take(MAX_SLUG_LENGTH).collect()
            })
    } else {
        slug
    }
}

// ============================================================================
// SECTION: Document Filenames
// ============================================================================

/// Builds the canonical document file stem `<REF>-<numeric_id>-<short_slug>`.
///
/// The caller appends `.json` or `.md`. `reference` is the filename form of
/// the reference identifier (controls use the underscore form here).
#[must_use]
pub fn document_file_stem(reference: &str, numeric_id: &str, name: &str) -> String {
    format!("{reference}-{numeric_id}-{}", short_slug(name))
}

// ============================================================================
// SECTION: Task Directories
// ============================================================================

/// Sanitizes a task name for use as a directory-name component.
///
/// Path-hostile and whitespace characters become underscores; runs collapse
/// and leading/trailing underscores are trimmed. Case is preserved.
#[must_use]
pub fn sanitize_task_dir_component(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_separator = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
            out.push(c);
            last_was_separator = false;
        } else if !last_was_separator {
            out.push('_');
            last_was_separator = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Builds the canonical evidence-task directory name `<REF>_<sanitized_name>`.
#[must_use]
pub fn task_dir_name(task_ref: &TaskRef, name: &str) -> String {
    let sanitized = sanitize_task_dir_component(name);
    if sanitized.is_empty() {
        task_ref.as_str().to_string()
    } else {
        format!("{task_ref}_{sanitized}")
    }
}

/// Parses a directory name back into its task reference.
///
/// Accepts any `ET-<digits>` prefix followed by `_` (or the bare reference),
/// normalizing the digits so the inverse of [`task_dir_name`] yields the same
/// reference identifier.
#[must_use]
pub fn parse_task_dir_name(dir_name: &str) -> Option<TaskRef> {
    let reference = dir_name.split_once('_').map_or(dir_name, |(prefix, _)| prefix);
    let digits = reference.strip_prefix("ET-")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    TaskRef::new(reference)
}

#[cfg(test)]
mod tests;
