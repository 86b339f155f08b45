// crates/harbormaster-engine/src/filetypes.rs
// ============================================================================
// Module: Accepted File Types
// Description: Remote-accepted extensions and the content-type table.
// Purpose: Share one static table between validator and submitter.
// Dependencies: none
// ============================================================================

//! ## Overview
//! The platform accepts a fixed set of file extensions for submission, with
//! a static content-type mapping over the same set. Unknown extensions map
//! to `application/octet-stream` for display purposes but are rejected by
//! the extension check before any upload.

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum file size the platform accepts, in bytes (20 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// Extension-to-content-type table for the accepted set.
const CONTENT_TYPES: &[(&str, &str)] = &[
    ("txt", "text/plain"),
    ("csv", "text/csv"),
    ("json", "application/json"),
    ("pdf", "application/pdf"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("md", "text/markdown"),
    ("doc", "application/msword"),
    ("docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
    ("xls", "application/vnd.ms-excel"),
    ("xlsx", "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
    ("odt", "application/vnd.oasis.opendocument.text"),
    ("ods", "application/vnd.oasis.opendocument.spreadsheet"),
];

/// Fallback content type for unknown extensions.
const OCTET_STREAM: &str = "application/octet-stream";

// ============================================================================
// SECTION: Lookups
// ============================================================================

/// Returns the lowercase extension of a filename, when it has one.
#[must_use]
pub fn extension_of(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Returns true when the filename's extension is in the accepted set.
#[must_use]
pub fn is_accepted_extension(filename: &str) -> bool {
    extension_of(filename)
        .is_some_and(|ext| CONTENT_TYPES.iter().any(|(known, _)| *known == ext))
}

/// Returns the content type for a filename.
///
/// Unknown extensions map to `application/octet-stream`; callers reject them
/// separately via [`is_accepted_extension`].
#[must_use]
pub fn content_type_for(filename: &str) -> &'static str {
    extension_of(filename)
        .and_then(|ext| {
            CONTENT_TYPES.iter().find(|(known, _)| *known == ext).map(|(_, mime)| *mime)
        })
        .unwrap_or(OCTET_STREAM)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only panic-based assertions are permitted.")]

    use super::content_type_for;
    use super::extension_of;
    use super::is_accepted_extension;

    #[test]
    fn accepted_set_matches_the_platform_table() {
        for name in [
            "a.txt", "a.csv", "a.json", "a.pdf", "a.png", "a.gif", "a.jpg", "a.jpeg", "a.md",
            "a.doc", "a.docx", "a.xls", "a.xlsx", "a.odt", "a.ods",
        ] {
            assert!(is_accepted_extension(name), "expected accepted: {name}");
        }
        for name in ["a.exe", "a.sh", "a.yaml", "archive", "a."] {
            assert!(!is_accepted_extension(name), "expected rejected: {name}");
        }
    }

    #[test]
    fn extensions_are_case_insensitive() {
        assert!(is_accepted_extension("REPORT.CSV"));
        assert_eq!(extension_of("REPORT.CSV").unwrap(), "csv");
    }

    #[test]
    fn unknown_extensions_map_to_octet_stream() {
        assert_eq!(content_type_for("a.csv"), "text/csv");
        assert_eq!(content_type_for("a.bin"), "application/octet-stream");
        assert_eq!(content_type_for("no_extension"), "application/octet-stream");
    }
}
