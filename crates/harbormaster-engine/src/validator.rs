// crates/harbormaster-engine/src/validator.rs
// ============================================================================
// Module: Pre-Submission Validator
// Description: Structured checks gating evidence submission.
// Purpose: Report errors and warnings without raising on failed checks.
// Dependencies: harbormaster-core, harbormaster-store, time
// ============================================================================

//! ## Overview
//! The validator inspects the working root of a window and produces a
//! [`ValidationResult`]: readable non-empty files, accepted extensions, the
//! 20 MiB platform limit, generation-sidecar checksum integrity, and the
//! at-least-one-file rule. `strict` mode treats warnings as blocking;
//! `lenient` permits them. The validator reports; it never raises for a
//! failing check and never writes to the filesystem.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::path::Path;

use harbormaster_core::EvidenceFile;
use harbormaster_core::FileCheck;
use harbormaster_core::TaskRef;
use harbormaster_core::ValidationMode;
use harbormaster_core::ValidationResult;
use harbormaster_store::EvidenceStore;
use harbormaster_store::StoreError;
use harbormaster_store::sha256_hex_file;
use time::OffsetDateTime;

use crate::filetypes::MAX_UPLOAD_BYTES;
use crate::filetypes::is_accepted_extension;

// ============================================================================
// SECTION: Validator
// ============================================================================

/// Pre-submission validation gate.
#[derive(Debug, Clone)]
pub struct Validator {
    /// Evidence tree access.
    evidence: EvidenceStore,
}

impl Validator {
    /// Creates a validator over an evidence store.
    #[must_use]
    pub const fn new(evidence: EvidenceStore) -> Self {
        Self {
            evidence,
        }
    }

    /// Validates the working root of a task window.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] only for infrastructure failures (the task
    /// directory cannot be resolved); failed checks are reported inside the
    /// result, never raised.
    pub fn validate(
        &self,
        task_ref: &TaskRef,
        window: &str,
        mode: ValidationMode,
        now: OffsetDateTime,
    ) -> Result<ValidationResult, StoreError> {
        let window_dir = self
            .evidence
            .find_task_dir(task_ref)?
            .map(|dir| dir.join(window));
        let files = match &window_dir {
            Some(dir) if dir.is_dir() => self.evidence.evidence_files(dir, "")?,
            _ => Vec::new(),
        };

        let mut errors = Vec::new();
        // None of the required checks emits warnings today; the collection
        // still feeds the result and the strict-mode gate.
        let warnings: Vec<String> = Vec::new();
        let mut file_checks = Vec::new();
        let mut passed_checks = 0u32;
        let mut failed_checks = 0u32;

        if files.is_empty() {
            errors.push(format!("no_evidence_files: window {window} has no files"));
            failed_checks += 1;
        }

        for file in &files {
            let Some(dir) = window_dir.as_deref() else {
                break;
            };
            let mut failures = Vec::new();
            check_readable_non_empty(dir, file, &mut failures);
            check_extension(file, &mut failures);
            check_size(file, &mut failures);
            if failures.is_empty() {
                passed_checks += 1;
                file_checks.push(FileCheck {
                    filename: file.filename.clone(),
                    passed: true,
                    detail: String::new(),
                });
            } else {
                failed_checks += u32::try_from(failures.len()).unwrap_or(u32::MAX);
                file_checks.push(FileCheck {
                    filename: file.filename.clone(),
                    passed: false,
                    detail: failures.join("; "),
                });
                errors.extend(failures);
            }
        }

        if let Some(dir) = window_dir.as_deref() {
            self.check_generation_sidecar(dir, &mut errors, &mut failed_checks);
        }

        let total_checks = passed_checks + failed_checks;
        let completeness_score = if total_checks == 0 {
            0.0
        } else {
            f64::from(passed_checks) / f64::from(total_checks)
        };
        let ready_for_submission = errors.is_empty()
            && (mode == ValidationMode::Lenient || warnings.is_empty());
        let status = if !errors.is_empty() {
            "failed"
        } else if warnings.is_empty() {
            "passed"
        } else {
            "passed_with_warnings"
        };

        Ok(ValidationResult {
            task_ref: task_ref.as_str().to_string(),
            window: window.to_string(),
            mode,
            status: status.to_string(),
            completeness_score,
            ready_for_submission,
            failed_checks,
            errors,
            warnings,
            file_checks,
            validated_at: now,
        })
    }

    /// Verifies generation-sidecar paths and checksums when one is present.
    ///
    /// A window with no generation sidecar is legal (manually collected
    /// evidence) and draws no finding.
    fn check_generation_sidecar(
        &self,
        window_dir: &Path,
        errors: &mut Vec<String>,
        failed_checks: &mut u32,
    ) {
        let Some(generation) = self.evidence.read_generation(window_dir) else {
            return;
        };
        for record in &generation.files_generated {
            let path = window_dir.join(&record.path);
            if !path.is_file() {
                errors.push(format!("missing_generated_file: {}", record.path));
                *failed_checks += 1;
                continue;
            }
            match sha256_hex_file(&path) {
                Ok(actual) if actual == record.checksum => {}
                Ok(_) => {
                    errors.push(format!("checksum_mismatch: {}", record.path));
                    *failed_checks += 1;
                }
                Err(err) => {
                    errors.push(format!("unreadable_file: {} ({err})", record.path));
                    *failed_checks += 1;
                }
            }
        }
    }
}

// ============================================================================
// SECTION: File Checks
// ============================================================================

/// Checks that a file opens and contains at least one byte.
fn check_readable_non_empty(dir: &Path, file: &EvidenceFile, failures: &mut Vec<String>) {
    if file.size_bytes == 0 {
        failures.push(format!("empty_file: {}", file.filename));
        return;
    }
    let path = dir.join(&file.relative_path);
    let mut buf = [0u8; 1];
    match File::open(&path).and_then(|mut f| f.read(&mut buf)) {
        Ok(_) => {}
        Err(err) => failures.push(format!("unreadable_file: {} ({err})", file.filename)),
    }
}

/// Checks the extension against the remote-accepted set.
fn check_extension(file: &EvidenceFile, failures: &mut Vec<String>) {
    if !is_accepted_extension(&file.filename) {
        failures.push(format!("unsupported_file_type: {}", file.filename));
    }
}

/// Checks the hard remote size limit.
fn check_size(file: &EvidenceFile, failures: &mut Vec<String>) {
    if file.size_bytes > MAX_UPLOAD_BYTES {
        failures.push(format!(
            "file_too_large: {} ({} > {MAX_UPLOAD_BYTES})",
            file.filename, file.size_bytes
        ));
    }
}
