// crates/harbormaster-engine/src/evaluator.rs
// ============================================================================
// Module: Window Evaluator
// Description: Four-dimension scoring of an evidence window.
// Purpose: Score windows against task requirements with fixed thresholds.
// Dependencies: harbormaster-core, time
// ============================================================================

//! ## Overview
//! The evaluator scores a window along completeness, requirements match,
//! quality, and control alignment, each in `[0, 100]`. The overall score is
//! the equal-weighted mean with the fixed 80/50 status thresholds. The
//! dimensions are deliberate heuristics; weights and thresholds are part of
//! the contract and are not re-tuned here. Issues are reported with
//! remediation hints and never auto-remediated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use harbormaster_core::Dimension;
use harbormaster_core::DimensionScore;
use harbormaster_core::DimensionStatus;
use harbormaster_core::EvaluationResult;
use harbormaster_core::EvidenceTask;
use harbormaster_core::Issue;
use harbormaster_core::Severity;
use harbormaster_core::WindowState;
use time::Duration;
use time::OffsetDateTime;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Minimum total bytes treated as substantive evidence (1 KiB).
const MIN_SUBSTANTIVE_BYTES: u64 = 1024;
/// Files newer than this are fully recent.
const RECENT_WINDOW_DAYS: i64 = 90;
/// Files older than this earn no recency credit.
const STALE_WINDOW_DAYS: i64 = 365;
/// Lower bound of a reasonable evidence file size.
const MIN_REASONABLE_BYTES: u64 = 100;
/// Upper bound of a reasonable evidence file size (100 MiB).
const MAX_REASONABLE_BYTES: u64 = 100 * 1024 * 1024;
/// Structured data extensions counted toward quality.
const STRUCTURED_EXTENSIONS: &[&str] = &["csv", "json", "yaml", "xlsx"];
/// Documentation extensions counted toward quality.
const DOCUMENTATION_EXTENSIONS: &[&str] = &["md", "txt", "pdf"];
/// Description length beyond which an extra file is expected.
const LONG_DESCRIPTION_CHARS: usize = 500;
/// Minimum keyword length used for requirement matching.
const MIN_KEYWORD_CHARS: usize = 4;

// ============================================================================
// SECTION: Evaluator
// ============================================================================

/// Stateless window evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator;

impl Evaluator {
    /// Scores a window state against its task's requirements.
    #[must_use]
    pub fn evaluate(
        &self,
        task: &EvidenceTask,
        window: &WindowState,
        subfolder_scope: Option<String>,
        now: OffsetDateTime,
    ) -> EvaluationResult {
        let mut issues = Vec::new();
        let completeness = score_completeness(task, window, now, &mut issues);
        let requirements = score_requirements(task, window, &mut issues);
        let quality = score_quality(window, &mut issues);
        let control_alignment = score_control_alignment(task, window, &mut issues);

        let overall_score = (completeness.score
            + requirements.score
            + quality.score
            + control_alignment.score)
            / 4.0;
        let overall_status = EvaluationResult::overall_status_for(overall_score);
        issues.sort_by_key(|issue| issue.severity);
        let recommendations = recommendations_for(
            &[&completeness, &requirements, &quality, &control_alignment],
            &issues,
        );

        EvaluationResult {
            task_ref: task.reference_id.clone(),
            task_id: Some(task.id),
            window: window.window.clone(),
            subfolder_scope,
            file_count: window.file_count,
            total_bytes: window.total_bytes,
            completeness,
            requirements,
            quality,
            control_alignment,
            overall_score,
            overall_status,
            issues,
            recommendations,
        }
    }
}

// ============================================================================
// SECTION: Expected Files Heuristic
// ============================================================================

/// Expected file count: 1 baseline, +1 if more than one related control,
/// +1 more if more than three, +1 for a long description.
#[must_use]
pub fn expected_file_count(task: &EvidenceTask) -> u32 {
    let mut expected = 1;
    if task.related_controls.len() > 1 {
        expected += 1;
    }
    if task.related_controls.len() > 3 {
        expected += 1;
    }
    if task.description.chars().count() > LONG_DESCRIPTION_CHARS {
        expected += 1;
    }
    expected
}

// ============================================================================
// SECTION: Dimension Scoring
// ============================================================================

/// Scores completeness: enough files, generation sidecar, size, recency.
fn score_completeness(
    task: &EvidenceTask,
    window: &WindowState,
    now: OffsetDateTime,
    issues: &mut Vec<Issue>,
) -> DimensionScore {
    let mut details = Vec::new();
    let expected = expected_file_count(task);

    if window.file_count == 0 {
        issues.push(Issue {
            severity: Severity::Critical,
            category: Dimension::Completeness,
            message: format!("window {} contains no evidence files", window.window),
            location: None,
            remediation: "generate or collect evidence before evaluating".to_string(),
        });
        details.push("no evidence files present".to_string());
        return DimensionScore::from_score(0.0, details);
    }

    let count_ratio = f64::from(window.file_count.min(expected)) / f64::from(expected);
    let mut score = 40.0 * count_ratio;
    details.push(format!("{} of {expected} expected files", window.file_count));
    if window.file_count < expected {
        issues.push(Issue {
            severity: Severity::Medium,
            category: Dimension::Completeness,
            message: format!(
                "expected at least {expected} files, found {}",
                window.file_count
            ),
            location: None,
            remediation: "collect the remaining evidence artifacts".to_string(),
        });
    }

    if window.has_generation_meta {
        score += 20.0;
        details.push("generation metadata present".to_string());
    } else {
        details.push("generation metadata missing".to_string());
    }

    if window.total_bytes > MIN_SUBSTANTIVE_BYTES {
        score += 20.0;
    } else {
        issues.push(Issue {
            severity: Severity::Low,
            category: Dimension::Completeness,
            message: format!("evidence totals only {} bytes", window.total_bytes),
            location: None,
            remediation: "verify the evidence is not a placeholder".to_string(),
        });
    }

    score += recency_credit(window, now, issues, &mut details);
    DimensionScore::from_score(score, details)
}

/// Scores recency of the newest file out of 20 points.
fn recency_credit(
    window: &WindowState,
    now: OffsetDateTime,
    issues: &mut Vec<Issue>,
    details: &mut Vec<String>,
) -> f64 {
    let Some(newest) = window.newest_file else {
        return 0.0;
    };
    let age = now - newest;
    if age <= Duration::days(RECENT_WINDOW_DAYS) {
        details.push("evidence is recent".to_string());
        20.0
    } else if age <= Duration::days(STALE_WINDOW_DAYS) {
        details.push("evidence is aging".to_string());
        10.0
    } else {
        issues.push(Issue {
            severity: Severity::Medium,
            category: Dimension::Completeness,
            message: "newest evidence file is over a year old".to_string(),
            location: None,
            remediation: "refresh the evidence for the current window".to_string(),
        });
        0.0
    }
}

/// Scores requirement match: keyword overlap, guidance, format fit.
fn score_requirements(
    task: &EvidenceTask,
    window: &WindowState,
    issues: &mut Vec<Issue>,
) -> DimensionScore {
    let mut details = Vec::new();
    let keywords = task_keywords(task);
    let mut score = 0.0;

    if window.files.is_empty() {
        details.push("no files to match against requirements".to_string());
        return DimensionScore::from_score(0.0, details);
    }

    if keywords.is_empty() {
        score += 50.0;
        details.push("task text yields no keywords; overlap not assessed".to_string());
    } else {
        let matched = window
            .files
            .iter()
            .filter(|file| {
                let name = file.filename.to_ascii_lowercase();
                keywords.iter().any(|keyword| name.contains(keyword.as_str()))
            })
            .count();
        let total = window.files.len();
        let matched_u32 = u32::try_from(matched).unwrap_or(u32::MAX);
        let total_u32 = u32::try_from(total).unwrap_or(u32::MAX);
        let ratio = f64::from(matched_u32) / f64::from(total_u32.max(1));
        score += 50.0 * ratio;
        details.push(format!("{matched} of {total} filenames match task keywords"));
        if matched == 0 {
            issues.push(Issue {
                severity: Severity::Medium,
                category: Dimension::Requirements,
                message: "no filename reflects the task's subject matter".to_string(),
                location: None,
                remediation: "name evidence files after what they demonstrate".to_string(),
            });
        }
    }

    if !task.guidance.is_empty() {
        score += 20.0;
        details.push("collection guidance available".to_string());
    }

    let accepted = window
        .files
        .iter()
        .filter(|file| crate::filetypes::is_accepted_extension(&file.filename))
        .count();
    let total = window.files.len();
    let accepted_u32 = u32::try_from(accepted).unwrap_or(u32::MAX);
    let total_u32 = u32::try_from(total).unwrap_or(u32::MAX);
    score += 30.0 * f64::from(accepted_u32) / f64::from(total_u32.max(1));
    for file in &window.files {
        if !crate::filetypes::is_accepted_extension(&file.filename) {
            issues.push(Issue {
                severity: Severity::High,
                category: Dimension::Requirements,
                message: format!("{} is not an accepted submission format", file.filename),
                location: Some(file.relative_path.clone()),
                remediation: "convert the file to an accepted format".to_string(),
            });
        }
    }

    DimensionScore::from_score(score, details)
}

/// Scores quality: naming, sizes, structured data, documentation.
fn score_quality(window: &WindowState, issues: &mut Vec<Issue>) -> DimensionScore {
    let mut details = Vec::new();
    if window.files.is_empty() {
        details.push("no files to assess".to_string());
        return DimensionScore::from_score(0.0, details);
    }
    let total = window.files.len();
    let total_u32 = u32::try_from(total).unwrap_or(u32::MAX);

    let well_named_count = window.files.iter().filter(|f| well_named(&f.filename)).count();
    for file in &window.files {
        if !well_named(&file.filename) {
            issues.push(Issue {
                severity: Severity::Low,
                category: Dimension::Quality,
                message: format!("{} does not follow naming conventions", file.filename),
                location: Some(file.relative_path.clone()),
                remediation: "use lowercase, descriptive names without spaces".to_string(),
            });
        }
    }
    let well_named_u32 = u32::try_from(well_named_count).unwrap_or(u32::MAX);
    let mut score = 30.0 * f64::from(well_named_u32) / f64::from(total_u32);
    details.push(format!("{well_named_count} of {total} files follow naming conventions"));

    let reasonable = window
        .files
        .iter()
        .filter(|f| (MIN_REASONABLE_BYTES..=MAX_REASONABLE_BYTES).contains(&f.size_bytes))
        .count();
    for file in &window.files {
        if !(MIN_REASONABLE_BYTES..=MAX_REASONABLE_BYTES).contains(&file.size_bytes) {
            issues.push(Issue {
                severity: Severity::Medium,
                category: Dimension::Quality,
                message: format!("{} is {} bytes", file.filename, file.size_bytes),
                location: Some(file.relative_path.clone()),
                remediation: "confirm the file is complete and not padded".to_string(),
            });
        }
    }
    let reasonable_u32 = u32::try_from(reasonable).unwrap_or(u32::MAX);
    score += 30.0 * f64::from(reasonable_u32) / f64::from(total_u32);

    let structured = window
        .files
        .iter()
        .filter(|f| has_extension_in(&f.filename, STRUCTURED_EXTENSIONS))
        .count();
    let structured_u32 = u32::try_from(structured).unwrap_or(u32::MAX);
    score += 20.0 * f64::from(structured_u32) / f64::from(total_u32);
    details.push(format!("{structured} of {total} files are structured data"));

    if window.files.iter().any(|f| has_extension_in(&f.filename, DOCUMENTATION_EXTENSIONS)) {
        score += 20.0;
        details.push("documentation present".to_string());
    }

    DimensionScore::from_score(score, details)
}

/// Scores control alignment: baseline, keyword coverage, breadth.
fn score_control_alignment(
    task: &EvidenceTask,
    window: &WindowState,
    issues: &mut Vec<Issue>,
) -> DimensionScore {
    let mut details = Vec::new();
    if window.files.is_empty() {
        details.push("no files to align".to_string());
        return DimensionScore::from_score(0.0, details);
    }
    let mut score = 40.0;
    if task.related_controls.is_empty() {
        score += 30.0;
        details.push("task has no related controls to align against".to_string());
        return DimensionScore::from_score(score, details);
    }

    let filenames: Vec<String> =
        window.files.iter().map(|f| f.filename.to_ascii_lowercase()).collect();
    let covered = task
        .related_controls
        .iter()
        .filter(|control| {
            let keywords = text_keywords(&control.name);
            keywords
                .iter()
                .any(|keyword| filenames.iter().any(|name| name.contains(keyword.as_str())))
        })
        .count();
    let total = task.related_controls.len();
    let covered_u32 = u32::try_from(covered).unwrap_or(u32::MAX);
    let total_u32 = u32::try_from(total).unwrap_or(u32::MAX);
    score += 40.0 * f64::from(covered_u32) / f64::from(total_u32.max(1));
    details.push(format!("{covered} of {total} related controls covered by filenames"));

    if covered > 1 {
        score += 20.0;
        details.push("evidence spans multiple controls".to_string());
    }
    if covered == 0 {
        issues.push(Issue {
            severity: Severity::Medium,
            category: Dimension::ControlAlignment,
            message: "no evidence file references a related control".to_string(),
            location: None,
            remediation: "collect artifacts that demonstrate the mapped controls".to_string(),
        });
    }

    DimensionScore::from_score(score, details)
}

// ============================================================================
// SECTION: Recommendations
// ============================================================================

/// Builds recommendations from dimensional thresholds and issue counts.
fn recommendations_for(dimensions: &[&DimensionScore], issues: &[Issue]) -> Vec<String> {
    let mut recommendations = Vec::new();
    let labels = ["completeness", "requirements match", "quality", "control alignment"];
    for (dimension, label) in dimensions.iter().zip(labels) {
        match dimension.status {
            DimensionStatus::Fail => {
                recommendations.push(format!("address {label}: score {:.0}", dimension.score));
            }
            DimensionStatus::Warning => {
                recommendations.push(format!("improve {label}: score {:.0}", dimension.score));
            }
            DimensionStatus::Pass => {}
        }
    }
    let critical = issues.iter().filter(|i| i.severity == Severity::Critical).count();
    if critical > 0 {
        recommendations
            .insert(0, format!("resolve {critical} critical issue(s) before submission"));
    }
    recommendations
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns true when a filename follows local naming conventions.
fn well_named(filename: &str) -> bool {
    let stem = filename.rsplit_once('.').map_or(filename, |(stem, _)| stem);
    stem.len() >= 5
        && !filename.contains(' ')
        && filename.chars().all(|c| !c.is_ascii_uppercase())
}

/// Returns true when the filename carries one of the listed extensions.
fn has_extension_in(filename: &str, extensions: &[&str]) -> bool {
    crate::filetypes::extension_of(filename)
        .is_some_and(|ext| extensions.contains(&ext.as_str()))
}

/// Extracts matching keywords from a task's name and description.
fn task_keywords(task: &EvidenceTask) -> BTreeSet<String> {
    let mut keywords = text_keywords(&task.name);
    keywords.extend(text_keywords(&task.description));
    keywords
}

/// Tokenizes text into lowercase keywords of useful length.
fn text_keywords(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| token.len() >= MIN_KEYWORD_CHARS)
        .map(str::to_ascii_lowercase)
        .collect()
}

#[cfg(test)]
mod tests;
