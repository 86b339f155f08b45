// crates/harbormaster-engine/src/sync.rs
// ============================================================================
// Module: Sync Engine
// Description: Pull remote records and attachments into the local stores.
// Purpose: Be the write-path source of truth for documents and archives.
// Dependencies: harbormaster-core, harbormaster-store, time, tracing
// ============================================================================

//! ## Overview
//! The sync engine mirrors Policies, Controls, and Evidence Tasks from the
//! platform into the document store, assigns stable reference identifiers
//! through the registry, writes Markdown companions, and pulls submitted
//! attachments into per-window `archive/` subtrees with submission sidecars
//! and history entries. Entities are processed in ascending numeric-id
//! order so new reference assignments are stable across runs regardless of
//! remote list order. One entity failing never aborts a phase; a total
//! remote-auth failure does.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;
use std::time::Instant;

use harbormaster_core::Attachment;
use harbormaster_core::AttachmentKind;
use harbormaster_core::CancelToken;
use harbormaster_core::ComplianceRemote;
use harbormaster_core::DocumentRenderer;
use harbormaster_core::EvidenceSubmission;
use harbormaster_core::EvidenceTask;
use harbormaster_core::HistoryEntry;
use harbormaster_core::RefKind;
use harbormaster_core::RemoteError;
use harbormaster_core::RemoteScope;
use harbormaster_core::SubmissionStatus;
use harbormaster_core::TaskRef;
use harbormaster_core::TugboatResponse;
use harbormaster_core::TugboatResponseMetadata;
use harbormaster_core::Window;
use harbormaster_core::normalize_reference;
use harbormaster_store::ARCHIVE_DIR;
use harbormaster_store::DocumentStore;
use harbormaster_store::EvidenceStore;
use harbormaster_store::ReferenceRegistry;
use harbormaster_store::write_atomic;
use serde::Serialize;
use thiserror::Error;
use time::Date;
use time::OffsetDateTime;
use time::macros::format_description;

// ============================================================================
// SECTION: Options and Counters
// ============================================================================

/// Sync invocation options.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Organization identifier.
    pub org_id: String,
    /// Optional framework filter.
    pub framework: Option<String>,
    /// Sync policies.
    pub policies: bool,
    /// Sync controls.
    pub controls: bool,
    /// Sync evidence tasks.
    pub evidence_tasks: bool,
    /// Pull submitted attachments into archives.
    pub submissions: bool,
}

impl SyncOptions {
    /// Enables every phase for a scope.
    #[must_use]
    pub const fn everything(org_id: String, framework: Option<String>) -> Self {
        Self {
            org_id,
            framework,
            policies: true,
            controls: true,
            evidence_tasks: true,
            submissions: true,
        }
    }

    /// Builds the remote scope for list calls.
    #[must_use]
    fn scope(&self) -> RemoteScope {
        RemoteScope {
            org_id: self.org_id.clone(),
            framework: self.framework.clone(),
        }
    }
}

/// Per-kind sync counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindCounters {
    /// Entities listed by the remote platform.
    pub total: u32,
    /// Entities fully materialized locally.
    pub synced: u32,
    /// Entities whose detail fetch succeeded.
    pub detailed: u32,
    /// Entities skipped (unsupported kinds, already current).
    pub skipped: u32,
    /// Entities that failed.
    pub errors: u32,
    /// Attachment files downloaded or already present.
    pub downloaded: u32,
}

/// Aggregate sync outcome.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncResult {
    /// Policy phase counters.
    pub policies: KindCounters,
    /// Control phase counters.
    pub controls: KindCounters,
    /// Evidence-task phase counters.
    pub evidence_tasks: KindCounters,
    /// Submissions phase counters.
    pub submissions: KindCounters,
    /// Accumulated phase errors.
    pub errors: Vec<String>,
    /// Wall-clock duration of the sync.
    pub duration: Duration,
}

impl SyncResult {
    /// Returns true unless some phase produced zero results with errors.
    ///
    /// This is the command-level success rule: partial failure is success as
    /// long as every phase that errored still produced something.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        !(phase_failed(&self.policies)
            || phase_failed(&self.controls)
            || phase_failed(&self.evidence_tasks)
            || phase_failed(&self.submissions))
    }
}

/// Returns true when a phase produced nothing and recorded errors.
const fn phase_failed(counters: &KindCounters) -> bool {
    counters.synced == 0 && counters.errors > 0
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Sync engine errors.
///
/// # Invariants
/// - Cancellation carries the partial counters accumulated so far.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The sync was cancelled; partial counters are attached.
    #[error("sync cancelled")]
    Cancelled(Box<SyncResult>),
}

/// Internal marker raised when the cancel token fires mid-phase.
struct PhaseCancelled;

// ============================================================================
// SECTION: Sync Engine
// ============================================================================

/// The sync engine.
///
/// # Invariants
/// - Registry mutation is serialized behind the internal mutex; consumers
///   only ever read the persisted registry file.
pub struct SyncEngine {
    /// Remote platform client.
    remote: Arc<dyn ComplianceRemote>,
    /// Document store (exclusive writer).
    documents: DocumentStore,
    /// Evidence tree access for archives.
    evidence: EvidenceStore,
    /// Reference registry, single-writer.
    registry: Mutex<ReferenceRegistry>,
    /// Markdown renderer for companion documents.
    renderer: Arc<dyn DocumentRenderer>,
    /// Interpolation variables for rendering.
    variables: BTreeMap<String, String>,
}

impl SyncEngine {
    /// Creates a sync engine.
    #[must_use]
    pub fn new(
        remote: Arc<dyn ComplianceRemote>,
        documents: DocumentStore,
        evidence: EvidenceStore,
        registry: ReferenceRegistry,
        renderer: Arc<dyn DocumentRenderer>,
        variables: BTreeMap<String, String>,
    ) -> Self {
        Self {
            remote,
            documents,
            evidence,
            registry: Mutex::new(registry),
            renderer,
            variables,
        }
    }

    /// Runs the enabled sync phases in order.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Cancelled`] with partial counters when the token
    /// fires; all other failures accumulate into the result's errors.
    pub fn sync(
        &self,
        options: &SyncOptions,
        cancel: &CancelToken,
        now: OffsetDateTime,
    ) -> Result<SyncResult, SyncError> {
        let started = Instant::now();
        let mut result = SyncResult::default();
        let outcome = self.run_phases(options, cancel, now, &mut result);
        result.duration = started.elapsed();
        match outcome {
            Ok(()) => Ok(result),
            Err(PhaseCancelled) => {
                result.errors.push("cancelled".to_string());
                Err(SyncError::Cancelled(Box::new(result)))
            }
        }
    }

    /// Runs each enabled phase, stopping only on cancellation.
    fn run_phases(
        &self,
        options: &SyncOptions,
        cancel: &CancelToken,
        now: OffsetDateTime,
        result: &mut SyncResult,
    ) -> Result<(), PhaseCancelled> {
        let scope = options.scope();
        if options.policies {
            self.sync_policies(&scope, cancel, result)?;
        }
        if options.controls {
            self.sync_controls(&scope, cancel, result)?;
        }
        if options.evidence_tasks {
            self.sync_tasks(&scope, cancel, result)?;
        }
        if options.submissions {
            self.sync_submissions(cancel, now, result)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Policies
    // ------------------------------------------------------------------

    /// Syncs the policy kind.
    fn sync_policies(
        &self,
        scope: &RemoteScope,
        cancel: &CancelToken,
        result: &mut SyncResult,
    ) -> Result<(), PhaseCancelled> {
        let mut summaries = match self.remote.list_policies(scope, cancel) {
            Ok(summaries) => summaries,
            Err(RemoteError::Cancelled) => return Err(PhaseCancelled),
            Err(err) => {
                result.policies.errors += 1;
                result.errors.push(format!("policies: {err}"));
                return Ok(());
            }
        };
        // Ascending numeric id keeps assignment order stable across runs.
        summaries.sort_by(|a, b| match (a.id.parse::<u64>(), b.id.parse::<u64>()) {
            (Ok(left), Ok(right)) => left.cmp(&right),
            _ => a.id.cmp(&b.id),
        });
        result.policies.total = u32::try_from(summaries.len()).unwrap_or(u32::MAX);

        for summary in summaries {
            if cancel.is_cancelled() {
                return Err(PhaseCancelled);
            }
            let mut policy = match self.remote.get_policy(&summary.id, cancel) {
                Ok(policy) => policy,
                Err(RemoteError::Cancelled) => return Err(PhaseCancelled),
                Err(err @ RemoteError::Auth(_)) => {
                    result.policies.errors += 1;
                    result.errors.push(format!("policies: {err}"));
                    return Ok(());
                }
                Err(err) => {
                    result.policies.errors += 1;
                    result.errors.push(format!("policy {}: {err}", summary.id));
                    continue;
                }
            };
            result.policies.detailed += 1;
            match normalize_reference(RefKind::Policy, &policy.reference_id) {
                Some(canonical) => policy.reference_id = canonical,
                None => {
                    policy.reference_recognized = false;
                    tracing::warn!(policy = %policy.id, reference = %policy.reference_id,
                        "unrecognized policy reference kept verbatim");
                }
            }
            match self.documents.save_policy(&policy) {
                Ok(json_path) => {
                    let markdown = self.renderer.render_policy(&policy, &self.variables);
                    if let Err(err) =
                        self.documents.save_companion_markdown(&json_path, &markdown)
                    {
                        result.errors.push(format!("policy {}: {err}", policy.id));
                    }
                    result.policies.synced += 1;
                }
                Err(err) => {
                    result.policies.errors += 1;
                    result.errors.push(format!("policy {}: {err}", policy.id));
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Controls
    // ------------------------------------------------------------------

    /// Syncs the control kind.
    fn sync_controls(
        &self,
        scope: &RemoteScope,
        cancel: &CancelToken,
        result: &mut SyncResult,
    ) -> Result<(), PhaseCancelled> {
        let mut summaries = match self.remote.list_controls(scope, cancel) {
            Ok(summaries) => summaries,
            Err(RemoteError::Cancelled) => return Err(PhaseCancelled),
            Err(err) => {
                result.controls.errors += 1;
                result.errors.push(format!("controls: {err}"));
                return Ok(());
            }
        };
        summaries.sort_by_key(|summary| summary.id);
        result.controls.total = u32::try_from(summaries.len()).unwrap_or(u32::MAX);

        for summary in summaries {
            if cancel.is_cancelled() {
                return Err(PhaseCancelled);
            }
            let mut control = match self.remote.get_control(summary.id, cancel) {
                Ok(control) => control,
                Err(RemoteError::Cancelled) => return Err(PhaseCancelled),
                Err(err @ RemoteError::Auth(_)) => {
                    result.controls.errors += 1;
                    result.errors.push(format!("controls: {err}"));
                    return Ok(());
                }
                Err(err) => {
                    result.controls.errors += 1;
                    result.errors.push(format!("control {}: {err}", summary.id));
                    continue;
                }
            };
            result.controls.detailed += 1;
            match normalize_reference(RefKind::Control, &control.reference_id) {
                Some(canonical) => control.reference_id = canonical,
                None => {
                    control.reference_recognized = false;
                    tracing::warn!(control = control.id, reference = %control.reference_id,
                        "unrecognized control reference kept verbatim");
                }
            }
            match self.documents.save_control(&control) {
                Ok(json_path) => {
                    let markdown = self.renderer.render_control(&control, &self.variables);
                    if let Err(err) =
                        self.documents.save_companion_markdown(&json_path, &markdown)
                    {
                        result.errors.push(format!("control {}: {err}", control.id));
                    }
                    result.controls.synced += 1;
                }
                Err(err) => {
                    result.controls.errors += 1;
                    result.errors.push(format!("control {}: {err}", control.id));
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Evidence tasks
    // ------------------------------------------------------------------

    /// Syncs the evidence-task kind and persists the registry once.
    fn sync_tasks(
        &self,
        scope: &RemoteScope,
        cancel: &CancelToken,
        result: &mut SyncResult,
    ) -> Result<(), PhaseCancelled> {
        let mut summaries = match self.remote.list_evidence_tasks(scope, cancel) {
            Ok(summaries) => summaries,
            Err(RemoteError::Cancelled) => return Err(PhaseCancelled),
            Err(err) => {
                result.evidence_tasks.errors += 1;
                result.errors.push(format!("evidence_tasks: {err}"));
                return Ok(());
            }
        };
        summaries.sort_by_key(|summary| summary.id);
        result.evidence_tasks.total = u32::try_from(summaries.len()).unwrap_or(u32::MAX);

        for summary in summaries {
            if cancel.is_cancelled() {
                return Err(PhaseCancelled);
            }
            let mut task = match self.remote.get_evidence_task(summary.id, cancel) {
                Ok(task) => task,
                Err(RemoteError::Cancelled) => return Err(PhaseCancelled),
                Err(err @ RemoteError::Auth(_)) => {
                    result.evidence_tasks.errors += 1;
                    result.errors.push(format!("evidence_tasks: {err}"));
                    break;
                }
                Err(err) => {
                    result.evidence_tasks.errors += 1;
                    result.errors.push(format!("task {}: {err}", summary.id));
                    continue;
                }
            };
            result.evidence_tasks.detailed += 1;
            let remote_reference = TaskRef::new(&task.reference_id);
            let assigned = {
                let mut registry =
                    self.registry.lock().unwrap_or_else(PoisonError::into_inner);
                registry.resolve(task.id, remote_reference.as_ref())
            };
            task.reference_id = assigned.as_str().to_string();
            match self.documents.save_task(&task) {
                Ok(json_path) => {
                    let markdown = self.renderer.render_task(&task, &self.variables);
                    if let Err(err) =
                        self.documents.save_companion_markdown(&json_path, &markdown)
                    {
                        result.errors.push(format!("task {}: {err}", task.id));
                    }
                    result.evidence_tasks.synced += 1;
                }
                Err(err) => {
                    result.evidence_tasks.errors += 1;
                    result.errors.push(format!("task {}: {err}", task.id));
                }
            }
        }

        // The registry persists once per phase; a save failure is reported
        // without aborting the sync.
        let registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = registry.save() {
            result.errors.push(format!("registry: {err}"));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Submissions (attachment archive pull)
    // ------------------------------------------------------------------

    /// Pulls submitted attachments into per-window archives.
    fn sync_submissions(
        &self,
        cancel: &CancelToken,
        now: OffsetDateTime,
        result: &mut SyncResult,
    ) -> Result<(), PhaseCancelled> {
        let tasks = match self.documents.get_all_tasks() {
            Ok(tasks) => tasks,
            Err(err) => {
                result.submissions.errors += 1;
                result.errors.push(format!("submissions: {err}"));
                return Ok(());
            }
        };
        for task in tasks {
            if cancel.is_cancelled() {
                return Err(PhaseCancelled);
            }
            let Some(task_ref) = TaskRef::new(&task.reference_id) else {
                result.submissions.skipped += 1;
                continue;
            };
            let mut attachments = match self.remote.list_attachments(task.id, cancel) {
                Ok(attachments) => attachments,
                Err(RemoteError::Cancelled) => return Err(PhaseCancelled),
                Err(err @ RemoteError::Auth(_)) => {
                    result.submissions.errors += 1;
                    result.errors.push(format!("submissions: {err}"));
                    return Ok(());
                }
                Err(err) => {
                    result.submissions.errors += 1;
                    result.errors.push(format!("attachments for {task_ref}: {err}"));
                    continue;
                }
            };
            attachments.sort_by_key(|attachment| attachment.id);
            result.submissions.total +=
                u32::try_from(attachments.len()).unwrap_or(u32::MAX);

            let task_dir = match self.evidence.find_task_dir(&task_ref) {
                Ok(Some(dir)) => dir,
                Ok(None) => self.evidence.task_dir_path(&task_ref, &task.name),
                Err(err) => {
                    result.submissions.errors += 1;
                    result.errors.push(format!("evidence tree for {task_ref}: {err}"));
                    continue;
                }
            };

            // Kind dispatch comes first: unsupported kinds are skipped
            // outright, and only file/url attachments need a collection date
            // to land in a window. An undatable attachment is a recorded
            // failure, never a silent drop.
            let mut by_window: BTreeMap<String, Vec<(Attachment, Date)>> = BTreeMap::new();
            for attachment in attachments {
                if let AttachmentKind::Other(kind) = &attachment.kind {
                    tracing::debug!(attachment = attachment.id, kind = %kind,
                        "unsupported attachment kind skipped");
                    result.submissions.skipped += 1;
                    continue;
                }
                let Some(collected) = attachment.collected_date else {
                    result.submissions.errors += 1;
                    result.errors.push(format!(
                        "attachment {}: missing or invalid collected_date",
                        attachment.id
                    ));
                    continue;
                };
                let window = Window::for_date(task.collection_interval, collected);
                by_window.entry(window.to_string()).or_default().push((attachment, collected));
            }
            for (window, window_attachments) in by_window {
                if cancel.is_cancelled() {
                    return Err(PhaseCancelled);
                }
                self.archive_window(
                    &task,
                    &task_ref,
                    &task_dir,
                    &window,
                    &window_attachments,
                    cancel,
                    now,
                    result,
                )?;
            }
        }
        Ok(())
    }

    /// Materializes one window's attachments under `archive/`.
    ///
    /// Unsupported kinds never reach this point; they are counted `skipped`
    /// during window grouping.
    #[allow(
        clippy::too_many_arguments,
        reason = "Archival threads the full task and window context once."
    )]
    fn archive_window(
        &self,
        task: &EvidenceTask,
        task_ref: &TaskRef,
        task_dir: &Path,
        window: &str,
        attachments: &[(Attachment, Date)],
        cancel: &CancelToken,
        now: OffsetDateTime,
        result: &mut SyncResult,
    ) -> Result<(), PhaseCancelled> {
        let archive_dir = task_dir.join(window).join(ARCHIVE_DIR);
        let mut new_entries: Vec<HistoryEntry> = Vec::new();

        for (attachment, collected) in attachments {
            if cancel.is_cancelled() {
                return Err(PhaseCancelled);
            }
            match &attachment.kind {
                AttachmentKind::File => {
                    let filename = attachment
                        .filename
                        .clone()
                        .filter(|name| !name.is_empty())
                        .unwrap_or_else(|| format!("attachment_{}", attachment.id));
                    let dest = archive_dir.join(&filename);
                    if dest.is_file() {
                        result.submissions.downloaded += 1;
                        result.submissions.synced += 1;
                        continue;
                    }
                    match self.remote.download_attachment(attachment, &dest, cancel) {
                        Ok(_) => {
                            result.submissions.downloaded += 1;
                            result.submissions.synced += 1;
                            new_entries.push(archive_history_entry(attachment, *collected, 1));
                        }
                        Err(RemoteError::Cancelled) => return Err(PhaseCancelled),
                        Err(err) => {
                            result.submissions.errors += 1;
                            result
                                .errors
                                .push(format!("attachment {}: {err}", attachment.id));
                        }
                    }
                }
                AttachmentKind::Url => {
                    let dest =
                        archive_dir.join(format!("url_reference_{}.txt", attachment.id));
                    if dest.is_file() {
                        result.submissions.synced += 1;
                        continue;
                    }
                    let body = url_reference_body(attachment, *collected);
                    match write_atomic(&dest, body.as_bytes()) {
                        Ok(()) => {
                            result.submissions.synced += 1;
                            new_entries.push(archive_history_entry(attachment, *collected, 1));
                        }
                        Err(err) => {
                            result.submissions.errors += 1;
                            result
                                .errors
                                .push(format!("attachment {}: {err}", attachment.id));
                        }
                    }
                }
                AttachmentKind::Other(_) => {
                    result.submissions.skipped += 1;
                }
            }
        }

        if let Err(err) =
            self.write_archive_sidecars(task, task_ref, task_dir, window, &new_entries, now)
        {
            result.errors.push(format!("archive sidecar for {task_ref}/{window}: {err}"));
        }
        Ok(())
    }

    /// Writes the archival submission sidecar and appends history entries.
    fn write_archive_sidecars(
        &self,
        task: &EvidenceTask,
        task_ref: &TaskRef,
        task_dir: &Path,
        window: &str,
        new_entries: &[HistoryEntry],
        now: OffsetDateTime,
    ) -> Result<(), harbormaster_store::StoreError> {
        let archive_dir = task_dir.join(window).join(ARCHIVE_DIR);
        let files = self.evidence.evidence_files(&archive_dir, "")?;
        if files.is_empty() {
            return Ok(());
        }
        let file_count = u32::try_from(files.len()).unwrap_or(u32::MAX);
        let total_size_bytes = files.iter().map(|f| f.size_bytes).sum();
        let submission = EvidenceSubmission {
            task_id: task.id,
            task_ref: task_ref.as_str().to_string(),
            window: window.to_string(),
            submission_id: format!("archive-{}-{window}", task.id),
            status: SubmissionStatus::Accepted,
            created_at: now,
            submitted_at: None,
            accepted_at: Some(now),
            evidence_files: files,
            total_file_count: file_count,
            total_size_bytes,
            submitted_by: "tugboat-sync".to_string(),
            notes: "archived from platform attachments".to_string(),
            validation_status: String::new(),
            validation_errors: Vec::new(),
            validation_warnings: Vec::new(),
            completeness_score: 0.0,
            tugboat_response: Some(TugboatResponse {
                submission_id: None,
                status: "archived".to_string(),
                message: String::new(),
                received_at: None,
                metadata: TugboatResponseMetadata {
                    files_submitted: file_count,
                    files_failed: 0,
                    failed_files: None,
                },
            }),
        };
        self.evidence.write_submission(&archive_dir, &submission)?;
        for entry in new_entries {
            self.evidence.append_history(
                &archive_dir,
                task_ref.as_str(),
                window,
                entry.clone(),
            )?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds a history entry for an archived attachment.
fn archive_history_entry(
    attachment: &Attachment,
    collected: Date,
    file_count: u32,
) -> HistoryEntry {
    HistoryEntry {
        submission_id: format!("attachment-{}", attachment.id),
        submitted_at: collected.midnight().assume_utc(),
        submitted_by: "tugboat-sync".to_string(),
        status: SubmissionStatus::Accepted,
        file_count,
        notes: attachment.notes.clone(),
    }
}

/// Renders the body of a URL-reference attachment file.
fn url_reference_body(attachment: &Attachment, collected: Date) -> String {
    let date_format = format_description!("[year]-[month]-[day]");
    let collected = collected
        .format(&date_format)
        .unwrap_or_else(|_| collected.to_string());
    format!(
        "URL:\n{}\nNotes:\n{}\nCollected:\n{}\n",
        attachment.url.as_deref().unwrap_or(""),
        attachment.notes,
        collected
    )
}
