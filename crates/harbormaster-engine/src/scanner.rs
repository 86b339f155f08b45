// crates/harbormaster-engine/src/scanner.rs
// ============================================================================
// Module: Evidence Scanner
// Description: Rebuilds derived window and task state from the on-disk layout.
// Purpose: Be the single reader that assembles evidence lifecycle state.
// Dependencies: harbormaster-core, harbormaster-store, time, tracing
// ============================================================================

//! ## Overview
//! The scanner walks the evidence tree and reconstructs [`WindowState`] and
//! [`EvidenceTaskState`] without mutating anything. It supports the hybrid
//! layout (`archive/`, `.submitted/`, working root) and the legacy flat
//! layout, reading sidecars in priority order `archive/` then `.submitted/`
//! then the window root; the first value encountered wins per sidecar and
//! conflicting timestamps are never merged. Unreadable entries degrade to
//! warnings, never scan failures.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;

use harbormaster_core::AutomationLevel;
use harbormaster_core::EvidenceTask;
use harbormaster_core::EvidenceTaskState;
use harbormaster_core::GenerationMetadata;
use harbormaster_core::TaskRef;
use harbormaster_core::WindowState;
use harbormaster_core::derive_local_state;
use harbormaster_store::ARCHIVE_DIR;
use harbormaster_store::DocumentStore;
use harbormaster_store::EvidenceStore;
use harbormaster_store::SUBMITTED_DIR;
use harbormaster_store::StoreError;
use harbormaster_store::sha256_hex_file;
use time::OffsetDateTime;

// ============================================================================
// SECTION: Tool Heuristics
// ============================================================================

/// Keyword families mapping task text onto applicable tool families.
const TOOL_KEYWORDS: &[(&str, &[&str])] = &[
    ("github", &["github"]),
    ("terraform-analyzer", &["terraform", "infrastructure", "iam", "security"]),
    ("workspace-collector", &["google", "workspace", "drive", "docs"]),
    ("stack-analyzer", &["atmos", "stack", "multi-environment"]),
];

/// Keywords implying human-only collection activity.
const MANUAL_KEYWORDS: &[&str] =
    &["interview", "walkthrough", "meeting", "physical", "training", "tabletop"];

// ============================================================================
// SECTION: Scanner
// ============================================================================

/// Read-only scanner over the evidence tree and document store.
///
/// # Invariants
/// - The scanner mutates nothing; derived state is a pure function of disk
///   contents plus task metadata at scan time.
#[derive(Debug, Clone)]
pub struct Scanner {
    /// Evidence tree access.
    evidence: EvidenceStore,
    /// Document store for task metadata.
    documents: DocumentStore,
}

impl Scanner {
    /// Creates a scanner over the given stores.
    #[must_use]
    pub const fn new(evidence: EvidenceStore, documents: DocumentStore) -> Self {
        Self {
            evidence,
            documents,
        }
    }

    /// Scans every task directory under the evidence root.
    ///
    /// Per-task failures are logged as warnings and yield an empty state for
    /// that task; the scan continues.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] only when the evidence root itself cannot be
    /// enumerated.
    pub fn scan_all(
        &self,
        now: OffsetDateTime,
    ) -> Result<BTreeMap<String, EvidenceTaskState>, StoreError> {
        self.scan_all_with_workers(now, 1)
    }

    /// Scans every task directory with a bounded worker count.
    ///
    /// Tasks are independent, so per-task scans run on up to `workers`
    /// threads; the merged output is ordered by task reference regardless of
    /// completion order. A worker count of one is fully sequential.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] only when the evidence root itself cannot be
    /// enumerated.
    pub fn scan_all_with_workers(
        &self,
        now: OffsetDateTime,
        workers: usize,
    ) -> Result<BTreeMap<String, EvidenceTaskState>, StoreError> {
        let dirs = self.evidence.list_task_dirs()?;
        if workers <= 1 || dirs.len() <= 1 {
            let mut states = BTreeMap::new();
            for (task_ref, dir) in dirs {
                let state = self.scan_task_dir(&task_ref, &dir, now);
                states.insert(task_ref.as_str().to_string(), state);
            }
            return Ok(states);
        }

        let chunk_size = dirs.len().div_ceil(workers);
        let mut states = BTreeMap::new();
        std::thread::scope(|scope| {
            let mut handles = Vec::new();
            for chunk in dirs.chunks(chunk_size) {
                handles.push(scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|(task_ref, dir)| {
                            let state = self.scan_task_dir(task_ref, dir, now);
                            (task_ref.as_str().to_string(), state)
                        })
                        .collect::<Vec<_>>()
                }));
            }
            for handle in handles {
                if let Ok(chunk_states) = handle.join() {
                    states.extend(chunk_states);
                }
            }
        });
        Ok(states)
    }

    /// Scans a single task.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when neither a task directory nor a
    /// task document exists for the reference.
    pub fn scan_task(
        &self,
        task_ref: &TaskRef,
        now: OffsetDateTime,
    ) -> Result<EvidenceTaskState, StoreError> {
        let dir = self.evidence.find_task_dir(task_ref)?;
        match dir {
            Some(dir) => Ok(self.scan_task_dir(task_ref, &dir, now)),
            None => {
                let task = self.documents.get_task(task_ref.as_str()).map_err(|_| {
                    StoreError::NotFound(format!("evidence task {task_ref}"))
                })?;
                Ok(self.state_without_windows(task_ref, Some(&task), now))
            }
        }
    }

    /// Scans a single window of a task.
    ///
    /// A missing window directory yields an empty window state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the task directory cannot be resolved.
    pub fn scan_window(
        &self,
        task_ref: &TaskRef,
        window: &str,
    ) -> Result<WindowState, StoreError> {
        let Some(dir) = self.evidence.find_task_dir(task_ref)? else {
            return Ok(WindowState::empty(window.to_string()));
        };
        let window_dir = dir.join(window);
        if !window_dir.is_dir() {
            return Ok(WindowState::empty(window.to_string()));
        }
        self.scan_window_dir(window, &window_dir)
    }

    // ------------------------------------------------------------------
    // Task assembly
    // ------------------------------------------------------------------

    /// Builds task state from a task directory, tolerating window failures.
    fn scan_task_dir(
        &self,
        task_ref: &TaskRef,
        dir: &Path,
        now: OffsetDateTime,
    ) -> EvidenceTaskState {
        let task = self.documents.get_task(task_ref.as_str()).ok();
        let mut state = self.state_without_windows(task_ref, task.as_ref(), now);

        let windows = match self.evidence.list_windows(dir) {
            Ok(windows) => windows,
            Err(err) => {
                tracing::warn!(task = %task_ref, error = %err, "task directory unreadable");
                Vec::new()
            }
        };
        for (window_name, window_dir) in windows {
            match self.scan_window_dir(&window_name, &window_dir) {
                Ok(window_state) => {
                    state.windows.insert(window_name, window_state);
                }
                Err(err) => {
                    tracing::warn!(
                        task = %task_ref,
                        window = %window_name,
                        error = %err,
                        "window unreadable, reported as empty"
                    );
                    state.windows.insert(window_name.clone(), WindowState::empty(window_name));
                }
            }
        }

        state.last_generated_at =
            state.windows.values().filter_map(|w| w.generated_at).max();
        state.last_submitted_at =
            state.windows.values().filter_map(|w| w.submitted_at).max();
        state.local_state = derive_local_state(&state.windows);

        let observed: BTreeSet<String> = state
            .windows
            .values()
            .flat_map(|w| w.tools_used.iter().cloned())
            .collect();
        let text = task.as_ref().map_or_else(String::new, |t| {
            format!("{} {}", t.name, t.description).to_ascii_lowercase()
        });
        let applicable = applicable_tools(&text);
        state.automation_level = automation_level(&observed, &applicable, &text);
        state.applicable_tools = applicable;
        state
    }

    /// Builds the windowless skeleton of a task state.
    fn state_without_windows(
        &self,
        task_ref: &TaskRef,
        task: Option<&EvidenceTask>,
        now: OffsetDateTime,
    ) -> EvidenceTaskState {
        EvidenceTaskState {
            task_ref: task_ref.as_str().to_string(),
            task_id: task.map(|t| t.id),
            task_name: task.map_or_else(String::new, |t| t.name.clone()),
            framework: task.map_or_else(String::new, |t| t.framework.clone()),
            tugboat_status: task.map_or_else(String::new, |t| t.status.clone()),
            tugboat_completed: task.is_some_and(|t| t.completed),
            local_state: harbormaster_core::LocalState::NoEvidence,
            windows: BTreeMap::new(),
            last_generated_at: None,
            last_submitted_at: None,
            automation_level: AutomationLevel::Unknown,
            applicable_tools: Vec::new(),
            last_scanned_at: now,
        }
    }

    // ------------------------------------------------------------------
    // Window assembly
    // ------------------------------------------------------------------

    /// Scans one window directory into a window state.
    fn scan_window_dir(&self, window: &str, dir: &Path) -> Result<WindowState, StoreError> {
        let archive_dir = dir.join(ARCHIVE_DIR);
        let submitted_dir = dir.join(SUBMITTED_DIR);
        let hybrid = archive_dir.is_dir() || submitted_dir.is_dir();

        let mut state = WindowState::empty(window.to_string());

        // Scan priority: archive first (authoritative), then locally
        // submitted copies, then the working root.
        let sources: Vec<(PathBuf, &str)> = if hybrid {
            vec![
                (archive_dir.clone(), ARCHIVE_DIR),
                (submitted_dir.clone(), SUBMITTED_DIR),
                (dir.to_path_buf(), ""),
            ]
        } else {
            vec![(dir.to_path_buf(), "")]
        };

        for (source_dir, prefix) in &sources {
            let files = self.evidence.evidence_files(source_dir, prefix)?;
            state.files.extend(files);
        }

        let metadata_bases: Vec<PathBuf> = if hybrid {
            vec![archive_dir.clone(), submitted_dir, dir.to_path_buf()]
        } else {
            vec![dir.to_path_buf()]
        };
        let generation =
            metadata_bases.iter().find_map(|base| self.evidence.read_generation(base));
        let validation =
            metadata_bases.iter().find_map(|base| self.evidence.read_validation(base));
        let submission =
            metadata_bases.iter().find_map(|base| self.evidence.read_submission(base));
        state.submission_in_archive = self.evidence.read_submission(&archive_dir).is_some();

        if let Some(generation) = &generation {
            state.has_generation_meta = true;
            state.generation_method = Some(generation.generation_method);
            state.generated_at = Some(generation.generated_at);
            state.generated_by = Some(generation.generated_by.clone());
            state.tools_used = generation.tools_used.clone();
            self.apply_generation_records(dir, generation, &mut state);
        }
        if let Some(validation) = &validation {
            state.has_validation_meta = true;
            state.validation_ready = validation.ready_for_submission;
        }
        if let Some(submission) = &submission {
            state.has_submission_meta = true;
            state.submission_status = Some(submission.status);
            state.submitted_at = submission.submitted_at;
            state.submission_id = Some(submission.submission_id.clone());
        }

        state.file_count = u32::try_from(state.files.len()).unwrap_or(u32::MAX);
        state.total_bytes = state.files.iter().map(|f| f.size_bytes).sum();
        state.oldest_file = state.files.iter().map(|f| f.modified_at).min();
        state.newest_file = state.files.iter().map(|f| f.modified_at).max();
        Ok(state)
    }

    /// Marks files claimed by the generation sidecar and verifies checksums.
    fn apply_generation_records(
        &self,
        window_dir: &Path,
        generation: &GenerationMetadata,
        state: &mut WindowState,
    ) {
        let recorded: BTreeMap<&str, &str> = generation
            .files_generated
            .iter()
            .filter_map(|record| {
                let filename = record.path.rsplit('/').next()?;
                Some((filename, record.checksum.as_str()))
            })
            .collect();
        for file in &mut state.files {
            let Some(checksum) = recorded.get(file.filename.as_str()) else {
                continue;
            };
            file.is_generated = true;
            file.checksum = Some((*checksum).to_string());
            if let Some(tool) = generation.tools_used.first() {
                file.source = tool.clone();
            }
            let path = window_dir.join(&file.relative_path);
            match sha256_hex_file(&path) {
                Ok(actual) if actual == *checksum => {}
                Ok(_) => {
                    file.tampered = true;
                    tracing::warn!(
                        file = %file.relative_path,
                        "checksum mismatch against generation sidecar"
                    );
                }
                Err(err) => {
                    tracing::warn!(file = %file.relative_path, error = %err, "checksum unreadable");
                }
            }
        }
    }
}

// ============================================================================
// SECTION: Automation Heuristics
// ============================================================================

/// Returns the tool families suggested by task text keywords.
fn applicable_tools(text: &str) -> Vec<String> {
    let mut tools = Vec::new();
    for (family, keywords) in TOOL_KEYWORDS {
        if keywords.iter().any(|keyword| text.contains(keyword)) {
            tools.push((*family).to_string());
        }
    }
    tools
}

/// Returns true when an observed tool name covers a tool family.
fn covers(observed: &BTreeSet<String>, family: &str) -> bool {
    let prefix = family.split('-').next().unwrap_or(family);
    observed.iter().any(|tool| tool.to_ascii_lowercase().contains(prefix))
}

/// Derives the automation level from observed tools and task text.
fn automation_level(
    observed: &BTreeSet<String>,
    applicable: &[String],
    text: &str,
) -> AutomationLevel {
    let all_covered = !applicable.is_empty()
        && applicable.iter().all(|family| covers(observed, family));
    if all_covered {
        return AutomationLevel::FullyAutomated;
    }
    if !observed.is_empty() || !applicable.is_empty() {
        return AutomationLevel::PartiallyAutomated;
    }
    if MANUAL_KEYWORDS.iter().any(|keyword| text.contains(keyword)) {
        return AutomationLevel::ManualOnly;
    }
    AutomationLevel::Unknown
}
