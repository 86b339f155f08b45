// crates/harbormaster-cli/src/main.rs
// ============================================================================
// Module: Harbormaster CLI Entry Point
// Description: Command dispatcher for sync, scan, evaluate, validate, submit.
// Purpose: Wire configuration into the engine and render structured reports.
// Dependencies: clap, harbormaster-{config,core,engine,remote,store}, serde_json
// ============================================================================

//! ## Overview
//! The CLI is a thin shell around the engine: it loads configuration, builds
//! the stores and the Tugboat client, threads a cancel token, and renders
//! each outcome as a structured JSON report on stdout. Failures render a
//! remediation-focused report with a stable `error_kind`; stack traces are
//! never shown. The tracing subscriber is installed here and nowhere else.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use clap::Subcommand;
use harbormaster_config::HarbormasterConfig;
use harbormaster_core::CancelToken;
use harbormaster_core::ErrorKind;
use harbormaster_core::TaskRef;
use harbormaster_core::ValidationMode;
use harbormaster_engine::BasicRenderer;
use harbormaster_engine::CleanupEngine;
use harbormaster_engine::Evaluator;
use harbormaster_engine::Scanner;
use harbormaster_engine::SubmitRequest;
use harbormaster_engine::Submitter;
use harbormaster_engine::SyncEngine;
use harbormaster_engine::SyncError;
use harbormaster_engine::SyncOptions;
use harbormaster_engine::Validator;
use harbormaster_remote::TugboatClient;
use harbormaster_remote::TugboatClientConfig;
use harbormaster_store::DocumentStore;
use harbormaster_store::EvidenceStore;
use harbormaster_store::ReferenceRegistry;
use serde::Serialize;
use time::OffsetDateTime;

// ============================================================================
// SECTION: Command Line Definition
// ============================================================================

/// Compliance-evidence automation for the Tugboat platform.
#[derive(Debug, Parser)]
#[command(name = "harbormaster", version, about)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Pull remote records and archived attachments into the local store.
    Sync {
        /// Organization identifier.
        #[arg(long)]
        org_id: String,
        /// Optional framework filter.
        #[arg(long)]
        framework: Option<String>,
        /// Sync policies only (combinable with the other kind flags).
        #[arg(long)]
        policies: bool,
        /// Sync controls only (combinable with the other kind flags).
        #[arg(long)]
        controls: bool,
        /// Sync evidence tasks only (combinable with the other kind flags).
        #[arg(long)]
        evidence: bool,
        /// Pull submitted attachments only (combinable with the kind flags).
        #[arg(long)]
        submissions: bool,
    },
    /// Rebuild derived evidence state from disk.
    Scan {
        /// Scan a single task instead of everything.
        #[arg(long)]
        task: Option<String>,
        /// Scan a single window of the task.
        #[arg(long, requires = "task")]
        window: Option<String>,
        /// Worker threads for full scans (1 = sequential).
        #[arg(long, default_value_t = 1)]
        workers: usize,
    },
    /// Score a window against its task's requirements.
    Evaluate {
        /// Task reference.
        #[arg(long)]
        task: String,
        /// Window to evaluate.
        #[arg(long)]
        window: String,
    },
    /// Run the pre-submission validation gate.
    Validate {
        /// Task reference.
        #[arg(long)]
        task: String,
        /// Window to validate.
        #[arg(long)]
        window: String,
        /// Permit warnings instead of treating them as errors.
        #[arg(long)]
        lenient: bool,
        /// Persist the result as the window's validation sidecar.
        #[arg(long)]
        record: bool,
    },
    /// Submit a window's evidence to the collector endpoint.
    Submit {
        /// Task reference.
        #[arg(long)]
        task: String,
        /// Window to submit.
        #[arg(long)]
        window: String,
        /// Notes recorded with the submission.
        #[arg(long, default_value = "")]
        notes: String,
        /// Skip the validation gate.
        #[arg(long)]
        skip_validation: bool,
        /// Permit validation warnings.
        #[arg(long)]
        lenient: bool,
        /// Operator recorded in the submission sidecar.
        #[arg(long, default_value = "harbormaster")]
        submitted_by: String,
    },
    /// Migrate flat-layout windows to the hybrid layout.
    Cleanup {
        /// Clean a single task instead of everything.
        #[arg(long)]
        task: Option<String>,
        /// Report intended moves without touching the filesystem.
        #[arg(long)]
        dry_run: bool,
    },
}

// ============================================================================
// SECTION: Reports
// ============================================================================

/// Structured report rendered for every command outcome.
#[derive(Debug, Serialize)]
struct Report<T: Serialize> {
    /// Whether the command succeeded.
    ok: bool,
    /// Stable status label.
    status: String,
    /// Human-readable summary.
    message: String,
    /// Stable error kind for failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<String>,
    /// Command-specific payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<T>,
}

/// Renders a report as JSON on stdout.
fn emit<T: Serialize>(report: &Report<T>) {
    let rendered = serde_json::to_string_pretty(report)
        .unwrap_or_else(|_| r#"{"ok":false,"status":"render_error"}"#.to_string());
    let _ = writeln!(io::stdout(), "{rendered}");
}

/// Command-level failure carrying a stable error kind.
struct CommandError {
    /// Domain-level error kind.
    kind: ErrorKind,
    /// Human-readable message.
    message: String,
}

impl CommandError {
    /// Builds a failure from anything exposing a kind.
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Renders a failure report and returns the failure exit code.
fn fail(error: &CommandError) -> ExitCode {
    emit(&Report::<()> {
        ok: false,
        status: "error".to_string(),
        message: error.message.clone(),
        error_kind: Some(error.kind.as_str().to_string()),
        payload: None,
    });
    ExitCode::FAILURE
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(error) => fail(&error),
    }
}

/// Dispatches the parsed command.
fn run(cli: &Cli) -> Result<ExitCode, CommandError> {
    let config = HarbormasterConfig::load(cli.config.as_deref())
        .map_err(|err| CommandError::new(err.kind(), err.to_string()))?;
    let app = App::new(config)?;
    match &cli.command {
        Command::Sync {
            org_id,
            framework,
            policies,
            controls,
            evidence,
            submissions,
        } => app.sync(org_id, framework.as_deref(), *policies, *controls, *evidence, *submissions),
        Command::Scan {
            task,
            window,
            workers,
        } => app.scan(task.as_deref(), window.as_deref(), *workers),
        Command::Evaluate {
            task,
            window,
        } => app.evaluate(task, window),
        Command::Validate {
            task,
            window,
            lenient,
            record,
        } => app.validate(task, window, *lenient, *record),
        Command::Submit {
            task,
            window,
            notes,
            skip_validation,
            lenient,
            submitted_by,
        } => app.submit(task, window, notes, *skip_validation, *lenient, submitted_by),
        Command::Cleanup {
            task,
            dry_run,
        } => app.cleanup(task.as_deref(), *dry_run),
    }
}

// ============================================================================
// SECTION: Application Wiring
// ============================================================================

/// Configured stores and engines shared by every command.
struct App {
    /// Loaded configuration.
    config: HarbormasterConfig,
    /// Document store.
    documents: DocumentStore,
    /// Evidence tree store.
    evidence: EvidenceStore,
}

impl App {
    /// Builds stores from configuration.
    fn new(config: HarbormasterConfig) -> Result<Self, CommandError> {
        let data_dir = config.storage.data_dir.clone();
        let documents = DocumentStore::new(
            data_dir.join(&config.storage.paths.policies),
            data_dir.join(&config.storage.paths.controls),
            data_dir.join(&config.storage.paths.evidence_tasks),
        );
        let evidence = EvidenceStore::with_data_root(&data_dir);
        Ok(Self {
            config,
            documents,
            evidence,
        })
    }

    /// Builds the Tugboat client from configuration.
    fn remote(&self) -> Result<Arc<TugboatClient>, CommandError> {
        let client = TugboatClient::new(TugboatClientConfig {
            base_url: self.config.tugboat.base_url.clone(),
            username: self.config.tugboat.username.clone(),
            password: self.config.tugboat.password.clone(),
            api_key: self.config.tugboat.api_key(),
            timeout: Duration::from_secs(self.config.tugboat.request_timeout_secs),
            user_agent: "harbormaster/0.1".to_string(),
        })
        .map_err(|err| CommandError::new(err.kind(), err.to_string()))?;
        Ok(Arc::new(client))
    }

    /// Parses and normalizes a task reference argument.
    fn task_ref(raw: &str) -> Result<TaskRef, CommandError> {
        TaskRef::new(raw).ok_or_else(|| {
            CommandError::new(
                ErrorKind::InvalidInput,
                format!("not a task reference: {raw}"),
            )
        })
    }

    /// Runs the sync engine.
    fn sync(
        &self,
        org_id: &str,
        framework: Option<&str>,
        policies: bool,
        controls: bool,
        evidence: bool,
        submissions: bool,
    ) -> Result<ExitCode, CommandError> {
        let all = !(policies || controls || evidence || submissions);
        let options = SyncOptions {
            org_id: org_id.to_string(),
            framework: framework.map(str::to_string),
            policies: all || policies,
            controls: all || controls,
            evidence_tasks: all || evidence,
            submissions: all || submissions,
        };
        let registry = ReferenceRegistry::load_under(&self.config.storage.data_dir)
            .map_err(|err| CommandError::new(err.kind(), err.to_string()))?;
        let engine = SyncEngine::new(
            self.remote()?,
            self.documents.clone(),
            self.evidence.clone(),
            registry,
            Arc::new(BasicRenderer),
            self.config.interpolation.variables.clone(),
        );
        match engine.sync(&options, &CancelToken::new(), OffsetDateTime::now_utc()) {
            Ok(result) => {
                let ok = result.succeeded();
                emit(&Report {
                    ok,
                    status: if ok { "synced" } else { "sync_failed" }.to_string(),
                    message: format!(
                        "synced {} policies, {} controls, {} tasks, {} attachments",
                        result.policies.synced,
                        result.controls.synced,
                        result.evidence_tasks.synced,
                        result.submissions.synced
                    ),
                    error_kind: None,
                    payload: Some(result),
                });
                Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
            }
            Err(SyncError::Cancelled(partial)) => {
                emit(&Report {
                    ok: false,
                    status: "cancelled".to_string(),
                    message: "sync cancelled; counters are partial".to_string(),
                    error_kind: Some(ErrorKind::Cancelled.as_str().to_string()),
                    payload: Some(*partial),
                });
                Ok(ExitCode::FAILURE)
            }
        }
    }

    /// Runs the scanner.
    fn scan(
        &self,
        task: Option<&str>,
        window: Option<&str>,
        workers: usize,
    ) -> Result<ExitCode, CommandError> {
        let scanner = Scanner::new(self.evidence.clone(), self.documents.clone());
        let now = OffsetDateTime::now_utc();
        match (task, window) {
            (Some(task), Some(window)) => {
                let state = scanner
                    .scan_window(&Self::task_ref(task)?, window)
                    .map_err(|err| CommandError::new(err.kind(), err.to_string()))?;
                emit(&Report {
                    ok: true,
                    status: "scanned".to_string(),
                    message: format!("window {window} of {task}"),
                    error_kind: None,
                    payload: Some(state),
                });
            }
            (Some(task), None) => {
                let state = scanner
                    .scan_task(&Self::task_ref(task)?, now)
                    .map_err(|err| CommandError::new(err.kind(), err.to_string()))?;
                emit(&Report {
                    ok: true,
                    status: "scanned".to_string(),
                    message: format!("task {task}: {}", state.local_state.as_str()),
                    error_kind: None,
                    payload: Some(state),
                });
            }
            _ => {
                let states = scanner
                    .scan_all_with_workers(now, workers.max(1))
                    .map_err(|err| CommandError::new(err.kind(), err.to_string()))?;
                emit(&Report {
                    ok: true,
                    status: "scanned".to_string(),
                    message: format!("{} tasks", states.len()),
                    error_kind: None,
                    payload: Some(states),
                });
            }
        }
        Ok(ExitCode::SUCCESS)
    }

    /// Runs the evaluator for one window.
    fn evaluate(&self, task: &str, window: &str) -> Result<ExitCode, CommandError> {
        let task_ref = Self::task_ref(task)?;
        let record = self
            .documents
            .get_task(task_ref.as_str())
            .map_err(|err| CommandError::new(err.kind(), err.to_string()))?;
        let scanner = Scanner::new(self.evidence.clone(), self.documents.clone());
        let state = scanner
            .scan_window(&task_ref, window)
            .map_err(|err| CommandError::new(err.kind(), err.to_string()))?;
        let result = Evaluator.evaluate(&record, &state, None, OffsetDateTime::now_utc());
        emit(&Report {
            ok: true,
            status: "evaluated".to_string(),
            message: format!("overall {:.0} for {window} of {task}", result.overall_score),
            error_kind: None,
            payload: Some(result),
        });
        Ok(ExitCode::SUCCESS)
    }

    /// Runs the validation gate, optionally recording the sidecar.
    fn validate(
        &self,
        task: &str,
        window: &str,
        lenient: bool,
        record: bool,
    ) -> Result<ExitCode, CommandError> {
        let task_ref = Self::task_ref(task)?;
        let mode = if lenient { ValidationMode::Lenient } else { ValidationMode::Strict };
        let result = Validator::new(self.evidence.clone())
            .validate(&task_ref, window, mode, OffsetDateTime::now_utc())
            .map_err(|err| CommandError::new(err.kind(), err.to_string()))?;
        if record {
            let window_dir = self
                .evidence
                .find_task_dir(&task_ref)
                .map_err(|err| CommandError::new(err.kind(), err.to_string()))?
                .map(|dir| dir.join(window))
                .ok_or_else(|| {
                    CommandError::new(
                        ErrorKind::NotFound,
                        format!("no evidence directory for {task}"),
                    )
                })?;
            self.evidence
                .write_validation(&window_dir, &result)
                .map_err(|err| CommandError::new(err.kind(), err.to_string()))?;
        }
        let ok = result.ready_for_submission;
        emit(&Report {
            ok,
            status: result.status.clone(),
            message: format!(
                "{} errors, {} warnings for {window} of {task}",
                result.errors.len(),
                result.warnings.len()
            ),
            error_kind: (!ok).then(|| ErrorKind::ValidationFailed.as_str().to_string()),
            payload: Some(result),
        });
        Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
    }

    /// Runs the submitter for one window.
    fn submit(
        &self,
        task: &str,
        window: &str,
        notes: &str,
        skip_validation: bool,
        lenient: bool,
        submitted_by: &str,
    ) -> Result<ExitCode, CommandError> {
        let request = SubmitRequest {
            task_ref: Self::task_ref(task)?,
            window: window.to_string(),
            notes: notes.to_string(),
            skip_validation,
            validation_mode: if lenient {
                ValidationMode::Lenient
            } else {
                ValidationMode::Strict
            },
            submitted_by: submitted_by.to_string(),
        };
        let submitter = Submitter::new(
            self.evidence.clone(),
            self.documents.clone(),
            self.remote()?,
            self.config.tugboat.collector_urls.clone(),
        );
        let response = submitter
            .submit(&request, &CancelToken::new(), OffsetDateTime::now_utc())
            .map_err(|err| CommandError::new(err.kind(), err.to_string()))?;
        let ok = response.success;
        emit(&Report {
            ok,
            status: response.status.clone(),
            message: response.message.clone(),
            error_kind: (!ok).then(|| ErrorKind::ValidationFailed.as_str().to_string()),
            payload: Some(response),
        });
        Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
    }

    /// Runs layout cleanup.
    fn cleanup(&self, task: Option<&str>, dry_run: bool) -> Result<ExitCode, CommandError> {
        let cleanup = CleanupEngine::new(self.evidence.clone());
        let report = match task {
            Some(task) => cleanup.run_task(&Self::task_ref(task)?, dry_run),
            None => cleanup.run(dry_run),
        }
        .map_err(|err| CommandError::new(err.kind(), err.to_string()))?;
        emit(&Report {
            ok: true,
            status: if dry_run { "planned" } else { "migrated" }.to_string(),
            message: format!(
                "{} windows scanned, {} migrated, {} skipped",
                report.windows_scanned, report.windows_migrated, report.windows_skipped
            ),
            error_kind: None,
            payload: Some(report),
        });
        Ok(ExitCode::SUCCESS)
    }
}
