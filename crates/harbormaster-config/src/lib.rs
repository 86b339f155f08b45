// crates/harbormaster-config/src/lib.rs
// ============================================================================
// Module: Harbormaster Configuration
// Description: Strict TOML configuration model for the evidence engine.
// Purpose: Load, validate, and expose configuration fail-closed.
// Dependencies: harbormaster-core, serde, thiserror, toml, url
// ============================================================================

//! ## Overview
//! Configuration is a single TOML file covering storage paths, Tugboat
//! credentials, per-task collector URLs, interpolation variables, and the
//! optional context-generator output override. Loading is strict and
//! fail-closed: unknown keys are rejected, files are size- and
//! encoding-guarded, and validation runs before any value is used.
//!
//! The upload API key is never stored here; only the name of the environment
//! variable that carries it is configured, and the value is read from the
//! process environment at use time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use harbormaster_core::ErrorKind;
use harbormaster_core::RefKind;
use harbormaster_core::normalize_reference;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is supplied.
pub const DEFAULT_CONFIG_FILENAME: &str = "harbormaster.toml";
/// Maximum configuration file size in bytes.
const MAX_CONFIG_BYTES: u64 = 1024 * 1024;
/// Maximum total path length accepted for the config path.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Default environment variable carrying the upload API key.
const DEFAULT_API_KEY_ENV: &str = "TUGBOAT_API_KEY";
/// Default per-request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading and validation errors.
///
/// # Invariants
/// - Messages are stable for tests and user-facing reports.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config path exceeds the accepted length.
    #[error("config path exceeds max length ({0} > {MAX_TOTAL_PATH_LENGTH})")]
    PathTooLong(usize),
    /// A config path component exceeds the accepted length.
    #[error("config path component too long ({0} > {MAX_PATH_COMPONENT_LENGTH})")]
    ComponentTooLong(usize),
    /// The config file exceeds the size limit.
    #[error("config file exceeds size limit ({0} > {MAX_CONFIG_BYTES})")]
    FileTooLarge(u64),
    /// The config file is not valid UTF-8.
    #[error("config file must be utf-8")]
    NotUtf8,
    /// The config file could not be read.
    #[error("config io error: {0}")]
    Io(String),
    /// The config file failed to parse as TOML.
    #[error("config parse error: {0}")]
    Parse(String),
    /// A config value failed validation.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Maps the error onto its domain-level kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::IoError,
            Self::Parse(_) | Self::NotUtf8 => ErrorKind::ParseError,
            Self::PathTooLong(_) | Self::ComponentTooLong(_) | Self::FileTooLarge(_)
            | Self::Invalid(_) => ErrorKind::InvalidInput,
        }
    }
}

// ============================================================================
// SECTION: Storage Configuration
// ============================================================================

/// Per-kind storage path overrides, relative to the data root.
///
/// # Invariants
/// - Paths are relative; absolute overrides are rejected by validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoragePaths {
    /// Policy documents directory.
    #[serde(default = "default_policies_path")]
    pub policies: PathBuf,
    /// Control documents directory.
    #[serde(default = "default_controls_path")]
    pub controls: PathBuf,
    /// Evidence-task documents directory.
    #[serde(default = "default_evidence_tasks_path")]
    pub evidence_tasks: PathBuf,
    /// Evidence-prompt documents directory.
    #[serde(default = "default_evidence_prompts_path")]
    pub evidence_prompts: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self {
            policies: default_policies_path(),
            controls: default_controls_path(),
            evidence_tasks: default_evidence_tasks_path(),
            evidence_prompts: default_evidence_prompts_path(),
        }
    }
}

/// Default policies directory.
fn default_policies_path() -> PathBuf {
    PathBuf::from("docs/policies")
}

/// Default controls directory.
fn default_controls_path() -> PathBuf {
    PathBuf::from("docs/controls")
}

/// Default evidence-tasks directory.
fn default_evidence_tasks_path() -> PathBuf {
    PathBuf::from("docs/evidence_tasks")
}

/// Default evidence-prompts directory.
fn default_evidence_prompts_path() -> PathBuf {
    PathBuf::from("docs/evidence_prompts")
}

/// Storage configuration.
///
/// # Invariants
/// - `data_dir` is the root of all on-disk state.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Root of all on-disk state.
    pub data_dir: PathBuf,
    /// Per-kind path overrides.
    #[serde(default)]
    pub paths: StoragePaths,
}

// ============================================================================
// SECTION: Tugboat Configuration
// ============================================================================

/// Tugboat platform credentials and endpoints.
///
/// # Invariants
/// - `password` never appears in `Debug` output or error messages.
/// - The upload API key lives in the environment, not in this struct.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TugboatConfig {
    /// Base URL of the read API.
    pub base_url: String,
    /// Read-endpoint username.
    pub username: String,
    /// Read-endpoint password.
    pub password: String,
    /// Environment variable carrying the upload API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Per-task collector upload URLs keyed by task reference.
    #[serde(default)]
    pub collector_urls: BTreeMap<String, String>,
}

impl TugboatConfig {
    /// Reads the upload API key from the configured environment variable.
    #[must_use]
    pub fn api_key(&self) -> Option<String> {
        env::var(&self.api_key_env).ok().filter(|key| !key.is_empty())
    }

    /// Looks up the collector URL for a canonical task reference.
    #[must_use]
    pub fn collector_url(&self, task_ref: &str) -> Option<&str> {
        self.collector_urls.get(task_ref).map(String::as_str)
    }
}

impl fmt::Debug for TugboatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TugboatConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("api_key_env", &self.api_key_env)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("collector_urls", &self.collector_urls)
            .finish()
    }
}

/// Default API-key environment variable name.
fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

/// Default per-request timeout.
const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

// ============================================================================
// SECTION: Interpolation and Evidence Configuration
// ============================================================================

/// Template variables injected into Markdown rendering.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct InterpolationConfig {
    /// Variables substituted for `{{name}}` placeholders.
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

/// Context-generator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct GenerationConfig {
    /// Optional override for the context generator's output directory.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

/// Evidence-specific configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct EvidenceConfig {
    /// Generation settings.
    #[serde(default)]
    pub generation: GenerationConfig,
}

// ============================================================================
// SECTION: Root Configuration
// ============================================================================

/// Root Harbormaster configuration.
///
/// # Invariants
/// - Loaded fail-closed; unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarbormasterConfig {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Tugboat platform configuration.
    pub tugboat: TugboatConfig,
    /// Interpolation variables.
    #[serde(default)]
    pub interpolation: InterpolationConfig,
    /// Evidence configuration.
    #[serde(default)]
    pub evidence: EvidenceConfig,
}

impl HarbormasterConfig {
    /// Loads and validates configuration from `path` (or the default file).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the path is unacceptable, the file cannot
    /// be read or parsed, or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let default_path = PathBuf::from(DEFAULT_CONFIG_FILENAME);
        let path = path.unwrap_or(&default_path);
        check_path(path)?;
        let metadata = fs::metadata(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if metadata.len() > MAX_CONFIG_BYTES {
            return Err(ConfigError::FileTooLarge(metadata.len()));
        }
        let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        let text = String::from_utf8(bytes).map_err(|_| ConfigError::NotUtf8)?;
        let config: Self =
            toml::from_str(&text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("storage.data_dir must not be empty".to_string()));
        }
        for (label, path) in [
            ("storage.paths.policies", &self.storage.paths.policies),
            ("storage.paths.controls", &self.storage.paths.controls),
            ("storage.paths.evidence_tasks", &self.storage.paths.evidence_tasks),
            ("storage.paths.evidence_prompts", &self.storage.paths.evidence_prompts),
        ] {
            if path.is_absolute() {
                return Err(ConfigError::Invalid(format!("{label} must be relative")));
            }
        }
        Url::parse(&self.tugboat.base_url)
            .map_err(|_| ConfigError::Invalid("tugboat.base_url must be a valid url".to_string()))?;
        if self.tugboat.username.is_empty() {
            return Err(ConfigError::Invalid("tugboat.username must not be empty".to_string()));
        }
        if self.tugboat.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "tugboat.request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        for (task_ref, collector_url) in &self.tugboat.collector_urls {
            let canonical = normalize_reference(RefKind::EvidenceTask, task_ref);
            if canonical.as_deref() != Some(task_ref.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "tugboat.collector_urls key is not a canonical task reference: {task_ref}"
                )));
            }
            Url::parse(collector_url).map_err(|_| {
                ConfigError::Invalid(format!(
                    "tugboat.collector_urls[{task_ref}] must be a valid url"
                ))
            })?;
        }
        Ok(())
    }
}

/// Enforces path length guards before any filesystem access.
fn check_path(path: &Path) -> Result<(), ConfigError> {
    let total = path.as_os_str().len();
    if total > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::PathTooLong(total));
    }
    for component in path.components() {
        let len = component.as_os_str().len();
        if len > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::ComponentTooLong(len));
        }
    }
    Ok(())
}
