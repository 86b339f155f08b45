// crates/harbormaster-remote/src/client.rs
// ============================================================================
// Module: Tugboat Client
// Description: Blocking HTTP client for the Tugboat compliance platform.
// Purpose: Implement ComplianceRemote with strict limits and redaction.
// Dependencies: harbormaster-core, reqwest, serde, time, url
// ============================================================================

//! ## Overview
//! Read endpoints use HTTP basic auth against the configured base URL;
//! uploads use an API-key header against per-task collector URLs. Redirects
//! are never followed, every request carries the configured timeout, and all
//! error text passes through credential redaction before leaving this
//! module. The collector endpoint is fire-and-forget: its acknowledgement
//! carries no durable identifier.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use harbormaster_core::Attachment;
use harbormaster_core::CancelToken;
use harbormaster_core::ComplianceRemote;
use harbormaster_core::Control;
use harbormaster_core::ControlSummary;
use harbormaster_core::EvidenceTask;
use harbormaster_core::Policy;
use harbormaster_core::PolicySummary;
use harbormaster_core::RemoteError;
use harbormaster_core::RemoteScope;
use harbormaster_core::SubmitReceipt;
use harbormaster_core::SubmitUpload;
use harbormaster_core::TaskSummary;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::blocking::Response;
use reqwest::blocking::multipart::Form;
use reqwest::blocking::multipart::Part;
use reqwest::redirect::Policy as RedirectPolicy;
use serde::de::DeserializeOwned;
use time::macros::format_description;
use url::Url;

use crate::wire;
use crate::wire::AttachmentDto;
use crate::wire::ControlDto;
use crate::wire::ControlSummaryDto;
use crate::wire::EvidenceTaskDto;
use crate::wire::PolicyDto;
use crate::wire::PolicySummaryDto;
use crate::wire::SubmitAckDto;
use crate::wire::TaskSummaryDto;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying the upload API key.
const API_KEY_HEADER: &str = "X-Api-Key";
/// Maximum error-body excerpt length kept in messages.
const MAX_ERROR_BODY_CHARS: usize = 256;
/// Download copy buffer size.
const DOWNLOAD_BUFFER_BYTES: usize = 64 * 1024;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the Tugboat client.
///
/// # Invariants
/// - `timeout` applies to the full request lifecycle of every call.
/// - `api_key` is required only for uploads.
#[derive(Clone)]
pub struct TugboatClientConfig {
    /// Base URL of the read API.
    pub base_url: String,
    /// Read-endpoint username.
    pub username: String,
    /// Read-endpoint password.
    pub password: String,
    /// Upload API key, when configured in the environment.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// User agent for outbound requests.
    pub user_agent: String,
}

impl Default for TugboatClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            username: String::new(),
            password: String::new(),
            api_key: None,
            timeout: Duration::from_secs(30),
            user_agent: "harbormaster/0.1".to_string(),
        }
    }
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Blocking Tugboat platform client.
///
/// # Invariants
/// - Shared, thread-safe, and connection-pooled; clones share the pool.
/// - Redirects are not followed.
pub struct TugboatClient {
    /// Client configuration including credentials.
    config: TugboatClientConfig,
    /// Parsed base URL for the read API.
    base_url: Url,
    /// Pooled blocking HTTP client.
    client: Client,
}

impl TugboatClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when the base URL is invalid or the HTTP
    /// client cannot be constructed.
    pub fn new(config: TugboatClientConfig) -> Result<Self, RemoteError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|_| RemoteError::Unavailable("invalid base url".to_string()))?;
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .redirect(RedirectPolicy::none())
            .build()
            .map_err(|_| RemoteError::Unavailable("http client build failed".to_string()))?;
        Ok(Self {
            config,
            base_url,
            client,
        })
    }

    /// Strips credentials from any outbound message text.
    fn redact(&self, message: &str) -> String {
        let mut redacted = message.to_string();
        for secret in [
            Some(self.config.password.as_str()),
            Some(self.config.username.as_str()),
            self.config.api_key.as_deref(),
        ]
        .into_iter()
        .flatten()
        {
            if !secret.is_empty() {
                redacted = redacted.replace(secret, "<redacted>");
            }
        }
        redacted
    }

    /// Resolves an API path against the base URL.
    fn api_url(&self, path: &str) -> Result<Url, RemoteError> {
        self.base_url
            .join(path)
            .map_err(|_| RemoteError::Unavailable(format!("invalid api path: {path}")))
    }

    /// Issues an authenticated GET and classifies the response.
    fn get(
        &self,
        url: Url,
        query: &[(&str, &str)],
        cancel: &CancelToken,
    ) -> Result<Response, RemoteError> {
        if cancel.is_cancelled() {
            return Err(RemoteError::Cancelled);
        }
        let response = self
            .client
            .get(url)
            .query(query)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .map_err(|err| self.classify_send_error(&err))?;
        self.classify_status(response)
    }

    /// Issues an authenticated GET and decodes a JSON body.
    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        cancel: &CancelToken,
    ) -> Result<T, RemoteError> {
        let url = self.api_url(path)?;
        let response = self.get(url, query, cancel)?;
        response.json::<T>().map_err(|err| RemoteError::Parse(self.redact(&err.to_string())))
    }

    /// Maps a transport error onto a redacted remote error.
    fn classify_send_error(&self, err: &reqwest::Error) -> RemoteError {
        RemoteError::Unavailable(self.redact(&err.to_string()))
    }

    /// Maps HTTP status codes onto remote errors, passing success through.
    fn classify_status(&self, response: Response) -> Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .map(|body| {
                let mut excerpt: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
                if excerpt.is_empty() {
                    excerpt = status.to_string();
                }
                self.redact(&excerpt)
            })
            .unwrap_or_else(|_| status.to_string());
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RemoteError::Auth(message));
        }
        Err(RemoteError::Reject {
            status: status.as_u16(),
            message,
        })
    }

    /// Builds the scope query parameters shared by list endpoints.
    fn scope_query<'a>(scope: &'a RemoteScope) -> Vec<(&'static str, &'a str)> {
        let mut query = vec![("org_id", scope.org_id.as_str())];
        if let Some(framework) = scope.framework.as_deref() {
            query.push(("framework", framework));
        }
        query
    }
}

// ============================================================================
// SECTION: ComplianceRemote Implementation
// ============================================================================

impl ComplianceRemote for TugboatClient {
    fn list_policies(
        &self,
        scope: &RemoteScope,
        cancel: &CancelToken,
    ) -> Result<Vec<PolicySummary>, RemoteError> {
        let dtos: Vec<PolicySummaryDto> =
            self.get_json("api/v1/policies", &Self::scope_query(scope), cancel)?;
        Ok(dtos.into_iter().map(PolicySummary::from).collect())
    }

    fn get_policy(&self, id: &str, cancel: &CancelToken) -> Result<Policy, RemoteError> {
        let dto: PolicyDto = self.get_json(&format!("api/v1/policies/{id}"), &[], cancel)?;
        Ok(wire::policy_from_wire(dto))
    }

    fn list_controls(
        &self,
        scope: &RemoteScope,
        cancel: &CancelToken,
    ) -> Result<Vec<ControlSummary>, RemoteError> {
        let dtos: Vec<ControlSummaryDto> =
            self.get_json("api/v1/controls", &Self::scope_query(scope), cancel)?;
        Ok(dtos.into_iter().map(ControlSummary::from).collect())
    }

    fn get_control(&self, id: i64, cancel: &CancelToken) -> Result<Control, RemoteError> {
        let dto: ControlDto = self.get_json(&format!("api/v1/controls/{id}"), &[], cancel)?;
        Ok(wire::control_from_wire(dto))
    }

    fn list_evidence_tasks(
        &self,
        scope: &RemoteScope,
        cancel: &CancelToken,
    ) -> Result<Vec<TaskSummary>, RemoteError> {
        let dtos: Vec<TaskSummaryDto> =
            self.get_json("api/v1/evidence_tasks", &Self::scope_query(scope), cancel)?;
        Ok(dtos.into_iter().map(TaskSummary::from).collect())
    }

    fn get_evidence_task(
        &self,
        id: i64,
        cancel: &CancelToken,
    ) -> Result<EvidenceTask, RemoteError> {
        let dto: EvidenceTaskDto =
            self.get_json(&format!("api/v1/evidence_tasks/{id}"), &[], cancel)?;
        Ok(wire::task_from_wire(dto))
    }

    fn list_attachments(
        &self,
        task_id: i64,
        cancel: &CancelToken,
    ) -> Result<Vec<Attachment>, RemoteError> {
        let dtos: Vec<AttachmentDto> =
            self.get_json(&format!("api/v1/evidence_tasks/{task_id}/attachments"), &[], cancel)?;
        Ok(dtos.into_iter().map(wire::attachment_from_wire).collect())
    }

    fn download_attachment(
        &self,
        attachment: &Attachment,
        dest: &Path,
        cancel: &CancelToken,
    ) -> Result<u64, RemoteError> {
        let url = self.api_url(&format!("api/v1/attachments/{}/download", attachment.id))?;
        let mut response = self.get(url, &[], cancel)?;

        let parent = dest
            .parent()
            .ok_or_else(|| RemoteError::Io("download path has no parent".to_string()))?;
        fs::create_dir_all(parent).map_err(|err| RemoteError::Io(err.to_string()))?;
        let mut tmp = dest.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = Path::new(&tmp);
        let mut file = fs::File::create(tmp).map_err(|err| RemoteError::Io(err.to_string()))?;

        let mut written = 0u64;
        let mut buf = vec![0u8; DOWNLOAD_BUFFER_BYTES];
        loop {
            if cancel.is_cancelled() {
                drop(file);
                let _ = fs::remove_file(tmp);
                return Err(RemoteError::Cancelled);
            }
            let read = response
                .read(&mut buf)
                .map_err(|err| RemoteError::Io(self.redact(&err.to_string())))?;
            if read == 0 {
                break;
            }
            file.write_all(&buf[..read]).map_err(|err| RemoteError::Io(err.to_string()))?;
            let read = u64::try_from(read)
                .map_err(|_| RemoteError::Io("download chunk size overflow".to_string()))?;
            written += read;
        }
        file.flush().map_err(|err| RemoteError::Io(err.to_string()))?;
        drop(file);
        fs::rename(tmp, dest).map_err(|err| RemoteError::Io(err.to_string()))?;
        Ok(written)
    }

    fn submit_evidence(
        &self,
        upload: &SubmitUpload,
        cancel: &CancelToken,
    ) -> Result<SubmitReceipt, RemoteError> {
        if cancel.is_cancelled() {
            return Err(RemoteError::Cancelled);
        }
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| RemoteError::Auth("upload api key not configured".to_string()))?;
        let filename = upload
            .file_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| RemoteError::Io("upload path has no filename".to_string()))?
            .to_string();
        let bytes =
            fs::read(&upload.file_path).map_err(|err| RemoteError::Io(err.to_string()))?;
        let part = Part::bytes(bytes)
            .file_name(filename)
            .mime_str(&upload.content_type)
            .map_err(|_| {
                RemoteError::Io(format!("invalid content type: {}", upload.content_type))
            })?;
        let date_format = format_description!("[year]-[month]-[day]");
        let collected = upload
            .collected_date
            .format(&date_format)
            .map_err(|err| RemoteError::Io(err.to_string()))?;
        let form = Form::new()
            .part("file", part)
            .text("collected_date", collected)
            .text("content_type", upload.content_type.clone());
        let response = self
            .client
            .post(&upload.collector_url)
            .header(API_KEY_HEADER, api_key)
            .multipart(form)
            .send()
            .map_err(|err| self.classify_send_error(&err))?;
        let response = self.classify_status(response)?;
        // The collector is fire-and-forget; an empty or non-JSON body is a
        // valid acknowledgement.
        let ack = response.json::<SubmitAckDto>().unwrap_or_default();
        Ok(SubmitReceipt::from(ack))
    }
}
