// crates/harbormaster-engine/tests/common/mod.rs
// ============================================================================
// Module: Engine Test Fixtures
// Description: In-memory remote fake and entity builders for engine tests.
// Purpose: Exercise sync and submission without a network.
// Dependencies: harbormaster-core
// ============================================================================

//! ## Overview
//! [`FakeRemote`] implements the remote interface over in-memory fixtures:
//! configurable entities, attachment bodies, per-filename upload failures,
//! and a captured upload log. Builders produce minimal domain records.

#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Shared test fixtures; not every test uses every helper."
)]

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use harbormaster_core::Attachment;
use harbormaster_core::CancelToken;
use harbormaster_core::CollectionInterval;
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
use time::macros::datetime;

/// In-memory stand-in for the Tugboat platform.
#[derive(Default)]
pub struct FakeRemote {
    /// Policies served by list and detail calls.
    pub policies: Vec<Policy>,
    /// Controls served by list and detail calls.
    pub controls: Vec<Control>,
    /// Tasks served by list and detail calls.
    pub tasks: Vec<EvidenceTask>,
    /// Attachments per task id.
    pub attachments: BTreeMap<i64, Vec<Attachment>>,
    /// Attachment bodies per attachment id.
    pub bodies: BTreeMap<i64, Vec<u8>>,
    /// Filenames whose upload fails with a rejection.
    pub failing_uploads: BTreeSet<String>,
    /// When set, every call fails with an auth error.
    pub auth_broken: bool,
    /// Captured upload filenames, in call order.
    pub upload_log: Mutex<Vec<String>>,
    /// Cancel this token after N uploads (simulates mid-batch cancellation).
    pub cancel_after_uploads: Option<(usize, CancelToken)>,
}

impl FakeRemote {
    /// Returns the auth failure every call observes when broken.
    fn auth_check(&self) -> Result<(), RemoteError> {
        if self.auth_broken {
            Err(RemoteError::Auth("bad credentials".to_string()))
        } else {
            Ok(())
        }
    }
}

impl ComplianceRemote for FakeRemote {
    fn list_policies(
        &self,
        _scope: &RemoteScope,
        _cancel: &CancelToken,
    ) -> Result<Vec<PolicySummary>, RemoteError> {
        self.auth_check()?;
        Ok(self
            .policies
            .iter()
            .map(|p| PolicySummary {
                id: p.id.clone(),
                reference_id: p.reference_id.clone(),
                name: p.name.clone(),
            })
            .collect())
    }

    fn get_policy(&self, id: &str, _cancel: &CancelToken) -> Result<Policy, RemoteError> {
        self.auth_check()?;
        self.policies
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| RemoteError::Reject {
                status: 404,
                message: format!("policy {id}"),
            })
    }

    fn list_controls(
        &self,
        _scope: &RemoteScope,
        _cancel: &CancelToken,
    ) -> Result<Vec<ControlSummary>, RemoteError> {
        self.auth_check()?;
        Ok(self
            .controls
            .iter()
            .map(|c| ControlSummary {
                id: c.id,
                reference_id: c.reference_id.clone(),
                name: c.name.clone(),
            })
            .collect())
    }

    fn get_control(&self, id: i64, _cancel: &CancelToken) -> Result<Control, RemoteError> {
        self.auth_check()?;
        self.controls.iter().find(|c| c.id == id).cloned().ok_or_else(|| {
            RemoteError::Reject {
                status: 404,
                message: format!("control {id}"),
            }
        })
    }

    fn list_evidence_tasks(
        &self,
        _scope: &RemoteScope,
        _cancel: &CancelToken,
    ) -> Result<Vec<TaskSummary>, RemoteError> {
        self.auth_check()?;
        Ok(self
            .tasks
            .iter()
            .map(|t| TaskSummary {
                id: t.id,
                reference_id: t.reference_id.clone(),
                name: t.name.clone(),
            })
            .collect())
    }

    fn get_evidence_task(
        &self,
        id: i64,
        _cancel: &CancelToken,
    ) -> Result<EvidenceTask, RemoteError> {
        self.auth_check()?;
        self.tasks.iter().find(|t| t.id == id).cloned().ok_or_else(|| {
            RemoteError::Reject {
                status: 404,
                message: format!("task {id}"),
            }
        })
    }

    fn list_attachments(
        &self,
        task_id: i64,
        _cancel: &CancelToken,
    ) -> Result<Vec<Attachment>, RemoteError> {
        self.auth_check()?;
        Ok(self.attachments.get(&task_id).cloned().unwrap_or_default())
    }

    fn download_attachment(
        &self,
        attachment: &Attachment,
        dest: &Path,
        _cancel: &CancelToken,
    ) -> Result<u64, RemoteError> {
        self.auth_check()?;
        let body = self
            .bodies
            .get(&attachment.id)
            .cloned()
            .unwrap_or_else(|| b"fixture-bytes".to_vec());
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|err| RemoteError::Io(err.to_string()))?;
        }
        fs::write(dest, &body).map_err(|err| RemoteError::Io(err.to_string()))?;
        Ok(u64::try_from(body.len()).unwrap())
    }

    fn submit_evidence(
        &self,
        upload: &SubmitUpload,
        _cancel: &CancelToken,
    ) -> Result<SubmitReceipt, RemoteError> {
        self.auth_check()?;
        let filename = upload
            .file_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("")
            .to_string();
        if self.failing_uploads.contains(&filename) {
            return Err(RemoteError::Reject {
                status: 422,
                message: format!("rejected {filename}"),
            });
        }
        let mut log = self.upload_log.lock().unwrap();
        log.push(filename);
        if let Some((limit, token)) = &self.cancel_after_uploads {
            if log.len() >= *limit {
                token.cancel();
            }
        }
        Ok(SubmitReceipt {
            received_at: Some(datetime!(2025-11-01 12:00 UTC)),
            status: "received".to_string(),
            message: String::new(),
        })
    }
}

// ============================================================================
// SECTION: Entity Builders
// ============================================================================

/// Builds a minimal policy.
pub fn policy(id: &str, reference: &str, name: &str) -> Policy {
    Policy {
        id: id.to_string(),
        reference_id: reference.to_string(),
        reference_recognized: true,
        name: name.to_string(),
        content: "Policy body.".to_string(),
        framework: "SOC2".to_string(),
        version: "1.0".to_string(),
        status: "approved".to_string(),
        created_at: None,
        updated_at: None,
    }
}

/// Builds a minimal control.
pub fn control(id: i64, reference: &str, name: &str) -> Control {
    Control {
        id,
        reference_id: reference.to_string(),
        reference_recognized: true,
        name: name.to_string(),
        description: String::new(),
        framework: "SOC2".to_string(),
        category: "access".to_string(),
        status: "implemented".to_string(),
        framework_codes: Vec::new(),
        implemented_date: None,
        tested_date: None,
    }
}

/// Builds a minimal evidence task.
pub fn task(id: i64, reference: &str, name: &str) -> EvidenceTask {
    EvidenceTask {
        id,
        reference_id: reference.to_string(),
        reference_recognized: true,
        name: name.to_string(),
        description: "Collect quarterly evidence.".to_string(),
        guidance: "Export and attach.".to_string(),
        framework: "SOC2".to_string(),
        priority: "high".to_string(),
        status: "open".to_string(),
        completed: false,
        controls: BTreeSet::new(),
        policies: BTreeSet::new(),
        collection_interval: CollectionInterval::Quarterly,
        next_due: None,
        sensitive: false,
        aec_status: None,
        related_controls: Vec::new(),
    }
}
