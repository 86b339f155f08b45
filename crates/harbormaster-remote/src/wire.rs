// crates/harbormaster-remote/src/wire.rs
// ============================================================================
// Module: Tugboat Wire Types
// Description: Remote JSON payload shapes and pure domain adapters.
// Purpose: Keep wire tolerance separate from the domain model.
// Dependencies: harbormaster-core, serde, time
// ============================================================================

//! ## Overview
//! Wire DTOs mirror the platform's JSON with every optional field defaulted,
//! so partial payloads decode instead of failing the sync. Adapters are pure
//! functions from DTO to domain record; reference normalization happens in
//! the sync engine, which owns the registry.

// ============================================================================
// SECTION: Imports
// ============================================================================

use harbormaster_core::AecStatus;
use harbormaster_core::Attachment;
use harbormaster_core::AttachmentKind;
use harbormaster_core::CollectionInterval;
use harbormaster_core::Control;
use harbormaster_core::ControlSummary;
use harbormaster_core::EvidenceTask;
use harbormaster_core::FrameworkCode;
use harbormaster_core::Policy;
use harbormaster_core::PolicySummary;
use harbormaster_core::SubmitReceipt;
use harbormaster_core::TaskSummary;
use serde::Deserialize;
use time::Date;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

// ============================================================================
// SECTION: Timestamp Parsing
// ============================================================================

/// Parses an RFC 3339 timestamp, tolerating absence and malformation.
#[must_use]
pub fn parse_timestamp(raw: Option<&str>) -> Option<OffsetDateTime> {
    raw.and_then(|value| OffsetDateTime::parse(value, &Rfc3339).ok())
}

/// Parses a `YYYY-MM-DD` date, tolerating absence and malformation.
#[must_use]
pub fn parse_date(raw: Option<&str>) -> Option<Date> {
    let format = format_description!("[year]-[month]-[day]");
    raw.and_then(|value| Date::parse(value, &format).ok())
}

// ============================================================================
// SECTION: Summary DTOs
// ============================================================================

/// Policy list entry as received on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicySummaryDto {
    /// Stable opaque remote identifier.
    pub id: String,
    /// Raw reference identifier.
    #[serde(default)]
    pub reference_id: String,
    /// Policy name.
    #[serde(default)]
    pub name: String,
}

impl From<PolicySummaryDto> for PolicySummary {
    fn from(dto: PolicySummaryDto) -> Self {
        Self {
            id: dto.id,
            reference_id: dto.reference_id,
            name: dto.name,
        }
    }
}

/// Control list entry as received on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct ControlSummaryDto {
    /// Stable remote identifier.
    pub id: i64,
    /// Raw reference identifier.
    #[serde(default)]
    pub reference_id: String,
    /// Control name.
    #[serde(default)]
    pub name: String,
}

impl From<ControlSummaryDto> for ControlSummary {
    fn from(dto: ControlSummaryDto) -> Self {
        Self {
            id: dto.id,
            reference_id: dto.reference_id,
            name: dto.name,
        }
    }
}

/// Evidence-task list entry as received on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskSummaryDto {
    /// Stable remote identifier.
    pub id: i64,
    /// Raw reference identifier.
    #[serde(default)]
    pub reference_id: String,
    /// Task name.
    #[serde(default)]
    pub name: String,
}

impl From<TaskSummaryDto> for TaskSummary {
    fn from(dto: TaskSummaryDto) -> Self {
        Self {
            id: dto.id,
            reference_id: dto.reference_id,
            name: dto.name,
        }
    }
}

// ============================================================================
// SECTION: Detail DTOs
// ============================================================================

/// Policy detail payload as received on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyDto {
    /// Stable opaque remote identifier.
    pub id: String,
    /// Raw reference identifier.
    #[serde(default)]
    pub reference_id: String,
    /// Policy name.
    #[serde(default)]
    pub name: String,
    /// Policy content.
    #[serde(default)]
    pub content: String,
    /// Framework label.
    #[serde(default)]
    pub framework: String,
    /// Version label.
    #[serde(default)]
    pub version: String,
    /// Status label.
    #[serde(default)]
    pub status: String,
    /// Creation timestamp (RFC 3339).
    #[serde(default)]
    pub created_at: Option<String>,
    /// Update timestamp (RFC 3339).
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Converts a policy payload into the domain record.
#[must_use]
pub fn policy_from_wire(dto: PolicyDto) -> Policy {
    Policy {
        id: dto.id,
        reference_id: dto.reference_id,
        reference_recognized: true,
        name: dto.name,
        content: dto.content,
        framework: dto.framework,
        version: dto.version,
        status: dto.status,
        created_at: parse_timestamp(dto.created_at.as_deref()),
        updated_at: parse_timestamp(dto.updated_at.as_deref()),
    }
}

/// Framework code payload as received on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct FrameworkCodeDto {
    /// Code within the framework.
    #[serde(default)]
    pub code: String,
    /// Framework the code belongs to.
    #[serde(default)]
    pub framework: String,
}

/// Control detail payload as received on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct ControlDto {
    /// Stable remote identifier.
    pub id: i64,
    /// Raw reference identifier.
    #[serde(default)]
    pub reference_id: String,
    /// Control name.
    #[serde(default)]
    pub name: String,
    /// Control description.
    #[serde(default)]
    pub description: String,
    /// Framework label.
    #[serde(default)]
    pub framework: String,
    /// Category label.
    #[serde(default)]
    pub category: String,
    /// Status label.
    #[serde(default)]
    pub status: String,
    /// Framework codes in remote order.
    #[serde(default)]
    pub framework_codes: Vec<FrameworkCodeDto>,
    /// Implementation date (`YYYY-MM-DD`).
    #[serde(default)]
    pub implemented_date: Option<String>,
    /// Last test date (`YYYY-MM-DD`).
    #[serde(default)]
    pub tested_date: Option<String>,
}

/// Converts a control payload into the domain record.
#[must_use]
pub fn control_from_wire(dto: ControlDto) -> Control {
    Control {
        id: dto.id,
        reference_id: dto.reference_id,
        reference_recognized: true,
        name: dto.name,
        description: dto.description,
        framework: dto.framework,
        category: dto.category,
        status: dto.status,
        framework_codes: dto
            .framework_codes
            .into_iter()
            .map(|code| FrameworkCode {
                code: code.code,
                framework: code.framework,
            })
            .collect(),
        implemented_date: parse_date(dto.implemented_date.as_deref()),
        tested_date: parse_date(dto.tested_date.as_deref()),
    }
}

/// AEC status payload as received on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct AecStatusDto {
    /// Remote AEC status label.
    #[serde(default)]
    pub status: String,
    /// Last execution timestamp (RFC 3339).
    #[serde(default)]
    pub last_executed: Option<String>,
    /// Next scheduled timestamp (RFC 3339).
    #[serde(default)]
    pub next_scheduled: Option<String>,
}

/// Evidence-task detail payload as received on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct EvidenceTaskDto {
    /// Stable remote identifier.
    pub id: i64,
    /// Raw reference identifier.
    #[serde(default)]
    pub reference_id: String,
    /// Task name.
    #[serde(default)]
    pub name: String,
    /// Task description.
    #[serde(default)]
    pub description: String,
    /// Collection guidance.
    #[serde(default)]
    pub guidance: String,
    /// Framework label.
    #[serde(default)]
    pub framework: String,
    /// Priority label.
    #[serde(default)]
    pub priority: String,
    /// Status label.
    #[serde(default)]
    pub status: String,
    /// Remote completion flag.
    #[serde(default)]
    pub completed: bool,
    /// Raw control references.
    #[serde(default)]
    pub controls: Vec<String>,
    /// Raw policy identifiers.
    #[serde(default)]
    pub policies: Vec<String>,
    /// Collection cadence label.
    #[serde(default)]
    pub collection_interval: Option<String>,
    /// Next due timestamp (RFC 3339).
    #[serde(default)]
    pub next_due: Option<String>,
    /// Sensitivity flag.
    #[serde(default)]
    pub sensitive: bool,
    /// AEC status payload.
    #[serde(default)]
    pub aec_status: Option<AecStatusDto>,
    /// Embedded related control payloads, in remote order.
    #[serde(default)]
    pub related_controls: Vec<ControlDto>,
}

/// Converts a collection-interval label, defaulting to quarterly.
#[must_use]
pub fn interval_from_wire(raw: Option<&str>) -> CollectionInterval {
    match raw.map(str::trim).map(str::to_ascii_lowercase).as_deref() {
        Some("annual" | "annually" | "yearly") => CollectionInterval::Annual,
        Some("monthly") => CollectionInterval::Monthly,
        Some("semi_annual" | "semi-annual" | "semiannual") => CollectionInterval::SemiAnnual,
        _ => CollectionInterval::Quarterly,
    }
}

/// Converts an evidence-task payload into the domain record.
#[must_use]
pub fn task_from_wire(dto: EvidenceTaskDto) -> EvidenceTask {
    EvidenceTask {
        id: dto.id,
        reference_id: dto.reference_id,
        reference_recognized: true,
        name: dto.name,
        description: dto.description,
        guidance: dto.guidance,
        framework: dto.framework,
        priority: dto.priority,
        status: dto.status,
        completed: dto.completed,
        controls: dto.controls.into_iter().collect(),
        policies: dto.policies.into_iter().collect(),
        collection_interval: interval_from_wire(dto.collection_interval.as_deref()),
        next_due: parse_timestamp(dto.next_due.as_deref()),
        sensitive: dto.sensitive,
        aec_status: dto.aec_status.map(|aec| AecStatus {
            status: aec.status,
            last_executed: parse_timestamp(aec.last_executed.as_deref()),
            next_scheduled: parse_timestamp(aec.next_scheduled.as_deref()),
        }),
        related_controls: dto.related_controls.into_iter().map(control_from_wire).collect(),
    }
}

// ============================================================================
// SECTION: Attachment DTOs
// ============================================================================

/// Attachment payload as received on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentDto {
    /// Stable remote identifier.
    pub id: i64,
    /// Owning task identifier.
    #[serde(default)]
    pub task_id: i64,
    /// Attachment type label (`file`, `url`, or other).
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Original filename.
    #[serde(default)]
    pub filename: Option<String>,
    /// Referenced URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Free-form notes.
    #[serde(default)]
    pub notes: String,
    /// Collection date (`YYYY-MM-DD`).
    #[serde(default)]
    pub collected_date: Option<String>,
}

/// Converts an attachment payload.
///
/// A missing or unparseable collection date becomes `None`; the sync engine
/// decides how an undatable attachment is accounted for.
#[must_use]
pub fn attachment_from_wire(dto: AttachmentDto) -> Attachment {
    let kind = match dto.kind.as_str() {
        "file" => AttachmentKind::File,
        "url" => AttachmentKind::Url,
        other => AttachmentKind::Other(other.to_string()),
    };
    Attachment {
        id: dto.id,
        task_id: dto.task_id,
        kind,
        filename: dto.filename,
        url: dto.url,
        notes: dto.notes,
        collected_date: parse_date(dto.collected_date.as_deref()),
    }
}

// ============================================================================
// SECTION: Upload Acknowledgement
// ============================================================================

/// Collector acknowledgement payload as received on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitAckDto {
    /// Receipt timestamp (RFC 3339).
    #[serde(default)]
    pub received_at: Option<String>,
    /// Acknowledgement status label.
    #[serde(default)]
    pub status: String,
    /// Acknowledgement message.
    #[serde(default)]
    pub message: String,
}

impl From<SubmitAckDto> for SubmitReceipt {
    fn from(dto: SubmitAckDto) -> Self {
        Self {
            received_at: parse_timestamp(dto.received_at.as_deref()),
            status: dto.status,
            message: dto.message,
        }
    }
}

#[cfg(test)]
mod tests;
