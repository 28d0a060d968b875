// Audit entry types and structures
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::temporal;

/// Weak reference to the patient an entry is about.
///
/// Holds identifiers only; the clinical record stays owned by the patient
/// directory. `identifier` is the display identifier (e.g. `GAN2000`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRef {
    pub uuid: String,
    pub identifier: String,
}

impl PatientRef {
    pub fn new(uuid: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            identifier: identifier.into(),
        }
    }
}

/// Weak reference to the acting user, by username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub username: String,
}

impl UserRef {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

/// An entry ready to be persisted. Storage assigns `audit_log_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditLogEntry {
    pub uuid: Uuid,
    pub date_created: DateTime<Utc>,
    pub event_type: String,
    pub module: String,
    pub message: String,
    pub patient: Option<PatientRef>,
    pub user: Option<UserRef>,
}

/// A persisted audit entry. Never updated once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub audit_log_id: i64,
    pub uuid: Uuid,
    pub date_created: DateTime<Utc>,
    pub event_type: String,
    pub module: String,
    pub message: String,
    pub patient: Option<PatientRef>,
    pub user: Option<UserRef>,
}

impl AuditLogEntry {
    pub fn from_new(audit_log_id: i64, entry: NewAuditLogEntry) -> Self {
        Self {
            audit_log_id,
            uuid: entry.uuid,
            date_created: entry.date_created,
            event_type: entry.event_type,
            module: entry.module,
            message: entry.message,
            patient: entry.patient,
            user: entry.user,
        }
    }

    /// Ordering position of this entry: creation time, then id.
    pub fn sort_key(&self) -> (DateTime<Utc>, i64) {
        (self.date_created, self.audit_log_id)
    }
}

/// Transport view of a stored entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogProjection {
    pub message: String,
    pub patient_id: Option<String>,
    pub user_id: Option<String>,
    pub event_type: String,
    #[serde(serialize_with = "temporal::serialize_utc")]
    pub date_created: DateTime<Utc>,
    pub audit_log_id: i64,
    pub module: String,
}

impl From<AuditLogEntry> for AuditLogProjection {
    // Field reads only; no lookups per row.
    fn from(entry: AuditLogEntry) -> Self {
        Self {
            message: entry.message,
            patient_id: entry.patient.map(|p| p.identifier),
            user_id: entry.user.map(|u| u.username),
            event_type: entry.event_type,
            date_created: entry.date_created,
            audit_log_id: entry.audit_log_id,
            module: entry.module,
        }
    }
}
