//! Wire shapes of the query and creation endpoints

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::pagination::FilterCriteria;
use crate::temporal;

/// Query string of the audit log read endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogQuery {
    pub username: Option<String>,
    pub patient_id: Option<String>,
    /// UTC wire timestamp, e.g. `2017-03-15T16:57:09.0Z`.
    pub start_from: Option<String>,
    pub last_audit_log_id: Option<i64>,
    #[serde(default)]
    pub prev: bool,
    #[serde(default)]
    pub default_view: bool,
}

impl AuditLogQuery {
    /// Parse into retrieval criteria. Blank text filters count as absent.
    pub fn into_criteria(self) -> Result<FilterCriteria> {
        let start_from = temporal::parse_optional_utc(self.start_from.as_deref())?;

        Ok(FilterCriteria {
            username: non_blank(self.username),
            patient_id: non_blank(self.patient_id),
            start_from,
            last_audit_log_id: self.last_audit_log_id,
            prev: self.prev,
            default_view: self.default_view,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Body of the audit log creation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogPayload {
    pub patient_uuid: Option<String>,
    pub message: String,
    pub event_type: String,
    pub module: String,
}

impl AuditLogPayload {
    pub fn new(
        patient_uuid: Option<String>,
        message: impl Into<String>,
        event_type: impl Into<String>,
        module: impl Into<String>,
    ) -> Self {
        Self {
            patient_uuid,
            message: message.into(),
            event_type: event_type.into(),
            module: module.into(),
        }
    }
}
