use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use super::{AuditLogRepository, CursorPosition, Direction, PageQuery};
use crate::entry::{AuditLogEntry, NewAuditLogEntry, PatientRef, UserRef};
use crate::error::Result;

const SELECT_COLUMNS: &str = "SELECT audit_log_id, uuid, date_created, event_type, module, \
     message, patient_uuid, patient_identifier, username FROM audit_log";

#[derive(Debug, FromRow)]
struct AuditLogRow {
    audit_log_id: i64,
    uuid: Uuid,
    date_created: DateTime<Utc>,
    event_type: String,
    module: String,
    message: String,
    patient_uuid: Option<String>,
    patient_identifier: Option<String>,
    username: Option<String>,
}

impl From<AuditLogRow> for AuditLogEntry {
    fn from(row: AuditLogRow) -> Self {
        let patient = match (row.patient_uuid, row.patient_identifier) {
            (Some(uuid), Some(identifier)) => Some(PatientRef { uuid, identifier }),
            (Some(uuid), None) => Some(PatientRef { uuid, identifier: String::new() }),
            _ => None,
        };

        Self {
            audit_log_id: row.audit_log_id,
            uuid: row.uuid,
            date_created: row.date_created,
            event_type: row.event_type,
            module: row.module,
            message: row.message,
            patient,
            user: row.username.map(|username| UserRef { username }),
        }
    }
}

/// Postgres-backed audit log repository
///
/// Expects the `audit_log` table from `migrations/`.
#[derive(Clone)]
pub struct PgAuditLogRepository {
    pool: PgPool,
}

impl PgAuditLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn build_page_query(query: &PageQuery) -> QueryBuilder<'_, Postgres> {
        let mut builder = QueryBuilder::<Postgres>::new(SELECT_COLUMNS);
        builder.push(" WHERE 1=1");

        if let Some(ref username) = query.username {
            builder.push(" AND username = ");
            builder.push_bind(username);
        }

        if let Some(ref identifier) = query.patient_identifier {
            builder.push(" AND patient_identifier = ");
            builder.push_bind(identifier);
        }

        if let Some(start_from) = query.start_from {
            builder.push(" AND date_created >= ");
            builder.push_bind(start_from);
        }

        if let Some(ref modules) = query.modules {
            builder.push(" AND module = ANY(");
            builder.push_bind(modules);
            builder.push(")");
        }

        if let Some(cursor) = query.cursor {
            let comparison = match query.direction {
                Direction::Forward => " > ",
                Direction::Backward => " < ",
            };
            builder.push(" AND (date_created, audit_log_id)");
            builder.push(comparison);
            builder.push("(");
            builder.push_bind(cursor.date_created);
            builder.push(", ");
            builder.push_bind(cursor.audit_log_id);
            builder.push(")");
        }

        match query.direction {
            Direction::Forward => builder.push(" ORDER BY date_created ASC, audit_log_id ASC"),
            Direction::Backward => builder.push(" ORDER BY date_created DESC, audit_log_id DESC"),
        };
        builder.push(" LIMIT ");
        builder.push_bind(i64::from(query.limit));

        builder
    }
}

#[async_trait]
impl AuditLogRepository for PgAuditLogRepository {
    async fn save(&self, entry: NewAuditLogEntry) -> Result<AuditLogEntry> {
        let audit_log_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO audit_log (
                uuid, date_created, event_type, module, message,
                patient_uuid, patient_identifier, username
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING audit_log_id
            "#,
        )
        .bind(entry.uuid)
        .bind(entry.date_created)
        .bind(&entry.event_type)
        .bind(&entry.module)
        .bind(&entry.message)
        .bind(entry.patient.as_ref().map(|p| p.uuid.as_str()))
        .bind(entry.patient.as_ref().map(|p| p.identifier.as_str()))
        .bind(entry.user.as_ref().map(|u| u.username.as_str()))
        .fetch_one(&self.pool)
        .await?;

        Ok(AuditLogEntry::from_new(audit_log_id, entry))
    }

    async fn find_page(&self, query: &PageQuery) -> Result<Vec<AuditLogEntry>> {
        let mut builder = Self::build_page_query(query);
        debug!(sql = builder.sql(), "Running audit log page query");

        let rows = builder
            .build_query_as::<AuditLogRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(AuditLogEntry::from).collect())
    }

    async fn cursor_position(&self, audit_log_id: i64) -> Result<Option<CursorPosition>> {
        let row: Option<(DateTime<Utc>,)> = sqlx::query_as(
            "SELECT date_created FROM audit_log WHERE audit_log_id = $1",
        )
        .bind(audit_log_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(date_created,)| CursorPosition {
            date_created,
            audit_log_id,
        }))
    }
}
