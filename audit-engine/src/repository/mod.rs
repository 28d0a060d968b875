//! Storage boundary for audit entries
//!
//! The pagination engine shapes a [`PageQuery`]; implementations run it and
//! return entries already ordered by `(date_created, audit_log_id)` in the
//! query's direction, at most `limit` of them.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryAuditLogRepository;
pub use postgres::PgAuditLogRepository;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::entry::{AuditLogEntry, NewAuditLogEntry};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Ascending by time, then id.
    #[default]
    Forward,
    /// Descending by time, then id.
    Backward,
}

impl Direction {
    pub fn from_prev(prev: bool) -> Self {
        if prev {
            Self::Backward
        } else {
            Self::Forward
        }
    }
}

/// Ordering position of a stored entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CursorPosition {
    pub date_created: DateTime<Utc>,
    pub audit_log_id: i64,
}

impl CursorPosition {
    pub fn of(entry: &AuditLogEntry) -> Self {
        Self {
            date_created: entry.date_created,
            audit_log_id: entry.audit_log_id,
        }
    }

    /// Whether `entry` lies strictly past this position in `direction`.
    pub fn admits(&self, entry: &AuditLogEntry, direction: Direction) -> bool {
        let key = (entry.date_created, entry.audit_log_id);
        let own = (self.date_created, self.audit_log_id);
        match direction {
            Direction::Forward => key > own,
            Direction::Backward => key < own,
        }
    }
}

/// Structured filter handed to the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub username: Option<String>,
    pub patient_identifier: Option<String>,
    /// Inclusive lower bound on `date_created`.
    pub start_from: Option<DateTime<FixedOffset>>,
    /// Results lie strictly past this position in `direction`.
    pub cursor: Option<CursorPosition>,
    pub direction: Direction,
    /// Restrict to these modules when set.
    pub modules: Option<Vec<String>>,
    pub limit: u32,
}

impl PageQuery {
    pub fn new(direction: Direction, limit: u32) -> Self {
        Self {
            username: None,
            patient_identifier: None,
            start_from: None,
            cursor: None,
            direction,
            modules: None,
            limit,
        }
    }

    /// Whether an entry satisfies every filter of this query (ignoring limit).
    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        if let Some(ref username) = self.username {
            if entry.user.as_ref().map(|u| &u.username) != Some(username) {
                return false;
            }
        }

        if let Some(ref identifier) = self.patient_identifier {
            if entry.patient.as_ref().map(|p| &p.identifier) != Some(identifier) {
                return false;
            }
        }

        if let Some(start_from) = self.start_from {
            if entry.date_created < start_from {
                return false;
            }
        }

        if let Some(ref cursor) = self.cursor {
            if !cursor.admits(entry, self.direction) {
                return false;
            }
        }

        if let Some(ref modules) = self.modules {
            if !modules.iter().any(|m| *m == entry.module) {
                return false;
            }
        }

        true
    }
}

/// Persistence collaborator for audit entries
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Persist a new entry and return it with its storage-assigned id.
    async fn save(&self, entry: NewAuditLogEntry) -> Result<AuditLogEntry>;

    /// Run a page query.
    async fn find_page(&self, query: &PageQuery) -> Result<Vec<AuditLogEntry>>;

    /// Resolve an entry id to its ordering position.
    async fn cursor_position(&self, audit_log_id: i64) -> Result<Option<CursorPosition>>;
}
