//! Cursor-based paging over audit entries
//!
//! Pages are ordered by `(date_created, audit_log_id)`: ascending when paging
//! forward, descending when paging back (`prev`). A cursor id resolves to the
//! position of that entry, and a page holds only entries strictly past it.
//! Without a cursor, backward paging starts at the most recent entry and
//! forward paging starts at `start_from` (or the oldest entry).
//!
//! The engine shapes the repository query, including the default-view module
//! narrowing, so page sizes stay meaningful. It performs no I/O of its own.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AuditLogConfig;
use crate::entry::AuditLogEntry;
use crate::error::Result;
use crate::repository::{AuditLogRepository, CursorPosition, Direction, PageQuery};
use crate::temporal;

/// Request-scoped retrieval filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub username: Option<String>,
    /// Patient display identifier.
    pub patient_id: Option<String>,
    pub start_from: Option<DateTime<Utc>>,
    /// Id of the last entry the caller saw. An id absent from storage yields
    /// an empty page rather than an error.
    pub last_audit_log_id: Option<i64>,
    pub prev: bool,
    pub default_view: bool,
}

impl FilterCriteria {
    pub fn direction(&self) -> Direction {
        Direction::from_prev(self.prev)
    }

    /// Default view applies only when no explicit filter was supplied.
    pub fn uses_default_modules(&self) -> bool {
        self.default_view
            && self.username.is_none()
            && self.patient_id.is_none()
            && self.start_from.is_none()
    }
}

pub struct Paginator {
    repository: Arc<dyn AuditLogRepository>,
    page_size: u32,
    default_modules: Vec<String>,
    storage_offset: FixedOffset,
}

impl Paginator {
    pub fn new(
        repository: Arc<dyn AuditLogRepository>,
        page_size: u32,
        default_modules: Vec<String>,
        storage_offset: FixedOffset,
    ) -> Self {
        Self {
            repository,
            page_size,
            default_modules,
            storage_offset,
        }
    }

    pub fn from_config(
        repository: Arc<dyn AuditLogRepository>,
        config: &AuditLogConfig,
    ) -> Result<Self> {
        Ok(Self::new(
            repository,
            config.page_size,
            config.default_modules.clone(),
            config.storage_offset()?,
        ))
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Translate criteria into a repository query. `cursor` is the resolved
    /// position of `criteria.last_audit_log_id`, if any.
    pub fn build_query(
        &self,
        criteria: &FilterCriteria,
        cursor: Option<CursorPosition>,
    ) -> PageQuery {
        let mut query = PageQuery::new(criteria.direction(), self.page_size);
        query.username = criteria.username.clone();
        query.patient_identifier = criteria.patient_id.clone();
        query.start_from = criteria
            .start_from
            .map(|start| temporal::to_local(start, self.storage_offset));
        query.cursor = cursor;

        if criteria.uses_default_modules() {
            query.modules = Some(self.default_modules.clone());
        }

        query
    }

    /// Fetch the page described by `criteria`.
    ///
    /// An unknown cursor id yields an empty page.
    pub async fn page(&self, criteria: &FilterCriteria) -> Result<Vec<AuditLogEntry>> {
        let cursor = match criteria.last_audit_log_id {
            Some(id) => match self.repository.cursor_position(id).await? {
                Some(position) => Some(position),
                None => {
                    debug!(
                        last_audit_log_id = id,
                        "Unknown audit log cursor, returning empty page"
                    );
                    return Ok(Vec::new());
                }
            },
            None => None,
        };

        let query = self.build_query(criteria, cursor);
        let mut entries = self.repository.find_page(&query).await?;
        enforce_ordering(&mut entries, &query);

        debug!(
            direction = ?query.direction,
            default_view = query.modules.is_some(),
            returned = entries.len(),
            "Fetched audit log page"
        );

        Ok(entries)
    }
}

/// Hold the adapter to the ordering contract: sorted in `query.direction`,
/// nothing at or behind the cursor, no duplicate ids, at most `limit` rows.
fn enforce_ordering(entries: &mut Vec<AuditLogEntry>, query: &PageQuery) {
    if let Some(cursor) = query.cursor {
        entries.retain(|entry| cursor.admits(entry, query.direction));
    }

    match query.direction {
        Direction::Forward => entries.sort_by_key(AuditLogEntry::sort_key),
        Direction::Backward => entries.sort_by_key(|e| std::cmp::Reverse(e.sort_key())),
    }
    entries.dedup_by_key(|e| e.audit_log_id);
    entries.truncate(query.limit as usize);
}
