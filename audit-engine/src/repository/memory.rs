use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use super::{AuditLogRepository, CursorPosition, Direction, PageQuery};
use crate::entry::{AuditLogEntry, NewAuditLogEntry};
use crate::error::Result;

/// In-memory audit log repository for testing and development
///
/// Ids are assigned from 1 in insertion order.
pub struct InMemoryAuditLogRepository {
    entries: Arc<DashMap<i64, AuditLogEntry>>,
    next_id: AtomicI64,
}

impl InMemoryAuditLogRepository {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Store an entry with a caller-chosen id, e.g. to seed fixtures.
    pub fn insert(&self, entry: AuditLogEntry) {
        self.next_id
            .fetch_max(entry.audit_log_id.saturating_add(1), Ordering::SeqCst);
        self.entries.insert(entry.audit_log_id, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, audit_log_id: i64) -> Option<AuditLogEntry> {
        self.entries.get(&audit_log_id).map(|e| e.value().clone())
    }
}

impl Default for InMemoryAuditLogRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryAuditLogRepository {
    async fn save(&self, entry: NewAuditLogEntry) -> Result<AuditLogEntry> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let stored = AuditLogEntry::from_new(id, entry);
        self.entries.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_page(&self, query: &PageQuery) -> Result<Vec<AuditLogEntry>> {
        let mut matching: Vec<AuditLogEntry> = self
            .entries
            .iter()
            .filter(|entry| query.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        match query.direction {
            Direction::Forward => matching.sort_by_key(AuditLogEntry::sort_key),
            Direction::Backward => matching.sort_by_key(|e| std::cmp::Reverse(e.sort_key())),
        }
        matching.truncate(query.limit as usize);

        Ok(matching)
    }

    async fn cursor_position(&self, audit_log_id: i64) -> Result<Option<CursorPosition>> {
        Ok(self
            .entries
            .get(&audit_log_id)
            .map(|entry| CursorPosition::of(entry.value())))
    }
}
