//! Acting identity and clock, passed explicitly into service calls

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entry::UserRef;
use crate::error::{AuditLogError, Result};

/// Identity of the caller as established by the authentication layer.
///
/// `username` is `None` when no user is logged in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityContext {
    pub username: Option<String>,
    pub privileges: Vec<String>,
}

impl IdentityContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            privileges: Vec::new(),
        }
    }

    pub fn with_privilege(mut self, privilege: impl Into<String>) -> Self {
        self.privileges.push(privilege.into());
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.username.is_some()
    }

    pub fn has_privilege(&self, privilege: &str) -> bool {
        self.privileges.iter().any(|p| p == privilege)
    }

    pub fn user_ref(&self) -> Option<UserRef> {
        self.username.as_deref().map(UserRef::new)
    }

    /// Require an authenticated caller holding `privilege`.
    pub fn require_privilege(&self, privilege: &str) -> Result<()> {
        if !self.is_authenticated() {
            return Err(AuditLogError::NotAuthenticated);
        }
        if !self.has_privilege(privilege) {
            return Err(AuditLogError::InsufficientPrivilege(privilege.to_string()));
        }
        Ok(())
    }
}

/// Source of creation timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
