//! Audit log configuration
//!
//! Read once at startup and never mutated afterwards. Sources, lowest
//! precedence first: built-in defaults, an optional file, then `AUDITLOG_*`
//! environment variables (`__` separates nested keys, e.g.
//! `AUDITLOG_LOGGING__LEVEL=debug`, and `AUDITLOG_DEFAULT_MODULES` takes a
//! comma-separated list).

use std::path::Path;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::codec::{MessageCodec, DEFAULT_MESSAGE_DELIMITER};
use crate::error::{AuditLogError, Result};
use crate::temporal;

/// Number of entries returned per page.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Privilege required to read audit logs.
pub const DEFAULT_ADMIN_PRIVILEGE: &str = "app:admin";

pub const ENV_PREFIX: &str = "AUDITLOG";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditLogConfig {
    pub page_size: u32,
    /// Modules shown by the default view when no explicit filter is given.
    pub default_modules: Vec<String>,
    pub admin_privilege: String,
    pub message_delimiter: String,
    /// Offset, in minutes east of UTC, that storage compares timestamps in.
    pub storage_utc_offset_minutes: i32,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub ansi: bool,
}

impl Default for AuditLogConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            default_modules: vec![
                "registration".to_string(),
                "clinical".to_string(),
                "reports".to_string(),
            ],
            admin_privilege: DEFAULT_ADMIN_PRIVILEGE.to_string(),
            message_delimiter: DEFAULT_MESSAGE_DELIMITER.to_string(),
            storage_utc_offset_minutes: 0,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: true,
        }
    }
}

impl AuditLogConfig {
    /// Load configuration from defaults, an optional file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("default_modules")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(AuditLogError::Configuration(
                "page_size must be greater than zero".to_string(),
            ));
        }

        if self.message_delimiter.chars().count() != 1 {
            return Err(AuditLogError::Configuration(format!(
                "message_delimiter must be exactly one character, got '{}'",
                self.message_delimiter
            )));
        }

        if self.admin_privilege.trim().is_empty() {
            return Err(AuditLogError::Configuration(
                "admin_privilege must not be empty".to_string(),
            ));
        }

        temporal::storage_offset(self.storage_utc_offset_minutes)?;
        Ok(())
    }

    pub fn message_codec(&self) -> MessageCodec {
        let delimiter = self
            .message_delimiter
            .chars()
            .next()
            .unwrap_or(DEFAULT_MESSAGE_DELIMITER);
        MessageCodec::new(delimiter)
    }

    pub fn storage_offset(&self) -> Result<FixedOffset> {
        temporal::storage_offset(self.storage_utc_offset_minutes)
    }
}
