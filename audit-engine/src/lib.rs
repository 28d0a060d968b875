//! Patient audit log engine for RustCare Engine
//!
//! Records audit events tied to patients and users, and reads them back in
//! cursor-paginated pages:
//! - Message encoding with optional named parameters (`message~{"k":"v"}`)
//! - UTC wire timestamps bridged into the storage comparison offset
//! - Cursor paging ordered by creation time, then id, in either direction
//! - Default-view narrowing to a configured module set
//! - Privilege-guarded retrieval mapped to a transport projection
//!
//! Storage, patient lookup, identity and the clock are collaborators injected
//! behind traits; in-memory and Postgres repositories are provided.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use audit_engine::{
//!     AuditLogConfig, AuditLogPayload, AuditLogQuery, AuditLogService, IdentityContext,
//!     InMemoryAuditLogRepository, InMemoryPatientDirectory, PatientRef, SystemClock,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let patients = InMemoryPatientDirectory::new();
//!     patients.register(PatientRef::new("patient-uuid", "GAN2000"));
//!
//!     let service = AuditLogService::new(
//!         Arc::new(InMemoryAuditLogRepository::new()),
//!         Arc::new(patients),
//!         Arc::new(SystemClock),
//!         &AuditLogConfig::default(),
//!     )?;
//!
//!     let admin = IdentityContext::authenticated("superman").with_privilege("app:admin");
//!     service
//!         .create_audit_log(
//!             &admin,
//!             AuditLogPayload::new(
//!                 Some("patient-uuid".into()),
//!                 "VIEWED_DASHBOARD",
//!                 "VIEWED_DASHBOARD",
//!                 "clinical",
//!             ),
//!         )
//!         .await?;
//!
//!     let logs = service.get_logs(&admin, AuditLogQuery::default()).await?;
//!     assert_eq!(logs.len(), 1);
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod entry;
pub mod error;
pub mod identity;
pub mod pagination;
pub mod patient;
pub mod query;
pub mod repository;
pub mod service;
pub mod telemetry;
pub mod temporal;

pub use codec::{MessageCodec, MessageParams};
pub use self::config::{AuditLogConfig, LoggingConfig};
pub use entry::*;
pub use error::*;
pub use identity::*;
pub use pagination::{FilterCriteria, Paginator};
pub use patient::{InMemoryPatientDirectory, PatientDirectory};
pub use query::{AuditLogPayload, AuditLogQuery};
pub use repository::{
    AuditLogRepository, CursorPosition, Direction, InMemoryAuditLogRepository, PageQuery,
    PgAuditLogRepository,
};
pub use service::AuditLogService;
pub use telemetry::init_tracing;
