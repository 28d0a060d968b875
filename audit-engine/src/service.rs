//! Audit log service
//!
//! Orchestrates retrieval (privilege check, criteria parsing, paging and
//! projection) and creation (patient resolution, identity and clock stamping,
//! message encoding and persistence). Every collaborator is injected; the
//! service holds no mutable state between requests.

use std::sync::Arc;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::codec::{MessageCodec, MessageParams};
use crate::config::AuditLogConfig;
use crate::entry::{AuditLogProjection, NewAuditLogEntry, PatientRef};
use crate::error::{AuditLogError, Result};
use crate::identity::{Clock, IdentityContext};
use crate::pagination::{FilterCriteria, Paginator};
use crate::patient::PatientDirectory;
use crate::query::{AuditLogPayload, AuditLogQuery};
use crate::repository::AuditLogRepository;

pub struct AuditLogService {
    repository: Arc<dyn AuditLogRepository>,
    patients: Arc<dyn PatientDirectory>,
    clock: Arc<dyn Clock>,
    paginator: Paginator,
    codec: MessageCodec,
    admin_privilege: String,
}

impl AuditLogService {
    pub fn new(
        repository: Arc<dyn AuditLogRepository>,
        patients: Arc<dyn PatientDirectory>,
        clock: Arc<dyn Clock>,
        config: &AuditLogConfig,
    ) -> Result<Self> {
        config.validate()?;
        let paginator = Paginator::from_config(repository.clone(), config)?;

        Ok(Self {
            repository,
            patients,
            clock,
            paginator,
            codec: config.message_codec(),
            admin_privilege: config.admin_privilege.clone(),
        })
    }

    /// Read endpoint: one page of audit log projections.
    ///
    /// The caller must be authenticated and hold the admin privilege; both are
    /// checked before the query is parsed or any collaborator is called.
    #[instrument(
        skip(self, identity, query),
        fields(prev = query.prev, default_view = query.default_view)
    )]
    pub async fn get_logs(
        &self,
        identity: &IdentityContext,
        query: AuditLogQuery,
    ) -> Result<Vec<AuditLogProjection>> {
        identity.require_privilege(&self.admin_privilege)?;
        let criteria = query.into_criteria()?;
        self.find_logs(&criteria).await
    }

    /// Page and project without an access check, for callers that have
    /// already authorised the request.
    pub async fn find_logs(&self, criteria: &FilterCriteria) -> Result<Vec<AuditLogProjection>> {
        let entries = self.paginator.page(criteria).await?;
        Ok(entries.into_iter().map(AuditLogProjection::from).collect())
    }

    /// Creation endpoint: store the payload message verbatim.
    #[instrument(
        skip(self, identity, payload),
        fields(module = %payload.module, event_type = %payload.event_type)
    )]
    pub async fn create_audit_log(
        &self,
        identity: &IdentityContext,
        payload: AuditLogPayload,
    ) -> Result<()> {
        let patient = self.resolve_patient(payload.patient_uuid.as_deref()).await?;
        self.persist(identity, patient, payload.event_type, payload.module, payload.message)
            .await
    }

    /// Store `message` with `params` encoded after the delimiter. Empty
    /// `params` store the message unchanged.
    #[instrument(skip(self, identity, message, params))]
    pub async fn create_audit_log_with_params(
        &self,
        identity: &IdentityContext,
        patient_uuid: Option<&str>,
        event_type: &str,
        message: &str,
        params: &MessageParams,
        module: &str,
    ) -> Result<()> {
        let stored_message = self.codec.encode(message, params)?;
        let patient = self.resolve_patient(patient_uuid).await?;
        self.persist(
            identity,
            patient,
            event_type.to_string(),
            module.to_string(),
            stored_message,
        )
        .await
    }

    pub fn codec(&self) -> &MessageCodec {
        &self.codec
    }

    async fn resolve_patient(&self, patient_uuid: Option<&str>) -> Result<Option<PatientRef>> {
        let Some(uuid) = patient_uuid else {
            return Ok(None);
        };

        let found = self
            .patients
            .find_by_uuid(uuid)
            .await
            .map_err(|err| match err {
                err @ AuditLogError::PatientLookupFailure(_) => err,
                other => AuditLogError::PatientLookupFailure(other.into()),
            })?;

        match found {
            Some(patient) => Ok(Some(patient)),
            None => {
                debug!(patient_uuid = %uuid, "Patient not found for audit log");
                Err(AuditLogError::PatientNotFound(uuid.to_string()))
            }
        }
    }

    async fn persist(
        &self,
        identity: &IdentityContext,
        patient: Option<PatientRef>,
        event_type: String,
        module: String,
        message: String,
    ) -> Result<()> {
        let entry = NewAuditLogEntry {
            uuid: Uuid::new_v4(),
            date_created: self.clock.now(),
            event_type,
            module,
            message,
            patient,
            user: identity.user_ref(),
        };

        let saved = self.repository.save(entry).await?;

        info!(
            target: "audit",
            audit_log_id = saved.audit_log_id,
            uuid = %saved.uuid,
            patient_uuid = ?saved.patient.as_ref().map(|p| p.uuid.as_str()),
            module = %saved.module,
            event_type = %saved.event_type,
            "Audit log created"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{AuditLogEntry, UserRef};
    use crate::identity::FixedClock;
    use crate::patient::MockPatientDirectory;
    use crate::repository::MockAuditLogRepository;
    use crate::temporal::parse_utc;
    use chrono::{DateTime, Utc};
    use std::sync::Mutex;

    fn now() -> DateTime<Utc> {
        parse_utc("2024-01-15T10:30:00.000Z").unwrap()
    }

    fn known_patient_directory() -> MockPatientDirectory {
        let mut patients = MockPatientDirectory::new();
        patients
            .expect_find_by_uuid()
            .withf(|uuid| uuid == "patientUuid")
            .returning(|uuid| Ok(Some(PatientRef::new(uuid, "GAN2000"))));
        patients
    }

    /// Repository mock recording the entry passed to `save`.
    fn capturing_repository(saved: Arc<Mutex<Vec<NewAuditLogEntry>>>) -> MockAuditLogRepository {
        let mut repo = MockAuditLogRepository::new();
        repo.expect_save().times(1).returning(move |entry| {
            saved.lock().unwrap().push(entry.clone());
            Ok(AuditLogEntry::from_new(1, entry))
        });
        repo
    }

    fn service(repo: MockAuditLogRepository, patients: MockPatientDirectory) -> AuditLogService {
        AuditLogService::new(
            Arc::new(repo),
            Arc::new(patients),
            Arc::new(FixedClock(now())),
            &AuditLogConfig::default(),
        )
        .unwrap()
    }

    fn auditlogger() -> IdentityContext {
        IdentityContext::authenticated("auditlogger")
    }

    #[tokio::test]
    async fn test_create_audit_log() {
        let saved = Arc::new(Mutex::new(Vec::new()));
        let service = service(capturing_repository(saved.clone()), known_patient_directory());
        let payload = AuditLogPayload::new(
            Some("patientUuid".to_string()),
            "message",
            "eventType",
            "registration",
        );

        service.create_audit_log(&auditlogger(), payload).await.unwrap();

        let saved = saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        let entry = &saved[0];
        assert_eq!(entry.patient.as_ref().map(|p| p.uuid.as_str()), Some("patientUuid"));
        assert_eq!(entry.message, "message");
        assert_eq!(entry.event_type, "eventType");
        assert_eq!(entry.module, "registration");
        assert_eq!(entry.user, Some(UserRef::new("auditlogger")));
        assert_eq!(entry.date_created, now());
    }

    #[tokio::test]
    async fn test_create_audit_log_with_params() {
        let saved = Arc::new(Mutex::new(Vec::new()));
        let service = service(capturing_repository(saved.clone()), known_patient_directory());
        let mut params = MessageParams::new();
        params.insert(
            "encounterUuid".to_string(),
            "81f57a25-3f10-11e4-821f-0800271c1b75".to_string(),
        );
        params.insert("encounterType".to_string(), "REG".to_string());

        service
            .create_audit_log_with_params(
                &auditlogger(),
                Some("patientUuid"),
                "eventType",
                "message",
                &params,
                "registration",
            )
            .await
            .unwrap();

        let saved = saved.lock().unwrap();
        let entry = &saved[0];
        assert_eq!(
            entry.message,
            concat!(
                r#"message~{"encounterUuid":"81f57a25-3f10-11e4-821f-0800271c1b75","#,
                r#""encounterType":"REG"}"#
            )
        );
        assert_eq!(entry.event_type, "eventType");
        assert_eq!(entry.module, "registration");
    }

    #[tokio::test]
    async fn test_empty_params_keep_message_verbatim() {
        let saved = Arc::new(Mutex::new(Vec::new()));
        let service = service(capturing_repository(saved.clone()), known_patient_directory());

        service
            .create_audit_log_with_params(
                &auditlogger(),
                Some("patientUuid"),
                "eventType",
                "message",
                &MessageParams::new(),
                "registration",
            )
            .await
            .unwrap();

        assert_eq!(saved.lock().unwrap()[0].message, "message");
    }

    #[tokio::test]
    async fn test_unknown_patient_never_saves() {
        let mut repo = MockAuditLogRepository::new();
        repo.expect_save().never();
        let mut patients = MockPatientDirectory::new();
        patients.expect_find_by_uuid().times(2).returning(|_| Ok(None));
        let service = service(repo, patients);

        let payload = AuditLogPayload::new(
            Some("missing".to_string()),
            "message",
            "eventType",
            "registration",
        );
        let err = service.create_audit_log(&auditlogger(), payload).await.unwrap_err();
        assert!(matches!(err, AuditLogError::PatientNotFound(ref uuid) if uuid == "missing"));

        let err = service
            .create_audit_log_with_params(
                &auditlogger(),
                Some("missing"),
                "eventType",
                "message",
                &MessageParams::new(),
                "registration",
            )
            .await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_no_patient_skips_lookup() {
        let saved = Arc::new(Mutex::new(Vec::new()));
        let mut patients = MockPatientDirectory::new();
        patients.expect_find_by_uuid().never();
        let service = service(capturing_repository(saved.clone()), patients);

        let payload =
            AuditLogPayload::new(None, "USER_LOGIN_FAILED", "USER_LOGIN_FAILED", "admin");
        service
            .create_audit_log(&IdentityContext::anonymous(), payload)
            .await
            .unwrap();

        let saved = saved.lock().unwrap();
        assert!(saved[0].patient.is_none());
        assert!(saved[0].user.is_none());
    }

    #[tokio::test]
    async fn test_persistence_failure_propagates() {
        let mut repo = MockAuditLogRepository::new();
        repo.expect_save()
            .times(1)
            .returning(|_| Err(AuditLogError::persistence(anyhow::anyhow!("connection reset"))));
        let service = service(repo, known_patient_directory());

        let payload = AuditLogPayload::new(
            Some("patientUuid".to_string()),
            "message",
            "eventType",
            "registration",
        );
        let err = service.create_audit_log(&auditlogger(), payload).await.unwrap_err();
        assert!(matches!(err, AuditLogError::PersistenceFailure(_)));
    }

    #[tokio::test]
    async fn test_patient_directory_failure_is_lookup_failure() {
        let mut repo = MockAuditLogRepository::new();
        repo.expect_save().never();
        let mut patients = MockPatientDirectory::new();
        patients
            .expect_find_by_uuid()
            .times(1)
            .returning(|_| Err(AuditLogError::persistence(anyhow::anyhow!("directory offline"))));
        let service = service(repo, patients);

        let payload = AuditLogPayload::new(
            Some("patientUuid".to_string()),
            "message",
            "eventType",
            "registration",
        );
        let err = service.create_audit_log(&auditlogger(), payload).await.unwrap_err();
        assert!(matches!(err, AuditLogError::PatientLookupFailure(_)));
        assert!(!err.is_access_denied());
    }

    #[tokio::test]
    async fn test_get_logs_requires_authentication() {
        let mut repo = MockAuditLogRepository::new();
        repo.expect_find_page().never();
        repo.expect_cursor_position().never();
        let service = service(repo, MockPatientDirectory::new());

        let err = service
            .get_logs(&IdentityContext::anonymous(), AuditLogQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuditLogError::NotAuthenticated));

        let err = service
            .get_logs(&IdentityContext::authenticated("nurse"), AuditLogQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuditLogError::InsufficientPrivilege(_)));
    }

    #[tokio::test]
    async fn test_get_logs_rejects_malformed_start_before_query() {
        let mut repo = MockAuditLogRepository::new();
        repo.expect_find_page().never();
        let service = service(repo, MockPatientDirectory::new());

        let query = AuditLogQuery {
            start_from: Some("2017-03-15 16:57".to_string()),
            ..Default::default()
        };
        let admin = IdentityContext::authenticated("superman").with_privilege("app:admin");
        let err = service.get_logs(&admin, query).await.unwrap_err();
        assert!(matches!(err, AuditLogError::MalformedTimestamp(_)));
    }

    #[tokio::test]
    async fn test_get_logs_maps_entries_in_order() {
        let first = AuditLogEntry {
            audit_log_id: 1,
            uuid: Uuid::new_v4(),
            date_created: parse_utc("2017-03-15T16:57:09.0Z").unwrap(),
            event_type: "event_type_1".to_string(),
            module: "clinical".to_string(),
            message: "message 1".to_string(),
            patient: Some(PatientRef::new("uuid-1", "GAN2000")),
            user: Some(UserRef::new("superman")),
        };
        let second = AuditLogEntry {
            audit_log_id: 2,
            uuid: Uuid::new_v4(),
            date_created: parse_utc("2017-03-15T16:57:10.0Z").unwrap(),
            event_type: "event_type_2".to_string(),
            module: "reports".to_string(),
            message: "message 2".to_string(),
            patient: Some(PatientRef::new("uuid-2", "GAN2001")),
            user: Some(UserRef::new("batman")),
        };

        let mut repo = MockAuditLogRepository::new();
        let page = vec![first.clone(), second.clone()];
        repo.expect_find_page()
            .withf(|query| {
                query.username.as_deref() == Some("username")
                    && query.patient_identifier.as_deref() == Some("patientId")
            })
            .times(1)
            .returning(move |_| Ok(page.clone()));
        let service = service(repo, MockPatientDirectory::new());

        let admin = IdentityContext::authenticated("superman").with_privilege("app:admin");
        let query = AuditLogQuery {
            username: Some("username".to_string()),
            patient_id: Some("patientId".to_string()),
            ..Default::default()
        };
        let logs = service.get_logs(&admin, query).await.unwrap();

        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].message, "message 1");
        assert_eq!(logs[0].patient_id.as_deref(), Some("GAN2000"));
        assert_eq!(logs[0].user_id.as_deref(), Some("superman"));
        assert_eq!(logs[0].event_type, "event_type_1");
        assert_eq!(logs[0].date_created, first.date_created);
        assert_eq!(logs[0].audit_log_id, 1);
        assert_eq!(logs[0].module, "clinical");

        assert_eq!(logs[1].message, "message 2");
        assert_eq!(logs[1].patient_id.as_deref(), Some("GAN2001"));
        assert_eq!(logs[1].user_id.as_deref(), Some("batman"));
        assert_eq!(logs[1].event_type, "event_type_2");
        assert_eq!(logs[1].date_created, second.date_created);
        assert_eq!(logs[1].audit_log_id, 2);
        assert_eq!(logs[1].module, "reports");
    }
}
