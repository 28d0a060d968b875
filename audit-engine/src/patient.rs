//! Patient lookup collaborator

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use crate::entry::PatientRef;
use crate::error::Result;

/// Resolves a patient uuid to its reference.
///
/// `Ok(None)` means the patient does not exist; `Err` is a lookup failure.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PatientDirectory: Send + Sync {
    async fn find_by_uuid(&self, uuid: &str) -> Result<Option<PatientRef>>;
}

/// In-memory patient directory for testing and development
#[derive(Default)]
pub struct InMemoryPatientDirectory {
    patients: Arc<DashMap<String, PatientRef>>,
}

impl InMemoryPatientDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, patient: PatientRef) {
        self.patients.insert(patient.uuid.clone(), patient);
    }
}

#[async_trait]
impl PatientDirectory for InMemoryPatientDirectory {
    async fn find_by_uuid(&self, uuid: &str) -> Result<Option<PatientRef>> {
        Ok(self.patients.get(uuid).map(|entry| entry.value().clone()))
    }
}
