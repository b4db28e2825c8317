use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;
use serde_json::Value;

use crate::applications::catalog::RuleCatalog;
use crate::applications::domain::{
    Actor, ApplicantId, ApplicationDraft, ApplicationId, DocumentKey, DocumentReference,
    LoanApplication, LoanStatus, PropertyType,
};
use crate::applications::evaluation::EvaluationEngine;
use crate::applications::lifecycle::StatusChanged;
use crate::applications::repository::{
    ApplicationFilter, ApplicationRecord, ApplicationRepository, NotificationError,
    NotificationSink, RepositoryError,
};
use crate::applications::service::LoanApplicationService;

pub(super) const APPLICANT: &str = "user-42";

pub(super) fn applicant() -> Actor {
    Actor::applicant(APPLICANT)
}

pub(super) fn executive() -> Actor {
    Actor::executive("exec-7")
}

pub(super) fn document(key: DocumentKey) -> DocumentReference {
    DocumentReference {
        file_name: format!("{}.pdf", key.code()),
        content_type: "application/pdf".to_string(),
        storage_key: format!("s3://loan-docs/{APPLICANT}/{}.pdf", key.code()),
    }
}

pub(super) fn all_documents() -> BTreeMap<DocumentKey, DocumentReference> {
    DocumentKey::REQUIRED
        .into_iter()
        .map(|key| (key, document(key)))
        .collect()
}

/// First-home purchase that clears every rule: LTV 0.80, DTI about 0.342.
pub(super) fn draft() -> ApplicationDraft {
    ApplicationDraft {
        applicant_id: APPLICANT.to_string(),
        property_type: "FIRST_HOME".to_string(),
        requested_amount: dec!(80000),
        property_value: dec!(100000),
        monthly_income: dec!(2000),
        current_debt: dec!(200),
        term: 20,
        interest_rate: dec!(4.0),
        employment_years: 3,
        documents: all_documents(),
    }
}

pub(super) fn application(suffix: &str) -> LoanApplication {
    let at = Utc
        .with_ymd_and_hms(2025, 3, 1, 9, 30, 0)
        .single()
        .expect("valid timestamp");

    LoanApplication {
        id: ApplicationId(format!("loan-{suffix}")),
        applicant: ApplicantId(APPLICANT.to_string()),
        property_type: PropertyType::FirstHome,
        requested_amount: dec!(80000),
        property_value: dec!(100000),
        monthly_income: dec!(2000),
        current_debt: dec!(200),
        term: 20,
        interest_rate: dec!(4.0),
        employment_years: 3,
        documents: all_documents(),
        status: LoanStatus::InReview,
        created_at: at,
        updated_at: at,
    }
}

pub(super) fn application_in(suffix: &str, status: LoanStatus) -> LoanApplication {
    LoanApplication {
        status,
        ..application(suffix)
    }
}

pub(super) fn evaluation_engine() -> EvaluationEngine {
    EvaluationEngine::new(RuleCatalog::standard())
}

pub(super) fn build_service() -> (
    LoanApplicationService<MemoryRepository, MemoryNotifications>,
    Arc<MemoryRepository>,
    Arc<MemoryNotifications>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let notifications = Arc::new(MemoryNotifications::default());
    let service = LoanApplicationService::new(
        repository.clone(),
        notifications.clone(),
        RuleCatalog::standard(),
    );
    (service, repository, notifications)
}

/// Walks a stored application through `path` as an executive.
pub(super) fn advance_to(
    service: &LoanApplicationService<MemoryRepository, MemoryNotifications>,
    id: &ApplicationId,
    path: &[LoanStatus],
) {
    for status in path {
        service
            .update_status(id, *status, &executive())
            .unwrap_or_else(|error| panic!("transition to {status} failed: {error}"));
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
}

impl ApplicationRepository for MemoryRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(record.id()) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id().clone(), record.clone());
        Ok(record)
    }

    fn update(
        &self,
        mut record: ApplicationRecord,
        expected_version: u64,
    ) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let current = guard.get(record.id()).ok_or(RepositoryError::NotFound)?;
        if current.version != expected_version {
            return Err(RepositoryError::VersionConflict {
                expected: expected_version,
                found: current.version,
            });
        }
        record.version = expected_version + 1;
        guard.insert(record.id().clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list(&self, filter: &ApplicationFilter) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut records: Vec<ApplicationRecord> = guard
            .values()
            .filter(|record| filter.matches(&record.application))
            .cloned()
            .collect();
        records.sort_by(|left, right| left.id().cmp(right.id()));
        Ok(records)
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifications {
    events: Arc<Mutex<Vec<StatusChanged>>>,
}

impl MemoryNotifications {
    pub(super) fn events(&self) -> Vec<StatusChanged> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }
}

impl NotificationSink for MemoryNotifications {
    fn publish(&self, event: StatusChanged) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push(event);
        Ok(())
    }
}

pub(super) struct OfflineNotifications;

impl NotificationSink for OfflineNotifications {
    fn publish(&self, _event: StatusChanged) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp relay down".to_string()))
    }
}

pub(super) struct UnavailableRepository;

impl ApplicationRepository for UnavailableRepository {
    fn insert(&self, _record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(
        &self,
        _record: ApplicationRecord,
        _expected_version: u64,
    ) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self, _filter: &ApplicationFilter) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) struct ConflictRepository;

impl ApplicationRepository for ConflictRepository {
    fn insert(&self, _record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn update(
        &self,
        _record: ApplicationRecord,
        _expected_version: u64,
    ) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(None)
    }

    fn list(&self, _filter: &ApplicationFilter) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Ok(Vec::new())
    }
}

/// Reads from memory but loses every write race, as if another writer always committed first.
#[derive(Default, Clone)]
pub(super) struct RacedRepository {
    pub(super) inner: MemoryRepository,
}

impl ApplicationRepository for RacedRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        self.inner.insert(record)
    }

    fn update(
        &self,
        _record: ApplicationRecord,
        expected_version: u64,
    ) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::VersionConflict {
            expected: expected_version,
            found: expected_version + 1,
        })
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn list(&self, filter: &ApplicationFilter) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        self.inner.list(filter)
    }
}
