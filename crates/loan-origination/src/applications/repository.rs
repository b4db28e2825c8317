use serde::{Deserialize, Serialize};

use super::domain::{ApplicantId, ApplicationId, DocumentKey, LoanApplication, LoanStatus, PropertyType};
use super::evaluation::EvaluationResult;
use super::lifecycle::StatusChanged;

/// Repository record: the application snapshot, its optimistic version and the latest
/// evaluation computed against that snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    pub application: LoanApplication,
    pub version: u64,
    pub latest_evaluation: Option<EvaluationResult>,
}

impl ApplicationRecord {
    pub fn new(application: LoanApplication) -> Self {
        Self {
            application,
            version: 0,
            latest_evaluation: None,
        }
    }

    pub fn id(&self) -> &ApplicationId {
        &self.application.id
    }

    pub fn decision_rationale(&self) -> String {
        match &self.latest_evaluation {
            Some(result) => result.message.clone(),
            None => "pending evaluation".to_string(),
        }
    }

    pub fn view(&self) -> ApplicationView {
        ApplicationView {
            application: self.application.clone(),
            status_label: self.application.status.label(),
            status_description: self.application.status.description(),
            missing_documents: self.application.missing_documents(),
            decision_rationale: self.decision_rationale(),
            latest_evaluation: self.latest_evaluation.clone(),
        }
    }
}

/// Storage abstraction so the service can be exercised in isolation.
///
/// `update` is optimistic: it succeeds only when the stored version equals `expected_version`,
/// and stores the record with the version bumped by one.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError>;
    fn update(
        &self,
        record: ApplicationRecord,
        expected_version: u64,
    ) -> Result<ApplicationRecord, RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn list(&self, filter: &ApplicationFilter) -> Result<Vec<ApplicationRecord>, RepositoryError>;
}

/// Optional criteria for listing applications; an empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationFilter {
    pub applicant_id: Option<ApplicantId>,
    pub status: Option<LoanStatus>,
    pub property_type: Option<PropertyType>,
}

impl ApplicationFilter {
    pub fn matches(&self, application: &LoanApplication) -> bool {
        self.applicant_id
            .as_ref()
            .map_or(true, |applicant| *applicant == application.applicant)
            && self
                .status
                .map_or(true, |status| status == application.status)
            && self
                .property_type
                .map_or(true, |property_type| property_type == application.property_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record changed concurrently (expected version {expected}, found {found})")]
    VersionConflict { expected: u64, found: u64 },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook for status-change notifications (e-mail, SMS, CRM adapters).
pub trait NotificationSink: Send + Sync {
    fn publish(&self, event: StatusChanged) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Application plus the derived fields the review screens display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationView {
    #[serde(flatten)]
    pub application: LoanApplication,
    pub status_label: &'static str,
    pub status_description: &'static str,
    pub missing_documents: Vec<DocumentKey>,
    pub decision_rationale: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_evaluation: Option<EvaluationResult>,
}
