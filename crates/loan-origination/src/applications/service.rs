use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::catalog::RuleCatalog;
use super::cost::{self, CostBreakdown, CostError, LoanTerms};
use super::domain::{
    Actor, ActorRole, ApplicationDraft, ApplicationId, DocumentKey, DocumentReference,
    LoanApplication, LoanStatus, PropertyType, UnknownPropertyType,
};
use super::evaluation::{EvaluationEngine, EvaluationError, EvaluationResult};
use super::lifecycle::{self, LifecycleError};
use super::repository::{
    ApplicationFilter, ApplicationRecord, ApplicationRepository, NotificationSink,
    RepositoryError,
};
use super::validation::{document_violations, IntakeError, IntakeGuard, ValidationError};

/// Simulator input: the category only constrains the accepted rate band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest {
    pub loan_type: String,
    pub amount: Decimal,
    pub term: u32,
    pub interest_rate: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub loan_type: PropertyType,
    pub monthly_payment: Decimal,
}

/// Service composing intake validation, the evaluator, the lifecycle and the repository.
pub struct LoanApplicationService<R, N> {
    guard: IntakeGuard,
    engine: EvaluationEngine,
    repository: Arc<R>,
    notifications: Arc<N>,
    require_evaluated_approval: bool,
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("loan-{id:06}"))
}

impl<R, N> LoanApplicationService<R, N>
where
    R: ApplicationRepository + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(repository: Arc<R>, notifications: Arc<N>, catalog: RuleCatalog) -> Self {
        let catalog = Arc::new(catalog);

        Self {
            guard: IntakeGuard::new(catalog.clone()),
            engine: EvaluationEngine::shared(catalog),
            repository,
            notifications,
            require_evaluated_approval: true,
        }
    }

    /// When enabled (the default), moving to `Approved` requires a passing evaluation of the
    /// current snapshot.
    pub fn with_evaluated_approval(mut self, required: bool) -> Self {
        self.require_evaluated_approval = required;
        self
    }

    pub fn catalog(&self) -> &RuleCatalog {
        self.engine.catalog()
    }

    /// Validate and store a new application in its initial status.
    pub fn create_application(
        &self,
        draft: ApplicationDraft,
    ) -> Result<LoanApplication, ApplicationServiceError> {
        let application =
            self.guard
                .application_from_draft(draft, next_application_id(), Utc::now())?;

        let stored = self.repository.insert(ApplicationRecord::new(application))?;
        info!(
            application_id = %stored.application.id,
            property_type = %stored.application.property_type,
            "loan application created"
        );
        Ok(stored.application)
    }

    pub fn get_application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<LoanApplication, ApplicationServiceError> {
        Ok(self.fetch(application_id)?.application)
    }

    /// Full repository record, including the latest stored evaluation.
    pub fn get_record(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        self.fetch(application_id)
    }

    pub fn list_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<LoanApplication>, ApplicationServiceError> {
        let records = self.repository.list(filter)?;
        Ok(records.into_iter().map(|record| record.application).collect())
    }

    /// Evaluate the current snapshot. The result is recorded so a later approval can be
    /// checked against it; the status is never changed here.
    pub fn evaluate(
        &self,
        application_id: &ApplicationId,
    ) -> Result<EvaluationResult, ApplicationServiceError> {
        let record = self.fetch(application_id)?;
        let result = self.engine.evaluate(&record.application)?;

        info!(
            application_id = %application_id,
            approved = result.approved,
            failed_rules = ?result.failed_rules(),
            "loan application evaluated"
        );

        if record.latest_evaluation.as_ref() != Some(&result) {
            let expected_version = record.version;
            let mut updated = record;
            updated.latest_evaluation = Some(result.clone());
            match self.repository.update(updated, expected_version) {
                Ok(_) => {}
                Err(RepositoryError::VersionConflict { expected, found }) => {
                    debug!(
                        application_id = %application_id,
                        expected,
                        found,
                        "application changed during evaluation, result not stored"
                    );
                }
                Err(error) => return Err(error.into()),
            }
        }

        Ok(result)
    }

    pub fn calculate_cost(&self, terms: &LoanTerms) -> Result<CostBreakdown, ApplicationServiceError> {
        Ok(cost::calculate_cost(terms)?)
    }

    pub fn simulate(
        &self,
        request: &SimulationRequest,
    ) -> Result<SimulationResult, ApplicationServiceError> {
        let loan_type: PropertyType = request.loan_type.parse()?;
        self.guard.check_rate(loan_type, request.interest_rate)?;

        let monthly_payment = cost::monthly_payment(&LoanTerms {
            amount: request.amount,
            interest_rate: request.interest_rate,
            term: request.term,
        })?;

        Ok(SimulationResult {
            loan_type,
            monthly_payment,
        })
    }

    /// Apply a lifecycle transition under optimistic concurrency: two racing requests from
    /// the same prior status cannot both commit.
    pub fn update_status(
        &self,
        application_id: &ApplicationId,
        new_status: LoanStatus,
        actor: &Actor,
    ) -> Result<LoanApplication, ApplicationServiceError> {
        let record = self.fetch(application_id)?;
        let expected_version = record.version;
        let mut application = record.application.clone();

        let event = lifecycle::transition(&mut application, new_status, actor, Utc::now())
            .map_err(|error| {
                warn!(application_id = %application_id, actor = %actor.id, %error, "status transition refused");
                error
            })?;

        if new_status == LoanStatus::Approved && self.require_evaluated_approval {
            let backed = record
                .latest_evaluation
                .as_ref()
                .is_some_and(|result| result.approved);
            if !backed {
                warn!(application_id = %application_id, "approval attempted without a passing evaluation");
                return Err(ApplicationServiceError::ApprovalWithoutPassingEvaluation {
                    application_id: application_id.clone(),
                });
            }
        }

        let stored = self.repository.update(
            ApplicationRecord {
                application,
                ..record
            },
            expected_version,
        )?;

        info!(
            application_id = %application_id,
            from = %event.from,
            to = %event.to,
            actor = %actor.id,
            "loan application status changed"
        );

        if let Err(error) = self.notifications.publish(event) {
            warn!(application_id = %application_id, %error, "status change notification failed");
        }

        Ok(stored.application)
    }

    /// Store or replace one required document. Any stored evaluation is discarded because
    /// it no longer describes the snapshot.
    pub fn attach_document(
        &self,
        application_id: &ApplicationId,
        key: DocumentKey,
        reference: DocumentReference,
        actor: &Actor,
    ) -> Result<LoanApplication, ApplicationServiceError> {
        let record = self.fetch(application_id)?;
        let expected_version = record.version;

        if record.application.status.is_terminal() {
            return Err(ApplicationServiceError::DocumentsLocked {
                status: record.application.status,
            });
        }
        if actor.role == ActorRole::Applicant && !actor.owns(&record.application) {
            return Err(ApplicationServiceError::Forbidden {
                actor: actor.id.clone(),
            });
        }

        let violations = document_violations(key, &reference);
        if !violations.is_empty() {
            return Err(ValidationError { violations }.into());
        }

        let mut application = record.application;
        application.documents.insert(key, reference);
        application.updated_at = Utc::now();

        let stored = self.repository.update(
            ApplicationRecord {
                application,
                version: record.version,
                latest_evaluation: None,
            },
            expected_version,
        )?;

        debug!(application_id = %application_id, document = %key, "document attached");
        Ok(stored.application)
    }

    fn fetch(&self, application_id: &ApplicationId) -> Result<ApplicationRecord, ApplicationServiceError> {
        let record = self
            .repository
            .fetch(application_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }
}

/// Error raised by the application service.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    UnknownPropertyType(#[from] UnknownPropertyType),
    #[error(transparent)]
    Cost(#[from] CostError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("application {application_id} has no passing evaluation for its current data")]
    ApprovalWithoutPassingEvaluation { application_id: ApplicationId },
    #[error("documents cannot change once the application is {status}")]
    DocumentsLocked { status: LoanStatus },
    #[error("'{actor}' may only modify their own application")]
    Forbidden { actor: String },
}

impl From<IntakeError> for ApplicationServiceError {
    fn from(value: IntakeError) -> Self {
        match value {
            IntakeError::UnknownPropertyType(error) => Self::UnknownPropertyType(error),
            IntakeError::Validation(error) => Self::Validation(error),
        }
    }
}

impl From<EvaluationError> for ApplicationServiceError {
    fn from(value: EvaluationError) -> Self {
        match value {
            EvaluationError::UnknownPropertyType(error) => Self::UnknownPropertyType(error),
            EvaluationError::Cost(error) => Self::Cost(error),
        }
    }
}
