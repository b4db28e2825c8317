//! Loan application intake, credit evaluation and review lifecycle.
//!
//! Leaves first: the rule catalog and cost calculator are pure policy and arithmetic, the
//! evaluator projects an application snapshot through the catalog, and the lifecycle governs
//! status changes. The service composes them over a repository and notification boundary.

pub mod catalog;
pub mod cost;
pub mod domain;
pub mod evaluation;
pub mod lifecycle;
pub mod repository;
pub mod router;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use catalog::{CategoryPolicy, RateRange, RuleCatalog};
pub use cost::{calculate_cost, monthly_payment, CostBreakdown, CostError, LoanTerms};
pub use domain::{
    Actor, ActorRole, ApplicantId, ApplicationDraft, ApplicationId, DocumentKey,
    DocumentReference, LoanApplication, LoanStatus, PropertyType, UnknownPropertyType,
};
pub use evaluation::{
    EvaluationDetail, EvaluationEngine, EvaluationError, EvaluationResult, UnderwritingRule,
};
pub use lifecycle::{LifecycleError, StatusChanged};
pub use repository::{
    ApplicationFilter, ApplicationRecord, ApplicationRepository, ApplicationView,
    NotificationError, NotificationSink, RepositoryError,
};
pub use router::{application_router, DocumentUploadRequest, StatusUpdateRequest};
pub use service::{
    ApplicationServiceError, LoanApplicationService, SimulationRequest, SimulationResult,
};
pub use validation::{FieldViolation, IntakeError, IntakeGuard, ValidationError};
