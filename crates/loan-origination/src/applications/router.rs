use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::cost::LoanTerms;
use super::domain::{Actor, ApplicationDraft, ApplicationId, DocumentKey, DocumentReference, LoanStatus};
use super::lifecycle::LifecycleError;
use super::repository::{ApplicationFilter, ApplicationRepository, NotificationSink, RepositoryError};
use super::service::{ApplicationServiceError, LoanApplicationService, SimulationRequest};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    pub status: LoanStatus,
    pub actor: Actor,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUploadRequest {
    pub document: DocumentReference,
    pub actor: Actor,
}

type SharedService<R, N> = Arc<LoanApplicationService<R, N>>;

/// Router builder exposing the engine's operations over HTTP.
pub fn application_router<R, N>(service: SharedService<R, N>) -> Router
where
    R: ApplicationRepository + 'static,
    N: NotificationSink + 'static,
{
    Router::new()
        .route(
            "/api/v1/loans/applications",
            post(create_handler::<R, N>).get(list_handler::<R, N>),
        )
        .route(
            "/api/v1/loans/applications/:application_id",
            get(get_handler::<R, N>),
        )
        .route(
            "/api/v1/loans/applications/:application_id/evaluation",
            post(evaluate_handler::<R, N>),
        )
        .route(
            "/api/v1/loans/applications/:application_id/status",
            put(status_handler::<R, N>),
        )
        .route(
            "/api/v1/loans/applications/:application_id/documents/:document_key",
            put(document_handler::<R, N>),
        )
        .route("/api/v1/loans/cost", post(cost_handler::<R, N>))
        .route("/api/v1/loans/simulation", post(simulation_handler::<R, N>))
        .with_state(service)
}

pub(crate) async fn create_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Json(draft): Json<ApplicationDraft>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: NotificationSink + 'static,
{
    match service.create_application(draft) {
        Ok(application) => (StatusCode::CREATED, Json(application)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn list_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Query(filter): Query<ApplicationFilter>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: NotificationSink + 'static,
{
    match service.list_applications(&filter) {
        Ok(applications) => (StatusCode::OK, Json(applications)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn get_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: NotificationSink + 'static,
{
    match service.get_record(&ApplicationId(application_id)) {
        Ok(record) => (StatusCode::OK, Json(record.view())).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn evaluate_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: NotificationSink + 'static,
{
    match service.evaluate(&ApplicationId(application_id)) {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn status_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(application_id): Path<String>,
    Json(request): Json<StatusUpdateRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: NotificationSink + 'static,
{
    match service.update_status(&ApplicationId(application_id), request.status, &request.actor) {
        Ok(application) => (StatusCode::OK, Json(application)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn document_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path((application_id, document_key)): Path<(String, DocumentKey)>,
    Json(request): Json<DocumentUploadRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: NotificationSink + 'static,
{
    match service.attach_document(
        &ApplicationId(application_id),
        document_key,
        request.document,
        &request.actor,
    ) {
        Ok(application) => (StatusCode::OK, Json(application)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn cost_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Json(terms): Json<LoanTerms>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: NotificationSink + 'static,
{
    match service.calculate_cost(&terms) {
        Ok(breakdown) => (StatusCode::OK, Json(breakdown)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn simulation_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Json(request): Json<SimulationRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: NotificationSink + 'static,
{
    match service.simulate(&request) {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(error) => error.into_response(),
    }
}

impl ApplicationServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApplicationServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApplicationServiceError::UnknownPropertyType(_) | ApplicationServiceError::Cost(_) => {
                StatusCode::BAD_REQUEST
            }
            ApplicationServiceError::Lifecycle(LifecycleError::InvalidTransition { .. })
            | ApplicationServiceError::ApprovalWithoutPassingEvaluation { .. }
            | ApplicationServiceError::DocumentsLocked { .. }
            | ApplicationServiceError::Repository(
                RepositoryError::Conflict | RepositoryError::VersionConflict { .. },
            ) => StatusCode::CONFLICT,
            ApplicationServiceError::Lifecycle(LifecycleError::NotPermitted { .. })
            | ApplicationServiceError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApplicationServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            ApplicationServiceError::Repository(RepositoryError::Unavailable(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApplicationServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let payload = match &self {
            ApplicationServiceError::Validation(error) => json!({
                "error": self.to_string(),
                "violations": error.violations,
            }),
            ApplicationServiceError::Lifecycle(LifecycleError::InvalidTransition { from, to }) => {
                json!({
                    "error": self.to_string(),
                    "currentStatus": from,
                    "requestedStatus": to,
                })
            }
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(payload)).into_response()
    }
}
