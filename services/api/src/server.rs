use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryApplicationRepository, LoggingNotificationSink};
use crate::routes::with_application_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use loan_origination::applications::{LoanApplicationService, RuleCatalog};
use loan_origination::config::AppConfig;
use loan_origination::error::AppError;
use loan_origination::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryApplicationRepository::default());
    let notifications = Arc::new(LoggingNotificationSink::default());
    let application_service = Arc::new(
        LoanApplicationService::new(repository, notifications, RuleCatalog::standard())
            .with_evaluated_approval(config.lifecycle.enforce_evaluated_approval),
    );

    let app = with_application_routes(application_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        enforce_evaluated_approval = config.lifecycle.enforce_evaluated_approval,
        "loan origination service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
