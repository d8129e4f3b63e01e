use crate::cli::ServeArgs;
use crate::infra::{AppState, Services};
use crate::routes::with_workflow_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use farmcert::config::AppConfig;
use farmcert::error::AppError;
use farmcert::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
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

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let services = Services::in_memory(config.evaluation, config.certificate);

    let app = with_workflow_routes(&services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        secondary_pass_threshold = config.evaluation.secondary_pass_threshold,
        certificate_validity_years = config.certificate.validity_years,
        "farm certification service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
