use crate::cli::ServeArgs;
use crate::infra::{live_registrar, open_store, AppState};
use crate::routes::with_operational_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use registrar::config::AppConfig;
use registrar::error::AppError;
use registrar::telemetry;
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
    if let Some(snapshot) = args.snapshot.take() {
        config.storage.snapshot_path = Some(snapshot);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = open_store(config.storage.snapshot_path.as_deref())?;
    let registrar = live_registrar(store, config.policy);

    let app = with_operational_routes(&registrar)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        passing_grade = config.policy.passing_grade,
        admission_threshold = config.policy.admission_threshold,
        "registrar service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
