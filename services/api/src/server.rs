use crate::cli::ServeArgs;
use crate::infra::{seed_demo_store, AppState, EngineServices, Store};
use crate::routes::with_engine_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use enrollment_engine::config::AppConfig;
use enrollment_engine::error::AppError;
use enrollment_engine::telemetry;
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

    let store = Arc::new(Store::new());
    if args.seed_demo {
        seed_demo_store(&store, Utc::now())?;
        info!("seeded demo institution");
    }
    let services = EngineServices::from_config(store, &config);

    let app = with_engine_routes(&services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        target_utilization = config.balancing.target_utilization,
        "enrollment engine ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
