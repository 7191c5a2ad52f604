use crate::cli::ServeArgs;
use crate::infra::{default_validator, load_option_provider, AppState};
use crate::routes::with_registration_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use iti_registration::config::AppConfig;
use iti_registration::error::AppError;
use iti_registration::registration::{
    HttpSubmissionGateway, RegistrationService, SessionLimits, TracingNotifier,
};
use iti_registration::telemetry;
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

    let options = Arc::new(load_option_provider(&config.registration)?);
    let gateway = Arc::new(HttpSubmissionGateway::new(
        config.registration.submission_endpoint.clone(),
    ));
    let registration_service = Arc::new(
        RegistrationService::new(default_validator(), options, gateway, Arc::new(TracingNotifier))
            .with_limits(SessionLimits {
                max_sessions: config.registration.max_sessions,
                idle_timeout: config.registration.session_idle_timeout,
            }),
    );

    let app = with_registration_routes(registration_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        endpoint = %config.registration.submission_endpoint,
        "registration service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
