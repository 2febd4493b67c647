use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemorySessionRepository, SimulatedScorer};
use crate::routes::with_kyc_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use kyc_onboarding::config::AppConfig;
use kyc_onboarding::error::AppError;
use kyc_onboarding::telemetry;
use kyc_onboarding::workflows::kyc::KycOnboardingService;
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

    let repository = Arc::new(InMemorySessionRepository::default());
    let scorer = Arc::new(SimulatedScorer::default());
    let kyc_service = Arc::new(KycOnboardingService::new(repository, scorer, config.policy));

    let app = with_kyc_routes(kyc_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        max_attempts = config.policy.max_attempts,
        "kyc onboarding engine ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
