use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use kyc_onboarding::workflows::kyc::{
    kyc_router, KycOnboardingService, SessionRepository, SignalScorer,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_kyc_routes<R, S>(service: Arc<KycOnboardingService<R, S>>) -> axum::Router
where
    R: SessionRepository + 'static,
    S: SignalScorer + 'static,
{
    kyc_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{InMemorySessionRepository, SimulatedScorer};
    use axum::body::Body;
    use axum::http::Request;
    use kyc_onboarding::workflows::kyc::VerdictConfig;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn app(ready: bool) -> axum::Router {
        let service = Arc::new(KycOnboardingService::new(
            Arc::new(InMemorySessionRepository::default()),
            Arc::new(SimulatedScorer::default()),
            VerdictConfig::default(),
        ));
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        with_kyc_routes(service).layer(Extension(state))
    }

    async fn get(router: axum::Router, uri: &str) -> axum::response::Response {
        router
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes")
    }

    #[tokio::test]
    async fn readiness_reflects_the_startup_flag() {
        let response = get(app(false), "/ready").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = get(app(true), "/ready").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_are_served_as_prometheus_text() {
        let response = get(app(true), "/metrics").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
    }

    #[tokio::test]
    async fn kyc_routes_are_mounted_next_to_probes() {
        let router = app(true);
        let health = get(router.clone(), "/health").await;
        assert_eq!(health.status(), StatusCode::OK);

        let created = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/kyc/sessions")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");
        assert_eq!(created.status(), StatusCode::CREATED);
    }
}
