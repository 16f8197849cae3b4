use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::application::use_cases::health::HealthUseCase;
use crate::presentation::http::{Endpoint, HttpModule};

pub const ENDPOINTS: &[Endpoint] = &[
    Endpoint {
        method: "GET",
        path: "/health/liveness",
    },
    Endpoint {
        method: "GET",
        path: "/health/readiness",
    },
];

#[utoipa::path(get, path = "/health/liveness", tag = "Health",
    responses((status = 200, description = "Process is running")))]
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

#[utoipa::path(get, path = "/health/readiness", tag = "Health",
    responses(
        (status = 200, description = "Dependencies are healthy"),
        (status = 500, description = "A dependency is unavailable; body is JSON null")
    ))]
pub async fn readiness(State(uc): State<Arc<HealthUseCase>>) -> Response {
    if let Err(e) = uc.readiness().await {
        tracing::warn!(error = ?e, "readiness_check_failed");
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::Value::Null)).into_response();
    }
    StatusCode::OK.into_response()
}

pub fn routes(uc: Arc<HealthUseCase>) -> Router {
    Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .with_state(uc)
}

pub fn register(router: Router, uc: Arc<HealthUseCase>) -> Router {
    router.merge(routes(uc))
}

pub struct HealthModule {
    uc: Arc<HealthUseCase>,
}

impl HealthModule {
    pub fn new(uc: Arc<HealthUseCase>) -> Self {
        Self { uc }
    }
}

impl HttpModule for HealthModule {
    fn name(&self) -> &'static str {
        "health"
    }

    fn endpoints(&self) -> &'static [Endpoint] {
        ENDPOINTS
    }

    fn register(&self, router: Router) -> Router {
        register(router, self.uc.clone())
    }
}
