//! API Router with Swagger UI

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, Method, StatusCode},
    middleware,
    routing::{get, post, MethodRouter},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::domain::submission::{
    Collaborator, Period, ReportRow, Submission, SubmissionRepository, Task, Weekdays,
};

use super::common::{method_not_allowed, ErrorBody};
use super::middleware::{
    require_read_key, require_write_key, submit_token_middleware, AuthState, API_KEY_HEADER,
};
use super::modules::health::{self, HealthState};
use super::modules::metrics::{http_metrics_middleware, prometheus_metrics, MetricsState};
use super::modules::request_id::request_id_middleware;
use super::modules::submissions::{self, ExportResponse, SubmissionCreated, SubmissionState};
use super::modules::tokens::{self, TokenResponse, TokenState};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Submit token from GET /get-token"))
                        .build(),
                ),
            );
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(API_KEY_HEADER))),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        tokens::get_token,
        submissions::salvar_ficha,
        submissions::api_fichas,
        submissions::api_powerbi,
    ),
    components(
        schemas(
            health::HealthResponse,
            TokenResponse,
            Submission,
            Collaborator,
            Period,
            Task,
            Weekdays,
            SubmissionCreated,
            ExportResponse,
            ReportRow,
            ErrorBody,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Tokens", description = "Short-lived submit tokens for the timesheet form"),
        (name = "Submissions", description = "Weekly timesheet writes"),
        (name = "Export", description = "Denormalized export for BI tools"),
    ),
    info(
        title = "Ficha Semanal API",
        version = "1.0.0",
        description = "Weekly timesheet collection and BI export"
    )
)]
pub struct ApiDoc;

async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Answer OPTIONS with 200 and anything else unlisted with a JSON 405.
fn finish<S>(route: MethodRouter<S>) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    route.options(preflight).fallback(method_not_allowed)
}

/// Create the API router with all routes
pub fn create_api_router(
    config: &AppConfig,
    repository: Arc<dyn SubmissionRepository>,
    prometheus: Option<PrometheusHandle>,
) -> Router {
    let auth_state = AuthState::from_security(&config.security);
    let submission_state = SubmissionState::new(repository);
    let token_state = TokenState {
        jwt_config: auth_state.jwt_config.clone(),
        allowed_origins: Arc::new(config.security.allowed_origins.clone()),
    };
    let health_state = HealthState::new(if config.database.is_memory() {
        "memory"
    } else {
        "database"
    });

    // ── Form write path (bearer token) ─────────────────────────
    let mut salvar_ficha = post(submissions::salvar_ficha);
    if config.security.require_submit_token {
        salvar_ficha = salvar_ficha.layer(middleware::from_fn_with_state(
            auth_state.clone(),
            submit_token_middleware,
        ));
    }
    if config.features.export_on_submit_path {
        salvar_ficha = salvar_ficha.merge(get(submissions::api_powerbi).layer(
            middleware::from_fn_with_state(auth_state.clone(), require_read_key),
        ));
    }

    // ── Machine-to-machine paths (API key) ─────────────────────
    let api_fichas = post(submissions::api_fichas).layer(middleware::from_fn_with_state(
        auth_state.clone(),
        require_write_key,
    ));
    let api_powerbi = get(submissions::api_powerbi).layer(middleware::from_fn_with_state(
        auth_state,
        require_read_key,
    ));

    let submission_routes = Router::new()
        .route("/salvar-ficha", finish(salvar_ficha))
        .route("/api-fichas", finish(api_fichas))
        .route("/api-powerbi", finish(api_powerbi))
        .with_state(submission_state);

    let token_routes = Router::new()
        .route("/get-token", finish(get(tokens::get_token)))
        .with_state(token_state);

    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .with_state(health_state);

    let mut app = Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(health_routes)
        .merge(token_routes)
        .merge(submission_routes);

    if let Some(handle) = prometheus {
        app = app.merge(
            Router::new()
                .route("/metrics", get(prometheus_metrics))
                .with_state(MetricsState { handle }),
        );
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(API_KEY_HEADER),
        ]);

    app.route_layer(middleware::from_fn(http_metrics_middleware))
        .layer(DefaultBodyLimit::max(config.server.max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
}
