//! Submission handlers

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::info;

use super::dto::{ExportResponse, SubmissionCreated};
use crate::domain::submission::{denormalize, Submission, SubmissionRepository};
use crate::interfaces::http::common::{ApiError, ClientIp, ErrorBody, ValidatedJson};

#[derive(Clone)]
pub struct SubmissionState {
    pub repository: Arc<dyn SubmissionRepository>,
}

impl SubmissionState {
    pub fn new(repository: Arc<dyn SubmissionRepository>) -> Self {
        Self { repository }
    }

    async fn store(
        &self,
        submission: Submission,
        ip: Option<String>,
        endpoint: &'static str,
    ) -> Result<(StatusCode, Json<SubmissionCreated>), ApiError> {
        let stored = self
            .repository
            .insert(submission.normalized(), ip)
            .await?;

        metrics::counter!("submissions_stored_total", "endpoint" => endpoint).increment(1);
        info!(id = %stored.id, endpoint, "Timesheet stored");

        Ok((
            StatusCode::CREATED,
            Json(SubmissionCreated {
                success: true,
                message: "Timesheet saved".to_string(),
                id: stored.id,
            }),
        ))
    }
}

#[utoipa::path(
    post,
    path = "/salvar-ficha",
    tag = "Submissions",
    request_body = Submission,
    responses(
        (status = 201, description = "Timesheet stored", body = SubmissionCreated),
        (status = 400, description = "Incomplete or malformed data", body = ErrorBody),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorBody),
        (status = 403, description = "Token not valid for this operation", body = ErrorBody),
        (status = 413, description = "Body too large", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody)
    ),
    security(("bearer_auth" = []))
)]
pub async fn salvar_ficha(
    State(state): State<SubmissionState>,
    ClientIp(ip): ClientIp,
    ValidatedJson(submission): ValidatedJson<Submission>,
) -> Result<(StatusCode, Json<SubmissionCreated>), ApiError> {
    state.store(submission, ip, "salvar-ficha").await
}

#[utoipa::path(
    post,
    path = "/api-fichas",
    tag = "Submissions",
    request_body = Submission,
    responses(
        (status = 201, description = "Timesheet stored", body = SubmissionCreated),
        (status = 400, description = "Incomplete or malformed data", body = ErrorBody),
        (status = 401, description = "Missing or invalid API key", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody)
    ),
    security(("api_key" = []))
)]
pub async fn api_fichas(
    State(state): State<SubmissionState>,
    ClientIp(ip): ClientIp,
    ValidatedJson(submission): ValidatedJson<Submission>,
) -> Result<(StatusCode, Json<SubmissionCreated>), ApiError> {
    state.store(submission, ip, "api-fichas").await
}

#[utoipa::path(
    get,
    path = "/api-powerbi",
    tag = "Export",
    responses(
        (status = 200, description = "All timesheets, one row per task, newest first", body = ExportResponse),
        (status = 401, description = "Missing or invalid API key", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody)
    ),
    security(("api_key" = []))
)]
pub async fn api_powerbi(
    State(state): State<SubmissionState>,
) -> Result<Json<ExportResponse>, ApiError> {
    let submissions = state.repository.list_newest_first().await?;
    let rows = denormalize(&submissions);
    info!(fichas = submissions.len(), registros = rows.len(), "Export served");

    Ok(Json(ExportResponse {
        success: true,
        total_registros: rows.len(),
        total_fichas: submissions.len(),
        dados: rows,
    }))
}
