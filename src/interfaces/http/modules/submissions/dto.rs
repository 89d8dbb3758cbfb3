//! Submission DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::submission::ReportRow;

/// Returned after a timesheet is stored
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmissionCreated {
    pub success: bool,
    pub message: String,
    /// Server-assigned identifier
    pub id: String,
}

/// Denormalized export, one row per task
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExportResponse {
    pub success: bool,
    pub total_registros: usize,
    pub total_fichas: usize,
    pub dados: Vec<ReportRow>,
}
