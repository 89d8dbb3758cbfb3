//! Weekly timesheet entities
//!
//! Field names on the wire are the Portuguese names the form and the BI
//! export use; the Rust names are English.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use super::cpf;

/// Longest period a single timesheet may cover, in days.
pub const MAX_PERIOD_DAYS: i64 = 7;

/// Person the timesheet belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Collaborator {
    #[serde(rename = "nome")]
    pub name: String,
    /// CPF, with or without punctuation
    pub cpf: String,
    #[serde(rename = "cargo", default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Start and end date of the reported week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Period {
    #[serde(rename = "inicio", alias = "dataInicio")]
    pub start: NaiveDate,
    #[serde(rename = "fim", alias = "dataFim")]
    pub end: NaiveDate,
}

impl Period {
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// Per-weekday flags for a task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct Weekdays {
    #[serde(rename = "segunda")]
    pub monday: bool,
    #[serde(rename = "terca")]
    pub tuesday: bool,
    #[serde(rename = "quarta")]
    pub wednesday: bool,
    #[serde(rename = "quinta")]
    pub thursday: bool,
    #[serde(rename = "sexta")]
    pub friday: bool,
    #[serde(rename = "sabado")]
    pub saturday: bool,
    #[serde(rename = "domingo")]
    pub sunday: bool,
}

/// One line of work in the timesheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Task {
    #[serde(rename = "numero", alias = "id", default)]
    pub number: u32,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "selecionada", default)]
    pub selected: bool,
    #[serde(rename = "dias", default)]
    pub days: Weekdays,
}

/// A weekly timesheet as submitted by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct Submission {
    #[serde(rename = "colaborador")]
    #[validate(custom(function = "validate_collaborator"))]
    pub collaborator: Collaborator,
    #[serde(rename = "periodo")]
    #[validate(custom(function = "validate_period"))]
    pub period: Period,
    #[serde(rename = "tarefas")]
    #[validate(custom(function = "validate_tasks"))]
    pub tasks: Vec<Task>,
    #[serde(rename = "dificuldades", default, skip_serializing_if = "Option::is_none")]
    pub difficulties: Option<String>,
    /// Client-side generation timestamp, stored as sent
    #[serde(rename = "dataGeracao", default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
}

impl Submission {
    /// Canonical form for storage: formatted CPF, blank tasks dropped,
    /// names trimmed.
    pub fn normalized(mut self) -> Self {
        self.collaborator.name = self.collaborator.name.trim().to_string();
        self.collaborator.cpf = cpf::format(&self.collaborator.cpf);
        self.tasks.retain(|t| !t.description.trim().is_empty());
        self
    }
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

fn validate_collaborator(collaborator: &Collaborator) -> Result<(), ValidationError> {
    if collaborator.name.trim().is_empty() {
        return Err(error("required", "name is required"));
    }
    if collaborator.cpf.trim().is_empty() {
        return Err(error("required", "cpf is required"));
    }
    if !cpf::is_valid(&collaborator.cpf) {
        return Err(error("cpf", "cpf is invalid"));
    }
    Ok(())
}

fn validate_period(period: &Period) -> Result<(), ValidationError> {
    if period.end < period.start {
        return Err(error("period", "end date cannot be before start date"));
    }
    if period.days() > MAX_PERIOD_DAYS {
        return Err(error("period", "period cannot exceed 7 days"));
    }
    Ok(())
}

fn validate_tasks(tasks: &[Task]) -> Result<(), ValidationError> {
    if tasks.iter().all(|t| t.description.trim().is_empty()) {
        return Err(error("required", "at least one task is required"));
    }
    Ok(())
}

/// A submission as persisted: append-only, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSubmission {
    pub id: String,
    #[serde(flatten)]
    pub submission: Submission,
    #[serde(rename = "criadoEm")]
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}
