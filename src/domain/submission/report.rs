//! Tabular export for BI consumers
//!
//! Each task of each submission becomes one flat row.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::model::StoredSubmission;

/// One reporting row: a single task of a single submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReportRow {
    pub ficha_id: String,
    pub colaborador_nome: String,
    pub colaborador_cpf: String,
    pub periodo_inicio: NaiveDate,
    pub periodo_fim: NaiveDate,
    pub tarefa_numero: u32,
    pub tarefa_descricao: String,
    pub tarefa_segunda: u8,
    pub tarefa_terca: u8,
    pub tarefa_quarta: u8,
    pub tarefa_quinta: u8,
    pub tarefa_sexta: u8,
    pub tarefa_sabado: u8,
    pub tarefa_domingo: u8,
    pub data_criacao: DateTime<Utc>,
    pub ip_origem: Option<String>,
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}

/// Expand submissions into rows, preserving the input order.
pub fn denormalize(submissions: &[StoredSubmission]) -> Vec<ReportRow> {
    submissions
        .iter()
        .flat_map(|stored| {
            let s = &stored.submission;
            s.tasks.iter().map(move |task| ReportRow {
                ficha_id: stored.id.clone(),
                colaborador_nome: s.collaborator.name.clone(),
                colaborador_cpf: s.collaborator.cpf.clone(),
                periodo_inicio: s.period.start,
                periodo_fim: s.period.end,
                tarefa_numero: task.number,
                tarefa_descricao: task.description.clone(),
                tarefa_segunda: flag(task.days.monday),
                tarefa_terca: flag(task.days.tuesday),
                tarefa_quarta: flag(task.days.wednesday),
                tarefa_quinta: flag(task.days.thursday),
                tarefa_sexta: flag(task.days.friday),
                tarefa_sabado: flag(task.days.saturday),
                tarefa_domingo: flag(task.days.sunday),
                data_criacao: stored.created_at,
                ip_origem: stored.ip.clone(),
            })
        })
        .collect()
}
