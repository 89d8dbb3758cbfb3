//! Weekly timesheet entity for database

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Timesheet row. Tasks are kept as a JSON array since they are only ever
/// read back whole.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fichas_semanais")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub colaborador_nome: String,
    pub colaborador_cpf: String,
    pub colaborador_cargo: Option<String>,
    pub periodo_inicio: NaiveDate,
    pub periodo_fim: NaiveDate,
    #[sea_orm(column_type = "Text")]
    pub tarefas: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub dificuldades: Option<String>,
    pub data_geracao: Option<String>,
    pub ip: Option<String>,
    pub criado_em: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
