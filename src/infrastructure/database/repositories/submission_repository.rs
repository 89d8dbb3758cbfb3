//! SeaORM implementation of SubmissionRepository

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, warn};
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, QueryOrder, Set};

use crate::domain::submission::{StoredSubmission, Submission, SubmissionRepository, Task};
use crate::domain::{DomainError, DomainResult, StorageError, StorageErrorKind};
use crate::infrastructure::database::entities::ficha_semanal;

pub struct SeaOrmSubmissionRepository {
    db: DatabaseConnection,
}

impl SeaOrmSubmissionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Decide the failure kind from the driver error, falling back to what the
/// operation was doing.
fn classify(e: &DbErr, operation: StorageErrorKind) -> StorageErrorKind {
    match e {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => StorageErrorKind::Unavailable,
        DbErr::Json(_) | DbErr::Type(_) | DbErr::TryIntoErr { .. } => StorageErrorKind::Corrupt,
        _ => operation,
    }
}

fn db_err(operation: StorageErrorKind) -> impl Fn(DbErr) -> DomainError {
    move |e| StorageError::new(classify(&e, operation), e.to_string()).into()
}

/// Rows whose `tarefas` column cannot be decoded keep their header fields
/// and come back without tasks, so they are counted but add no report rows.
fn to_stored(model: ficha_semanal::Model) -> StoredSubmission {
    let tasks: Vec<Task> = match serde_json::from_str(&model.tarefas) {
        Ok(tasks) => tasks,
        Err(e) => {
            warn!("Timesheet {} has unreadable tasks: {}", model.id, e);
            Vec::new()
        }
    };
    StoredSubmission {
        id: model.id,
        submission: Submission {
            collaborator: crate::domain::submission::Collaborator {
                name: model.colaborador_nome,
                cpf: model.colaborador_cpf,
                role: model.colaborador_cargo,
            },
            period: crate::domain::submission::Period {
                start: model.periodo_inicio,
                end: model.periodo_fim,
            },
            tasks,
            difficulties: model.dificuldades,
            generated_at: model.data_geracao,
        },
        created_at: model.criado_em,
        ip: model.ip,
    }
}

#[async_trait]
impl SubmissionRepository for SeaOrmSubmissionRepository {
    async fn insert(&self, submission: Submission, ip: Option<String>) -> DomainResult<StoredSubmission> {
        let tarefas = serde_json::to_string(&submission.tasks).map_err(|e| {
            DomainError::from(StorageError::new(StorageErrorKind::WriteFailed, e.to_string()))
        })?;

        let stored = StoredSubmission {
            id: uuid::Uuid::new_v4().to_string(),
            submission,
            created_at: Utc::now(),
            ip,
        };

        let row = ficha_semanal::ActiveModel {
            id: Set(stored.id.clone()),
            colaborador_nome: Set(stored.submission.collaborator.name.clone()),
            colaborador_cpf: Set(stored.submission.collaborator.cpf.clone()),
            colaborador_cargo: Set(stored.submission.collaborator.role.clone()),
            periodo_inicio: Set(stored.submission.period.start),
            periodo_fim: Set(stored.submission.period.end),
            tarefas: Set(tarefas),
            dificuldades: Set(stored.submission.difficulties.clone()),
            data_geracao: Set(stored.submission.generated_at.clone()),
            ip: Set(stored.ip.clone()),
            criado_em: Set(stored.created_at),
        };
        row.insert(&self.db)
            .await
            .map_err(db_err(StorageErrorKind::WriteFailed))?;

        debug!("Stored timesheet {}", stored.id);
        Ok(stored)
    }

    async fn list_newest_first(&self) -> DomainResult<Vec<StoredSubmission>> {
        let rows = ficha_semanal::Entity::find()
            .order_by_desc(ficha_semanal::Column::CriadoEm)
            .all(&self.db)
            .await
            .map_err(db_err(StorageErrorKind::ReadFailed))?;

        let submissions: Vec<StoredSubmission> = rows.into_iter().map(to_stored).collect();
        debug!("Loaded {} timesheets", submissions.len());
        Ok(submissions)
    }
}
