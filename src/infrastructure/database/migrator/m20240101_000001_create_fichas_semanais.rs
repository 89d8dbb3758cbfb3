//! Create fichas_semanais table migration

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FichasSemanais::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FichasSemanais::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FichasSemanais::ColaboradorNome)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FichasSemanais::ColaboradorCpf)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FichasSemanais::ColaboradorCargo)
                            .string_len(255)
                            .null(),
                    )
                    .col(ColumnDef::new(FichasSemanais::PeriodoInicio).date().not_null())
                    .col(ColumnDef::new(FichasSemanais::PeriodoFim).date().not_null())
                    .col(
                        ColumnDef::new(FichasSemanais::Tarefas)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(ColumnDef::new(FichasSemanais::Dificuldades).text().null())
                    .col(ColumnDef::new(FichasSemanais::DataGeracao).string().null())
                    .col(ColumnDef::new(FichasSemanais::Ip).string_len(255).null())
                    .col(
                        ColumnDef::new(FichasSemanais::CriadoEm)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Export reads newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_fichas_semanais_criado_em")
                    .table(FichasSemanais::Table)
                    .col(FichasSemanais::CriadoEm)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FichasSemanais::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum FichasSemanais {
    Table,
    Id,
    ColaboradorNome,
    ColaboradorCpf,
    ColaboradorCargo,
    PeriodoInicio,
    PeriodoFim,
    Tarefas,
    Dificuldades,
    DataGeracao,
    Ip,
    CriadoEm,
}
