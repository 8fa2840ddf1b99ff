/*
 * SPDX-FileCopyrightText: 2026 Slipway Contributors
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Project::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Project::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Project::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Project::Framework).string())
                    .col(ColumnDef::new(Project::Status).integer().not_null())
                    .col(ColumnDef::new(Project::Repository).string().not_null())
                    .col(ColumnDef::new(Project::Branch).string().not_null())
                    .col(ColumnDef::new(Project::Domain).string())
                    .col(ColumnDef::new(Project::BuildLogs).text())
                    .col(ColumnDef::new(Project::CreatedAt).date_time().not_null())
                    .col(ColumnDef::new(Project::LastDeployedAt).date_time())
                    .col(ColumnDef::new(Project::CreatedBy).uuid().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-project-created_by")
                            .from(Project::Table, Project::CreatedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Project::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Project {
    Table,
    Id,
    Name,
    Framework,
    Status,
    Repository,
    Branch,
    Domain,
    BuildLogs,
    CreatedAt,
    LastDeployedAt,
    CreatedBy,
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
}
