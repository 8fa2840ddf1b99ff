/*
 * SPDX-FileCopyrightText: 2026 Slipway Contributors
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use anyhow::{Context, Result};
use entity::project::ProjectStatus;
use migration::Migrator;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, ConnectOptions, Database,
    DatabaseConnection, DbErr, EntityTrait, QueryFilter,
};
use sea_orm_migration::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::log::LevelFilter;
use uuid::Uuid;

use super::types::*;

pub async fn connect_db(cli: &Cli) -> Result<DatabaseConnection> {
    let db_url = if let Some(file) = &cli.database_url_file {
        std::fs::read_to_string(file)
            .context("Failed to read database url from file")?
            .trim()
            .to_string()
    } else if let Some(url) = &cli.database_url {
        url.clone()
    } else {
        anyhow::bail!("No database url provided")
    };

    let mut opt = ConnectOptions::new(db_url);

    // Only enable SQL logging at debug level
    if cli.log_level == "debug" {
        opt.sqlx_logging(true)
            .sqlx_logging_level(LevelFilter::Debug);
    } else {
        opt.sqlx_logging(false);
    }

    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .max_lifetime(Duration::from_secs(8));

    let db = Database::connect(opt)
        .await
        .context("Failed to connect to database")?;
    Migrator::up(&db, None)
        .await
        .context("Failed to run database migrations")?;
    repair_interrupted(&db)
        .await
        .context("Failed to repair interrupted deployments")?;
    Ok(db)
}

/// A project still marked Queued or Building at startup was interrupted by a
/// process restart. The run cannot be resumed, only resubmitted, so the row
/// is moved to Failed. Container state itself is repaired by the reconciler.
async fn repair_interrupted(db: &DatabaseConnection) -> Result<(), DbErr> {
    let interrupted = EProject::find()
        .filter(
            Condition::any()
                .add(CProject::Status.eq(ProjectStatus::Queued))
                .add(CProject::Status.eq(ProjectStatus::Building)),
        )
        .all(db)
        .await?;

    for project in interrupted {
        tracing::warn!(project = %project.name, "Marking interrupted deployment as failed");

        let logs = match project.build_logs.clone() {
            Some(existing) => format!("{}\nDeployment interrupted by server restart", existing),
            None => "Deployment interrupted by server restart".to_string(),
        };

        let mut aproject: AProject = project.into();
        aproject.status = Set(ProjectStatus::Failed);
        aproject.build_logs = Set(Some(logs));
        aproject.update(db).await?;
    }

    Ok(())
}

pub async fn get_project_by_name(
    state: Arc<ServerState>,
    name: &str,
) -> Result<Option<MProject>> {
    Ok(EProject::find()
        .filter(CProject::Name.eq(name))
        .one(&state.db)
        .await
        .context("Failed to query project")?)
}

pub async fn get_user_project(
    state: Arc<ServerState>,
    user_id: Uuid,
    name: &str,
) -> Result<Option<MProject>> {
    Ok(EProject::find()
        .filter(
            Condition::all()
                .add(CProject::Name.eq(name))
                .add(CProject::CreatedBy.eq(user_id)),
        )
        .one(&state.db)
        .await
        .context("Failed to query project")?)
}
