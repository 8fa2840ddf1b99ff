/*
 * SPDX-FileCopyrightText: 2026 Slipway Contributors
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Tests for project entity

use chrono::NaiveDate;
use entity::project::ProjectStatus;
use entity::*;
use sea_orm::{DatabaseBackend, MockDatabase, entity::prelude::*};
use uuid::Uuid;

fn naive_date() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

#[tokio::test]
async fn test_project_entity_basic() -> Result<(), DbErr> {
    let project_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![project::Model {
            id: project_id,
            name: "my-app".to_owned(),
            framework: Some("React".to_owned()),
            status: ProjectStatus::Live,
            repository: "https://github.com/example/my-app.git".to_owned(),
            branch: "main".to_owned(),
            domain: Some("my-app.localhost".to_owned()),
            build_logs: Some("Build completed".to_owned()),
            created_at: naive_date(),
            last_deployed_at: Some(naive_date()),
            created_by: user_id,
        }]])
        .into_connection();

    let result = project::Entity::find_by_id(project_id).one(&db).await?;

    assert!(result.is_some());
    let project = result.unwrap();
    assert_eq!(project.name, "my-app");
    assert_eq!(project.status, ProjectStatus::Live);
    assert_eq!(project.domain.as_deref(), Some("my-app.localhost"));

    Ok(())
}

#[test]
fn test_project_status_display() {
    assert_eq!(ProjectStatus::Queued.to_string(), "Queued");
    assert_eq!(ProjectStatus::Building.to_string(), "Building");
    assert_eq!(ProjectStatus::Live.to_string(), "Live");
    assert_eq!(ProjectStatus::Failed.to_string(), "Failed");
}

#[test]
fn test_project_status_terminal() {
    assert!(!ProjectStatus::Queued.is_terminal());
    assert!(!ProjectStatus::Building.is_terminal());
    assert!(ProjectStatus::Live.is_terminal());
    assert!(ProjectStatus::Failed.is_terminal());
}

#[test]
fn test_project_status_serialization() {
    let json = serde_json::to_string(&ProjectStatus::Live).unwrap();
    assert_eq!(json, "\"Live\"");

    let parsed: ProjectStatus = serde_json::from_str("\"Failed\"").unwrap();
    assert_eq!(parsed, ProjectStatus::Failed);
}
