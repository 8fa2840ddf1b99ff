/*
 * SPDX-FileCopyrightText: 2026 Slipway Contributors
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use chrono::NaiveDateTime;
use entity::project::ProjectStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug)]
pub struct MakeUserRequest {
    pub username: String,
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MakeLoginRequest {
    pub loginname: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MakeDeployRequest {
    pub git_url: String,
    pub project_name: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct DeployResponse {
    pub message: String,
    pub status: String,
    pub project: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub name: String,
    pub framework: Option<String>,
    pub status: ProjectStatus,
    pub repository: String,
    pub branch: String,
    pub domain: Option<String>,
    pub created_at: NaiveDateTime,
    pub last_deployed_at: Option<NaiveDateTime>,
}

impl From<slipway_core::types::MProject> for ProjectResponse {
    fn from(project: slipway_core::types::MProject) -> Self {
        Self {
            id: project.id,
            name: project.name,
            framework: project.framework,
            status: project.status,
            repository: project.repository,
            branch: project.branch,
            domain: project.domain,
            created_at: project.created_at,
            last_deployed_at: project.last_deployed_at,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct StreamParams {
    pub token: String,
}

/// Records emitted on the deployment log stream. Terminal types end the
/// stream.
#[derive(Serialize, Debug)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    Connected {
        message: String,
    },
    Log {
        message: String,
    },
    Status {
        status: ProjectStatus,
        domain: Option<String>,
    },
    Complete {
        status: ProjectStatus,
        domain: Option<String>,
        url: Option<String>,
    },
    Error {
        message: String,
    },
    Timeout {
        message: String,
    },
}
