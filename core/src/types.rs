/*
 * SPDX-FileCopyrightText: 2026 Slipway Contributors
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use super::cache::ProgressCache;
use super::input::{greater_than_zero, port_in_range};
use super::runtime::DockerRuntime;
use clap::Parser;
use entity::*;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Parser, Debug, Clone)]
#[command(name = "Slipway", display_name = "Slipway", bin_name = "slipway-server", author = "Slipway", version, about, long_about = None)]
pub struct Cli {
    #[arg(long, env = "SLIPWAY_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
    #[arg(long, env = "SLIPWAY_IP", default_value = "127.0.0.1")]
    pub ip: String,
    #[arg(long, env = "SLIPWAY_PORT", value_parser = port_in_range, default_value_t = 8000)]
    pub port: u16,
    #[arg(
        long,
        env = "SLIPWAY_SERVE_URL",
        default_value = "http://127.0.0.1:3000"
    )]
    pub serve_url: String,
    #[arg(long, env = "SLIPWAY_DATABASE_URL")]
    pub database_url: Option<String>,
    #[arg(long, env = "SLIPWAY_DATABASE_URL_FILE")]
    pub database_url_file: Option<String>,
    #[arg(long, env = "SLIPWAY_JWT_SECRET_FILE")]
    pub jwt_secret_file: String,
    #[arg(long, env = "SLIPWAY_DOCKER_SOCKET")]
    pub docker_socket: Option<String>,
    #[arg(long, env = "SLIPWAY_PROJECTS_PATH", default_value = "/app/projects")]
    pub projects_path: String,
    #[arg(long, env = "SLIPWAY_HOST_PROJECTS_PATH", default_value = "./projects")]
    pub host_projects_path: String,
    #[arg(long, env = "SLIPWAY_DOMAIN_SUFFIX", default_value = ".localhost")]
    pub domain_suffix: String,
    #[arg(long, env = "SLIPWAY_DOCKER_NETWORK", default_value = "slipway-net")]
    pub docker_network: String,
    #[arg(
        long,
        env = "SLIPWAY_PROXY_CONTAINERS",
        value_delimiter = ',',
        default_value = "slipway-proxy,nginx-proxy"
    )]
    pub proxy_containers: Vec<String>,
    #[arg(
        long,
        env = "SLIPWAY_PROXY_CONFIG_PATH",
        default_value = "/etc/nginx/conf.d"
    )]
    pub proxy_config_path: String,
    #[arg(long, env = "SLIPWAY_BUILD_IMAGE", default_value = "node:20-alpine")]
    pub build_image: String,
    #[arg(long, env = "SLIPWAY_STREAM_POLL_INTERVAL", value_parser = greater_than_zero::<u64>, default_value = "1")]
    pub stream_poll_interval: u64,
    #[arg(long, env = "SLIPWAY_STREAM_MAX_POLLS", value_parser = greater_than_zero::<u32>, default_value = "120")]
    pub stream_max_polls: u32,
    #[arg(long, env = "SLIPWAY_DISABLE_REGISTRATION", default_value = "false")]
    pub disable_registration: bool,
    #[arg(long, env = "SLIPWAY_REPORT_ERRORS", default_value = "false")]
    pub report_errors: bool,
    #[arg(long, env = "SLIPWAY_SENTRY_DSN")]
    pub sentry_dsn: Option<String>,
}

pub struct ServerState {
    pub db: DatabaseConnection,
    pub cli: Cli,
    pub runtime: DockerRuntime,
    pub progress: ProgressCache,
}

impl ServerState {
    /// Public hostname for a project.
    pub fn domain_for(&self, project_name: &str) -> String {
        format!("{}{}", project_name, self.cli.domain_suffix)
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct BaseResponse<T> {
    pub error: bool,
    pub message: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListItem {
    pub id: Uuid,
    pub name: String,
}

pub type ListResponse = Vec<ListItem>;

pub type EProject = project::Entity;
pub type EUser = user::Entity;

pub type MProject = project::Model;
pub type MUser = user::Model;

pub type AProject = project::ActiveModel;
pub type AUser = user::ActiveModel;

pub type CProject = project::Column;
pub type CUser = user::Column;

pub type RProject = project::Relation;
pub type RUser = user::Relation;
