use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, DeriveActiveEnum, EnumIter, Deserialize, Serialize)]
#[sea_orm(rs_type = "i16", db_type = "Integer")]
pub enum ProjectStatus {
    #[sea_orm(num_value = 0)]
    Queued,
    #[sea_orm(num_value = 1)]
    Building,
    #[sea_orm(num_value = 2)]
    Live,
    #[sea_orm(num_value = 3)]
    Failed,
}

impl ProjectStatus {
    /// A status from which no further transition happens within a run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProjectStatus::Live | ProjectStatus::Failed)
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProjectStatus::Queued => "Queued",
            ProjectStatus::Building => "Building",
            ProjectStatus::Live => "Live",
            ProjectStatus::Failed => "Failed",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "project")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub name: String,
    pub framework: Option<String>,
    pub status: ProjectStatus,
    pub repository: String,
    pub branch: String,
    pub domain: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub build_logs: Option<String>,
    pub created_at: NaiveDateTime,
    pub last_deployed_at: Option<NaiveDateTime>,
    pub created_by: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id"
    )]
    CreatedBy,
}

impl ActiveModelBehavior for ActiveModel {}
