use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    ToSchema,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum PostPlatform {
    #[sea_orm(string_value = "linkedin")]
    Linkedin,
}

/// Lifecycle of a scheduled post.
///
/// `Dispatching` is the claim held by a sweep while the posting adapter runs;
/// `Posted` and `Cancelled` are terminal. `Failed` rows with attempts left are
/// picked up again by the next sweep.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    ToSchema,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum ScheduledPostStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "dispatching")]
    Dispatching,
    #[sea_orm(string_value = "posted")]
    Posted,
    #[sea_orm(string_value = "failed")]
    Failed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl ScheduledPostStatus {
    /// States a sweep may claim from.
    pub fn unclaimed() -> [ScheduledPostStatus; 2] {
        [ScheduledPostStatus::Pending, ScheduledPostStatus::Failed]
    }
}

impl std::fmt::Display for ScheduledPostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduledPostStatus::Pending => write!(f, "pending"),
            ScheduledPostStatus::Dispatching => write!(f, "dispatching"),
            ScheduledPostStatus::Posted => write!(f, "posted"),
            ScheduledPostStatus::Failed => write!(f, "failed"),
            ScheduledPostStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for ScheduledPostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ScheduledPostStatus::Pending),
            "dispatching" => Ok(ScheduledPostStatus::Dispatching),
            "posted" => Ok(ScheduledPostStatus::Posted),
            "failed" => Ok(ScheduledPostStatus::Failed),
            "cancelled" => Ok(ScheduledPostStatus::Cancelled),
            other => Err(format!("Unknown scheduled post status: {other}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "scheduled_posts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub platform: PostPlatform,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub image_url: Option<String>,
    /// UTC instant; the IST rendering lives in `scheduled_time_display`.
    pub scheduled_time: DateTime<Utc>,
    pub scheduled_time_display: String,
    pub status: ScheduledPostStatus,
    pub attempts: i32,
    pub max_attempts: i32,
    pub last_attempt: Option<DateTime<Utc>>,
    #[sea_orm(column_type = "Text", nullable)]
    pub error: Option<String>,
    pub linkedin_post_id: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub linkedin_url: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn attempts_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
