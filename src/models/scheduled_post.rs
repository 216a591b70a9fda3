use crate::entities::{ScheduledPostStatus, scheduled_post_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduledPostRequest {
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
    /// RFC 3339 with offset, or `YYYY-MM-DDTHH:MM` in IST.
    #[schema(example = "2026-10-20T09:30")]
    pub scheduled_time: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ScheduledPostQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<String>, // pending/dispatching/posted/failed/cancelled
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledPostResponse {
    pub id: i64,
    pub content: String,
    pub image_url: Option<String>,
    pub scheduled_time: DateTime<Utc>,
    pub scheduled_time_display: String,
    pub status: ScheduledPostStatus,
    pub attempts: i32,
    pub max_attempts: i32,
    pub last_attempt: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub linkedin_post_id: Option<String>,
    pub linkedin_url: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<scheduled_post_entity::Model> for ScheduledPostResponse {
    fn from(m: scheduled_post_entity::Model) -> Self {
        Self {
            id: m.id,
            content: m.content,
            image_url: m.image_url,
            scheduled_time: m.scheduled_time,
            scheduled_time_display: m.scheduled_time_display,
            status: m.status,
            attempts: m.attempts,
            max_attempts: m.max_attempts,
            last_attempt: m.last_attempt,
            error: m.error,
            linkedin_post_id: m.linkedin_post_id,
            linkedin_url: m.linkedin_url,
            posted_at: m.posted_at,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Outcome of one dispatcher sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct SweepReport {
    /// Rows this sweep claimed and dispatched.
    pub processed: u32,
    pub succeeded: u32,
    pub failed: u32,
    /// Due rows another sweep claimed first.
    pub skipped: u32,
    /// Abandoned `dispatching` rows returned to `failed`.
    pub recovered: u32,
}
