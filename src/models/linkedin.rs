use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinkLinkedInAccountRequest {
    pub access_token: String,
    pub profile_id: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinkedInAccountStatus {
    pub connected: bool,
    pub profile_id: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub expired: bool,
}
