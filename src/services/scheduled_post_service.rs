use crate::entities::{
    PostPlatform, ScheduledPostStatus, linkedin_account_entity as accounts,
    scheduled_post_entity as posts,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateScheduledPostRequest, LinkLinkedInAccountRequest, LinkedInAccountStatus,
    PaginatedResponse, PaginationParams, ScheduledPostQuery, ScheduledPostResponse,
};
use crate::utils::time;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

/// LinkedIn rejects longer share commentary.
pub const MAX_CONTENT_CHARS: usize = 3000;

pub async fn find_linkedin_account<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
) -> AppResult<Option<accounts::Model>> {
    let account = accounts::Entity::find()
        .filter(accounts::Column::UserId.eq(user_id))
        .one(db)
        .await?;
    Ok(account)
}

#[derive(Clone)]
pub struct ScheduledPostService {
    pool: DatabaseConnection,
    max_attempts: i32,
}

impl ScheduledPostService {
    pub fn new(pool: DatabaseConnection, max_attempts: i32) -> Self {
        Self {
            pool,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Validates and stores a new `pending` post.
    pub async fn create(
        &self,
        user_id: i64,
        req: &CreateScheduledPostRequest,
    ) -> AppResult<ScheduledPostResponse> {
        let content = req.content.trim();
        if content.is_empty() {
            return Err(AppError::ValidationError("Content is required".into()));
        }
        if content.chars().count() > MAX_CONTENT_CHARS {
            return Err(AppError::ValidationError(format!(
                "Content must be at most {MAX_CONTENT_CHARS} characters"
            )));
        }
        let image_url = normalize_image_url(req.image_url.as_deref())?;

        let now = time::now();
        let scheduled_time = time::parse_schedule_input(&req.scheduled_time)?;
        time::ensure_schedulable(scheduled_time, now)?;

        match find_linkedin_account(&self.pool, user_id).await? {
            None => {
                return Err(AppError::ValidationError(
                    "Connect your LinkedIn account before scheduling posts".into(),
                ));
            }
            Some(account) if account.is_expired(now) => {
                return Err(AppError::ValidationError(
                    "Your LinkedIn connection has expired, please reconnect".into(),
                ));
            }
            Some(_) => {}
        }

        let post = posts::ActiveModel {
            user_id: Set(user_id),
            platform: Set(PostPlatform::Linkedin),
            content: Set(content.to_string()),
            image_url: Set(image_url),
            scheduled_time: Set(scheduled_time),
            scheduled_time_display: Set(time::format_display(scheduled_time)),
            status: Set(ScheduledPostStatus::Pending),
            attempts: Set(0),
            max_attempts: Set(self.max_attempts),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!(
            "Scheduled post {} for user {} at {}",
            post.id,
            user_id,
            post.scheduled_time_display
        );
        Ok(post.into())
    }

    pub async fn list(
        &self,
        user_id: i64,
        query: &ScheduledPostQuery,
    ) -> AppResult<PaginatedResponse<ScheduledPostResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut base_query = posts::Entity::find().filter(posts::Column::UserId.eq(user_id));
        if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
            let status: ScheduledPostStatus =
                status.parse().map_err(AppError::ValidationError)?;
            base_query = base_query.filter(posts::Column::Status.eq(status));
        }

        let total = base_query.clone().count(&self.pool).await? as i64;
        let items = base_query
            .order_by_asc(posts::Column::ScheduledTime)
            .order_by_asc(posts::Column::Id)
            .limit(params.get_limit() as u64)
            .offset(params.get_offset() as u64)
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(
            items.into_iter().map(Into::into).collect(),
            &params,
            total,
        ))
    }

    pub async fn get(&self, user_id: i64, post_id: i64) -> AppResult<ScheduledPostResponse> {
        self.find_owned(user_id, post_id).await.map(Into::into)
    }

    /// Only a `pending` row can be cancelled. Claimed, failed and terminal
    /// rows are left alone.
    pub async fn cancel(&self, user_id: i64, post_id: i64) -> AppResult<ScheduledPostResponse> {
        let res = posts::Entity::update_many()
            .set(posts::ActiveModel {
                status: Set(ScheduledPostStatus::Cancelled),
                updated_at: Set(Some(time::now())),
                ..Default::default()
            })
            .filter(posts::Column::Id.eq(post_id))
            .filter(posts::Column::UserId.eq(user_id))
            .filter(posts::Column::Status.eq(ScheduledPostStatus::Pending))
            .exec(&self.pool)
            .await?;

        let post = self.find_owned(user_id, post_id).await?;
        if res.rows_affected == 0 {
            return Err(AppError::ValidationError(format!(
                "A {} post can no longer be cancelled",
                post.status
            )));
        }
        log::info!("Scheduled post {post_id} cancelled by user {user_id}");
        Ok(post.into())
    }

    pub async fn link_account(
        &self,
        user_id: i64,
        req: &LinkLinkedInAccountRequest,
    ) -> AppResult<LinkedInAccountStatus> {
        let access_token = req.access_token.trim();
        let profile_id = req.profile_id.trim();
        if access_token.is_empty() || profile_id.is_empty() {
            return Err(AppError::ValidationError(
                "Access token and profile id are required".into(),
            ));
        }

        let now = time::now();
        let account = match find_linkedin_account(&self.pool, user_id).await? {
            Some(existing) => {
                let mut am = existing.into_active_model();
                am.access_token = Set(access_token.to_string());
                am.profile_id = Set(profile_id.to_string());
                am.expires_at = Set(req.expires_at);
                am.updated_at = Set(Some(now));
                am.update(&self.pool).await?
            }
            None => {
                accounts::ActiveModel {
                    user_id: Set(user_id),
                    access_token: Set(access_token.to_string()),
                    profile_id: Set(profile_id.to_string()),
                    expires_at: Set(req.expires_at),
                    created_at: Set(Some(now)),
                    updated_at: Set(Some(now)),
                    ..Default::default()
                }
                .insert(&self.pool)
                .await?
            }
        };

        Ok(account_status(Some(&account), now))
    }

    pub async fn account_status(&self, user_id: i64) -> AppResult<LinkedInAccountStatus> {
        let account = find_linkedin_account(&self.pool, user_id).await?;
        Ok(account_status(account.as_ref(), time::now()))
    }

    async fn find_owned(&self, user_id: i64, post_id: i64) -> AppResult<posts::Model> {
        posts::Entity::find_by_id(post_id)
            .filter(posts::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Scheduled post not found".into()))
    }
}

fn account_status(
    account: Option<&accounts::Model>,
    now: chrono::DateTime<chrono::Utc>,
) -> LinkedInAccountStatus {
    match account {
        Some(a) => LinkedInAccountStatus {
            connected: true,
            profile_id: Some(a.profile_id.clone()),
            expires_at: a.expires_at,
            expired: a.is_expired(now),
        },
        None => LinkedInAccountStatus {
            connected: false,
            profile_id: None,
            expires_at: None,
            expired: false,
        },
    }
}

fn normalize_image_url(raw: Option<&str>) -> AppResult<Option<String>> {
    let Some(url) = raw.map(str::trim).filter(|u| !u.is_empty()) else {
        return Ok(None);
    };
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(AppError::ValidationError(
            "Image URL must be an http(s) link".into(),
        ));
    }
    Ok(Some(url.to_string()))
}
