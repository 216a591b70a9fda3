//! Sweep over due scheduled posts.
//!
//! Each due row is claimed with one conditional `UPDATE` that flips it to
//! `dispatching` and consumes an attempt. Only the sweep whose update touched
//! the row calls the posting adapter, so overlapping sweeps never publish the
//! same row twice.

use crate::entities::{ScheduledPostStatus, scheduled_post_entity as posts};
use crate::error::{AppError, AppResult};
use crate::external::{LinkedInCredential, PostingAdapter, PublishedPost};
use crate::models::SweepReport;
use crate::services::find_linkedin_account;
use crate::utils::time;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct PostDispatcher {
    pool: DatabaseConnection,
    adapter: Arc<dyn PostingAdapter>,
    adapter_timeout: Duration,
    claim_lease: chrono::Duration,
}

impl PostDispatcher {
    pub fn new(
        pool: DatabaseConnection,
        adapter: Arc<dyn PostingAdapter>,
        adapter_timeout: Duration,
        claim_lease_secs: i64,
    ) -> Self {
        Self {
            pool,
            adapter,
            adapter_timeout,
            claim_lease: chrono::Duration::seconds(claim_lease_secs.max(1)),
        }
    }

    pub async fn run_sweep(&self) -> AppResult<SweepReport> {
        self.sweep(time::now()).await
    }

    /// Dispatches every row due at `now`, earliest first. Per-row failures
    /// are written to the row; only store errors abort the sweep.
    pub async fn sweep(&self, now: DateTime<Utc>) -> AppResult<SweepReport> {
        let mut report = SweepReport {
            recovered: self.recover_stale_claims(now).await?,
            ..Default::default()
        };

        for mut post in self.due_posts(now).await? {
            if !self.claim(&post, now).await? {
                report.skipped += 1;
                continue;
            }
            report.processed += 1;
            // mirror the claim's increment
            post.attempts += 1;
            let attempt = post.attempts;

            match self.dispatch(&post, now).await? {
                Ok(published) => {
                    self.mark_posted(post.id, &published, now).await?;
                    report.succeeded += 1;
                    log::info!(
                        "Scheduled post {} published as {} (attempt {}/{})",
                        post.id,
                        published.post_id,
                        attempt,
                        post.max_attempts
                    );
                }
                Err(reason) => {
                    self.mark_failed(post.id, &reason, now).await?;
                    report.failed += 1;
                    if post.attempts_exhausted() {
                        log::error!(
                            "Scheduled post {} failed permanently after {} attempts: {}",
                            post.id,
                            attempt,
                            reason
                        );
                    } else {
                        log::warn!(
                            "Scheduled post {} failed (attempt {}/{}): {}",
                            post.id,
                            attempt,
                            post.max_attempts,
                            reason
                        );
                    }
                }
            }
        }

        if report.processed > 0 || report.recovered > 0 || report.skipped > 0 {
            log::info!(
                "Sweep done: processed={} succeeded={} failed={} skipped={} recovered={}",
                report.processed,
                report.succeeded,
                report.failed,
                report.skipped,
                report.recovered
            );
        }
        Ok(report)
    }

    /// Unclaimed rows with attempts left and `scheduled_time <= now`, ascending.
    pub async fn due_posts(&self, now: DateTime<Utc>) -> AppResult<Vec<posts::Model>> {
        let due = posts::Entity::find()
            .filter(due_condition(now))
            .order_by_asc(posts::Column::ScheduledTime)
            .order_by_asc(posts::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(due)
    }

    /// Returns `true` when this caller won the row.
    pub async fn claim(&self, post: &posts::Model, now: DateTime<Utc>) -> AppResult<bool> {
        let res = posts::Entity::update_many()
            .col_expr(
                posts::Column::Status,
                Expr::value(ScheduledPostStatus::Dispatching),
            )
            .col_expr(
                posts::Column::Attempts,
                Expr::col(posts::Column::Attempts).add(1),
            )
            .col_expr(posts::Column::LastAttempt, Expr::value(Some(now)))
            .col_expr(posts::Column::UpdatedAt, Expr::value(Some(now)))
            .filter(posts::Column::Id.eq(post.id))
            .filter(due_condition(now))
            .exec(&self.pool)
            .await?;
        Ok(res.rows_affected == 1)
    }

    /// Rows left in `dispatching` past the lease belong to a sweep that died;
    /// they become ordinary failures so the attempt ceiling still applies.
    pub async fn recover_stale_claims(&self, now: DateTime<Utc>) -> AppResult<u32> {
        let cutoff = now - self.claim_lease;
        let res = posts::Entity::update_many()
            .set(posts::ActiveModel {
                status: Set(ScheduledPostStatus::Failed),
                error: Set(Some("Dispatch was interrupted before completion".to_string())),
                updated_at: Set(Some(now)),
                ..Default::default()
            })
            .filter(posts::Column::Status.eq(ScheduledPostStatus::Dispatching))
            .filter(
                Condition::any()
                    .add(posts::Column::LastAttempt.is_null())
                    .add(posts::Column::LastAttempt.lt(cutoff)),
            )
            .exec(&self.pool)
            .await?;
        if res.rows_affected > 0 {
            log::warn!("Recovered {} stale dispatching posts", res.rows_affected);
        }
        Ok(res.rows_affected as u32)
    }

    /// Outer error: store failure. Inner error: reason recorded on the row.
    async fn dispatch(
        &self,
        post: &posts::Model,
        now: DateTime<Utc>,
    ) -> AppResult<Result<PublishedPost, String>> {
        let credential = match find_linkedin_account(&self.pool, post.user_id).await? {
            None => return Ok(Err("LinkedIn account not connected".to_string())),
            Some(account) if account.is_expired(now) => {
                return Ok(Err("LinkedIn access token has expired".to_string()));
            }
            Some(account) => LinkedInCredential::from(&account),
        };

        Ok(self
            .publish(post, &credential)
            .await
            .map_err(|e| e.dispatch_message()))
    }

    async fn publish(
        &self,
        post: &posts::Model,
        credential: &LinkedInCredential,
    ) -> AppResult<PublishedPost> {
        let call = self
            .adapter
            .post(&post.content, post.image_url.as_deref(), credential);
        match tokio::time::timeout(self.adapter_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(AppError::ExternalApiError(format!(
                "Posting timed out after {}s",
                self.adapter_timeout.as_secs()
            ))),
        }
    }

    async fn mark_posted(
        &self,
        post_id: i64,
        published: &PublishedPost,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        posts::Entity::update_many()
            .set(posts::ActiveModel {
                status: Set(ScheduledPostStatus::Posted),
                linkedin_post_id: Set(Some(published.post_id.clone())),
                linkedin_url: Set(Some(published.url.clone())),
                posted_at: Set(Some(now)),
                error: Set(None),
                updated_at: Set(Some(now)),
                ..Default::default()
            })
            .filter(posts::Column::Id.eq(post_id))
            .filter(posts::Column::Status.eq(ScheduledPostStatus::Dispatching))
            .exec(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_failed(&self, post_id: i64, reason: &str, now: DateTime<Utc>) -> AppResult<()> {
        posts::Entity::update_many()
            .set(posts::ActiveModel {
                status: Set(ScheduledPostStatus::Failed),
                error: Set(Some(reason.to_string())),
                updated_at: Set(Some(now)),
                ..Default::default()
            })
            .filter(posts::Column::Id.eq(post_id))
            .filter(posts::Column::Status.eq(ScheduledPostStatus::Dispatching))
            .exec(&self.pool)
            .await?;
        Ok(())
    }
}

fn due_condition(now: DateTime<Utc>) -> Condition {
    Condition::all()
        .add(posts::Column::Status.is_in(ScheduledPostStatus::unclaimed()))
        .add(Expr::col(posts::Column::Attempts).lt(Expr::col(posts::Column::MaxAttempts)))
        .add(posts::Column::ScheduledTime.lte(now))
}
