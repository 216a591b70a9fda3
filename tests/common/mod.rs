#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use linkzup_backend::AppResult;
use linkzup_backend::config::RazorpayConfig;
use linkzup_backend::database::create_tables;
use linkzup_backend::entities::{
    DiscountType, PostPlatform, ScheduledPostStatus, coupon_entity, linkedin_account_entity,
    plan_entity, scheduled_post_entity,
};
use linkzup_backend::utils::time;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};

pub const KEY_SECRET: &str = "test_key_secret";
pub const WEBHOOK_SECRET: &str = "test_webhook_secret";

/// Single-connection in-memory SQLite with every table created.
pub async fn setup_test_db() -> AppResult<DatabaseConnection> {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opts).await?;
    create_tables(&db).await?;
    Ok(db)
}

pub fn razorpay_config() -> RazorpayConfig {
    RazorpayConfig {
        key_id: "rzp_test_key".to_string(),
        key_secret: KEY_SECRET.to_string(),
        webhook_secret: WEBHOOK_SECRET.to_string(),
        // never reached by these tests
        base_url: "http://127.0.0.1:9".to_string(),
        currency: "INR".to_string(),
    }
}

pub async fn create_plan(db: &DatabaseConnection, id: &str, price: i64) -> plan_entity::Model {
    plan_entity::ActiveModel {
        id: Set(id.to_string()),
        name: Set(format!("{id} plan")),
        price: Set(price),
        duration_days: Set(30),
        is_active: Set(true),
        created_at: Set(Some(time::now())),
    }
    .insert(db)
    .await
    .unwrap()
}

/// `SAVE20`: 20% off, capped at ₹100, minimum ₹50, 100 uses, once per user.
pub fn save20() -> coupon_entity::ActiveModel {
    let now = time::now();
    coupon_entity::ActiveModel {
        code: Set("SAVE20".to_string()),
        name: Set("Save 20%".to_string()),
        description: Set(Some("20% off any plan".to_string())),
        discount_type: Set(DiscountType::Percentage),
        value: Set(20),
        min_amount: Set(Some(5000)),
        max_discount: Set(Some(10000)),
        usage_limit: Set(Some(100)),
        usage_count: Set(0),
        per_user_limit: Set(Some(1)),
        valid_from: Set(now - Duration::days(1)),
        valid_until: Set(now + Duration::days(30)),
        applicable_plans: Set(String::new()),
        is_active: Set(true),
        created_at: Set(Some(now)),
        updated_at: Set(Some(now)),
        ..Default::default()
    }
}

pub async fn insert_coupon(
    db: &DatabaseConnection,
    coupon: coupon_entity::ActiveModel,
) -> coupon_entity::Model {
    coupon.insert(db).await.unwrap()
}

pub async fn link_account(
    db: &DatabaseConnection,
    user_id: i64,
    expires_at: Option<DateTime<Utc>>,
) -> linkedin_account_entity::Model {
    let now = time::now();
    linkedin_account_entity::ActiveModel {
        user_id: Set(user_id),
        access_token: Set(format!("token-{user_id}")),
        profile_id: Set(format!("profile{user_id}")),
        expires_at: Set(expires_at),
        created_at: Set(Some(now)),
        updated_at: Set(Some(now)),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

/// Inserts a row directly, bypassing the lead-time check.
pub async fn insert_post(
    db: &DatabaseConnection,
    user_id: i64,
    content: &str,
    scheduled_time: DateTime<Utc>,
    status: ScheduledPostStatus,
    attempts: i32,
    max_attempts: i32,
) -> scheduled_post_entity::Model {
    let now = time::now();
    scheduled_post_entity::ActiveModel {
        user_id: Set(user_id),
        platform: Set(PostPlatform::Linkedin),
        content: Set(content.to_string()),
        image_url: Set(None),
        scheduled_time: Set(scheduled_time),
        scheduled_time_display: Set(time::format_display(scheduled_time)),
        status: Set(status),
        attempts: Set(attempts),
        max_attempts: Set(max_attempts),
        created_at: Set(Some(now)),
        updated_at: Set(Some(now)),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}
