pub mod coupon;
pub mod cron;
pub mod linkedin;
pub mod payment;
pub mod scheduled_post;
pub mod webhook;

pub use coupon::coupon_config;
pub use cron::cron_config;
pub use linkedin::linkedin_config;
pub use payment::payment_config;
pub use scheduled_post::scheduled_post_config;
pub use webhook::webhook_config;

use crate::error::AppError;
use actix_web::{HttpMessage, HttpRequest};

/// User id the auth middleware put into the request extensions.
pub(crate) fn current_user_id(req: &HttpRequest) -> Result<i64, AppError> {
    req.extensions()
        .get::<i64>()
        .copied()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::AuthError("Missing access token".to_string()))
}
