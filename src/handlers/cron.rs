use crate::config::CronConfig;
use crate::error::AppError;
use crate::models::ApiResponse;
use crate::services::PostDispatcher;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

pub const CRON_SECRET_HEADER: &str = "x-cron-secret";

fn check_cron_secret(expected: &str, provided: Option<&str>) -> Result<(), AppError> {
    if expected.is_empty() {
        return Err(AppError::Forbidden);
    }
    match provided {
        Some(secret) if constant_time_eq(secret.as_bytes(), expected.as_bytes()) => Ok(()),
        _ => Err(AppError::AuthError("Invalid cron secret".to_string())),
    }
}

/// Compares every byte regardless of where the first mismatch is.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// External trigger for one dispatcher sweep.
pub async fn auto_post(
    req: HttpRequest,
    cron: web::Data<CronConfig>,
    dispatcher: web::Data<PostDispatcher>,
) -> Result<HttpResponse> {
    let provided = req
        .headers()
        .get(CRON_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());
    if let Err(e) = check_cron_secret(&cron.secret, provided) {
        log::warn!("Rejected cron trigger: {e}");
        return Ok(e.error_response());
    }

    match dispatcher.run_sweep().await {
        Ok(report) => Ok(HttpResponse::Ok().json(ApiResponse::success(report))),
        Err(e) => {
            log::error!("Sweep aborted: {e}");
            Ok(e.error_response())
        }
    }
}

pub fn cron_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/cron").route("/auto-post", web::post().to(auto_post)));
}
