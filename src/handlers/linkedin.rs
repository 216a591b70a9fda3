use super::current_user_id;
use crate::models::*;
use crate::services::ScheduledPostService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    put,
    path = "/linkedin/account",
    tag = "linkedin",
    request_body = LinkLinkedInAccountRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Credential stored", body = LinkedInAccountStatus),
        (status = 400, description = "Missing token or profile id"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn link_account(
    service: web::Data<ScheduledPostService>,
    req: HttpRequest,
    body: web::Json<LinkLinkedInAccountRequest>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match service.link_account(user_id, &body.into_inner()).await {
        Ok(status) => Ok(HttpResponse::Ok().json(ApiResponse::success(status))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/linkedin/account",
    tag = "linkedin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Connection status (token never returned)", body = LinkedInAccountStatus),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_account(
    service: web::Data<ScheduledPostService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match service.account_status(user_id).await {
        Ok(status) => Ok(HttpResponse::Ok().json(ApiResponse::success(status))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn linkedin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/linkedin")
            .route("/account", web::put().to(link_account))
            .route("/account", web::get().to(get_account)),
    );
}
