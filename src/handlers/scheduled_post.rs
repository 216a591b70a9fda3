use super::current_user_id;
use crate::models::*;
use crate::services::ScheduledPostService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/scheduled-posts",
    tag = "scheduled_post",
    request_body = CreateScheduledPostRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Post scheduled", body = ScheduledPostResponse),
        (status = 400, description = "Too soon, bad content or no LinkedIn connection"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn create_scheduled_post(
    service: web::Data<ScheduledPostService>,
    req: HttpRequest,
    body: web::Json<CreateScheduledPostRequest>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match service.create(user_id, &body.into_inner()).await {
        Ok(post) => Ok(HttpResponse::Ok().json(ApiResponse::success(post))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/scheduled-posts",
    tag = "scheduled_post",
    params(
        ("page" = Option<u32>, Query, description = "Page number (default 1)"),
        ("per_page" = Option<u32>, Query, description = "Page size (default 20)"),
        ("status" = Option<String>, Query, description = "pending / dispatching / posted / failed / cancelled")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Scheduled posts, earliest first", body = PaginatedResponse<ScheduledPostResponse>),
        (status = 400, description = "Unknown status filter"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_scheduled_posts(
    service: web::Data<ScheduledPostService>,
    req: HttpRequest,
    query: web::Query<ScheduledPostQuery>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match service.list(user_id, &query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/scheduled-posts/{id}",
    tag = "scheduled_post",
    params(
        ("id" = i64, Path, description = "Scheduled post id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Scheduled post", body = ScheduledPostResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_scheduled_post(
    service: web::Data<ScheduledPostService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match service.get(user_id, path.into_inner()).await {
        Ok(post) => Ok(HttpResponse::Ok().json(ApiResponse::success(post))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/scheduled-posts/{id}/cancel",
    tag = "scheduled_post",
    params(
        ("id" = i64, Path, description = "Scheduled post id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Post cancelled", body = ScheduledPostResponse),
        (status = 400, description = "Already dispatching, posted, cancelled or out of attempts"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found")
    )
)]
pub async fn cancel_scheduled_post(
    service: web::Data<ScheduledPostService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match service.cancel(user_id, path.into_inner()).await {
        Ok(post) => Ok(HttpResponse::Ok().json(ApiResponse::success(post))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn scheduled_post_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/scheduled-posts")
            .route("", web::post().to(create_scheduled_post))
            .route("", web::get().to(list_scheduled_posts))
            .route("/{id}", web::get().to(get_scheduled_post))
            .route("/{id}/cancel", web::post().to(cancel_scheduled_post)),
    );
}
