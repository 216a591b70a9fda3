use super::current_user_id;
use crate::models::*;
use crate::services::{CouponService, PriceQuote};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/coupons/validate",
    tag = "coupon",
    request_body = ValidateCouponRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Coupon applies to the plan", body = ValidateCouponResponse),
        (status = 400, description = "Coupon rejected, message carries the reason"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Plan not found")
    )
)]
pub async fn validate_coupon(
    service: web::Data<CouponService>,
    req: HttpRequest,
    body: web::Json<ValidateCouponRequest>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match service.validate(user_id, &body.code, &body.plan_id).await {
        Ok(data) => Ok(HttpResponse::Ok().json(ApiResponse::success(data))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/price-quote",
    tag = "coupon",
    request_body = PriceQuoteRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Quote; isValid=false with error when the coupon is rejected", body = PriceQuote),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Plan not found")
    )
)]
pub async fn price_quote(
    service: web::Data<CouponService>,
    req: HttpRequest,
    body: web::Json<PriceQuoteRequest>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match service
        .quote(user_id, &body.plan_id, body.coupon_code.as_deref())
        .await
    {
        Ok(quoted) => Ok(HttpResponse::Ok().json(ApiResponse::success(quoted.quote))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn coupon_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/coupons/validate", web::post().to(validate_coupon))
        .route("/price-quote", web::post().to(price_quote));
}
