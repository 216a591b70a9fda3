use super::current_user_id;
use crate::models::*;
use crate::services::PaymentService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/payments/create-order",
    tag = "payment",
    request_body = CreateOrderRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Order created (or completed when free)", body = CreateOrderResponse),
        (status = 400, description = "Coupon rejected"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Plan not found"),
        (status = 502, description = "Payment gateway error")
    )
)]
pub async fn create_order(
    service: web::Data<PaymentService>,
    req: HttpRequest,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match service.create_order(user_id, &body.into_inner()).await {
        Ok(data) => Ok(HttpResponse::Ok().json(ApiResponse::success(data))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/payments/verify",
    tag = "payment",
    request_body = VerifyPaymentRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Payment captured", body = PaymentResponse),
        (status = 400, description = "Invalid signature"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Payment not found")
    )
)]
pub async fn verify_payment(
    service: web::Data<PaymentService>,
    req: HttpRequest,
    body: web::Json<VerifyPaymentRequest>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match service.verify_payment(user_id, &body.into_inner()).await {
        Ok(data) => Ok(HttpResponse::Ok().json(ApiResponse::success(data))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/payments",
    tag = "payment",
    params(
        ("page" = Option<u32>, Query, description = "Page number (default 1)"),
        ("per_page" = Option<u32>, Query, description = "Page size (default 20)")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Payments, newest first", body = PaginatedResponse<PaymentResponse>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_payments(
    service: web::Data<PaymentService>,
    req: HttpRequest,
    query: web::Query<PaymentQuery>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match service.list_payments(user_id, &query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn payment_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payments")
            .route("", web::get().to(get_payments))
            .route("/create-order", web::post().to(create_order))
            .route("/verify", web::post().to(verify_payment)),
    );
}
