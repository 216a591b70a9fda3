use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{DiscountType, PaymentStatus, ScheduledPostStatus};
use crate::handlers;
use crate::models::*;
use crate::services::PriceQuote;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::coupon::validate_coupon,
        handlers::coupon::price_quote,
        handlers::payment::create_order,
        handlers::payment::verify_payment,
        handlers::payment::get_payments,
        handlers::scheduled_post::create_scheduled_post,
        handlers::scheduled_post::list_scheduled_posts,
        handlers::scheduled_post::get_scheduled_post,
        handlers::scheduled_post::cancel_scheduled_post,
        handlers::linkedin::link_account,
        handlers::linkedin::get_account,
    ),
    components(
        schemas(
            ApiError,
            PriceQuote,
            PriceQuoteRequest,
            ValidateCouponRequest,
            ValidateCouponResponse,
            CouponSummary,
            DiscountType,
            CreateOrderRequest,
            CreateOrderResponse,
            VerifyPaymentRequest,
            PaymentResponse,
            PaymentStatus,
            CreateScheduledPostRequest,
            ScheduledPostResponse,
            ScheduledPostStatus,
            SweepReport,
            LinkLinkedInAccountRequest,
            LinkedInAccountStatus,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "coupon", description = "Coupon validation and price quotes"),
        (name = "payment", description = "Razorpay checkout"),
        (name = "scheduled_post", description = "Scheduled LinkedIn posts"),
        (name = "linkedin", description = "LinkedIn posting credential"),
    ),
    info(
        title = "LinkZup Backend API",
        version = "1.0.0",
        description = "Pricing, checkout and scheduled LinkedIn posting"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
