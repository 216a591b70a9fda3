use crate::external::WebhookEvent;
use crate::services::PaymentService;
use actix_web::{HttpRequest, HttpResponse, Result, web};
use log::{error, info, warn};

/// Razorpay webhook.
///
/// Signature failures get 401. Once the signature checks out the gateway
/// always gets 200, processing errors are only logged.
pub async fn razorpay_webhook(
    req: HttpRequest,
    body: web::Bytes,
    payment_service: web::Data<PaymentService>,
) -> Result<HttpResponse> {
    let signature = match req.headers().get("x-razorpay-signature") {
        Some(sig) => sig.to_str().unwrap_or(""),
        None => {
            warn!("Missing X-Razorpay-Signature header");
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Missing X-Razorpay-Signature header"
            })));
        }
    };

    if let Err(e) = payment_service.verify_webhook_signature(&body, signature) {
        error!("Webhook signature verification failed: {e}");
        return Ok(HttpResponse::Unauthorized().json(serde_json::json!({
            "error": "Invalid signature"
        })));
    }

    let event: WebhookEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            error!("Unparseable Razorpay webhook payload: {e}");
            return Ok(HttpResponse::Ok().json(serde_json::json!({
                "received": true,
                "error": "Unparseable payload"
            })));
        }
    };

    info!("Received Razorpay webhook event: {}", event.event);

    match payment_service.handle_webhook_event(&event).await {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({ "received": true }))),
        Err(e) => {
            error!("Failed to process webhook event {}: {e}", event.event);
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "received": true,
                "error": format!("Processing failed: {}", e)
            })))
        }
    }
}

pub fn webhook_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/webhook").route("/razorpay", web::post().to(razorpay_webhook)));
}
