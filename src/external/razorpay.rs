use crate::config::RazorpayConfig;
use crate::error::{AppError, AppResult};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::HashMap;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
    notes: &'a HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RazorpayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    pub status: String,
}

/// Webhook envelope; only the fields the capture flow needs.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub payload: WebhookPayload,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub payment: Option<EntityWrapper<PaymentEntity>>,
    #[serde(default)]
    pub order: Option<EntityWrapper<OrderEntity>>,
}

#[derive(Debug, Deserialize)]
pub struct EntityWrapper<T> {
    pub entity: T,
}

#[derive(Debug, Deserialize)]
pub struct PaymentEntity {
    pub id: String,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OrderEntity {
    pub id: String,
    #[serde(default)]
    pub status: String,
}

impl WebhookEvent {
    pub fn order_id(&self) -> Option<&str> {
        self.payload
            .payment
            .as_ref()
            .and_then(|p| p.entity.order_id.as_deref())
            .or_else(|| self.payload.order.as_ref().map(|o| o.entity.id.as_str()))
    }

    pub fn payment_id(&self) -> Option<&str> {
        self.payload.payment.as_ref().map(|p| p.entity.id.as_str())
    }
}

#[derive(Clone)]
pub struct RazorpayService {
    client: Client,
    config: RazorpayConfig,
}

impl RazorpayService {
    pub fn new(config: RazorpayConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn key_id(&self) -> &str {
        &self.config.key_id
    }

    pub fn currency(&self) -> &str {
        &self.config.currency
    }

    /// Creates a gateway order for `amount` paise.
    pub async fn create_order(
        &self,
        amount: i64,
        receipt: &str,
        notes: &HashMap<String, String>,
    ) -> AppResult<RazorpayOrder> {
        let url = format!("{}/v1/orders", self.config.base_url.trim_end_matches('/'));
        let body = CreateOrderBody {
            amount,
            currency: &self.config.currency,
            receipt,
            notes,
        };

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(&body)
            .send()
            .await?;

        if response.status().is_success() {
            let order: RazorpayOrder = response.json().await?;
            Ok(order)
        } else {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            Err(AppError::ExternalApiError(format!(
                "Failed to create Razorpay order: HTTP {}: {}",
                status.as_u16(),
                error_text
            )))
        }
    }

    /// Checkout callback signature: HMAC-SHA256(`order_id|payment_id`, key_secret).
    pub fn verify_payment_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> AppResult<()> {
        let payload = format!("{order_id}|{payment_id}");
        if verify_signature(
            self.config.key_secret.as_bytes(),
            payload.as_bytes(),
            signature,
        ) {
            Ok(())
        } else {
            Err(AppError::ValidationError(
                "Invalid payment signature".to_string(),
            ))
        }
    }

    /// Webhook signature: HMAC-SHA256(raw body, webhook_secret).
    pub fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> AppResult<()> {
        if self.config.webhook_secret.is_empty() {
            return Err(AppError::ConfigError(
                "Razorpay webhook secret is not configured".to_string(),
            ));
        }
        if verify_signature(self.config.webhook_secret.as_bytes(), payload, signature) {
            Ok(())
        } else {
            Err(AppError::AuthError("Invalid webhook signature".to_string()))
        }
    }
}

pub fn sign(secret: &[u8], payload: &[u8]) -> String {
    match HmacSha256::new_from_slice(secret) {
        Ok(mut mac) => {
            mac.update(payload);
            hex::encode(mac.finalize().into_bytes())
        }
        Err(_) => String::new(),
    }
}

fn verify_signature(secret: &[u8], payload: &[u8], signature_hex: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(payload);
    // constant-time comparison
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> RazorpayService {
        RazorpayService::new(RazorpayConfig {
            key_id: "rzp_test_123".to_string(),
            key_secret: "key_secret".to_string(),
            webhook_secret: "whsec_123".to_string(),
            base_url: "https://api.razorpay.com".to_string(),
            currency: "INR".to_string(),
        })
    }

    #[test]
    fn hmac_known_vector() {
        assert_eq!(
            sign(b"key", b"The quick brown fox jumps over the lazy dog"),
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    #[test]
    fn payment_signature_round_trip() {
        let svc = service();
        let sig = sign(b"key_secret", b"order_ABC|pay_XYZ");
        assert!(svc.verify_payment_signature("order_ABC", "pay_XYZ", &sig).is_ok());
        assert!(svc.verify_payment_signature("order_ABC", "pay_OTHER", &sig).is_err());
        assert!(svc.verify_payment_signature("order_ABC", "pay_XYZ", "not-hex").is_err());
    }

    #[test]
    fn webhook_signature_uses_webhook_secret() {
        let svc = service();
        let body = br#"{"event":"payment.captured"}"#;
        let good = sign(b"whsec_123", body);
        let wrong_key = sign(b"key_secret", body);
        assert!(svc.verify_webhook_signature(body, &good).is_ok());
        assert!(svc.verify_webhook_signature(body, &wrong_key).is_err());
    }

    #[test]
    fn parses_captured_event() {
        let raw = r#"{
            "entity": "event",
            "event": "payment.captured",
            "payload": {
                "payment": {
                    "entity": {
                        "id": "pay_29QQoUBi66xm2f",
                        "order_id": "order_9A33XWu170gUtm",
                        "amount": 40000,
                        "status": "captured"
                    }
                }
            }
        }"#;
        let event: WebhookEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.event, "payment.captured");
        assert_eq!(event.order_id(), Some("order_9A33XWu170gUtm"));
        assert_eq!(event.payment_id(), Some("pay_29QQoUBi66xm2f"));
    }

    #[test]
    fn order_paid_falls_back_to_order_entity() {
        let raw = r#"{"event":"order.paid","payload":{"order":{"entity":{"id":"order_1","status":"paid"}}}}"#;
        let event: WebhookEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.order_id(), Some("order_1"));
        assert_eq!(event.payment_id(), None);
    }
}
