use crate::entities::{PaymentStatus, payment_entity};
use crate::services::PriceQuote;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[schema(example = "pro")]
    pub plan_id: String,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub payment_id: i64,
    /// Gateway order id; absent when the coupon made the order free.
    pub order_id: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub key_id: String,
    pub status: PaymentStatus,
    pub quote: PriceQuote,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: i64,
    pub plan_id: String,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub base_amount: i64,
    pub discount_amount: i64,
    pub final_amount: i64,
    pub currency: String,
    pub coupon_code: Option<String>,
    pub status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<payment_entity::Model> for PaymentResponse {
    fn from(m: payment_entity::Model) -> Self {
        Self {
            id: m.id,
            plan_id: m.plan_id,
            razorpay_order_id: m.razorpay_order_id,
            razorpay_payment_id: m.razorpay_payment_id,
            base_amount: m.base_amount,
            discount_amount: m.discount_amount,
            final_amount: m.final_amount,
            currency: m.currency,
            coupon_code: m.coupon_code,
            status: m.status,
            paid_at: m.paid_at,
            created_at: m.created_at,
        }
    }
}
