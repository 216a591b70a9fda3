use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateCouponRequest {
    #[schema(example = "SAVE20")]
    pub code: String,
    #[schema(example = "pro")]
    pub plan_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuoteRequest {
    #[schema(example = "pro")]
    pub plan_id: String,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CouponSummary {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub discount_type: crate::entities::DiscountType,
    pub value: i64,
}

impl From<&crate::entities::coupon_entity::Model> for CouponSummary {
    fn from(m: &crate::entities::coupon_entity::Model) -> Self {
        Self {
            code: m.code.clone(),
            name: m.name.clone(),
            description: m.description.clone(),
            discount_type: m.discount_type,
            value: m.value,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateCouponResponse {
    pub coupon: CouponSummary,
    pub quote: crate::services::PriceQuote,
}
