//! Coupon price rules.
//!
//! [`calculate_price_quote`] is a pure function of the base amount, a coupon
//! snapshot, the target plan, the user's prior redemption count and the
//! current time. Rules are checked in a fixed order and the first violation
//! wins. Amounts are integer minor units (paise) throughout.

use crate::entities::{DiscountType, coupon_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Why a coupon could not be applied. `Display` is the user-facing reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CouponRejection {
    UnknownCode,
    Inactive,
    NotYetValid { valid_from: DateTime<Utc> },
    Expired { valid_until: DateTime<Utc> },
    UsageLimitReached,
    PerUserLimitReached { limit: i64 },
    PlanNotEligible { plan_id: String },
    MinimumAmountNotMet { min_amount: i64 },
    NegativeAmount,
}

impl std::fmt::Display for CouponRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CouponRejection::UnknownCode => write!(f, "Invalid coupon code"),
            CouponRejection::Inactive => write!(f, "This coupon is no longer active"),
            CouponRejection::NotYetValid { valid_from } => write!(
                f,
                "This coupon is not valid until {}",
                valid_from.format("%Y-%m-%d %H:%M UTC")
            ),
            CouponRejection::Expired { valid_until } => write!(
                f,
                "This coupon expired on {}",
                valid_until.format("%Y-%m-%d %H:%M UTC")
            ),
            CouponRejection::UsageLimitReached => {
                write!(f, "This coupon has reached its usage limit")
            }
            CouponRejection::PerUserLimitReached { limit } => write!(
                f,
                "You have already used this coupon the maximum number of times ({limit})"
            ),
            CouponRejection::PlanNotEligible { plan_id } => {
                write!(f, "This coupon is not applicable to the {plan_id} plan")
            }
            CouponRejection::MinimumAmountNotMet { min_amount } => write!(
                f,
                "Minimum order amount of {} is required for this coupon",
                format_rupees(*min_amount)
            ),
            CouponRejection::NegativeAmount => write!(f, "Order amount cannot be negative"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub is_valid: bool,
    pub base_amount: i64,
    pub discount_amount: i64,
    pub final_amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PriceQuote {
    pub fn undiscounted(base_amount: i64) -> Self {
        Self {
            is_valid: true,
            base_amount,
            discount_amount: 0,
            final_amount: base_amount,
            error: None,
        }
    }

    pub fn rejected(base_amount: i64, reason: &CouponRejection) -> Self {
        Self {
            is_valid: false,
            base_amount,
            discount_amount: 0,
            final_amount: base_amount,
            error: Some(reason.to_string()),
        }
    }
}

pub struct QuoteInput<'a> {
    pub base_amount: i64,
    pub coupon: Option<&'a coupon_entity::Model>,
    pub plan_id: &'a str,
    /// `CouponUsage` rows this user already has for `coupon`.
    pub user_redemptions: u64,
    pub now: DateTime<Utc>,
}

/// A negative base amount is rejected before any coupon rule runs.
pub fn calculate_price_quote(input: QuoteInput<'_>) -> PriceQuote {
    let base = input.base_amount;
    if base < 0 {
        return PriceQuote::rejected(base, &CouponRejection::NegativeAmount);
    }
    let Some(coupon) = input.coupon else {
        return PriceQuote::undiscounted(base);
    };

    match check_coupon(coupon, base, input.plan_id, input.user_redemptions, input.now) {
        Ok(()) => {
            let discount = discount_for(coupon, base);
            PriceQuote {
                is_valid: true,
                base_amount: base,
                discount_amount: discount,
                final_amount: base - discount,
                error: None,
            }
        }
        Err(reason) => PriceQuote::rejected(base, &reason),
    }
}

/// Rules 1-6, in order.
pub fn check_coupon(
    coupon: &coupon_entity::Model,
    base_amount: i64,
    plan_id: &str,
    user_redemptions: u64,
    now: DateTime<Utc>,
) -> Result<(), CouponRejection> {
    if !coupon.is_active {
        return Err(CouponRejection::Inactive);
    }
    if now < coupon.valid_from {
        return Err(CouponRejection::NotYetValid {
            valid_from: coupon.valid_from,
        });
    }
    if now > coupon.valid_until {
        return Err(CouponRejection::Expired {
            valid_until: coupon.valid_until,
        });
    }
    if let Some(limit) = coupon.usage_limit
        && coupon.usage_count >= limit
    {
        return Err(CouponRejection::UsageLimitReached);
    }
    if let Some(limit) = coupon.per_user_limit
        && user_redemptions as i64 >= limit
    {
        return Err(CouponRejection::PerUserLimitReached { limit });
    }
    let plans = coupon.applicable_plan_ids();
    if !plans.is_empty() && !plans.contains(&plan_id) {
        return Err(CouponRejection::PlanNotEligible {
            plan_id: plan_id.to_string(),
        });
    }
    if let Some(min_amount) = coupon.min_amount
        && base_amount < min_amount
    {
        return Err(CouponRejection::MinimumAmountNotMet { min_amount });
    }
    Ok(())
}

/// Rules 7-8: the raw discount, capped for percentages and never above `base`.
pub fn discount_for(coupon: &coupon_entity::Model, base_amount: i64) -> i64 {
    let base = base_amount.max(0);
    let raw = match coupon.discount_type {
        DiscountType::Percentage => {
            let pct = percentage_of(base, coupon.value);
            match coupon.max_discount {
                Some(cap) if pct > cap => cap,
                _ => pct,
            }
        }
        DiscountType::Fixed => coupon.value,
    };
    raw.clamp(0, base)
}

/// `round(base * percent / 100)` with half-up integer rounding.
fn percentage_of(base: i64, percent: i64) -> i64 {
    let scaled = (base as i128) * (percent.max(0) as i128);
    ((scaled + 50) / 100).min(i64::MAX as i128) as i64
}

fn format_rupees(paise: i64) -> String {
    if paise % 100 == 0 {
        format!("₹{}", paise / 100)
    } else {
        format!("₹{}.{:02}", paise / 100, paise % 100)
    }
}
