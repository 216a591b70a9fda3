use crate::entities::coupon_entity::{self as coupons, normalize_code};
use crate::entities::{coupon_usage_entity as usages, plan_entity as plans};
use crate::error::{AppError, AppResult};
use crate::models::{CouponSummary, ValidateCouponResponse};
use crate::services::pricing::{CouponRejection, PriceQuote, QuoteInput, calculate_price_quote};
use crate::utils::time;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, Set,
};

/// A quote together with the records it was computed from.
#[derive(Debug, Clone)]
pub struct QuotedPlan {
    pub plan: plans::Model,
    /// Present only when the coupon passed every rule.
    pub coupon: Option<coupons::Model>,
    pub quote: PriceQuote,
}

#[derive(Clone)]
pub struct CouponService {
    pool: DatabaseConnection,
}

impl CouponService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn find_by_code(&self, code: &str) -> AppResult<Option<coupons::Model>> {
        let coupon = coupons::Entity::find()
            .filter(coupons::Column::Code.eq(normalize_code(code)))
            .one(&self.pool)
            .await?;
        Ok(coupon)
    }

    pub async fn find_plan(&self, plan_id: &str) -> AppResult<plans::Model> {
        plans::Entity::find_by_id(plan_id.to_string())
            .filter(plans::Column::IsActive.eq(true))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Plan {plan_id} not found")))
    }

    /// Number of `CouponUsage` rows the user already has for this coupon.
    pub async fn count_user_redemptions<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
        coupon_id: i64,
    ) -> AppResult<u64> {
        let count = usages::Entity::find()
            .filter(usages::Column::UserId.eq(user_id))
            .filter(usages::Column::CouponId.eq(coupon_id))
            .count(db)
            .await?;
        Ok(count)
    }

    /// Prices `plan_id` for `user_id`, applying `coupon_code` when given.
    ///
    /// A blank code is treated as no coupon. An unknown code or a negative
    /// plan price yields an invalid quote rather than an error so callers can
    /// surface the reason.
    pub async fn quote(
        &self,
        user_id: i64,
        plan_id: &str,
        coupon_code: Option<&str>,
    ) -> AppResult<QuotedPlan> {
        let plan = self.find_plan(plan_id).await?;
        let now = time::now();

        let base_quote = calculate_price_quote(QuoteInput {
            base_amount: plan.price,
            coupon: None,
            plan_id: &plan.id,
            user_redemptions: 0,
            now,
        });
        let code = coupon_code.map(str::trim).filter(|c| !c.is_empty());
        let Some(code) = code.filter(|_| base_quote.is_valid) else {
            return Ok(QuotedPlan {
                quote: base_quote,
                plan,
                coupon: None,
            });
        };

        let Some(coupon) = self.find_by_code(code).await? else {
            return Ok(QuotedPlan {
                quote: PriceQuote::rejected(plan.price, &CouponRejection::UnknownCode),
                plan,
                coupon: None,
            });
        };

        let user_redemptions =
            Self::count_user_redemptions(&self.pool, user_id, coupon.id).await?;
        let quote = calculate_price_quote(QuoteInput {
            base_amount: plan.price,
            coupon: Some(&coupon),
            plan_id: &plan.id,
            user_redemptions,
            now,
        });

        if !quote.is_valid {
            log::warn!(
                "Coupon {} rejected for user {} on plan {}: {}",
                coupon.code,
                user_id,
                plan.id,
                quote.error.as_deref().unwrap_or_default()
            );
        }

        Ok(QuotedPlan {
            coupon: quote.is_valid.then_some(coupon),
            plan,
            quote,
        })
    }

    /// Like [`quote`](Self::quote) but a rejected coupon is an error.
    pub async fn validate(
        &self,
        user_id: i64,
        code: &str,
        plan_id: &str,
    ) -> AppResult<ValidateCouponResponse> {
        if code.trim().is_empty() {
            return Err(AppError::ValidationError("Coupon code is required".into()));
        }
        let quoted = self.quote(user_id, plan_id, Some(code)).await?;
        match quoted.coupon {
            Some(coupon) => Ok(ValidateCouponResponse {
                coupon: CouponSummary::from(&coupon),
                quote: quoted.quote,
            }),
            None => Err(AppError::ValidationError(
                quoted
                    .quote
                    .error
                    .unwrap_or_else(|| CouponRejection::UnknownCode.to_string()),
            )),
        }
    }

    /// Records one redemption for a captured payment.
    ///
    /// Must run inside the capture transaction. The counter is bumped with a
    /// single `usage_count = usage_count + 1` guarded by the usage limit; when
    /// the guard fails the usage row is still written because the money has
    /// already moved.
    pub async fn record_redemption<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
        coupon_id: i64,
        coupon_code: &str,
        payment_id: i64,
        discount_amount: i64,
    ) -> AppResult<()> {
        let now = time::now();

        usages::ActiveModel {
            user_id: Set(user_id),
            coupon_id: Set(coupon_id),
            coupon_code: Set(coupon_code.to_string()),
            payment_id: Set(payment_id),
            discount_amount: Set(discount_amount),
            created_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(db)
        .await?;

        let res = coupons::Entity::update_many()
            .col_expr(
                coupons::Column::UsageCount,
                Expr::col(coupons::Column::UsageCount).add(1),
            )
            .col_expr(coupons::Column::UpdatedAt, Expr::value(Some(now)))
            .filter(coupons::Column::Id.eq(coupon_id))
            .filter(
                Condition::any()
                    .add(coupons::Column::UsageLimit.is_null())
                    .add(
                        Expr::col(coupons::Column::UsageCount)
                            .lt(Expr::col(coupons::Column::UsageLimit)),
                    ),
            )
            .exec(db)
            .await?;

        if res.rows_affected == 0 {
            log::warn!(
                "Coupon {coupon_code} usage limit already reached when recording payment \
                 {payment_id}"
            );
        }
        Ok(())
    }
}
