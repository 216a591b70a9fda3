use crate::entities::{PaymentStatus, payment_entity as payments};
use crate::error::{AppError, AppResult};
use crate::external::{RazorpayService, WebhookEvent};
use crate::models::{
    CreateOrderRequest, CreateOrderResponse, PaginatedResponse, PaginationParams, PaymentQuery,
    PaymentResponse, VerifyPaymentRequest,
};
use crate::services::CouponService;
use crate::utils::time;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Clone)]
pub struct PaymentService {
    pool: DatabaseConnection,
    coupon_service: CouponService,
    razorpay: RazorpayService,
}

impl PaymentService {
    pub fn new(
        pool: DatabaseConnection,
        coupon_service: CouponService,
        razorpay: RazorpayService,
    ) -> Self {
        Self {
            pool,
            coupon_service,
            razorpay,
        }
    }

    /// 1. quote (a rejected coupon fails the request with its reason)
    /// 2. insert the `created` payment row
    /// 3. free orders are captured immediately, others get a gateway order
    pub async fn create_order(
        &self,
        user_id: i64,
        req: &CreateOrderRequest,
    ) -> AppResult<CreateOrderResponse> {
        let quoted = self
            .coupon_service
            .quote(user_id, &req.plan_id, req.coupon_code.as_deref())
            .await?;
        if !quoted.quote.is_valid {
            return Err(AppError::ValidationError(
                quoted
                    .quote
                    .error
                    .unwrap_or_else(|| "Invalid coupon".to_string()),
            ));
        }

        let now = time::now();
        // gateway caps receipts at 40 chars
        let receipt = format!("rcpt_{}", Uuid::new_v4().simple());
        let payment = payments::ActiveModel {
            user_id: Set(user_id),
            plan_id: Set(quoted.plan.id.clone()),
            receipt: Set(receipt.clone()),
            base_amount: Set(quoted.quote.base_amount),
            discount_amount: Set(quoted.quote.discount_amount),
            final_amount: Set(quoted.quote.final_amount),
            currency: Set(self.razorpay.currency().to_string()),
            coupon_id: Set(quoted.coupon.as_ref().map(|c| c.id)),
            coupon_code: Set(quoted.coupon.as_ref().map(|c| c.code.clone())),
            status: Set(PaymentStatus::Created),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        if payment.final_amount == 0 {
            self.capture(payment.id, None).await?;
            log::info!(
                "Payment {} for user {} completed without charge",
                payment.id,
                user_id
            );
            return Ok(CreateOrderResponse {
                payment_id: payment.id,
                order_id: None,
                amount: 0,
                currency: payment.currency,
                key_id: self.razorpay.key_id().to_string(),
                status: PaymentStatus::Paid,
                quote: quoted.quote,
            });
        }

        let mut notes = HashMap::new();
        notes.insert("user_id".to_string(), user_id.to_string());
        notes.insert("plan_id".to_string(), payment.plan_id.clone());
        notes.insert("payment_id".to_string(), payment.id.to_string());
        if let Some(code) = &payment.coupon_code {
            notes.insert("coupon_code".to_string(), code.clone());
        }

        let order = match self
            .razorpay
            .create_order(payment.final_amount, &receipt, &notes)
            .await
        {
            Ok(order) => order,
            Err(e) => {
                log::error!("Razorpay order creation failed for payment {}: {}", payment.id, e);
                let mut am = payment.into_active_model();
                am.status = Set(PaymentStatus::Failed);
                am.updated_at = Set(Some(time::now()));
                am.update(&self.pool).await?;
                return Err(e);
            }
        };

        let mut am = payment.into_active_model();
        am.razorpay_order_id = Set(Some(order.id.clone()));
        am.updated_at = Set(Some(time::now()));
        let payment = am.update(&self.pool).await?;

        Ok(CreateOrderResponse {
            payment_id: payment.id,
            order_id: Some(order.id),
            amount: payment.final_amount,
            currency: payment.currency,
            key_id: self.razorpay.key_id().to_string(),
            status: payment.status,
            quote: quoted.quote,
        })
    }

    /// Checkout callback: signature check, then capture.
    pub async fn verify_payment(
        &self,
        user_id: i64,
        req: &VerifyPaymentRequest,
    ) -> AppResult<PaymentResponse> {
        self.razorpay.verify_payment_signature(
            &req.razorpay_order_id,
            &req.razorpay_payment_id,
            &req.razorpay_signature,
        )?;

        let payment = payments::Entity::find()
            .filter(payments::Column::RazorpayOrderId.eq(req.razorpay_order_id.as_str()))
            .filter(payments::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".into()))?;

        self.capture(payment.id, Some(&req.razorpay_payment_id))
            .await?;
        self.get_payment(payment.id).await.map(Into::into)
    }

    pub fn verify_webhook_signature(&self, body: &[u8], signature: &str) -> AppResult<()> {
        self.razorpay.verify_webhook_signature(body, signature)
    }

    pub async fn handle_webhook_event(&self, event: &WebhookEvent) -> AppResult<()> {
        match event.event.as_str() {
            "payment.captured" | "order.paid" => {
                let Some(order_id) = event.order_id() else {
                    log::warn!("Webhook {} carried no order id", event.event);
                    return Ok(());
                };
                match self.find_by_order_id(order_id).await? {
                    Some(payment) => {
                        self.capture(payment.id, event.payment_id()).await?;
                    }
                    None => log::warn!("Webhook {} for unknown order {}", event.event, order_id),
                }
            }
            "payment.failed" => {
                if let Some(order_id) = event.order_id() {
                    self.mark_failed(order_id).await?;
                }
            }
            other => log::debug!("Ignoring Razorpay webhook event {other}"),
        }
        Ok(())
    }

    /// Moves a payment to `paid` exactly once and records its coupon usage in
    /// the same transaction. Returns `false` when it was already paid.
    pub async fn capture(
        &self,
        payment_id: i64,
        razorpay_payment_id: Option<&str>,
    ) -> AppResult<bool> {
        let now = time::now();
        let txn = self.pool.begin().await?;

        let mut changes = payments::ActiveModel {
            status: Set(PaymentStatus::Paid),
            paid_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        };
        if let Some(id) = razorpay_payment_id {
            changes.razorpay_payment_id = Set(Some(id.to_string()));
        }

        let res = payments::Entity::update_many()
            .set(changes)
            .filter(payments::Column::Id.eq(payment_id))
            .filter(payments::Column::Status.ne(PaymentStatus::Paid))
            .exec(&txn)
            .await?;

        if res.rows_affected == 0 {
            txn.commit().await?;
            log::debug!("Payment {payment_id} already captured");
            return Ok(false);
        }

        let payment = payments::Entity::find_by_id(payment_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".into()))?;

        if let (Some(coupon_id), Some(code)) = (payment.coupon_id, payment.coupon_code.as_deref()) {
            CouponService::record_redemption(
                &txn,
                payment.user_id,
                coupon_id,
                code,
                payment.id,
                payment.discount_amount,
            )
            .await?;
        }

        txn.commit().await?;
        log::info!(
            "Payment {} captured for user {} ({} {})",
            payment.id,
            payment.user_id,
            payment.final_amount,
            payment.currency
        );
        Ok(true)
    }

    /// Only a payment still in `created` can fail.
    pub async fn mark_failed(&self, razorpay_order_id: &str) -> AppResult<bool> {
        let res = payments::Entity::update_many()
            .set(payments::ActiveModel {
                status: Set(PaymentStatus::Failed),
                updated_at: Set(Some(time::now())),
                ..Default::default()
            })
            .filter(payments::Column::RazorpayOrderId.eq(razorpay_order_id))
            .filter(payments::Column::Status.eq(PaymentStatus::Created))
            .exec(&self.pool)
            .await?;
        if res.rows_affected > 0 {
            log::warn!("Payment for order {razorpay_order_id} failed");
        }
        Ok(res.rows_affected > 0)
    }

    pub async fn list_payments(
        &self,
        user_id: i64,
        query: &PaymentQuery,
    ) -> AppResult<PaginatedResponse<PaymentResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let base_query = payments::Entity::find().filter(payments::Column::UserId.eq(user_id));
        let total = base_query.clone().count(&self.pool).await? as i64;

        let items = base_query
            .order_by_desc(payments::Column::CreatedAt)
            .order_by_desc(payments::Column::Id)
            .limit(params.get_limit() as u64)
            .offset(params.get_offset() as u64)
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(
            items.into_iter().map(Into::into).collect(),
            &params,
            total,
        ))
    }

    pub async fn get_payment(&self, payment_id: i64) -> AppResult<payments::Model> {
        payments::Entity::find_by_id(payment_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".into()))
    }

    async fn find_by_order_id(&self, order_id: &str) -> AppResult<Option<payments::Model>> {
        let payment = payments::Entity::find()
            .filter(payments::Column::RazorpayOrderId.eq(order_id))
            .one(&self.pool)
            .await?;
        Ok(payment)
    }
}
