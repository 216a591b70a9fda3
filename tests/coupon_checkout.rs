mod common;

use common::*;
use linkzup_backend::AppError;
use linkzup_backend::entities::{
    DiscountType, PaymentStatus, coupon_entity, coupon_usage_entity, payment_entity,
};
use linkzup_backend::external::{RazorpayService, WebhookEvent, sign};
use linkzup_backend::models::{CreateOrderRequest, PaymentQuery, VerifyPaymentRequest};
use linkzup_backend::services::{CouponService, PaymentService};
use linkzup_backend::utils::time;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};

fn payment_service(db: &DatabaseConnection) -> PaymentService {
    PaymentService::new(
        db.clone(),
        CouponService::new(db.clone()),
        RazorpayService::new(razorpay_config()),
    )
}

async fn created_payment(
    db: &DatabaseConnection,
    user_id: i64,
    order_id: &str,
    coupon: Option<&coupon_entity::Model>,
) -> payment_entity::Model {
    let now = time::now();
    payment_entity::ActiveModel {
        user_id: Set(user_id),
        plan_id: Set("pro".to_string()),
        receipt: Set(format!("rcpt_{order_id}")),
        razorpay_order_id: Set(Some(order_id.to_string())),
        base_amount: Set(50000),
        discount_amount: Set(if coupon.is_some() { 10000 } else { 0 }),
        final_amount: Set(if coupon.is_some() { 40000 } else { 50000 }),
        currency: Set("INR".to_string()),
        coupon_id: Set(coupon.map(|c| c.id)),
        coupon_code: Set(coupon.map(|c| c.code.clone())),
        status: Set(PaymentStatus::Created),
        created_at: Set(Some(now)),
        updated_at: Set(Some(now)),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

async fn usage_rows(db: &DatabaseConnection, coupon_id: i64) -> u64 {
    coupon_usage_entity::Entity::find()
        .filter(coupon_usage_entity::Column::CouponId.eq(coupon_id))
        .count(db)
        .await
        .unwrap()
}

async fn reload_coupon(db: &DatabaseConnection, id: i64) -> coupon_entity::Model {
    coupon_entity::Entity::find_by_id(id)
        .one(db)
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn quote_without_coupon_is_base_price() {
    let db = setup_test_db().await.unwrap();
    create_plan(&db, "pro", 50000).await;
    let svc = CouponService::new(db.clone());

    for code in [None, Some(""), Some("   ")] {
        let quoted = svc.quote(1, "pro", code).await.unwrap();
        assert!(quoted.quote.is_valid);
        assert_eq!(quoted.quote.discount_amount, 0);
        assert_eq!(quoted.quote.final_amount, 50000);
        assert!(quoted.coupon.is_none());
    }
}

#[tokio::test]
async fn save20_on_pro_plan() {
    let db = setup_test_db().await.unwrap();
    create_plan(&db, "pro", 50000).await;
    insert_coupon(&db, save20()).await;
    let svc = CouponService::new(db.clone());

    let quoted = svc.quote(1, "pro", Some("save20")).await.unwrap();
    assert!(quoted.quote.is_valid);
    assert_eq!(quoted.quote.base_amount, 50000);
    assert_eq!(quoted.quote.discount_amount, 10000);
    assert_eq!(quoted.quote.final_amount, 40000);
    assert_eq!(quoted.coupon.unwrap().code, "SAVE20");
}

#[tokio::test]
async fn save20_below_minimum_amount() {
    let db = setup_test_db().await.unwrap();
    create_plan(&db, "starter", 4000).await;
    insert_coupon(&db, save20()).await;
    let svc = CouponService::new(db.clone());

    let quoted = svc.quote(1, "starter", Some("SAVE20")).await.unwrap();
    assert!(!quoted.quote.is_valid);
    assert_eq!(quoted.quote.discount_amount, 0);
    assert_eq!(quoted.quote.final_amount, 4000);
    assert!(quoted.quote.error.unwrap().contains("Minimum order amount"));

    match svc.validate(1, "SAVE20", "starter").await {
        Err(AppError::ValidationError(msg)) => assert!(msg.contains("Minimum order amount")),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_code_and_unknown_plan() {
    let db = setup_test_db().await.unwrap();
    create_plan(&db, "pro", 50000).await;
    let svc = CouponService::new(db.clone());

    let quoted = svc.quote(1, "pro", Some("NOPE")).await.unwrap();
    assert!(!quoted.quote.is_valid);
    assert_eq!(quoted.quote.error.as_deref(), Some("Invalid coupon code"));

    assert!(matches!(
        svc.validate(1, "NOPE", "pro").await,
        Err(AppError::ValidationError(_))
    ));
    assert!(matches!(
        svc.quote(1, "enterprise", None).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn plan_allow_list_is_enforced() {
    let db = setup_test_db().await.unwrap();
    create_plan(&db, "pro", 50000).await;
    create_plan(&db, "team", 90000).await;
    let mut coupon = save20();
    coupon.applicable_plans = Set("team".to_string());
    insert_coupon(&db, coupon).await;
    let svc = CouponService::new(db.clone());

    let pro = svc.quote(1, "pro", Some("SAVE20")).await.unwrap();
    assert!(!pro.quote.is_valid);
    assert!(pro.quote.error.unwrap().contains("not applicable"));

    let team = svc.quote(1, "team", Some("SAVE20")).await.unwrap();
    assert!(team.quote.is_valid);
    assert_eq!(team.quote.discount_amount, 10000);
}

#[tokio::test]
async fn per_user_limit_counts_existing_redemptions() {
    let db = setup_test_db().await.unwrap();
    create_plan(&db, "pro", 50000).await;
    let coupon = insert_coupon(&db, save20()).await;
    let svc = CouponService::new(db.clone());

    let payment = created_payment(&db, 7, "order_u7", Some(&coupon)).await;
    CouponService::record_redemption(&db, 7, coupon.id, &coupon.code, payment.id, 10000)
        .await
        .unwrap();

    let again = svc.quote(7, "pro", Some("SAVE20")).await.unwrap();
    assert!(!again.quote.is_valid);
    assert!(again.quote.error.unwrap().contains("maximum number of times"));

    let other_user = svc.quote(8, "pro", Some("SAVE20")).await.unwrap();
    assert!(other_user.quote.is_valid);
}

#[tokio::test]
async fn exhausted_coupon_is_rejected() {
    let db = setup_test_db().await.unwrap();
    create_plan(&db, "pro", 50000).await;
    let mut coupon = save20();
    coupon.usage_limit = Set(Some(5));
    coupon.usage_count = Set(5);
    insert_coupon(&db, coupon).await;
    let svc = CouponService::new(db.clone());

    let quoted = svc.quote(1, "pro", Some("SAVE20")).await.unwrap();
    assert!(!quoted.quote.is_valid);
    assert!(quoted.quote.error.unwrap().contains("usage limit"));
}

#[tokio::test]
async fn counter_never_passes_usage_limit() {
    let db = setup_test_db().await.unwrap();
    let mut coupon = save20();
    coupon.usage_limit = Set(Some(1));
    coupon.per_user_limit = Set(None);
    let coupon = insert_coupon(&db, coupon).await;

    let first = created_payment(&db, 1, "order_a", Some(&coupon)).await;
    let second = created_payment(&db, 2, "order_b", Some(&coupon)).await;
    CouponService::record_redemption(&db, 1, coupon.id, &coupon.code, first.id, 10000)
        .await
        .unwrap();
    CouponService::record_redemption(&db, 2, coupon.id, &coupon.code, second.id, 10000)
        .await
        .unwrap();

    assert_eq!(reload_coupon(&db, coupon.id).await.usage_count, 1);
    // both captured payments keep their usage row
    assert_eq!(usage_rows(&db, coupon.id).await, 2);
}

#[tokio::test]
async fn capture_records_usage_exactly_once() {
    let db = setup_test_db().await.unwrap();
    let coupon = insert_coupon(&db, save20()).await;
    let payment = created_payment(&db, 3, "order_once", Some(&coupon)).await;
    let svc = payment_service(&db);

    assert!(svc.capture(payment.id, Some("pay_1")).await.unwrap());
    assert!(!svc.capture(payment.id, Some("pay_1")).await.unwrap());

    let stored = svc.get_payment(payment.id).await.unwrap();
    assert_eq!(stored.status, PaymentStatus::Paid);
    assert_eq!(stored.razorpay_payment_id.as_deref(), Some("pay_1"));
    assert!(stored.paid_at.is_some());
    assert_eq!(usage_rows(&db, coupon.id).await, 1);
    assert_eq!(reload_coupon(&db, coupon.id).await.usage_count, 1);
}

#[tokio::test]
async fn verify_then_webhook_captures_once() {
    let db = setup_test_db().await.unwrap();
    let coupon = insert_coupon(&db, save20()).await;
    let payment = created_payment(&db, 4, "order_vw", Some(&coupon)).await;
    let svc = payment_service(&db);

    let bad = VerifyPaymentRequest {
        razorpay_order_id: "order_vw".to_string(),
        razorpay_payment_id: "pay_vw".to_string(),
        razorpay_signature: sign(b"wrong", b"order_vw|pay_vw"),
    };
    assert!(matches!(
        svc.verify_payment(4, &bad).await,
        Err(AppError::ValidationError(_))
    ));

    let good = VerifyPaymentRequest {
        razorpay_signature: sign(KEY_SECRET.as_bytes(), b"order_vw|pay_vw"),
        ..bad
    };
    let verified = svc.verify_payment(4, &good).await.unwrap();
    assert_eq!(verified.id, payment.id);
    assert_eq!(verified.status, PaymentStatus::Paid);

    let raw = r#"{"event":"payment.captured","payload":{"payment":{"entity":{"id":"pay_vw","order_id":"order_vw","amount":40000,"status":"captured"}}}}"#;
    let signature = sign(WEBHOOK_SECRET.as_bytes(), raw.as_bytes());
    assert!(svc.verify_webhook_signature(raw.as_bytes(), &signature).is_ok());
    let event: WebhookEvent = serde_json::from_str(raw).unwrap();
    svc.handle_webhook_event(&event).await.unwrap();

    assert_eq!(usage_rows(&db, coupon.id).await, 1);
    assert_eq!(reload_coupon(&db, coupon.id).await.usage_count, 1);
}

#[tokio::test]
async fn verify_rejects_foreign_payment() {
    let db = setup_test_db().await.unwrap();
    created_payment(&db, 4, "order_mine", None).await;
    let svc = payment_service(&db);

    let req = VerifyPaymentRequest {
        razorpay_order_id: "order_mine".to_string(),
        razorpay_payment_id: "pay_1".to_string(),
        razorpay_signature: sign(KEY_SECRET.as_bytes(), b"order_mine|pay_1"),
    };
    assert!(matches!(
        svc.verify_payment(5, &req).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn failed_webhook_only_touches_created_payments() {
    let db = setup_test_db().await.unwrap();
    let open = created_payment(&db, 1, "order_open", None).await;
    let paid = created_payment(&db, 1, "order_paid", None).await;
    let svc = payment_service(&db);
    svc.capture(paid.id, Some("pay_ok")).await.unwrap();

    for order in ["order_open", "order_paid"] {
        let raw = format!(
            r#"{{"event":"payment.failed","payload":{{"payment":{{"entity":{{"id":"pay_x","order_id":"{order}","status":"failed","error_description":"Card declined"}}}}}}}}"#
        );
        let event: WebhookEvent = serde_json::from_str(&raw).unwrap();
        svc.handle_webhook_event(&event).await.unwrap();
    }

    assert_eq!(svc.get_payment(open.id).await.unwrap().status, PaymentStatus::Failed);
    assert_eq!(svc.get_payment(paid.id).await.unwrap().status, PaymentStatus::Paid);
}

#[tokio::test]
async fn free_order_completes_without_gateway() {
    let db = setup_test_db().await.unwrap();
    create_plan(&db, "pro", 50000).await;
    let mut coupon = save20();
    coupon.code = Set("FREE100".to_string());
    coupon.value = Set(100);
    coupon.max_discount = Set(None);
    let coupon = insert_coupon(&db, coupon).await;
    let svc = payment_service(&db);

    let resp = svc
        .create_order(
            9,
            &CreateOrderRequest {
                plan_id: "pro".to_string(),
                coupon_code: Some("free100".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(resp.amount, 0);
    assert!(resp.order_id.is_none());
    assert_eq!(resp.status, PaymentStatus::Paid);
    assert_eq!(resp.quote.discount_amount, 50000);
    assert_eq!(usage_rows(&db, coupon.id).await, 1);

    let page = svc
        .list_payments(9, &PaymentQuery { page: None, per_page: None })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.data[0].coupon_code.as_deref(), Some("FREE100"));
}

#[tokio::test]
async fn create_order_rejects_invalid_coupon_before_insert() {
    let db = setup_test_db().await.unwrap();
    create_plan(&db, "pro", 50000).await;
    let mut coupon = save20();
    coupon.is_active = Set(false);
    coupon.discount_type = Set(DiscountType::Fixed);
    insert_coupon(&db, coupon).await;
    let svc = payment_service(&db);

    let err = svc
        .create_order(
            1,
            &CreateOrderRequest {
                plan_id: "pro".to_string(),
                coupon_code: Some("SAVE20".to_string()),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(ref m) if m.contains("no longer active")));
    assert_eq!(payment_entity::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn negative_plan_price_never_reaches_checkout() {
    let db = setup_test_db().await.unwrap();
    create_plan(&db, "broken", -100).await;
    insert_coupon(&db, save20()).await;
    let coupons = CouponService::new(db.clone());

    for code in [None, Some(""), Some("SAVE20"), Some("NOPE")] {
        let quoted = coupons.quote(1, "broken", code).await.unwrap();
        assert!(!quoted.quote.is_valid);
        assert!(quoted.coupon.is_none());
        assert_eq!(
            quoted.quote.error.as_deref(),
            Some("Order amount cannot be negative")
        );
    }

    let err = payment_service(&db)
        .create_order(
            1,
            &CreateOrderRequest {
                plan_id: "broken".to_string(),
                coupon_code: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(ref m) if m.contains("cannot be negative")));
    assert_eq!(payment_entity::Entity::find().count(&db).await.unwrap(), 0);
}
