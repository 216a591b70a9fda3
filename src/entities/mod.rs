pub mod coupon_usages;
pub mod coupons;
pub mod linkedin_accounts;
pub mod payments;
pub mod plans;
pub mod scheduled_posts;

pub use coupon_usages as coupon_usage_entity;
pub use coupons as coupon_entity;
pub use linkedin_accounts as linkedin_account_entity;
pub use payments as payment_entity;
pub use plans as plan_entity;
pub use scheduled_posts as scheduled_post_entity;

pub use coupons::DiscountType;
pub use payments::PaymentStatus;
pub use scheduled_posts::{PostPlatform, ScheduledPostStatus};
