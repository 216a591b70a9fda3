pub mod coupon_service;
pub mod payment_service;
pub mod post_dispatcher;
pub mod pricing;
pub mod scheduled_post_service;

pub use coupon_service::*;
pub use payment_service::*;
pub use post_dispatcher::*;
pub use pricing::*;
pub use scheduled_post_service::*;
