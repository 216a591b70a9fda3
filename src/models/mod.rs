pub mod common;
pub mod coupon;
pub mod linkedin;
pub mod pagination;
pub mod payment;
pub mod scheduled_post;

pub use common::*;
pub use coupon::*;
pub use linkedin::*;
pub use pagination::*;
pub use payment::*;
pub use scheduled_post::*;
