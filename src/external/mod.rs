pub mod linkedin;
pub mod razorpay;

pub use linkedin::*;
pub use razorpay::*;
