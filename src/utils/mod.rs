pub mod jwt;
pub mod time;

pub use jwt::*;
