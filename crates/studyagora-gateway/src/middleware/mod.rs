//! Axum middleware: fixed-window counters and the access-control layer.

mod access;
mod rate_limit;

pub use access::access_control;
pub use rate_limit::{Admission, RateLimiter};
