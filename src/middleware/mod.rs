pub mod auth;
pub mod rate_limit;
pub mod response;

pub use auth::{admin_auth_middleware, staff_auth_middleware, AuthUser};
pub use rate_limit::OtpRateLimiter;
pub use response::{ApiResponse, ApiResult};
