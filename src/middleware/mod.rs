pub mod auth;
pub mod response;
pub mod security;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use response::{ApiResponse, ApiResult};
