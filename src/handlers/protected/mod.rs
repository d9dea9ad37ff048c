// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every route here sits behind `jwt_auth_middleware`, which injects `AuthUser`.
// Resources owned by another user answer 403.
pub mod folders;
pub mod forms;
pub mod submissions;
pub mod user_content;
