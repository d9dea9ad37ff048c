// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Respondent-facing chatbot endpoints, token acquisition and static content.
pub mod assets;
pub mod auth;
pub mod chatbot;
pub mod system;
