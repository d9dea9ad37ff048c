// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth): chatbot flow, token acquisition, static assets, status
// Protected (JWT auth): form, folder, submission and user-content management
pub mod protected;
pub mod public;

use axum::extract::FromRequest;

use crate::error::ApiError;

/// `Json` extractor whose rejections render through [`ApiError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Path` extractor whose rejections render through [`ApiError`].
#[derive(Debug, axum::extract::FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// `Query` extractor whose rejections render through [`ApiError`].
#[derive(Debug, axum::extract::FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
