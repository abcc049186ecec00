//! Request-time authentication gate for an axum service.
//!
//! Every operation is registered with its access markers. Marked operations
//! require `Authorization: Bearer <jwt>`; the token is verified against the
//! shared HMAC secret, checked for expiry, and its subject resolved into a
//! [`Principal`](services::auth::Principal) that handlers see through a
//! [`SecurityCtx`](services::auth::SecurityCtx).

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod repos;
pub mod services;
pub mod state;
