//! # Wavemap API Server
//!
//! Thin HTTP surface over the [`wavemap_auth`] pipeline. It owns the
//! transport conventions (session cookie, `Authorization` schemes,
//! guest token header), the guard middleware that attaches an
//! [`wavemap_auth::AuthContext`] to each authorized request, and the
//! token lifecycle endpoints. Domain routers mount the same guard with
//! their own permission declarations.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, Result};
pub use server::{Server, ServerBuilder, ServerConfig};
pub use state::AppState;

/// API version
pub const API_VERSION: &str = "v1";
