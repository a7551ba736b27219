//! # Sesame Core
//!
//! Data model shared by the sesame authentication gateway.
//!
//! ## Key Concepts
//!
//! - **Request**: canonical, immutable form of an inbound web request,
//!   translated from the wire envelope the gateway receives
//! - **User**: identity reported by a strategy; sanitized before it leaves
//!   the process
//! - **AuthResponse**: redirect-to-provider or authenticated user
//! - **RouteGate**: static, deny-by-default route enablement lookup

pub mod error;
pub mod request;
pub mod response;
pub mod route;
pub mod user;

pub use error::{CoreError, ErrorCategory, Result};
pub use request::{HeaderValue, Request, WireHeaderValues, WireRequest};
pub use response::{AuthResponse, Redirect, Success, DEFAULT_REDIRECT_STATUS};
pub use route::{RouteGate, RouteId};
pub use user::{sanitize_tokens, SanitizedUser, User};
