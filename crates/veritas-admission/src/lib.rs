//! # veritas-admission
//!
//! Framework-agnostic request admission logic for the VERITAS decision
//! gateway: HMAC-SHA256 signature verification ([`hmac_auth`]), nonce
//! replay guarding ([`nonce`]), per-key rate limiting ([`rate_limit`]),
//! the fixed security header set ([`headers`]), and an explicit CORS
//! allow-list ([`cors`]). [`admission::AdmissionGuard`] composes all of
//! these into the single check a caller's HTTP layer runs per request.
//!
//! This crate has no HTTP framework dependency; it is called from
//! whatever middleware layer the embedding application uses.

pub mod admission;
pub mod cors;
pub mod headers;
pub mod hmac_auth;
pub mod nonce;
pub mod rate_limit;

pub use admission::{AdmissionConfig, AdmissionError, AdmissionGuard, RequestHeaders};
pub use cors::CorsAllowList;
pub use nonce::NonceStore;
pub use rate_limit::RateLimiter;
