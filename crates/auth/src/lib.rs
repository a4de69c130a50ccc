//! Bearer-token authentication for the course-enrollment platform.
//!
//! - [`jwt`] -- HS256 token decoding into a raw claim set
//! - [`claims`] -- dot-path claim lookup with typed coercion
//! - [`authorities`] -- roles claim to `ROLE_*` authorities
//! - [`principal`] -- the authenticated caller of one request
//! - [`current_user`] -- principal to internal user id, and the auditor

pub mod authorities;
pub mod claims;
pub mod config;
pub mod current_user;
pub mod jwt;
pub mod principal;

pub use config::SecurityConfig;
pub use principal::Principal;
