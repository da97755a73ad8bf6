//! # auth-adapters
//!
//! `IdentityResolver` implementations. Identity is always derived
//! server-side from a verified token — client-supplied identity fields are
//! never trusted. Every resolver fails closed: anything unverifiable is
//! the anonymous identity.

pub mod token;

#[cfg(feature = "auth-jwt")]
pub mod jwt;

pub use token::{capabilities_for_role, SignedTokenResolver};

#[cfg(feature = "auth-jwt")]
pub use jwt::JwtResolver;
