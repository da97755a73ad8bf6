//! # DomainError
//!
//! Centralized error taxonomy for the review service. Every variant is
//! recoverable by the caller and maps to a structured 4xx-equivalent
//! response at the transport boundary; only `Storage` represents an
//! infrastructure failure.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::ReviewStatus;
use crate::visibility::VisibilityAction;

/// A single field-level validation failure. Validation reports *all*
/// violations found, not just the first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Machine-distinguishable reason for an authorization denial, so callers
/// can map to the correct user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DenyReason {
    NotOwner,
    AlreadyDeleted,
    InsufficientRole,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::NotOwner => f.write_str("not-owner"),
            DenyReason::AlreadyDeleted => f.write_str("already-deleted"),
            DenyReason::InsufficientRole => f.write_str("insufficient-role"),
        }
    }
}

/// The primary error type for all review-service operations.
#[derive(Error, Debug)]
pub enum DomainError {
    /// One or more fields violated their invariants.
    #[error("validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldViolation>),

    /// The caller is not allowed to perform this mutation.
    #[error("forbidden: {0}")]
    Forbidden(DenyReason),

    /// Unknown review id.
    #[error("review {0} not found")]
    NotFound(Uuid),

    /// The requested edge does not exist in the visibility state machine.
    #[error("cannot {action} a {from} review")]
    InvalidTransition {
        from: ReviewStatus,
        action: VisibilityAction,
    },

    /// Backing-store failure. Surfaced as-is; retries belong to the
    /// transport layer, not this core (a retry could double-apply a reply).
    #[error("storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn storage(err: impl fmt::Display) -> Self {
        DomainError::Storage(err.to_string())
    }
}

/// A specialized Result for review-service logic.
pub type Result<T> = std::result::Result<T, DomainError>;
