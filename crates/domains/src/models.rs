//! # Domain Models
//!
//! Core entities of the review subsystem. UUID v7 gives time-ordered,
//! globally unique identification; the human-facing display counter is the
//! store-assigned `sequence_number`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of entity a review is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Product,
    Vendor,
    Ticket,
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetType::Product => f.write_str("product"),
            TargetType::Vendor => f.write_str("vendor"),
            TargetType::Ticket => f.write_str("ticket"),
        }
    }
}

impl std::str::FromStr for TargetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "product" => Ok(TargetType::Product),
            "vendor" => Ok(TargetType::Vendor),
            "ticket" => Ok(TargetType::Ticket),
            other => Err(format!("unknown target type: {other}")),
        }
    }
}

/// Visibility of a review. `Deleted` is terminal; a review is never
/// physically removed from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Public,
    Hidden,
    Deleted,
}

impl ReviewStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ReviewStatus::Deleted)
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewStatus::Public => f.write_str("public"),
            ReviewStatus::Hidden => f.write_str("hidden"),
            ReviewStatus::Deleted => f.write_str("deleted"),
        }
    }
}

impl std::str::FromStr for ReviewStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(ReviewStatus::Public),
            "hidden" => Ok(ReviewStatus::Hidden),
            "deleted" => Ok(ReviewStatus::Deleted),
            other => Err(format!("unknown review status: {other}")),
        }
    }
}

/// A moderator reply attached to a review. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// A customer review of a target entity.
///
/// `author_id`, `target_type`, `target_key`, `sequence_number`, and
/// `created_at` are immutable after creation. `target_name` and
/// `author_name` are display snapshots taken at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub target_type: TargetType,
    pub target_key: String,
    pub target_name: String,
    /// Star rating, 1..=5 (enforced by validation before any write).
    pub rating: i32,
    pub title: Option<String>,
    pub comment: String,
    pub status: ReviewStatus,
    /// Monotonically increasing display counter assigned by the store.
    pub sequence_number: u64,
    pub created_at: DateTime<Utc>,
    /// Advances on field mutation and status transitions.
    pub updated_at: DateTime<Utc>,
    /// Append-only, insertion order.
    pub replies: Vec<Reply>,
}

impl Review {
    pub fn reply_count(&self) -> usize {
        self.replies.len()
    }
}

/// Validated input for review creation. The store assigns id, sequence
/// number, status, and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub author_id: Uuid,
    pub author_name: String,
    pub target_type: TargetType,
    pub target_key: String,
    pub target_name: String,
    pub rating: i32,
    pub title: Option<String>,
    pub comment: String,
}

/// Partial update of author-editable fields. `None` leaves a field as-is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewPatch {
    pub rating: Option<i32>,
    pub title: Option<String>,
    pub comment: Option<String>,
}

impl ReviewPatch {
    pub fn is_empty(&self) -> bool {
        self.rating.is_none() && self.title.is_none() && self.comment.is_none()
    }
}
