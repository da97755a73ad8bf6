//! # Port Traits
//!
//! Contracts between the service layer and its adapters. Storage and
//! identity backends are swapped at construction time — no process-wide
//! singletons.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::identity::Identity;
use crate::models::{NewReview, Reply, Review, ReviewPatch};
use crate::query::{PageRequest, ReviewFilter, ReviewPage};
use crate::visibility::VisibilityAction;

/// Persistence contract for reviews and their reply sub-ledgers.
///
/// Mutations are atomic units: either the full write lands or nothing
/// does. There is deliberately no `remove` — deletion is a status
/// transition, never physical erasure.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ReviewRepo: Send + Sync {
    /// Persist a new review. Assigns id, sequence number, `public` status,
    /// and both timestamps.
    async fn create(&self, review: NewReview) -> Result<Review>;

    /// Fetch by id regardless of status; `NotFound` for unknown ids.
    async fn get(&self, id: Uuid) -> Result<Review>;

    /// Merge the patch into the stored review and advance `updated_at`.
    /// Last write wins under concurrent author edits.
    async fn update_fields(&self, id: Uuid, patch: ReviewPatch) -> Result<Review>;

    /// Atomically check-and-set the visibility status. The legality of the
    /// edge is evaluated against the status the store holds at apply time,
    /// so of two racing identical transitions at most one succeeds.
    async fn apply_transition(&self, id: Uuid, action: VisibilityAction) -> Result<Review>;

    /// Append to the reply sub-ledger. Prior replies are never touched.
    async fn append_reply(&self, id: Uuid, reply: Reply) -> Result<Review>;

    /// Filtered, sorted, paginated listing. Ordering must be stable for a
    /// fixed filter over an unmodified store.
    async fn list(&self, filter: ReviewFilter, page: PageRequest) -> Result<ReviewPage>;

    /// Mean rating over `public` reviews of the target, unrounded;
    /// 0 when the target has none.
    async fn average_rating(&self, target_key: &str) -> Result<f64>;
}

/// Identity and capability resolution contract.
pub trait IdentityResolver: Send + Sync {
    /// Derive the caller's identity from a bearer token. Fails closed: a
    /// missing, malformed, or unverifiable token resolves to the anonymous
    /// identity rather than an error.
    fn resolve(&self, token: Option<&str>) -> Identity;
}
