//! Review use-cases.
//!
//! Every operation follows the same shape: authorize against the policy,
//! validate, then hand the store one atomic mutation and return the
//! re-read record. The store handle is injected at construction.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use domains::query::round_rating;
use domains::validation::{validate_reply_message, validate_review_fields};
use domains::{
    DenyReason, DomainError, Identity, NewReview, PageRequest, Reply, Result, Review,
    ReviewFilter, ReviewPage, ReviewPatch, ReviewRepo, ReviewStatus, TargetType,
    VisibilityAction,
};

use crate::policy::{authorize, MutateAction};

/// Caller-supplied fields for review creation. Author identity and target
/// snapshot come from the request context, everything else is assigned by
/// the store.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReviewInput {
    pub target_type: TargetType,
    pub target_key: String,
    pub target_name: String,
    pub rating: i32,
    pub title: Option<String>,
    pub comment: String,
}

/// Public aggregation over a target: average of public ratings (one
/// decimal) and how many public reviews contributed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub target_key: String,
    pub average_rating: f64,
    pub review_count: u64,
}

/// The single entry point for review reads and mutations.
pub struct ReviewService {
    repo: Arc<dyn ReviewRepo>,
}

impl ReviewService {
    pub fn new(repo: Arc<dyn ReviewRepo>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self, identity, input), fields(target = %input.target_key))]
    pub async fn create(&self, identity: &Identity, input: CreateReviewInput) -> Result<Review> {
        authorize(identity, None, MutateAction::Create).map_err(DomainError::Forbidden)?;
        let author_id = identity
            .id
            .ok_or(DomainError::Forbidden(DenyReason::InsufficientRole))?;

        let title = normalize_title(input.title);
        let comment = input.comment.trim().to_string();
        let violations = validate_review_fields(input.rating, title.as_deref(), &comment);
        if !violations.is_empty() {
            return Err(DomainError::Validation(violations));
        }

        self.repo
            .create(NewReview {
                author_id,
                author_name: identity.display_name.clone(),
                target_type: input.target_type,
                target_key: input.target_key,
                target_name: input.target_name,
                rating: input.rating,
                title,
                comment,
            })
            .await
    }

    /// Fetch one review if the caller is allowed to see it. Non-public
    /// reviews are visible to their owner and to moderators only; everyone
    /// else gets `NotFound` so existence is not disclosed.
    pub async fn get_visible(&self, identity: &Identity, id: Uuid) -> Result<Review> {
        let review = self.repo.get(id).await?;
        if review.status == ReviewStatus::Public
            || identity.owns(review.author_id)
            || identity.can_moderate()
        {
            Ok(review)
        } else {
            Err(DomainError::NotFound(id))
        }
    }

    /// Author-scoped partial update. Re-validates the merged record, so a
    /// patch can never push a stored review out of its invariants. A patch
    /// that touches no field is a no-op: the store is not written and
    /// `updated_at` stays put.
    #[instrument(skip(self, identity, patch), fields(review = %id))]
    pub async fn update(&self, identity: &Identity, id: Uuid, patch: ReviewPatch) -> Result<Review> {
        let current = self.repo.get(id).await?;
        authorize(identity, Some(&current), MutateAction::Edit).map_err(DomainError::Forbidden)?;
        if patch.is_empty() {
            return Ok(current);
        }

        let patch = ReviewPatch {
            rating: patch.rating,
            title: patch.title.map(|t| t.trim().to_string()),
            comment: patch.comment.map(|c| c.trim().to_string()),
        };
        let merged_rating = patch.rating.unwrap_or(current.rating);
        let merged_title = patch.title.as_deref().or(current.title.as_deref());
        let merged_comment = patch.comment.as_deref().unwrap_or(&current.comment);
        let violations = validate_review_fields(merged_rating, merged_title, merged_comment);
        if !violations.is_empty() {
            return Err(DomainError::Validation(violations));
        }

        self.repo.update_fields(id, patch).await
    }

    /// Author self-service soft delete. Lands in the same terminal state as
    /// a moderator delete, but is gated by ownership rather than role.
    #[instrument(skip(self, identity), fields(review = %id))]
    pub async fn delete_own(&self, identity: &Identity, id: Uuid) -> Result<Review> {
        let current = self.repo.get(id).await?;
        authorize(identity, Some(&current), MutateAction::DeleteOwn)
            .map_err(DomainError::Forbidden)?;
        self.repo.apply_transition(id, VisibilityAction::Delete).await
    }

    /// Moderator visibility transition. Edge legality is enforced
    /// atomically by the store against its current status.
    #[instrument(skip(self, identity), fields(review = %id, action = %action))]
    pub async fn change_visibility(
        &self,
        identity: &Identity,
        id: Uuid,
        action: VisibilityAction,
    ) -> Result<Review> {
        authorize(identity, None, MutateAction::ChangeVisibility)
            .map_err(DomainError::Forbidden)?;
        let review = self.repo.apply_transition(id, action).await?;
        debug!(status = %review.status, "visibility changed");
        Ok(review)
    }

    /// Moderator reply, appended to the review's immutable sub-ledger with
    /// a server-assigned timestamp.
    #[instrument(skip(self, identity, message), fields(review = %id))]
    pub async fn add_reply(&self, identity: &Identity, id: Uuid, message: &str) -> Result<Review> {
        authorize(identity, None, MutateAction::Reply).map_err(DomainError::Forbidden)?;
        let violations = validate_reply_message(message);
        if !violations.is_empty() {
            return Err(DomainError::Validation(violations));
        }
        self.repo
            .append_reply(
                id,
                Reply {
                    message: message.trim().to_string(),
                    created_at: Utc::now(),
                },
            )
            .await
    }

    /// Audience-scoped listing: the requested filter is narrowed to what
    /// this caller may see before it reaches the store.
    pub async fn list(
        &self,
        identity: &Identity,
        requested: ReviewFilter,
        page: PageRequest,
    ) -> Result<ReviewPage> {
        let effective = audience_scope(identity, requested);
        self.repo.list(effective, page).await
    }

    /// "My reviews": every status, restricted to the caller's own records.
    pub async fn list_own(&self, identity: &Identity, page: PageRequest) -> Result<ReviewPage> {
        let owner_id = identity
            .id
            .ok_or(DomainError::Forbidden(DenyReason::InsufficientRole))?;
        self.repo
            .list(
                ReviewFilter {
                    owner_id: Some(owner_id),
                    ..Default::default()
                },
                page,
            )
            .await
    }

    /// The caller's canonical review of a target. The store does not
    /// enforce one-review-per-(author, target); when several exist the
    /// latest (highest sequence number) is canonical.
    pub async fn find_own(&self, identity: &Identity, target_key: &str) -> Result<Option<Review>> {
        let owner_id = identity
            .id
            .ok_or(DomainError::Forbidden(DenyReason::InsufficientRole))?;
        let page = self
            .repo
            .list(
                ReviewFilter {
                    owner_id: Some(owner_id),
                    target_key: Some(target_key.to_string()),
                    ..Default::default()
                },
                PageRequest::new(1, PageRequest::MAX_PAGE_SIZE),
            )
            .await?;
        Ok(page
            .items
            .into_iter()
            .max_by_key(|review| review.sequence_number))
    }

    /// Public aggregation for a target, computed over public reviews only.
    pub async fn rating_summary(&self, target_key: &str) -> Result<RatingSummary> {
        let average = self.repo.average_rating(target_key).await?;
        let publics = self
            .repo
            .list(
                ReviewFilter {
                    target_key: Some(target_key.to_string()),
                    status: Some(ReviewStatus::Public),
                    ..Default::default()
                },
                PageRequest::new(1, 1),
            )
            .await?;
        Ok(RatingSummary {
            target_key: target_key.to_string(),
            average_rating: round_rating(average),
            review_count: publics.total_count,
        })
    }
}

/// Audience enforcement for listings:
///
/// - moderators query any status they ask for;
/// - an authenticated caller scoping to their own records sees all of
///   their statuses;
/// - everyone else is pinned to `public`, regardless of the requested
///   filter.
fn audience_scope(identity: &Identity, mut filter: ReviewFilter) -> ReviewFilter {
    if identity.can_moderate() {
        return filter;
    }
    let own_scope = match (identity.id, filter.owner_id) {
        (Some(me), Some(owner)) => me == owner,
        _ => false,
    };
    if !own_scope {
        filter.status = Some(ReviewStatus::Public);
    }
    filter
}

fn normalize_title(title: Option<String>) -> Option<String> {
    title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use domains::{Capability, MockReviewRepo};
    use mockall::predicate;

    fn customer() -> Identity {
        Identity::new(
            Uuid::now_v7(),
            "mira",
            HashSet::from([Capability::SubmitReviews]),
        )
    }

    fn moderator() -> Identity {
        Identity::new(
            Uuid::now_v7(),
            "dane",
            HashSet::from([Capability::SubmitReviews, Capability::ModerateReviews]),
        )
    }

    fn input() -> CreateReviewInput {
        CreateReviewInput {
            target_type: TargetType::Product,
            target_key: "PRD-0001".to_string(),
            target_name: "Walnut desk".to_string(),
            rating: 5,
            title: Some("Great".to_string()),
            comment: "Works well".to_string(),
        }
    }

    fn stored(new: NewReview) -> Review {
        Review {
            id: Uuid::now_v7(),
            author_id: new.author_id,
            author_name: new.author_name,
            target_type: new.target_type,
            target_key: new.target_key,
            target_name: new.target_name,
            rating: new.rating,
            title: new.title,
            comment: new.comment,
            status: ReviewStatus::Public,
            sequence_number: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            replies: Vec::new(),
        }
    }

    #[tokio::test]
    async fn create_persists_with_identity_snapshot() {
        let mut repo = MockReviewRepo::new();
        repo.expect_create()
            .times(1)
            .returning(|new| Ok(stored(new)));
        let service = ReviewService::new(Arc::new(repo));
        let caller = customer();

        let review = service.create(&caller, input()).await.unwrap();
        assert_eq!(review.author_id, caller.id.unwrap());
        assert_eq!(review.author_name, "mira");
        assert_eq!(review.status, ReviewStatus::Public);
    }

    #[tokio::test]
    async fn create_rejects_invalid_fields_before_the_store() {
        // No expectations set: any repo call would panic the test.
        let repo = MockReviewRepo::new();
        let service = ReviewService::new(Arc::new(repo));

        let mut bad = input();
        bad.rating = 9;
        bad.comment = "hi".to_string();
        let err = service.create(&customer(), bad).await.unwrap_err();
        match err {
            DomainError::Validation(violations) => {
                let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
                assert_eq!(fields, vec!["rating", "comment"]);
            }
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[tokio::test]
    async fn create_rejects_anonymous_callers() {
        let repo = MockReviewRepo::new();
        let service = ReviewService::new(Arc::new(repo));

        let err = service
            .create(&Identity::anonymous(), input())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Forbidden(DenyReason::InsufficientRole)
        ));
    }

    #[tokio::test]
    async fn update_validates_the_merged_record() {
        let caller = customer();
        let existing = stored(NewReview {
            author_id: caller.id.unwrap(),
            author_name: "mira".to_string(),
            target_type: TargetType::Product,
            target_key: "PRD-0001".to_string(),
            target_name: "Walnut desk".to_string(),
            rating: 5,
            title: Some("Great".to_string()),
            comment: "Works well".to_string(),
        });
        let id = existing.id;

        let mut repo = MockReviewRepo::new();
        let fetched = existing.clone();
        repo.expect_get()
            .with(predicate::eq(id))
            .returning(move |_| Ok(fetched.clone()));
        // Patch only touches the rating; title and comment stay valid, so
        // the store is reached with exactly the normalized patch.
        repo.expect_update_fields()
            .withf(move |got_id, patch| {
                *got_id == id
                    && patch.rating == Some(2)
                    && patch.title.is_none()
                    && patch.comment.is_none()
            })
            .times(1)
            .returning(move |_, patch| {
                let mut updated = existing.clone();
                updated.rating = patch.rating.unwrap();
                Ok(updated)
            });
        let service = ReviewService::new(Arc::new(repo));

        let updated = service
            .update(
                &caller,
                id,
                ReviewPatch {
                    rating: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.rating, 2);
        assert_eq!(updated.title.as_deref(), Some("Great"));
        assert_eq!(updated.comment, "Works well");
    }

    #[tokio::test]
    async fn empty_patch_is_a_no_op() {
        let caller = customer();
        let existing = stored(NewReview {
            author_id: caller.id.unwrap(),
            author_name: "mira".to_string(),
            target_type: TargetType::Product,
            target_key: "PRD-0001".to_string(),
            target_name: "Walnut desk".to_string(),
            rating: 5,
            title: Some("Great".to_string()),
            comment: "Works well".to_string(),
        });
        let id = existing.id;

        // Only a read is expected; an update_fields call would panic.
        let mut repo = MockReviewRepo::new();
        let fetched = existing.clone();
        repo.expect_get().returning(move |_| Ok(fetched.clone()));
        let service = ReviewService::new(Arc::new(repo));

        let unchanged = service
            .update(&caller, id, ReviewPatch::default())
            .await
            .unwrap();
        assert_eq!(unchanged, existing);
    }

    #[tokio::test]
    async fn update_by_non_owner_is_denied_regardless_of_fields() {
        let owner = customer();
        let intruder = customer();
        let existing = stored(NewReview {
            author_id: owner.id.unwrap(),
            author_name: "mira".to_string(),
            target_type: TargetType::Product,
            target_key: "PRD-0001".to_string(),
            target_name: "Walnut desk".to_string(),
            rating: 5,
            title: None,
            comment: "Works well".to_string(),
        });
        let id = existing.id;

        let mut repo = MockReviewRepo::new();
        repo.expect_get().returning(move |_| Ok(existing.clone()));
        let service = ReviewService::new(Arc::new(repo));

        let err = service
            .update(
                &intruder,
                id,
                ReviewPatch {
                    rating: Some(4),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(DenyReason::NotOwner)));
    }

    #[tokio::test]
    async fn delete_own_is_a_transition_to_deleted() {
        let caller = customer();
        let existing = stored(NewReview {
            author_id: caller.id.unwrap(),
            author_name: "mira".to_string(),
            target_type: TargetType::Product,
            target_key: "PRD-0001".to_string(),
            target_name: "Walnut desk".to_string(),
            rating: 5,
            title: None,
            comment: "Works well".to_string(),
        });
        let id = existing.id;

        let mut repo = MockReviewRepo::new();
        let fetched = existing.clone();
        repo.expect_get().returning(move |_| Ok(fetched.clone()));
        repo.expect_apply_transition()
            .with(predicate::eq(id), predicate::eq(VisibilityAction::Delete))
            .times(1)
            .returning(move |_, _| {
                let mut deleted = existing.clone();
                deleted.status = ReviewStatus::Deleted;
                Ok(deleted)
            });
        let service = ReviewService::new(Arc::new(repo));

        let deleted = service.delete_own(&caller, id).await.unwrap();
        assert_eq!(deleted.status, ReviewStatus::Deleted);
    }

    #[tokio::test]
    async fn blank_reply_is_rejected_before_the_store() {
        let repo = MockReviewRepo::new();
        let service = ReviewService::new(Arc::new(repo));

        let err = service
            .add_reply(&moderator(), Uuid::now_v7(), "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn reply_requires_moderation_capability() {
        let repo = MockReviewRepo::new();
        let service = ReviewService::new(Arc::new(repo));

        let err = service
            .add_reply(&customer(), Uuid::now_v7(), "Thanks!")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Forbidden(DenyReason::InsufficientRole)
        ));
    }

    #[tokio::test]
    async fn anonymous_listings_are_pinned_to_public() {
        let mut repo = MockReviewRepo::new();
        repo.expect_list()
            .withf(|filter, _| filter.status == Some(ReviewStatus::Public))
            .returning(|_, page| {
                Ok(ReviewPage {
                    items: Vec::new(),
                    page: page.page(),
                    total_pages: 1,
                    total_count: 0,
                })
            });
        let service = ReviewService::new(Arc::new(repo));

        // Even an explicit request for hidden records is narrowed.
        service
            .list(
                &Identity::anonymous(),
                ReviewFilter {
                    status: Some(ReviewStatus::Hidden),
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn owners_see_all_statuses_of_their_own_records_only() {
        let caller = customer();
        let me = caller.id.unwrap();
        let mut repo = MockReviewRepo::new();
        repo.expect_list()
            .withf(move |filter, _| filter.owner_id == Some(me) && filter.status.is_none())
            .times(1)
            .returning(|_, page| {
                Ok(ReviewPage {
                    items: Vec::new(),
                    page: page.page(),
                    total_pages: 1,
                    total_count: 0,
                })
            });
        // Scoping to someone else's records collapses back to public.
        repo.expect_list()
            .withf(move |filter, _| {
                filter.owner_id.is_some()
                    && filter.owner_id != Some(me)
                    && filter.status == Some(ReviewStatus::Public)
            })
            .times(1)
            .returning(|_, page| {
                Ok(ReviewPage {
                    items: Vec::new(),
                    page: page.page(),
                    total_pages: 1,
                    total_count: 0,
                })
            });
        let service = ReviewService::new(Arc::new(repo));

        service.list_own(&caller, PageRequest::default()).await.unwrap();
        service
            .list(
                &caller,
                ReviewFilter {
                    owner_id: Some(Uuid::now_v7()),
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn moderators_query_any_status_verbatim() {
        let mut repo = MockReviewRepo::new();
        repo.expect_list()
            .withf(|filter, _| filter.status == Some(ReviewStatus::Hidden))
            .times(1)
            .returning(|_, page| {
                Ok(ReviewPage {
                    items: Vec::new(),
                    page: page.page(),
                    total_pages: 1,
                    total_count: 0,
                })
            });
        let service = ReviewService::new(Arc::new(repo));

        service
            .list(
                &moderator(),
                ReviewFilter {
                    status: Some(ReviewStatus::Hidden),
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn find_own_picks_the_highest_sequence_number() {
        let caller = customer();
        let make = |seq: u64| {
            let mut r = stored(NewReview {
                author_id: caller.id.unwrap(),
                author_name: "mira".to_string(),
                target_type: TargetType::Product,
                target_key: "PRD-0001".to_string(),
                target_name: "Walnut desk".to_string(),
                rating: 3,
                title: None,
                comment: "Works well".to_string(),
            });
            r.sequence_number = seq;
            r
        };
        let mut repo = MockReviewRepo::new();
        let items = vec![make(3), make(7), make(5)];
        repo.expect_list().returning(move |_, _| {
            Ok(ReviewPage {
                items: items.clone(),
                page: 1,
                total_pages: 1,
                total_count: 3,
            })
        });
        let service = ReviewService::new(Arc::new(repo));

        let canonical = service.find_own(&caller, "PRD-0001").await.unwrap().unwrap();
        assert_eq!(canonical.sequence_number, 7);
    }

    #[tokio::test]
    async fn rating_summary_rounds_and_counts_public_reviews() {
        let mut repo = MockReviewRepo::new();
        repo.expect_average_rating()
            .withf(|key| key == "PRD-0002")
            .returning(|_| Ok(10.0 / 3.0));
        repo.expect_list().returning(|_, _| {
            Ok(ReviewPage {
                items: Vec::new(),
                page: 1,
                total_pages: 1,
                total_count: 3,
            })
        });
        let service = ReviewService::new(Arc::new(repo));

        let summary = service.rating_summary("PRD-0002").await.unwrap();
        assert_eq!(summary.average_rating, 3.3);
        assert_eq!(summary.review_count, 3);
    }
}
