//! In-memory `ReviewRepo` backed by a concurrent map.
//!
//! The default backend for development and tests. Transition atomicity
//! comes from mutating under the map entry's shard lock: the status check
//! and the write happen while the lock is held, so of two racing identical
//! transitions exactly one observes the old status.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use domains::query::paginate;
use domains::visibility::next_status;
use domains::{
    DomainError, NewReview, PageRequest, Reply, Result, Review, ReviewFilter, ReviewPage,
    ReviewPatch, ReviewRepo, ReviewStatus, VisibilityAction,
};

#[derive(Default)]
pub struct MemoryReviewRepo {
    reviews: DashMap<Uuid, Review>,
    sequence: AtomicU64,
}

impl MemoryReviewRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReviewRepo for MemoryReviewRepo {
    async fn create(&self, new: NewReview) -> Result<Review> {
        let now = Utc::now();
        let review = Review {
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
            sequence_number: self.sequence.fetch_add(1, Ordering::Relaxed) + 1,
            created_at: now,
            updated_at: now,
            replies: Vec::new(),
        };
        self.reviews.insert(review.id, review.clone());
        Ok(review)
    }

    async fn get(&self, id: Uuid) -> Result<Review> {
        self.reviews
            .get(&id)
            .map(|entry| entry.clone())
            .ok_or(DomainError::NotFound(id))
    }

    async fn update_fields(&self, id: Uuid, patch: ReviewPatch) -> Result<Review> {
        let mut entry = self.reviews.get_mut(&id).ok_or(DomainError::NotFound(id))?;
        if let Some(rating) = patch.rating {
            entry.rating = rating;
        }
        if let Some(title) = patch.title {
            // An empty patched title clears the optional field.
            entry.title = if title.is_empty() { None } else { Some(title) };
        }
        if let Some(comment) = patch.comment {
            entry.comment = comment;
        }
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    async fn apply_transition(&self, id: Uuid, action: VisibilityAction) -> Result<Review> {
        let mut entry = self.reviews.get_mut(&id).ok_or(DomainError::NotFound(id))?;
        let next = next_status(entry.status, action).ok_or(DomainError::InvalidTransition {
            from: entry.status,
            action,
        })?;
        entry.status = next;
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    async fn append_reply(&self, id: Uuid, reply: Reply) -> Result<Review> {
        let mut entry = self.reviews.get_mut(&id).ok_or(DomainError::NotFound(id))?;
        entry.replies.push(reply);
        Ok(entry.clone())
    }

    async fn list(&self, filter: ReviewFilter, page: PageRequest) -> Result<ReviewPage> {
        let matching: Vec<Review> = self
            .reviews
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        Ok(paginate(matching, page))
    }

    async fn average_rating(&self, target_key: &str) -> Result<f64> {
        let (sum, count) = self
            .reviews
            .iter()
            .filter(|entry| {
                entry.status == ReviewStatus::Public && entry.target_key == target_key
            })
            .fold((0i64, 0u64), |(sum, count), entry| {
                (sum + i64::from(entry.rating), count + 1)
            });
        if count == 0 {
            Ok(0.0)
        } else {
            Ok(sum as f64 / count as f64)
        }
    }
}
