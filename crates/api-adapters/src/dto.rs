//! Request and response bodies for the review API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domains::{Reply, Review, ReviewPage, ReviewPatch, ReviewStatus, TargetType};

/// Query parameters accepted by `GET /api/reviews`. Status and owner
/// filters are requests, not grants — the service narrows them to what the
/// caller may actually see.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub owner_id: Option<Uuid>,
    pub target_key: Option<String>,
    pub target_type: Option<TargetType>,
    pub status: Option<ReviewStatus>,
    /// Case-insensitive substring, matched against title, comment, id, and
    /// author display name.
    pub q: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Pagination-only parameters (`GET /api/reviews/mine`).
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReviewBody {
    pub rating: Option<i32>,
    pub title: Option<String>,
    pub comment: Option<String>,
}

impl From<UpdateReviewBody> for ReviewPatch {
    fn from(body: UpdateReviewBody) -> Self {
        ReviewPatch {
            rating: body.rating,
            title: body.title,
            comment: body.comment,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VisibilityBody {
    pub action: domains::VisibilityAction,
}

#[derive(Debug, Deserialize)]
pub struct ReplyBody {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReplyView {
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl From<Reply> for ReplyView {
    fn from(reply: Reply) -> Self {
        Self {
            message: reply.message,
            created_at: reply.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewView {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub target_type: TargetType,
    pub target_key: String,
    pub target_name: String,
    pub rating: i32,
    pub title: Option<String>,
    pub comment: String,
    pub status: ReviewStatus,
    pub sequence_number: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub reply_count: usize,
    pub replies: Vec<ReplyView>,
}

impl From<Review> for ReviewView {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            author_id: review.author_id,
            author_name: review.author_name,
            target_type: review.target_type,
            target_key: review.target_key,
            target_name: review.target_name,
            rating: review.rating,
            title: review.title,
            comment: review.comment,
            status: review.status,
            sequence_number: review.sequence_number,
            created_at: review.created_at,
            updated_at: review.updated_at,
            reply_count: review.replies.len(),
            replies: review.replies.into_iter().map(ReplyView::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PageView {
    pub items: Vec<ReviewView>,
    pub page: u32,
    pub total_pages: u32,
    pub total_count: u64,
}

impl From<ReviewPage> for PageView {
    fn from(page: ReviewPage) -> Self {
        Self {
            items: page.items.into_iter().map(ReviewView::from).collect(),
            page: page.page,
            total_pages: page.total_pages,
            total_count: page.total_count,
        }
    }
}
