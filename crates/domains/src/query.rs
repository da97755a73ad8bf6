//! Query, search, and pagination primitives.
//!
//! Pure functions over in-memory snapshots so every adapter paginates
//! identically: newest-created first, id as tiebreak, 1-indexed offset
//! pages. Adapters with a query planner of their own (Postgres) must match
//! this ordering exactly.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Review, ReviewStatus, TargetType};

/// Filter over the review store. All present fields must match; `search`
/// is an OR across title, comment, id, and author display name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewFilter {
    pub owner_id: Option<Uuid>,
    pub target_key: Option<String>,
    pub target_type: Option<TargetType>,
    pub status: Option<ReviewStatus>,
    pub search: Option<String>,
}

impl ReviewFilter {
    pub fn matches(&self, review: &Review) -> bool {
        if let Some(owner_id) = self.owner_id {
            if review.author_id != owner_id {
                return false;
            }
        }
        if let Some(target_key) = &self.target_key {
            if &review.target_key != target_key {
                return false;
            }
        }
        if let Some(target_type) = self.target_type {
            if review.target_type != target_type {
                return false;
            }
        }
        if let Some(status) = self.status {
            if review.status != status {
                return false;
            }
        }
        if let Some(needle) = &self.search {
            if !search_matches(review, needle) {
                return false;
            }
        }
        true
    }
}

/// Case-insensitive substring match; any one field matching is sufficient.
fn search_matches(review: &Review, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    if needle.is_empty() {
        return true;
    }
    review
        .title
        .as_deref()
        .is_some_and(|t| t.to_lowercase().contains(&needle))
        || review.comment.to_lowercase().contains(&needle)
        || review.id.to_string().contains(&needle)
        || review.author_name.to_lowercase().contains(&needle)
}

/// A 1-indexed page request with a clamped page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    pub const DEFAULT_PAGE_SIZE: u32 = 20;
    pub const MAX_PAGE_SIZE: u32 = 100;

    /// Out-of-range inputs are clamped rather than rejected: page 0 becomes
    /// 1, page size is bounded to 1..=MAX_PAGE_SIZE.
    pub fn new(page: u32, page_size: u32) -> Self {
        Self::with_limit(page, page_size, Self::MAX_PAGE_SIZE)
    }

    /// Same clamping with a caller-supplied cap, for deployments that
    /// configure a different `max_page_size` than [`Self::MAX_PAGE_SIZE`].
    pub fn with_limit(page: u32, page_size: u32, max_page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, max_page_size.max(1)),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.page_size as usize
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_PAGE_SIZE)
    }
}

/// One page of results plus the totals callers need to render pagers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewPage {
    pub items: Vec<Review>,
    pub page: u32,
    pub total_pages: u32,
    pub total_count: u64,
}

/// `ceil(total_count / page_size)`, minimum 1 so an empty result still has
/// a first page.
pub fn total_pages(total_count: u64, page_size: u32) -> u32 {
    let pages = total_count.div_ceil(page_size as u64);
    pages.clamp(1, u32::MAX as u64) as u32
}

/// Display ordering: most recently created first, ties broken by id so a
/// fixed filter over an unmodified store always returns the same order.
pub fn display_order(a: &Review, b: &Review) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

/// Sort and slice an already-filtered result set into a page.
pub fn paginate(mut matching: Vec<Review>, request: PageRequest) -> ReviewPage {
    matching.sort_by(display_order);
    let total_count = matching.len() as u64;
    let items = matching
        .into_iter()
        .skip(request.offset())
        .take(request.page_size() as usize)
        .collect();
    ReviewPage {
        items,
        page: request.page(),
        total_pages: total_pages(total_count, request.page_size()),
        total_count,
    }
}

/// Round an average rating to one decimal place for display.
pub fn round_rating(average: f64) -> f64 {
    (average * 10.0).round() / 10.0
}
