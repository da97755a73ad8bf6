//! Shared handler state, assembled once by the binary.

use std::sync::Arc;

use domains::IdentityResolver;
use services::ReviewService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ReviewService>,
    pub resolver: Arc<dyn IdentityResolver>,
    /// Page size used when the caller does not pass one.
    pub default_page_size: u32,
    /// Upper bound a caller-supplied page size is clamped to.
    pub max_page_size: u32,
}

impl AppState {
    pub fn new(service: Arc<ReviewService>, resolver: Arc<dyn IdentityResolver>) -> Self {
        Self {
            service,
            resolver,
            default_page_size: domains::PageRequest::DEFAULT_PAGE_SIZE,
            max_page_size: domains::PageRequest::MAX_PAGE_SIZE,
        }
    }

    pub fn with_default_page_size(mut self, default_page_size: u32) -> Self {
        self.default_page_size = default_page_size;
        self
    }

    pub fn with_max_page_size(mut self, max_page_size: u32) -> Self {
        self.max_page_size = max_page_size;
        self
    }
}
