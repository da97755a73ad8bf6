//! # Caller Identity
//!
//! An identity is the `(id, display_name, capabilities)` triple resolved
//! server-side from a verified session token. Authorization checks test
//! capability membership, never role-name strings.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A resolved capability tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// May create and maintain their own reviews.
    SubmitReviews,
    /// May change review visibility and post replies.
    ModerateReviews,
}

/// The caller of a request, as derived by an [`crate::ports::IdentityResolver`].
///
/// Anonymous callers have no id and an empty capability set; they may read
/// public reviews and nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Option<Uuid>,
    pub display_name: String,
    pub capabilities: HashSet<Capability>,
}

impl Identity {
    pub fn new(id: Uuid, display_name: impl Into<String>, capabilities: HashSet<Capability>) -> Self {
        Self {
            id: Some(id),
            display_name: display_name.into(),
            capabilities,
        }
    }

    /// The fail-closed default for unverifiable callers.
    pub fn anonymous() -> Self {
        Self {
            id: None,
            display_name: "anonymous".to_string(),
            capabilities: HashSet::new(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.id.is_none()
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn can_moderate(&self) -> bool {
        self.can(Capability::ModerateReviews)
    }

    /// True when this identity owns the given author id.
    pub fn owns(&self, author_id: Uuid) -> bool {
        self.id == Some(author_id)
    }
}
