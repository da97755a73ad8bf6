//! Shared fixtures for the cross-crate test suite.
//!
//! Tests here exercise the real service wired to the in-memory store; the
//! HTTP fixtures additionally go through the axum router with signed test
//! tokens, the same path production requests take.

use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use domains::{Capability, Identity, TargetType};
use services::{CreateReviewInput, ReviewService};
use storage_adapters::MemoryReviewRepo;

pub fn service() -> ReviewService {
    ReviewService::new(Arc::new(MemoryReviewRepo::new()))
}

pub fn customer(name: &str) -> Identity {
    Identity::new(
        Uuid::now_v7(),
        name,
        HashSet::from([Capability::SubmitReviews]),
    )
}

pub fn moderator(name: &str) -> Identity {
    Identity::new(
        Uuid::now_v7(),
        name,
        HashSet::from([Capability::SubmitReviews, Capability::ModerateReviews]),
    )
}

pub fn review_input(target_key: &str) -> CreateReviewInput {
    CreateReviewInput {
        target_type: TargetType::Product,
        target_key: target_key.to_string(),
        target_name: "Walnut desk".to_string(),
        rating: 4,
        title: Some("Solid".to_string()),
        comment: "Sturdy and well made".to_string(),
    }
}

#[cfg(feature = "web-axum")]
pub mod http {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use tower::ServiceExt;
    use uuid::Uuid;

    use api_adapters::{router, AppState};
    use auth_adapters::SignedTokenResolver;
    use services::ReviewService;
    use storage_adapters::MemoryReviewRepo;

    pub const SECRET: &str = "integration-test-secret";

    pub fn app() -> Router {
        let service = Arc::new(ReviewService::new(Arc::new(MemoryReviewRepo::new())));
        let resolver = Arc::new(SignedTokenResolver::new(SECRET));
        router(AppState::new(service, resolver))
    }

    /// A bearer header for a fresh identity with the given role tag.
    pub fn bearer(role: &str) -> String {
        bearer_named(Uuid::now_v7(), "mira", role)
    }

    pub fn bearer_named(user_id: Uuid, name: &str, role: &str) -> String {
        let token = SignedTokenResolver::new(SECRET).issue(user_id, name, role);
        format!("Bearer {token}")
    }

    pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    pub fn get(uri: &str, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::empty()).unwrap()
    }

    pub fn json(
        method: &str,
        uri: &str,
        auth: Option<&str>,
        body: serde_json::Value,
    ) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    pub fn create_review_body(target_key: &str, rating: i64) -> serde_json::Value {
        serde_json::json!({
            "target_type": "product",
            "target_key": target_key,
            "target_name": "Walnut desk",
            "rating": rating,
            "title": "Solid",
            "comment": "Sturdy and well made"
        })
    }
}
