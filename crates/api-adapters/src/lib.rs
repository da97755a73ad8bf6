//! # api-adapters
//!
//! The HTTP surface of the review service (feature `web-axum`). Thin by
//! design: handlers resolve the caller, translate DTOs, and delegate every
//! decision to `services`; errors map onto structured JSON responses.

#[cfg(feature = "web-axum")]
pub mod dto;
#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod handlers;
#[cfg(feature = "web-axum")]
pub mod state;

#[cfg(feature = "web-axum")]
pub use state::AppState;

#[cfg(feature = "web-axum")]
pub fn router(state: AppState) -> axum::Router {
    use axum::routing::{get, post};
    use tower_http::cors::CorsLayer;
    use tower_http::trace::TraceLayer;

    axum::Router::new()
        .route("/healthz", get(handlers::healthz))
        .route(
            "/api/reviews",
            post(handlers::create_review).get(handlers::list_reviews),
        )
        .route("/api/reviews/mine", get(handlers::list_my_reviews))
        .route(
            "/api/reviews/{id}",
            get(handlers::get_review)
                .patch(handlers::update_review)
                .delete(handlers::delete_review),
        )
        .route("/api/reviews/{id}/visibility", post(handlers::change_visibility))
        .route("/api/reviews/{id}/replies", post(handlers::add_reply))
        .route("/api/targets/{target_key}/summary", get(handlers::target_summary))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
