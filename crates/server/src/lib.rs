//! Knowledge-sharing planner backend.
//!
//! People pick presentation topics, vote on topics and suggestions, claim
//! suggestions and mark topics as discussed. Every operation is a single
//! round trip to Postgres behind a thin axum handler.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod state;
pub mod views;

use axum::{
    Router,
    http::{HeaderValue, header::CACHE_CONTROL},
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};

use handlers::*;
use state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/setup", get(setup))
        .route("/people", get(list_people))
        .route("/people/:id/login", post(login))
        .route("/people/:id/topics", get(person_topics))
        .route(
            "/topics",
            get(list_topics)
                .post(create_topic)
                .put(update_topic)
                .delete(delete_topic),
        )
        .route("/topics/discussed", get(list_discussed_topics))
        .route("/topics/:id/vote", post(vote_topic))
        .route("/topics/:id/discussed", post(mark_discussed))
        .route("/suggestions", get(list_suggestions).post(create_suggestion))
        .route("/suggestions/:id/vote", post(vote_suggestion))
        .route("/suggestions/:id/claim", post(claim_suggestion))
        .route("/leaderboard", get(leaderboard))
        // Clients must always see current state.
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store, max-age=0"),
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
