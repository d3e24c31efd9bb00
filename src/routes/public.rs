use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// The anonymous surface: read-only content access plus the two entry points of the
/// identity flow, registration and login. No gate is layered here.
///
/// Security Mandate:
/// Nothing in this module may depend on `AuthUser`. The login and register handlers
/// return a signed bearer token; every other identity decision happens behind the
/// access gate on the protected routers.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers and monitoring. Answers "ok" with no
        // further work.
        .route("/health", get(|| async { "ok" }))
        // POST /auth/register
        // Creates a new account (always the 'reader' role) and signs the caller in.
        .route("/auth/register", post(handlers::register_user))
        // POST /auth/login
        // Verifies credentials and issues a fresh bearer token. Unknown email and
        // wrong password are externally indistinguishable.
        .route("/auth/login", post(handlers::login))
        // GET /posts?category=...
        // Lists all posts, newest first, optionally filtered by category slug.
        .route("/posts", get(handlers::get_posts))
        // GET /posts/{id}
        // Retrieves the detailed view of a single post.
        .route("/posts/{id}", get(handlers::get_post))
        // GET /posts/by-slug/{slug}
        // Same detail view, addressed by the URL slug instead of the id.
        .route("/posts/by-slug/{slug}", get(handlers::get_post_by_slug))
        // GET /posts/{id}/comments
        // Lists all associated comments for a specific post, oldest first.
        .route("/posts/{id}/comments", get(handlers::get_comments))
        // GET /categories
        // Lists all categories alphabetically.
        .route("/categories", get(handlers::get_categories))
}
