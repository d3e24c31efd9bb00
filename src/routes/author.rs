use crate::{AppState, handlers};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::post,
};

/// Author Router Module
///
/// Defines the routes for content production: creating, modifying and deleting
/// posts, and uploading cover images. Restricted to users with the 'author' role;
/// admins satisfy the requirement as well.
///
/// Access Control:
/// This entire router is wrapped by the `require_author` layer, which first
/// authenticates the caller (via the `AuthUser` extractor) and then enforces the
/// role requirement before any handler runs. Handlers therefore contain no role
/// logic; the remaining **Owner-Only** checks (an author may only touch their own
/// posts) live in the repository queries.
pub fn author_routes() -> Router<AppState> {
    Router::new()
        // POST /posts
        // Submits a new post. The author is always the authenticated caller; the
        // slug is derived server-side from the title.
        .route("/posts", post(handlers::create_post))
        // PUT/DELETE /posts/{id}
        // Allows an author to modify or remove their own post.
        // Strict ownership check is enforced at the repository level.
        .route(
            "/posts/{id}",
            axum::routing::put(handlers::update_post).delete(handlers::delete_post),
        )
        // POST /uploads/image
        // Multipart image upload. The route-level body limit leaves headroom over the
        // 5 MiB file contract for the multipart framing itself.
        .route(
            "/uploads/image",
            post(handlers::upload_image)
                .layer(DefaultBodyLimit::max(handlers::MAX_IMAGE_BYTES + 64 * 1024)),
        )
}
