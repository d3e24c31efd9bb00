use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Authenticated Router Module
///
/// Routes open to any caller who clears the authentication stage of the access
/// gate, whatever their role: the profile endpoint and the commenting surface
/// available to readers.
///
/// Access Control Strategy:
/// The `auth_middleware` layer wrapping this router has already resolved the
/// caller's identity, so every handler here starts from a verified `AuthUser` and
/// only the Owner-Only checks (`update_comment`, `delete_comment`) remain, down in
/// the repository queries.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        // Retrieves the currently authenticated user's profile, resolved from the
        // live user row.
        .route("/me", get(handlers::get_me))
        // POST /comments
        // Posts a new comment on an existing post, attributed to the caller.
        .route("/comments", post(handlers::create_comment))
        // PUT /comments/{id}
        // Edits the caller's own comment. **Owner-Only** check in the repository layer.
        .route("/comments/{id}", put(handlers::update_comment))
        // DELETE /comments/{id}
        // Deletes a comment: owners may delete their own, admins may force-delete any.
        .route("/comments/{id}", delete(handlers::delete_comment))
}
