use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, post, put},
};

/// Admin Router Module
///
/// Defines the routes exclusively accessible to users with the 'admin' role:
/// the category taxonomy, which shapes the public content surface for every reader.
///
/// Access Control:
/// This entire router is wrapped by the `require_admin` layer, which first
/// authenticates the user (using the `AuthUser` extractor) and then explicitly checks
/// for the `admin` role before allowing the request to proceed to the handler.
/// This prevents any unauthorized access to the taxonomy management functions.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST /categories
        // Creates a new category; the slug is derived from the name.
        .route("/categories", post(handlers::create_category))
        // PUT /categories/{id}
        // Renames a category; the slug follows the new name.
        .route("/categories/{id}", put(handlers::update_category))
        // DELETE /categories/{id}
        // Removes a category. Refused with 400 while posts still reference it.
        .route("/categories/{id}", delete(handlers::delete_category))
}
