use crate::{
    AppState, auth,
    auth::AuthUser,
    error::ApiError,
    models::{
        Category, Comment, CreateCategoryRequest, CreateCommentRequest, CreatePostRequest,
        LoginRequest, LoginResponse, Post, RegisterRequest, Role, UpdateCommentRequest,
        UpdatePostRequest, UploadResponse, User, UserProfile,
    },
};
use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

/// Upload size ceiling, matching the request body limit on the upload route.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

// --- Query Parameters ---

/// PostFilter
///
/// The query string accepted by GET /posts, bound through Axum's Query extractor.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct PostFilter {
    /// Optional filter: only posts in the category with this slug.
    pub category: Option<String>,
}

/// slugify
///
/// Derives a URL-friendly identifier from a title or name: lowercase ASCII
/// alphanumeric runs joined by single dashes.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut prev_dash = false;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            prev_dash = false;
        } else if !slug.is_empty() && !prev_dash {
            slug.push('-');
            prev_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

// --- Auth Handlers ---

/// register_user
///
/// [Public Route] Creates a new account. The plaintext password flows only into the
/// credential hasher; what is stored is the salted Argon2id hash. New accounts
/// always start with the `reader` role; promotion is a data operation, not an API.
///
/// Returns the same `{token, user}` shape as login so clients are signed in
/// immediately after registering.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = LoginResponse),
        (status = 400, description = "Invalid or duplicate registration data")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), ApiError> {
    if payload.email.is_empty() || !payload.email.contains('@') || payload.username.is_empty() {
        return Err(ApiError::BadRequest("email and username are required".into()));
    }
    if payload.password.len() < 6 {
        return Err(ApiError::BadRequest(
            "password must be at least 6 characters".into(),
        ));
    }

    // An entropy/parameter failure here is infrastructure trouble, surfaced as a
    // logged 500 rather than a client error.
    let password_hash = state
        .hasher
        .hash(&payload.password)
        .map_err(ApiError::Hashing)?;

    let user = User {
        id: Uuid::new_v4(),
        email: payload.email,
        username: payload.username,
        password_hash,
        role: Role::Reader,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    // A duplicate email or username surfaces as a plain 400.
    let user = state
        .repo
        .create_user(user)
        .await
        .ok_or_else(|| ApiError::BadRequest("failed to create user".into()))?;

    let token = state
        .tokens
        .issue(user.id)
        .map_err(|e| ApiError::Internal(format!("token issuance failed: {e}")))?;

    Ok((StatusCode::CREATED, Json(LoginResponse { token, user })))
}

/// login
///
/// [Public Route] Authenticates an account and returns a fresh bearer token.
///
/// *Security*: `auth::authenticate` guarantees that an unknown email and a wrong
/// password are externally indistinguishable.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = auth::authenticate(&state.repo, &state.hasher, &payload.email, &payload.password)
        .await?;

    let token = state
        .tokens
        .issue(user.id)
        .map_err(|e| ApiError::Internal(format!("token issuance failed: {e}")))?;

    Ok(Json(LoginResponse { token, user }))
}

/// get_me
///
/// [Authenticated Route] Provides the authenticated user's profile information,
/// resolved from the live user row.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = UserProfile))
)]
pub async fn get_me(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = state
        .repo
        .find_user_by_id(id)
        .await
        .ok_or(ApiError::UnknownSubject)?;

    Ok(Json(UserProfile {
        id: user.id,
        email: user.email,
        username: user.username,
        role: user.role,
    }))
}

// --- Post Handlers ---

/// get_posts
///
/// [Public Route] Lists posts, optionally filtered by category slug.
#[utoipa::path(
    get,
    path = "/posts",
    params(PostFilter),
    responses((status = 200, description = "List posts", body = [Post]))
)]
pub async fn get_posts(
    State(state): State<AppState>,
    Query(filter): Query<PostFilter>,
) -> Json<Vec<Post>> {
    let posts = state.repo.get_posts(filter.category).await;
    Json(posts)
}

/// get_post
///
/// [Public Route] Retrieves a single post by ID.
#[utoipa::path(
    get,
    path = "/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Found", body = Post),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Post>, ApiError> {
    state.repo.get_post(id).await.map(Json).ok_or(ApiError::NotFound)
}

/// get_post_by_slug
///
/// [Public Route] Retrieves a single post by its URL slug.
#[utoipa::path(
    get,
    path = "/posts/by-slug/{slug}",
    params(("slug" = String, Path, description = "Post slug")),
    responses(
        (status = 200, description = "Found", body = Post),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_post_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Post>, ApiError> {
    state
        .repo
        .get_post_by_slug(&slug)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// create_post
///
/// [Author Route] Submits a new post. The author is always the authenticated user;
/// the slug is derived from the title server-side.
#[utoipa::path(
    post,
    path = "/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Created", body = Post),
        (status = 400, description = "Unknown category or duplicate slug")
    )
)]
pub async fn create_post(
    AuthUser { id: author_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    if payload.title.is_empty() || payload.content.is_empty() {
        return Err(ApiError::BadRequest("title and content are required".into()));
    }

    let slug = slugify(&payload.title);
    let post = state
        .repo
        .create_post(payload, slug, author_id)
        .await
        .ok_or_else(|| ApiError::BadRequest("failed to create post".into()))?;

    Ok((StatusCode::CREATED, Json(post)))
}

/// update_post
///
/// [Author Route] Modifies an existing post.
///
/// *Authorization*: The repository method enforces an **Owner-Only** check against
/// the author id provided by the access gate. If the caller is not the author, the
/// query affects 0 rows and the response is a 404.
#[utoipa::path(
    put,
    path = "/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Updated", body = Post),
        (status = 404, description = "Not Found or Not Yours")
    )
)]
pub async fn update_post(
    AuthUser { id: author_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<Json<Post>, ApiError> {
    // A changed title re-derives the slug alongside it.
    let slug = payload.title.as_deref().map(slugify);

    state
        .repo
        .update_post(id, author_id, payload, slug)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// delete_post
///
/// [Author Route] Removes a post.
///
/// *Authorization*: **Owner-Only** check in the repository layer; a non-owner gets
/// the same 404 as a missing post.
#[utoipa::path(
    delete,
    path = "/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found or Not Yours")
    )
)]
pub async fn delete_post(
    AuthUser { id: author_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.repo.delete_post(id, author_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

// --- Comment Handlers ---

/// get_comments
///
/// [Public Route] Retrieves all comments for a given post ID, oldest first.
#[utoipa::path(
    get,
    path = "/posts/{id}/comments",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses((status = 200, description = "Comments", body = [Comment]))
)]
pub async fn get_comments(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> Json<Vec<Comment>> {
    let comments = state.repo.get_comments(post_id).await;
    Json(comments)
}

/// create_comment
///
/// [Authenticated Route] Posts a new comment on an existing post.
#[utoipa::path(
    post,
    path = "/comments",
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment Added", body = Comment),
        (status = 404, description = "Post Not Found")
    )
)]
pub async fn create_comment(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    if payload.content.is_empty() {
        return Err(ApiError::BadRequest("content is required".into()));
    }

    // Commenting on a deleted post is a 404, not a foreign-key error.
    if state.repo.get_post(payload.post_id).await.is_none() {
        return Err(ApiError::NotFound);
    }

    let comment = state
        .repo
        .add_comment(payload.post_id, user_id, payload.content)
        .await
        .ok_or_else(|| ApiError::Internal("failed to insert comment".into()))?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// update_comment
///
/// [Authenticated Route] Edits the caller's own comment.
///
/// *Authorization*: **Owner-Only** check in the repository layer.
#[utoipa::path(
    put,
    path = "/comments/{id}",
    params(("id" = i64, Path, description = "Comment ID")),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Updated", body = Comment),
        (status = 404, description = "Not Found or Not Yours")
    )
)]
pub async fn update_comment(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCommentRequest>,
) -> Result<Json<Comment>, ApiError> {
    if payload.content.is_empty() {
        return Err(ApiError::BadRequest("content is required".into()));
    }

    state
        .repo
        .update_comment(id, user_id, payload.content)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// delete_comment
///
/// [Authenticated Route] Removes a comment under two-tier authorization: admins may
/// moderate any comment away, everyone else only their own. A failed ownership
/// check is indistinguishable from a missing comment.
#[utoipa::path(
    delete,
    path = "/comments/{id}",
    params(("id" = i64, Path, description = "Comment ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found or Not Yours")
    )
)]
pub async fn delete_comment(
    AuthUser { id: user_id, role }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = if role == Role::Admin {
        // Moderation path, ownership ignored.
        state.repo.delete_comment_admin(id).await
    } else {
        // Owner-scoped path.
        state.repo.delete_comment(id, user_id).await
    };

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

// --- Category Handlers ---

/// get_categories
///
/// [Public Route] Lists all categories, alphabetically.
#[utoipa::path(
    get,
    path = "/categories",
    responses((status = 200, description = "Categories", body = [Category]))
)]
pub async fn get_categories(State(state): State<AppState>) -> Json<Vec<Category>> {
    Json(state.repo.get_categories().await)
}

/// create_category
///
/// [Admin Route] Creates a new category. The role requirement is enforced by the
/// access gate on the admin router; the handler contains no role logic.
#[utoipa::path(
    post,
    path = "/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Created", body = Category),
        (status = 400, description = "Duplicate name")
    )
)]
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    if payload.name.is_empty() {
        return Err(ApiError::BadRequest("name is required".into()));
    }

    let slug = slugify(&payload.name);
    let category = state
        .repo
        .create_category(payload.name, slug)
        .await
        .ok_or_else(|| ApiError::BadRequest("failed to create category".into()))?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// update_category
///
/// [Admin Route] Renames a category; the slug follows the new name.
#[utoipa::path(
    put,
    path = "/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = CreateCategoryRequest,
    responses(
        (status = 200, description = "Updated", body = Category),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<Json<Category>, ApiError> {
    if payload.name.is_empty() {
        return Err(ApiError::BadRequest("name is required".into()));
    }

    let slug = slugify(&payload.name);
    state
        .repo
        .update_category(id, payload.name, slug)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// delete_category
///
/// [Admin Route] Removes a category, refusing while posts still reference it.
#[utoipa::path(
    delete,
    path = "/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Category still has posts"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.repo.get_category(id).await.is_none() {
        return Err(ApiError::NotFound);
    }

    if state.repo.count_posts_in_category(id).await > 0 {
        return Err(ApiError::BadRequest(
            "cannot delete category with existing posts".into(),
        ));
    }

    if state.repo.delete_category(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

// --- Upload Handler ---

/// upload_image
///
/// [Author Route] Accepts a multipart form with a single `image` field and stores it
/// through the storage service. Responds with the relative URL under which the file
/// is served.
///
/// *Limits*: bodies beyond the route's byte limit are rejected before this handler
/// runs; the explicit size check covers the exact 5 MiB contract.
#[utoipa::path(
    post,
    path = "/uploads/image",
    responses(
        (status = 200, description = "Stored", body = UploadResponse),
        (status = 400, description = "No file, oversized, or unsupported type")
    )
)]
pub async fn upload_image(
    AuthUser { .. }: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("malformed multipart body".into()))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload.bin").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|_| ApiError::BadRequest("failed to read upload".into()))?;

        if data.len() > MAX_IMAGE_BYTES {
            return Err(ApiError::BadRequest("file size exceeds 5MB limit".into()));
        }

        let stored = state
            .storage
            .save_image(&filename, &data)
            .await
            .map_err(|e| ApiError::BadRequest(e))?;

        return Ok(Json(UploadResponse {
            url: format!("/uploads/{}", stored),
        }));
    }

    Err(ApiError::BadRequest("no file uploaded".into()))
}
