use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Database-Backed Rows ---

/// Role
///
/// The RBAC label attached to every user. Stored as a lowercase string in the
/// `users.role` column and serialized the same way in JSON.
///
/// `Admin` satisfies any role requirement; all other roles satisfy only an exact
/// match. That single rule lives in `satisfies` and nowhere else.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    Author,
    #[default]
    Reader,
}

impl Role {
    /// The one role-comparison rule of the access gate.
    pub fn satisfies(self, required: Role) -> bool {
        self == Role::Admin || self == required
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Author => "author",
            Role::Reader => "reader",
        }
    }
}

/// User
///
/// The canonical identity record stored in the `users` table. The password hash is
/// write-only from the API's point of view: it is persisted at registration and read
/// during login, but `#[serde(skip)]` guarantees it never appears in a response body.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    // The user's login identifier. Unique.
    pub email: String,
    // Public display handle. Unique.
    pub username: String,
    /// PHC-encoded Argon2id hash. Never serialized.
    #[serde(skip)]
    pub password_hash: String,
    // The RBAC field: 'admin', 'author' or 'reader'.
    pub role: Role,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Post
///
/// A blog post record from the `posts` table. This is the primary data structure for
/// the content surface.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Post {
    pub id: Uuid,
    // FK to users.id (the writing author).
    pub author_id: Uuid,
    // FK to categories.id.
    pub category_id: Uuid,
    pub title: String,
    /// URL-friendly identifier derived from the title. Unique.
    pub slug: String,
    pub content: String,
    // Relative URL of the uploaded cover image, if any.
    pub image_url: Option<String>,
    pub likes: i32,

    // Filled in by the users join; absent on plain RETURNING rows.
    #[sqlx(default)]
    pub author_username: Option<String>,

    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Comment
///
/// A comment record from the `comments` table, augmented with the author's username
/// (a join operation).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Comment {
    // Using BigInt (i64) for comment IDs due to the high volume potential.
    pub id: i64,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub content: String,

    // Filled in by the users join in the repository queries.
    #[sqlx(default)]
    pub author_username: Option<String>,

    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Category
///
/// A post category from the `categories` table. Created and modified exclusively by
/// administrators.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// --- Request Payloads ---

/// RegisterRequest
///
/// Input payload for the public registration endpoint (POST /auth/register). The
/// plaintext password only ever flows into the credential hasher; it is neither
/// persisted nor logged.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// LoginRequest
///
/// Input payload for POST /auth/login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// LoginResponse
///
/// Output of a successful register or login: the signed bearer token plus the public
/// view of the user record.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// CreatePostRequest
///
/// Input payload for submitting a new post (POST /posts). The slug is derived
/// server-side from the title.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    pub category_id: Uuid,
    // Relative URL previously returned by the upload endpoint.
    pub image_url: Option<String>,
}

/// UpdatePostRequest
///
/// Partial update payload for modifying an existing post (PUT /posts/{id}).
///
/// Uses `Option<T>` for all fields and `#[serde(skip_serializing_if = "Option::is_none")]`
/// to efficiently handle partial updates, ensuring only provided fields are included
/// in the JSON payload. A changed title re-derives the slug.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdatePostRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// CreateCommentRequest
///
/// Body of POST /comments.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCommentRequest {
    pub content: String,
    pub post_id: Uuid,
}

/// UpdateCommentRequest
///
/// Input payload for editing an existing comment.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateCommentRequest {
    pub content: String,
}

/// CreateCategoryRequest
///
/// Input payload for creating or renaming a category (admin only). The slug is
/// derived server-side from the name.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCategoryRequest {
    pub name: String,
}

/// --- Profile & Upload Schemas (Output) ---

/// UserProfile
///
/// What GET /me returns: the public fields of the caller's own row.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub role: Role,
}

/// UploadResponse
///
/// Output schema of the image upload endpoint: the relative URL under which the
/// stored file is served.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UploadResponse {
    pub url: String,
}
