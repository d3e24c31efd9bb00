use crate::models::{
    Category, Comment, CreatePostRequest, Post, UpdatePostRequest, User,
};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// The single seam between the HTTP layer and persistence. Handlers and the access
/// gate speak only this trait; whether the rows live in Postgres or in a test's
/// in-memory vectors is invisible to them.
///
/// The **Send + Sync** bounds (plus async_trait) let the `Arc<dyn Repository>` trait
/// object cross Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users / Identity ---
    // Inserts a new user row. Returns None on conflict (duplicate email/username).
    async fn create_user(&self, user: User) -> Option<User>;
    // Exact-match lookup used at login time.
    async fn find_user_by_email(&self, email: &str) -> Option<User>;
    // Per-request identity resolution. Never cached: the returned role must be the
    // live one so that revocation takes effect on the next request.
    async fn find_user_by_id(&self, id: Uuid) -> Option<User>;

    // --- Posts ---
    // Public listing, optionally filtered by category slug.
    async fn get_posts(&self, category: Option<String>) -> Vec<Post>;
    async fn get_post(&self, id: Uuid) -> Option<Post>;
    async fn get_post_by_slug(&self, slug: &str) -> Option<Post>;
    async fn create_post(
        &self,
        req: CreatePostRequest,
        slug: String,
        author_id: Uuid,
    ) -> Option<Post>;
    // Owner-Only: updates only if `author_id` matches the post's author. Uses
    // COALESCE for partial updates.
    async fn update_post(
        &self,
        id: Uuid,
        author_id: Uuid,
        req: UpdatePostRequest,
        slug: Option<String>,
    ) -> Option<Post>;
    // Owner-Only: deletes only if `author_id` matches the post's author.
    async fn delete_post(&self, id: Uuid, author_id: Uuid) -> bool;

    // --- Comments ---
    async fn add_comment(&self, post_id: Uuid, user_id: Uuid, content: String) -> Option<Comment>;
    async fn get_comments(&self, post_id: Uuid) -> Vec<Comment>;
    // Owner-Only: updates only the caller's own comment.
    async fn update_comment(&self, id: i64, user_id: Uuid, content: String) -> Option<Comment>;
    // Owner-Only: a non-owner's delete affects zero rows.
    async fn delete_comment(&self, id: i64, user_id: Uuid) -> bool;
    // Admin override: deletes any comment, ownership ignored.
    async fn delete_comment_admin(&self, id: i64) -> bool;

    // --- Categories ---
    async fn get_categories(&self) -> Vec<Category>;
    async fn get_category(&self, id: Uuid) -> Option<Category>;
    async fn create_category(&self, name: String, slug: String) -> Option<Category>;
    async fn update_category(&self, id: Uuid, name: String, slug: String) -> Option<Category>;
    async fn delete_category(&self, id: Uuid) -> bool;
    // Guard for deletion: categories still referenced by posts must not be removed.
    async fn count_posts_in_category(&self, id: Uuid) -> i64;
}

/// RepositoryState
///
/// The shape the repository takes inside `AppState`.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The production implementation, one `sqlx` pool behind every method.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Shared column lists keep the SELECT shape identical across queries.
const USER_COLUMNS: &str = "id, email, username, password_hash, role, created_at, updated_at";
const POST_COLUMNS: &str =
    "p.id, p.author_id, p.category_id, p.title, p.slug, p.content, p.image_url, p.likes, \
     p.created_at, p.updated_at, u.username AS author_username";

#[async_trait]
impl Repository for PostgresRepository {
    /// create_user
    ///
    /// Inserts the registration row. A unique violation on email or username is a
    /// normal outcome (the caller maps it to a 400), so it is logged and collapsed
    /// into None rather than propagated.
    async fn create_user(&self, user: User) -> Option<User> {
        let query = format!(
            "INSERT INTO users (id, email, username, password_hash, role, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, NOW(), NOW()) RETURNING {USER_COLUMNS}"
        );
        match sqlx::query_as::<_, User>(&query)
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(user.role)
            .fetch_one(&self.pool)
            .await
        {
            Ok(u) => Some(u),
            Err(e) => {
                tracing::error!("create_user error: {:?}", e);
                None
            }
        }
    }

    async fn find_user_by_email(&self, email: &str) -> Option<User> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("find_user_by_email error: {:?}", e);
                None
            })
    }

    async fn find_user_by_id(&self, id: Uuid) -> Option<User> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("find_user_by_id error: {:?}", e);
                None
            })
    }

    /// get_posts
    ///
    /// The optional category filter is assembled with QueryBuilder; the slug is
    /// bound, never interpolated. Every row carries the author's username from the
    /// users join.
    async fn get_posts(&self, category: Option<String>) -> Vec<Post> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {POST_COLUMNS} FROM posts p JOIN users u ON p.author_id = u.id"
        ));

        if let Some(slug) = category {
            builder.push(" JOIN categories c ON p.category_id = c.id WHERE c.slug = ");
            builder.push_bind(slug);
        }

        builder.push(" ORDER BY p.created_at DESC");

        let query = builder.build_query_as::<Post>();

        match query.fetch_all(&self.pool).await {
            Ok(p) => p,
            Err(e) => {
                tracing::error!("get_posts error: {:?}", e);
                vec![]
            }
        }
    }

    async fn get_post(&self, id: Uuid) -> Option<Post> {
        let query = format!(
            "SELECT {POST_COLUMNS} FROM posts p JOIN users u ON p.author_id = u.id WHERE p.id = $1"
        );
        sqlx::query_as::<_, Post>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_post error: {:?}", e);
                None
            })
    }

    async fn get_post_by_slug(&self, slug: &str) -> Option<Post> {
        let query = format!(
            "SELECT {POST_COLUMNS} FROM posts p JOIN users u ON p.author_id = u.id WHERE p.slug = $1"
        );
        sqlx::query_as::<_, Post>(&query)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_post_by_slug error: {:?}", e);
                None
            })
    }

    /// create_post
    ///
    /// Inserts a new post attributed to `author_id`. The slug has already been
    /// derived by the handler; a duplicate slug collapses into None.
    async fn create_post(
        &self,
        req: CreatePostRequest,
        slug: String,
        author_id: Uuid,
    ) -> Option<Post> {
        let new_id = Uuid::new_v4();
        match sqlx::query_as::<_, Post>(
            "INSERT INTO posts (id, author_id, category_id, title, slug, content, image_url, likes, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, 0, NOW(), NOW()) \
             RETURNING id, author_id, category_id, title, slug, content, image_url, likes, created_at, updated_at",
        )
        .bind(new_id)
        .bind(author_id)
        .bind(req.category_id)
        .bind(&req.title)
        .bind(&slug)
        .bind(&req.content)
        .bind(&req.image_url)
        .fetch_one(&self.pool)
        .await
        {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::error!("create_post error: {:?}", e);
                None
            }
        }
    }

    /// update_post
    ///
    /// Partial update scoped to the owning author. Each `Option<T>` field is folded
    /// in with `COALESCE`, so a `None` leaves the stored column untouched.
    async fn update_post(
        &self,
        id: Uuid,
        author_id: Uuid,
        req: UpdatePostRequest,
        slug: Option<String>,
    ) -> Option<Post> {
        sqlx::query_as::<_, Post>(
            "UPDATE posts \
             SET title = COALESCE($3, title), \
                 slug = COALESCE($4, slug), \
                 content = COALESCE($5, content), \
                 category_id = COALESCE($6, category_id), \
                 image_url = COALESCE($7, image_url), \
                 updated_at = NOW() \
             WHERE id = $1 AND author_id = $2 \
             RETURNING id, author_id, category_id, title, slug, content, image_url, likes, created_at, updated_at",
        )
        .bind(id)
        .bind(author_id)
        .bind(&req.title)
        .bind(&slug)
        .bind(&req.content)
        .bind(req.category_id)
        .bind(&req.image_url)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_post error: {:?}", e);
            None
        })
    }

    /// delete_post
    ///
    /// The `author_id` predicate in the WHERE clause is the ownership check: a
    /// non-owner's delete simply affects zero rows.
    async fn delete_post(&self, id: Uuid, author_id: Uuid) -> bool {
        match sqlx::query("DELETE FROM posts WHERE id = $1 AND author_id = $2")
            .bind(id)
            .bind(author_id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_post error: {:?}", e);
                false
            }
        }
    }

    /// add_comment
    ///
    /// Inserts a new comment and immediately joins with `users` to return the
    /// enriched `Comment` model, including the author's username.
    async fn add_comment(&self, post_id: Uuid, user_id: Uuid, content: String) -> Option<Comment> {
        // Insert and username join in one round trip via a CTE.
        sqlx::query_as::<_, Comment>(
            "WITH inserted AS ( \
                 INSERT INTO comments (post_id, user_id, content) VALUES ($1, $2, $3) \
                 RETURNING id, post_id, user_id, content, created_at, updated_at \
             ) \
             SELECT i.id, i.post_id, i.user_id, i.content, i.created_at, i.updated_at, \
                    u.username AS author_username \
             FROM inserted i JOIN users u ON i.user_id = u.id",
        )
        .bind(post_id)
        .bind(user_id)
        .bind(&content)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("add_comment error: {:?}", e);
            None
        })
    }

    async fn get_comments(&self, post_id: Uuid) -> Vec<Comment> {
        sqlx::query_as::<_, Comment>(
            "SELECT c.id, c.post_id, c.user_id, c.content, c.created_at, c.updated_at, \
                    u.username AS author_username \
             FROM comments c JOIN users u ON c.user_id = u.id \
             WHERE c.post_id = $1 \
             ORDER BY c.created_at ASC",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_default()
    }

    /// update_comment
    ///
    /// Ownership enforced by the `user_id` predicate; editing someone else's
    /// comment matches nothing.
    async fn update_comment(&self, id: i64, user_id: Uuid, content: String) -> Option<Comment> {
        sqlx::query_as::<_, Comment>(
            "UPDATE comments SET content = $3, updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 \
             RETURNING id, post_id, user_id, content, created_at, updated_at",
        )
        .bind(id)
        .bind(user_id)
        .bind(&content)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_comment error: {:?}", e);
            None
        })
    }

    /// delete_comment
    ///
    /// Owner-scoped delete, same `user_id` predicate as `update_comment`.
    async fn delete_comment(&self, id: i64, user_id: Uuid) -> bool {
        match sqlx::query("DELETE FROM comments WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_comment error: {:?}", e);
                false
            }
        }
    }

    /// delete_comment_admin
    ///
    /// Moderation path: no ownership predicate.
    async fn delete_comment_admin(&self, id: i64) -> bool {
        match sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_comment_admin error: {:?}", e);
                false
            }
        }
    }

    async fn get_categories(&self) -> Vec<Category> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, created_at, updated_at FROM categories ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_categories error: {:?}", e);
            vec![]
        })
    }

    async fn get_category(&self, id: Uuid) -> Option<Category> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, created_at, updated_at FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_category error: {:?}", e);
            None
        })
    }

    /// create_category
    ///
    /// A duplicate name or slug collapses into None (the caller maps it to a 400).
    async fn create_category(&self, name: String, slug: String) -> Option<Category> {
        let new_id = Uuid::new_v4();
        match sqlx::query_as::<_, Category>(
            "INSERT INTO categories (id, name, slug, created_at, updated_at) \
             VALUES ($1, $2, $3, NOW(), NOW()) \
             RETURNING id, name, slug, created_at, updated_at",
        )
        .bind(new_id)
        .bind(&name)
        .bind(&slug)
        .fetch_one(&self.pool)
        .await
        {
            Ok(c) => Some(c),
            Err(e) => {
                tracing::error!("create_category error: {:?}", e);
                None
            }
        }
    }

    async fn update_category(&self, id: Uuid, name: String, slug: String) -> Option<Category> {
        sqlx::query_as::<_, Category>(
            "UPDATE categories SET name = $2, slug = $3, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING id, name, slug, created_at, updated_at",
        )
        .bind(id)
        .bind(&name)
        .bind(&slug)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_category error: {:?}", e);
            None
        })
    }

    async fn delete_category(&self, id: Uuid) -> bool {
        match sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_category error: {:?}", e);
                false
            }
        }
    }

    async fn count_posts_in_category(&self, id: Uuid) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts WHERE category_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("count_posts_in_category error: {:?}", e);
                0
            })
    }
}
