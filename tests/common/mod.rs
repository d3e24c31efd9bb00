#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use inkpost::{
    AppState, CredentialHasher, MockStorageService, TokenService, create_router,
    models::{Category, Comment, CreatePostRequest, Post, Role, UpdatePostRequest, User},
    repository::{Repository, RepositoryState},
    storage::StorageState,
};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicI64, Ordering},
};
use tokio::net::TcpListener;
use uuid::Uuid;

/// Signing secret shared by every test token in this suite.
pub const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

/// Token lifetime used by the test TokenService.
pub const TEST_TOKEN_TTL: std::time::Duration = std::time::Duration::from_secs(60 * 60);

// --- In-Memory Repository ---

/// MemoryRepository
///
/// A full in-memory implementation of the `Repository` trait, mirroring the
/// constraints the Postgres schema enforces (unique emails/usernames/slugs,
/// category foreign keys, ownership-scoped updates). Lets the integration tests
/// drive the real router end-to-end without a database.
#[derive(Default)]
pub struct MemoryRepository {
    users: Mutex<Vec<User>>,
    posts: Mutex<Vec<Post>>,
    comments: Mutex<Vec<Comment>>,
    categories: Mutex<Vec<Category>>,
    next_comment_id: AtomicI64,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self {
            next_comment_id: AtomicI64::new(1),
            ..Default::default()
        }
    }

    /// Direct data mutation standing in for an operator's role change. Role
    /// promotion/demotion is not an API, so tests reach into the store.
    pub fn set_role(&self, id: Uuid, role: Role) {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.role = role;
        }
    }

    /// Removes a user row entirely, simulating account deletion after a token
    /// was issued.
    pub fn remove_user(&self, id: Uuid) {
        self.users.lock().unwrap().retain(|u| u.id != id);
    }

    pub fn stored_password_hash(&self, email: &str) -> Option<String> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.password_hash.clone())
    }

    fn username_of(&self, id: Uuid) -> Option<String> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.username.clone())
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create_user(&self, user: User) -> Option<User> {
        let mut users = self.users.lock().unwrap();
        if users
            .iter()
            .any(|u| u.email == user.email || u.username == user.username)
        {
            return None;
        }
        users.push(user.clone());
        Some(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned()
    }

    async fn find_user_by_id(&self, id: Uuid) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned()
    }

    async fn get_posts(&self, category: Option<String>) -> Vec<Post> {
        // None = unfiltered; Some(None) = unknown slug, which matches nothing
        // (the SQL join would yield zero rows).
        let filter = category.map(|slug| {
            self.categories
                .lock()
                .unwrap()
                .iter()
                .find(|c| c.slug == slug)
                .map(|c| c.id)
        });

        let mut posts: Vec<Post> = self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| match filter {
                None => true,
                Some(None) => false,
                Some(Some(cid)) => p.category_id == cid,
            })
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts
    }

    async fn get_post(&self, id: Uuid) -> Option<Post> {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    async fn get_post_by_slug(&self, slug: &str) -> Option<Post> {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.slug == slug)
            .cloned()
    }

    async fn create_post(
        &self,
        req: CreatePostRequest,
        slug: String,
        author_id: Uuid,
    ) -> Option<Post> {
        // The FK to categories and the unique slug both reject the insert.
        if !self
            .categories
            .lock()
            .unwrap()
            .iter()
            .any(|c| c.id == req.category_id)
        {
            return None;
        }
        let author_username = self.username_of(author_id)?;

        let mut posts = self.posts.lock().unwrap();
        if posts.iter().any(|p| p.slug == slug) {
            return None;
        }

        let post = Post {
            id: Uuid::new_v4(),
            author_id,
            category_id: req.category_id,
            title: req.title,
            slug,
            content: req.content,
            image_url: req.image_url,
            likes: 0,
            author_username: Some(author_username),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        posts.push(post.clone());
        Some(post)
    }

    async fn update_post(
        &self,
        id: Uuid,
        author_id: Uuid,
        req: UpdatePostRequest,
        slug: Option<String>,
    ) -> Option<Post> {
        let mut posts = self.posts.lock().unwrap();
        let post = posts
            .iter_mut()
            .find(|p| p.id == id && p.author_id == author_id)?;

        if let Some(title) = req.title {
            post.title = title;
        }
        if let Some(slug) = slug {
            post.slug = slug;
        }
        if let Some(content) = req.content {
            post.content = content;
        }
        if let Some(category_id) = req.category_id {
            post.category_id = category_id;
        }
        if let Some(image_url) = req.image_url {
            post.image_url = Some(image_url);
        }
        post.updated_at = Utc::now();
        Some(post.clone())
    }

    async fn delete_post(&self, id: Uuid, author_id: Uuid) -> bool {
        let mut posts = self.posts.lock().unwrap();
        let before = posts.len();
        posts.retain(|p| !(p.id == id && p.author_id == author_id));
        posts.len() < before
    }

    async fn add_comment(&self, post_id: Uuid, user_id: Uuid, content: String) -> Option<Comment> {
        if !self.posts.lock().unwrap().iter().any(|p| p.id == post_id) {
            return None;
        }
        let author_username = self.username_of(user_id)?;

        let comment = Comment {
            id: self.next_comment_id.fetch_add(1, Ordering::SeqCst),
            post_id,
            user_id,
            content,
            author_username: Some(author_username),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.comments.lock().unwrap().push(comment.clone());
        Some(comment)
    }

    async fn get_comments(&self, post_id: Uuid) -> Vec<Comment> {
        let mut comments: Vec<Comment> = self
            .comments
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        comments
    }

    async fn update_comment(&self, id: i64, user_id: Uuid, content: String) -> Option<Comment> {
        let mut comments = self.comments.lock().unwrap();
        let comment = comments
            .iter_mut()
            .find(|c| c.id == id && c.user_id == user_id)?;
        comment.content = content;
        comment.updated_at = Utc::now();
        Some(comment.clone())
    }

    async fn delete_comment(&self, id: i64, user_id: Uuid) -> bool {
        let mut comments = self.comments.lock().unwrap();
        let before = comments.len();
        comments.retain(|c| !(c.id == id && c.user_id == user_id));
        comments.len() < before
    }

    async fn delete_comment_admin(&self, id: i64) -> bool {
        let mut comments = self.comments.lock().unwrap();
        let before = comments.len();
        comments.retain(|c| c.id != id);
        comments.len() < before
    }

    async fn get_categories(&self) -> Vec<Category> {
        let mut categories = self.categories.lock().unwrap().clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        categories
    }

    async fn get_category(&self, id: Uuid) -> Option<Category> {
        self.categories
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    async fn create_category(&self, name: String, slug: String) -> Option<Category> {
        let mut categories = self.categories.lock().unwrap();
        if categories.iter().any(|c| c.name == name || c.slug == slug) {
            return None;
        }
        let category = Category {
            id: Uuid::new_v4(),
            name,
            slug,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        categories.push(category.clone());
        Some(category)
    }

    async fn update_category(&self, id: Uuid, name: String, slug: String) -> Option<Category> {
        let mut categories = self.categories.lock().unwrap();
        let category = categories.iter_mut().find(|c| c.id == id)?;
        category.name = name;
        category.slug = slug;
        category.updated_at = Utc::now();
        Some(category.clone())
    }

    async fn delete_category(&self, id: Uuid) -> bool {
        let mut categories = self.categories.lock().unwrap();
        let before = categories.len();
        categories.retain(|c| c.id != id);
        categories.len() < before
    }

    async fn count_posts_in_category(&self, id: Uuid) -> i64 {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.category_id == id)
            .count() as i64
    }
}

// --- Test Application ---

pub struct TestApp {
    pub address: String,
    /// Kept alongside the trait object so tests can seed and inspect data directly.
    pub repo: Arc<MemoryRepository>,
    pub state: AppState,
}

/// spawn_app
///
/// Boots the real router on an ephemeral port, backed by the in-memory repository
/// and the mock storage service. Returns the base address for reqwest calls.
pub async fn spawn_app() -> TestApp {
    let repo = Arc::new(MemoryRepository::new());

    let state = AppState {
        repo: repo.clone() as RepositoryState,
        storage: Arc::new(MockStorageService::new()) as StorageState,
        tokens: TokenService::new(TEST_JWT_SECRET, TEST_TOKEN_TTL),
        // Minimum time cost keeps the many register/login round trips fast.
        hasher: CredentialHasher::new(1),
        config: inkpost::AppConfig::default(),
    };
    let router = create_router(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        address,
        repo,
        state,
    }
}

/// Inserts a user with a properly hashed password and the given role, returning
/// the stored row.
pub async fn seed_user(app: &TestApp, email: &str, username: &str, password: &str, role: Role) -> User {
    let user = User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        username: username.to_string(),
        password_hash: app.state.hasher.hash(password).unwrap(),
        role,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    app.state
        .repo
        .create_user(user)
        .await
        .expect("seed_user: duplicate email or username")
}

/// Issues a bearer token for the given user through the app's own TokenService.
pub fn bearer_for(app: &TestApp, id: Uuid) -> String {
    format!("Bearer {}", app.state.tokens.issue(id).unwrap())
}
