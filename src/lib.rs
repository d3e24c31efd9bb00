use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core services.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod password;
pub mod repository;
pub mod storage;

// Module for routing segregation (Public, Authenticated, Author, Admin).
pub mod routes;
use auth::AuthUser; // The resolved authenticated user identity.
use error::ApiError;
use models::Role;
use routes::{admin, authenticated, author, public};

// --- Public Re-exports ---

// The state types main.rs assembles at startup.
pub use auth::TokenService;
pub use config::AppConfig;
pub use password::CredentialHasher;
pub use repository::{PostgresRepository, RepositoryState};
pub use storage::{LocalDiskStorage, MockStorageService, StorageState};

/// ApiDoc
///
/// Collects every `#[utoipa::path]` handler and `ToSchema` payload into one OpenAPI
/// document, served as JSON at `/api-docs/openapi.json` and browsable through the
/// Swagger UI route.
#[derive(OpenApi)]
#[openapi(
    // Every handler with a #[utoipa::path] annotation must be listed here.
    paths(
        handlers::register_user, handlers::login, handlers::get_me,
        handlers::get_posts, handlers::get_post, handlers::get_post_by_slug,
        handlers::create_post, handlers::update_post, handlers::delete_post,
        handlers::get_comments, handlers::create_comment, handlers::update_comment,
        handlers::delete_comment, handlers::get_categories, handlers::create_category,
        handlers::update_category, handlers::delete_category, handlers::upload_image
    ),
    // Request and response body schemas.
    components(
        schemas(
            models::User, models::Role, models::Post, models::Comment, models::Category,
            models::RegisterRequest, models::LoginRequest, models::LoginResponse,
            models::CreatePostRequest, models::UpdatePostRequest,
            models::CreateCommentRequest, models::UpdateCommentRequest,
            models::CreateCategoryRequest, models::UserProfile, models::UploadResponse,
        )
    ),
    tags(
        (name = "inkpost", description = "Blog Publishing API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Everything a request handler can depend on, bundled into one cloneable value and
/// registered on the router. Nothing in here is mutated after startup, so any number
/// of concurrent gate evaluations and handlers read it without locking.
#[derive(Clone)]
pub struct AppState {
    /// Persistence access behind the `Repository` trait object.
    pub repo: RepositoryState,
    /// Image persistence behind the `StorageService` trait object (local disk in
    /// production, a mock in tests).
    pub storage: StorageState,
    /// Issues and verifies signed bearer tokens. Carries the process-wide signing
    /// secret, injected once at construction.
    pub tokens: TokenService,
    /// One-way salted password hashing for registration and login.
    pub hasher: CredentialHasher,
    /// The loaded, read-only environment configuration.
    pub config: AppConfig,
}

// --- FromRef Implementations ---

// Let the AuthUser extractor and individual handlers pull just the component they
// need out of the shared AppState, instead of taking the whole struct.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for TokenService {
    fn from_ref(app_state: &AppState) -> TokenService {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for CredentialHasher {
    fn from_ref(app_state: &AppState) -> CredentialHasher {
        app_state.hasher.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

// --- The Access Gate ---

/// auth_middleware
///
/// The authentication stage of the access gate, applied to the `authenticated_routes`.
///
/// The `AuthUser` argument does the work: its `FromRequestParts` implementation runs
/// credential extraction, token verification, and identity resolution, and a failure
/// at any step answers 401 before the handler is reached. On success the resolved
/// decision is attached to the request extensions, so the handler's own `AuthUser`
/// argument reuses it instead of re-verifying.
pub async fn auth_middleware(auth_user: AuthUser, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(auth_user);
    next.run(request).await
}

/// authorize
///
/// The authorization stage of the access gate: the single role-comparison
/// implementation in the codebase. `Admin` satisfies every requirement; any other
/// role must match exactly (`Role::satisfies`). A mismatch terminates the request
/// with 403 Forbidden. The gate only reads; its one effect is attaching the
/// resolved `AuthUser` to the request extensions for downstream reuse.
async fn authorize(
    required: Role,
    auth_user: AuthUser,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !auth_user.role.satisfies(required) {
        return Err(ApiError::InsufficientRole);
    }

    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

/// require_author
///
/// Route layer for the author-gated routes: authenticate, then require the
/// `author` role (admins pass).
pub async fn require_author(
    auth_user: AuthUser,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authorize(Role::Author, auth_user, request, next).await
}

/// require_admin
///
/// Route layer for the admin-gated routes: authenticate, then require the
/// `admin` role.
pub async fn require_admin(
    auth_user: AuthUser,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authorize(Role::Admin, auth_user, request, next).await
}

/// create_router
///
/// Builds the full routing table, layers the gate onto the protected routers, and
/// wraps the result in the observability stack.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Correlation header shared by the request-id layers below.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Routing Table
    let base_router = Router::new()
        // Interactive API documentation.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Anonymous surface, no gate.
        .merge(public::public_routes())
        // Any authenticated role: the gate's authentication stage only.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Authentication plus the `author` role requirement.
        .merge(
            author::author_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), require_author)),
        )
        // Authentication plus the `admin` role requirement.
        .merge(
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), require_admin)),
        )
        // Stored images are served back under /uploads/<filename>.
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        .with_state(state);

    // 3. Observability (outermost, so the span covers the whole pipeline)
    base_router
        .layer(
            ServiceBuilder::new()
                // A fresh UUID for every inbound request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // Per-request span carrying that id, with response latency logged
                // on the way out.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // The id is echoed back to the client in the response headers.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS, applied last.
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: names the span after the request and carries the
/// generated `x-request-id`, so every log line emitted while serving one request
/// shares a correlation id.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
