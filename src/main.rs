use inkpost::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    password::CredentialHasher,
    repository::{PostgresRepository, RepositoryState},
    storage::{LocalDiskStorage, StorageService, StorageState},
    TokenService,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Async entry point. Brings up every process-wide component in dependency order:
/// configuration, logging, the database pool and migrations, upload storage, the
/// token and hashing services, and finally the HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration (Fail-Fast)
    // A .env file is honored before any variable is read.
    dotenv::dotenv().ok();
    // In production, a missing secret aborts startup here rather than at first use.
    let config = AppConfig::load();

    // 2. Log Filtering
    // RUST_LOG wins when present; otherwise a default filter keeps our own crate
    // chatty and the HTTP stack at a reasonable volume.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "inkpost=debug,tower_http=info,axum=trace".into());

    // 3. Log Format, Switched on APP_ENV
    match config.env {
        Env::Local => {
            // Human-readable multi-line output while developing.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // One JSON object per line, for log aggregators.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Database (Postgres)
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    // Pending schema migrations run to completion before any traffic is accepted.
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("FATAL: database migration failed");

    // The repository goes behind an Arc so every request task shares one pool.
    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;

    // 5. Upload Storage (Local Disk)
    // The upload directory must exist before the first image arrives.
    let disk = LocalDiskStorage::new(&config.upload_dir);
    disk.ensure_ready().await;
    let storage = Arc::new(disk) as StorageState;

    // 6. Auth Services
    // The signing secret and token TTL are injected once here and stay fixed for
    // the process lifetime; rotation requires a restart.
    let tokens = TokenService::new(&config.jwt_secret, config.token_ttl);
    let hasher = CredentialHasher::new(config.hash_cost);

    // 7. Shared State
    let app_state = AppState {
        repo,
        storage,
        tokens,
        hasher,
        config: config.clone(),
    };

    // 8. Router and Server
    let app = create_router(app_state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await.unwrap();

    tracing::info!("HTTP server bound successfully.");
    tracing::info!("Listening on {}", addr);
    tracing::info!(
        "API Documentation (Swagger UI) available at: http://localhost:{}/swagger-ui",
        config.port
    );

    axum::serve(listener, app).await.unwrap();
}
