use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

// 1. The Contract
/// StorageService
///
/// What the upload handler needs from an image store, and nothing more. Production
/// binds `LocalDiskStorage`; tests bind `MockStorageService`. The handler cannot
/// tell the difference.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Ensures the storage location exists. Called once at startup; creates the
    /// upload directory if it is missing.
    async fn ensure_ready(&self);

    /// Persists an uploaded image and returns the stored filename.
    ///
    /// `original_filename` contributes only its extension; the stored name is a
    /// fresh UUID, so a hostile filename can never influence the target path.
    async fn save_image(&self, original_filename: &str, bytes: &[u8]) -> Result<String, String>;
}

/// Extensions accepted for image uploads.
fn is_allowed_image_ext(ext: &str) -> bool {
    matches!(ext, "jpg" | "jpeg" | "png" | "gif" | "webp")
}

// 2. The Real Implementation (Local Disk)
/// LocalDiskStorage
///
/// Stores uploaded images on the local filesystem under the configured upload
/// directory. Files are served back by the static `/uploads` route.
#[derive(Clone)]
pub struct LocalDiskStorage {
    upload_dir: PathBuf,
}

impl LocalDiskStorage {
    pub fn new(upload_dir: &str) -> Self {
        Self {
            upload_dir: PathBuf::from(upload_dir),
        }
    }
}

#[async_trait]
impl StorageService for LocalDiskStorage {
    async fn ensure_ready(&self) {
        if let Err(e) = tokio::fs::create_dir_all(&self.upload_dir).await {
            tracing::error!("failed to create upload directory: {:?}", e);
        }
    }

    async fn save_image(&self, original_filename: &str, bytes: &[u8]) -> Result<String, String> {
        let ext = Path::new(original_filename)
            .extension()
            .and_then(std::ffi::OsStr::to_str)
            .map(str::to_lowercase)
            .unwrap_or_default();

        if !is_allowed_image_ext(&ext) {
            return Err(format!("unsupported file type: {}", ext));
        }

        // Unique, non-guessable name. Only the validated extension survives from the
        // client-provided filename.
        let filename = format!("{}.{}", Uuid::new_v4(), ext);
        let path = self.upload_dir.join(&filename);

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| e.to_string())?;

        Ok(filename)
    }
}

// 3. The Test Double
/// MockStorageService
///
/// Test-only stand-in that never touches the filesystem. The upload handler tests
/// exercise their own logic against this, with the disk kept out of the picture.
#[derive(Clone)]
pub struct MockStorageService {
    /// When set, every save reports a simulated failure.
    pub should_fail: bool,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

impl Default for MockStorageService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_ready(&self) {
        // Nothing to prepare.
    }

    async fn save_image(&self, original_filename: &str, _bytes: &[u8]) -> Result<String, String> {
        if self.should_fail {
            return Err("Mock Storage Error: Simulation requested".to_string());
        }

        // Deterministic name so tests can assert on the returned URL.
        Ok(format!("mock-{}", original_filename))
    }
}

/// StorageState
///
/// The shape the storage service takes inside `AppState`.
pub type StorageState = Arc<dyn StorageService>;
