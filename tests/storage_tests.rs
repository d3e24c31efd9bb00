use inkpost::storage::{LocalDiskStorage, MockStorageService, StorageService};
use uuid::Uuid;

#[cfg(test)]
mod disk_tests {
    use super::*;

    #[tokio::test]
    async fn test_save_image_writes_under_random_name() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path().to_str().unwrap());
        storage.ensure_ready().await;

        let stored = storage
            .save_image("cover.PNG", b"fake image bytes")
            .await
            .unwrap();

        // The stored name is `<uuid>.<lowercased ext>`; nothing of the client's
        // filename survives except the validated extension.
        let (stem, ext) = stored.rsplit_once('.').unwrap();
        assert_eq!(ext, "png");
        assert!(Uuid::parse_str(stem).is_ok());

        let on_disk = tokio::fs::read(dir.path().join(&stored)).await.unwrap();
        assert_eq!(on_disk, b"fake image bytes");
    }

    #[tokio::test]
    async fn test_two_uploads_never_collide() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path().to_str().unwrap());
        storage.ensure_ready().await;

        let first = storage.save_image("same.jpg", b"one").await.unwrap();
        let second = storage.save_image("same.jpg", b"two").await.unwrap();

        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_disallowed_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path().to_str().unwrap());
        storage.ensure_ready().await;

        assert!(storage.save_image("payload.exe", b"nope").await.is_err());
        assert!(storage.save_image("no-extension", b"nope").await.is_err());
        assert!(storage.save_image("style.css", b"nope").await.is_err());
    }

    #[tokio::test]
    async fn test_hostile_filename_cannot_escape_the_upload_dir() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path().to_str().unwrap());
        storage.ensure_ready().await;

        let stored = storage
            .save_image("../../etc/evil.png", b"traversal attempt")
            .await
            .unwrap();

        // Only the extension was taken from the input; the file landed inside
        // the upload directory under a fresh UUID.
        assert!(!stored.contains(".."));
        assert!(dir.path().join(&stored).exists());
    }

    #[tokio::test]
    async fn test_ensure_ready_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("uploads");
        let storage = LocalDiskStorage::new(nested.to_str().unwrap());

        storage.ensure_ready().await;

        assert!(nested.is_dir());
    }
}

#[cfg(test)]
mod mock_tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_success() {
        let mock = MockStorageService::new();
        let result = mock.save_image("test.png", b"bytes").await;

        assert_eq!(result.unwrap(), "mock-test.png");
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let mock = MockStorageService::new_failing();
        let result = mock.save_image("test.png", b"bytes").await;

        assert!(result.is_err());
    }
}
