use academy_portal::storage::{
    MockStorageService, S3StorageClient, StorageError, StorageService, is_video_content_type,
    sanitize_key,
};
use uuid::Uuid;

#[cfg(test)]
mod mock_tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_success() {
        let mock = MockStorageService::new();
        let filename = "videos/test.mp4";
        let result = mock.get_presigned_upload_url(filename, "video/mp4").await;
        assert!(result.is_ok());

        let url = result.unwrap();

        assert!(url.contains("signature=fake"));
        assert!(url.contains(filename));
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let mock = MockStorageService::new_failing();
        let result = mock.get_presigned_upload_url("videos/test.mp4", "video/mp4").await;
        assert!(matches!(result, Err(StorageError::Backend(_))));
    }

    #[tokio::test]
    async fn test_mock_sanitization() {
        let mock = MockStorageService::new();
        let result = mock
            .get_presigned_upload_url("../../etc/passwd", "video/mp4")
            .await;
        assert!(result.is_ok());

        let url = result.unwrap();

        assert!(!url.contains(".."));
        assert!(url.contains("/etc/passwd"));
    }

    #[tokio::test]
    async fn test_mock_playback_url() {
        let mock = MockStorageService::new();
        let url = mock
            .get_presigned_playback_url("videos/lecture.mp4")
            .await
            .unwrap();
        assert!(url.contains("videos/lecture.mp4"));

        let failing = MockStorageService::new_failing();
        assert!(failing.get_presigned_playback_url("videos/lecture.mp4").await.is_err());
    }

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("videos//./a.mp4"), "videos/a.mp4");
        assert_eq!(sanitize_key("/videos/../b.mp4"), "videos/b.mp4");
    }

    #[test]
    fn test_video_content_types() {
        assert!(is_video_content_type("video/mp4"));
        assert!(is_video_content_type("video/webm"));
        assert!(!is_video_content_type("video/"));
        assert!(!is_video_content_type("application/pdf"));
        assert!(!is_video_content_type("video/mp4/evil"));
    }
}

#[cfg(test)]
mod s3_tests {
    use super::*;

    #[tokio::test]
    async fn test_s3_client_creation() {
        let _client = S3StorageClient::new(
            "http://localhost:9000",
            "us-east-1",
            "testkey",
            "testsecret",
            "testbucket",
        )
        .await;
        // Just testing that construction doesn't panic
    }

    #[tokio::test]
    async fn test_s3_presigned_url_format() {
        let client = S3StorageClient::new(
            "http://localhost:9000",
            "us-east-1",
            "testkey",
            "testsecret",
            "testbucket",
        )
        .await;

        let key = format!("videos/{}.mp4", Uuid::new_v4());
        let result = client.get_presigned_upload_url(&key, "video/mp4").await;

        // Presigning is local; no server is contacted.
        let url = result.unwrap();

        assert!(url.contains("localhost:9000"));
        assert!(url.contains("X-Amz-Expires=600"));
        assert!(url.contains(&key));
    }
}
