//! Object-detection boundary.
//!
//! The detection model runs as a separate service; this crate only ships the
//! uploaded image there and receives the annotated image back.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::info;

use crate::client::ImageAttachment;
use crate::error::{Error, Result};

/// Draws disease bounding boxes onto a leaf image.
#[async_trait]
pub trait LeafDetector: Send + Sync {
    /// Returns the annotated image as JPEG bytes.
    async fn annotate(&self, image: &ImageAttachment) -> Result<Vec<u8>>;
}

/// Detector reached over HTTP at `{base}/annotate`.
#[derive(Debug, Clone)]
pub struct HttpDetector {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpDetector {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: format!("{}/annotate", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl LeafDetector for HttpDetector {
    async fn annotate(&self, image: &ImageAttachment) -> Result<Vec<u8>> {
        // ---
        info!(endpoint = %self.endpoint, bytes = image.data.len(), "Requesting detection");

        let response = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, &image.mime_type)
            .body(image.data.clone())
            .send()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("detection: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::UpstreamUnavailable(format!("detection: status {status}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("detection: {e}")))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::test_support::spawn_stub;
    use axum::http::StatusCode;

    #[test]
    fn test_endpoint_trailing_slash() {
        // ---
        assert_eq!(HttpDetector::new("http://d:9000/").endpoint, "http://d:9000/annotate");
        assert_eq!(HttpDetector::new("http://d:9000").endpoint, "http://d:9000/annotate");
    }

    #[tokio::test]
    async fn test_error_status_is_upstream_unavailable() {
        // ---
        let base = spawn_stub(StatusCode::INTERNAL_SERVER_ERROR, "boom").await;
        let image = ImageAttachment::jpeg(vec![0xff, 0xd8]);

        let err = HttpDetector::new(&base).annotate(&image).await.unwrap_err();
        match err {
            Error::UpstreamUnavailable(message) => {
                assert!(message.starts_with("detection: status 500"), "{message}")
            }
            other => panic!("expected UpstreamUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_annotated_bytes_are_returned() {
        // ---
        let base = spawn_stub(StatusCode::OK, "annotated").await;
        let image = ImageAttachment::jpeg(vec![0xff, 0xd8]);

        let bytes = HttpDetector::new(&base).annotate(&image).await.unwrap();
        assert_eq!(bytes, b"annotated");
    }
}
