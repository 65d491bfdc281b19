//! Image registry client
//!
//! Used both for the remote registry images are published to and for the
//! datacenter-local registry they are imported into.

use manta_core::domain::image::{ImageRef, ImageState, ImageStatus};
use manta_core::dto::image::{ImageFilters, ImportOptions};
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

use crate::Endpoint;
use crate::error::{ClientError, Result};

/// HTTP client for an image registry
#[derive(Debug, Clone)]
pub struct ImgapiClient {
    endpoint: Endpoint,
    /// Delay between status checks while waiting for an import
    poll_interval: Duration,
    /// Upper bound on how long an import may take to settle
    wait_limit: Duration,
}

/// Response to an import request
#[derive(Debug, Deserialize)]
struct ImportJob {
    #[serde(default)]
    job_uuid: Option<Uuid>,
}

impl ImgapiClient {
    /// Create a new image registry client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new image registry client with a configured reqwest Client
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            endpoint: Endpoint::new(base_url, client),
            poll_interval: Duration::from_secs(5),
            wait_limit: Duration::from_secs(60 * 60),
        }
    }

    /// Override how often import status is polled
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Override how long to wait for a single import
    pub fn with_wait_limit(mut self, limit: Duration) -> Self {
        self.wait_limit = limit;
        self
    }

    /// Get the base URL of the registry
    pub fn base_url(&self) -> &str {
        self.endpoint.base_url()
    }

    // =============================================================================
    // Search
    // =============================================================================

    /// List images matching the given filters
    pub async fn list_images(&self, filters: &ImageFilters) -> Result<Vec<ImageRef>> {
        let url = self.endpoint.url("/images");
        let response = self
            .endpoint
            .http()
            .get(&url)
            .query(filters)
            .send()
            .await?;

        self.endpoint.handle_response(response).await
    }

    /// Get the current state of an image
    pub async fn get_image_status(&self, uuid: Uuid) -> Result<ImageStatus> {
        let url = self.endpoint.url(&format!("/images/{}", uuid));
        let response = self.endpoint.http().get(&url).send().await?;

        self.endpoint.handle_response(response).await
    }

    // =============================================================================
    // Import
    // =============================================================================

    /// Start importing an image from another registry
    ///
    /// Returns [`ClientError::AlreadyExists`] when the image is already present.
    pub async fn admin_import_remote_image(
        &self,
        uuid: Uuid,
        source: &str,
        options: ImportOptions,
    ) -> Result<Option<Uuid>> {
        let url = self.endpoint.url(&format!("/images/{}", uuid));
        let mut query = vec![("action", "import-remote"), ("source", source)];
        if options.skip_owner_check {
            query.push(("skip_owner_check", "true"));
        }

        let response = self
            .endpoint
            .http()
            .post(&url)
            .query(&query)
            .send()
            .await?;

        let job: ImportJob = self.endpoint.handle_response(response).await?;
        Ok(job.job_uuid)
    }

    /// Import an image from another registry and wait until it is usable
    pub async fn admin_import_remote_image_and_wait(
        &self,
        uuid: Uuid,
        source: &str,
        options: ImportOptions,
    ) -> Result<()> {
        let job = self.admin_import_remote_image(uuid, source, options).await?;
        info!(image_uuid = %uuid, job_uuid = ?job, "import started");

        let started = Instant::now();
        loop {
            match self.get_image_status(uuid).await {
                Ok(status) if status.state.is_terminal() => {
                    return Self::settled(uuid, status);
                }
                Ok(status) => {
                    debug!(image_uuid = %uuid, state = %status.state, "import in progress");
                }
                // The image record may not exist until the import job has begun.
                Err(e) if e.is_not_found() => {
                    debug!(image_uuid = %uuid, "image not yet visible");
                }
                Err(e) => return Err(e),
            }

            if started.elapsed() >= self.wait_limit {
                return Err(ClientError::ImportFailed {
                    uuid,
                    message: format!("not active after {:?}", self.wait_limit),
                });
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    fn settled(uuid: Uuid, status: ImageStatus) -> Result<()> {
        match status.state {
            ImageState::Failed => Err(ClientError::ImportFailed {
                uuid,
                message: status
                    .error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "image is in state failed".to_string()),
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ImgapiClient::new("http://imgapi.example.com/");
        assert_eq!(client.base_url(), "http://imgapi.example.com");
    }

    #[test]
    fn test_custom_polling() {
        let client = ImgapiClient::new("http://imgapi.example.com")
            .with_poll_interval(Duration::from_millis(10))
            .with_wait_limit(Duration::from_secs(1));
        assert_eq!(client.poll_interval, Duration::from_millis(10));
        assert_eq!(client.wait_limit, Duration::from_secs(1));
    }

    #[test]
    fn test_settled_active() {
        let uuid = Uuid::new_v4();
        let status = ImageStatus {
            uuid,
            state: ImageState::Active,
            error: None,
        };
        assert!(ImgapiClient::settled(uuid, status).is_ok());
    }

    #[test]
    fn test_settled_failed() {
        let uuid = Uuid::new_v4();
        let status = ImageStatus {
            uuid,
            state: ImageState::Failed,
            error: Some(serde_json::json!({"message": "origin is not active"})),
        };
        let err = ImgapiClient::settled(uuid, status).unwrap_err();
        assert!(err.to_string().contains("origin is not active"));
    }
}
