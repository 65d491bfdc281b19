//! Manta registry HTTP clients
//!
//! Thin, typed HTTP clients for the registries a Manta deployment is
//! bootstrapped against:
//! - [`UfdsClient`]: identity directory (users, keys, groups)
//! - [`SapiClient`]: service registry (mode, applications, services, manifests)
//! - [`ImgapiClient`]: image registry (search, remote import)
//! - [`NapiClient`]: network registry (networks, network pools)
//!
//! Registry error responses are classified into [`ClientError`] variants at
//! this boundary, so callers match on kinds instead of error-name strings.
//!
//! # Example
//!
//! ```no_run
//! use manta_client::ImgapiClient;
//! use manta_core::dto::image::ImageFilters;
//!
//! #[tokio::main]
//! async fn main() -> manta_client::Result<()> {
//!     let imgapi = ImgapiClient::new("https://updates.tritondatacenter.com");
//!     let images = imgapi.list_images(&ImageFilters::named("mantav2-webapi")).await?;
//!     println!("found {} images", images.len());
//!     Ok(())
//! }
//! ```

pub mod error;
mod imgapi;
mod napi;
mod sapi;
mod ufds;

pub use error::{ClientError, Result};
pub use imgapi::ImgapiClient;
pub use napi::NapiClient;
pub use sapi::SapiClient;
pub use ufds::{UfdsClient, UfdsCredentials};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// Connection to one registry endpoint, shared by the typed clients
#[derive(Debug, Clone)]
pub(crate) struct Endpoint {
    /// Base URL without a trailing slash
    base_url: String,
    client: Client,
}

impl Endpoint {
    pub(crate) fn new(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Check the status code and deserialize the JSON body
    pub(crate) async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let response = Self::check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Check the status code of a response whose body is not needed
    pub(crate) async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        Self::check_status(response).await.map(|_| ())
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(ClientError::from_response(status.as_u16(), &body))
    }
}
