//! Identity directory client
//!
//! Talks to the directory's HTTP gateway. Users are addressed by login,
//! groups by distinguished name.

use manta_core::domain::user::User;
use manta_core::dto::user::{GroupChange, NewKey, NewUser, UserChanges};
use reqwest::{Client, RequestBuilder};
use tracing::debug;

use crate::Endpoint;
use crate::error::Result;

/// Bind credentials for the directory
#[derive(Debug, Clone)]
pub struct UfdsCredentials {
    pub bind_dn: String,
    pub bind_password: String,
}

/// HTTP client for the identity directory
#[derive(Debug, Clone)]
pub struct UfdsClient {
    endpoint: Endpoint,
    credentials: Option<UfdsCredentials>,
}

impl UfdsClient {
    /// Create a new directory client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new directory client with a configured reqwest Client
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            endpoint: Endpoint::new(base_url, client),
            credentials: None,
        }
    }

    /// Authenticate every request with the given bind credentials
    pub fn with_credentials(mut self, credentials: UfdsCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Get the base URL of the directory
    pub fn base_url(&self) -> &str {
        self.endpoint.base_url()
    }

    fn authenticated(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some(creds) => request.basic_auth(&creds.bind_dn, Some(&creds.bind_password)),
            None => request,
        }
    }

    // =============================================================================
    // Users
    // =============================================================================

    /// Get a user by login
    ///
    /// Returns [`ClientError::NotFound`](crate::ClientError::NotFound) when no such user exists.
    pub async fn get_user(&self, login: &str) -> Result<User> {
        let url = self
            .endpoint
            .url(&format!("/users/{}", urlencoding::encode(login)));
        debug!("GET {}", url);
        let response = self
            .authenticated(self.endpoint.http().get(&url))
            .send()
            .await?;

        self.endpoint.handle_response(response).await
    }

    /// Create a user
    pub async fn add_user(&self, user: &NewUser) -> Result<User> {
        let url = self.endpoint.url("/users");
        let response = self
            .authenticated(self.endpoint.http().post(&url))
            .json(user)
            .send()
            .await?;

        self.endpoint.handle_response(response).await
    }

    /// Apply a partial update to a user
    pub async fn update_user(&self, login: &str, changes: &UserChanges) -> Result<()> {
        let url = self
            .endpoint
            .url(&format!("/users/{}", urlencoding::encode(login)));
        let response = self
            .authenticated(self.endpoint.http().put(&url))
            .json(changes)
            .send()
            .await?;

        self.endpoint.handle_empty_response(response).await
    }

    /// Attach an SSH public key to a user
    pub async fn add_key(&self, login: &str, key: &NewKey) -> Result<()> {
        let url = self
            .endpoint
            .url(&format!("/users/{}/keys", urlencoding::encode(login)));
        let response = self
            .authenticated(self.endpoint.http().post(&url))
            .json(key)
            .send()
            .await?;

        self.endpoint.handle_empty_response(response).await
    }

    // =============================================================================
    // Groups
    // =============================================================================

    /// Apply a modification to a group entry
    pub async fn modify_group(&self, group_dn: &str, change: &GroupChange) -> Result<()> {
        let url = self
            .endpoint
            .url(&format!("/groups/{}", urlencoding::encode(group_dn)));
        let response = self
            .authenticated(self.endpoint.http().patch(&url))
            .json(change)
            .send()
            .await?;

        self.endpoint.handle_empty_response(response).await
    }
}
