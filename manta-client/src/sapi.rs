//! Service registry client

use manta_core::domain::application::{Application, RegistryMode, Service};
use manta_core::dto::application::{CreateApplication, CreateService, RecordChanges};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

use crate::Endpoint;
use crate::error::{ClientError, Result};

/// HTTP client for the service registry
#[derive(Debug, Clone)]
pub struct SapiClient {
    endpoint: Endpoint,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    uuid: Uuid,
    name: String,
}

impl SapiClient {
    /// Create a new service registry client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new service registry client with a configured reqwest Client
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            endpoint: Endpoint::new(base_url, client),
        }
    }

    /// Get the base URL of the service registry
    pub fn base_url(&self) -> &str {
        self.endpoint.base_url()
    }

    // =============================================================================
    // Mode
    // =============================================================================

    /// Get the registry's operating mode
    pub async fn get_mode(&self) -> Result<RegistryMode> {
        let url = self.endpoint.url("/mode");
        let response = self.endpoint.http().get(&url).send().await?;

        self.endpoint.handle_response(response).await
    }

    /// Switch the registry's operating mode
    pub async fn set_mode(&self, mode: RegistryMode) -> Result<()> {
        let url = self.endpoint.url("/mode");
        let response = self
            .endpoint
            .http()
            .post(&url)
            .query(&[("mode", mode.to_string())])
            .send()
            .await?;

        self.endpoint.handle_empty_response(response).await
    }

    // =============================================================================
    // Applications
    // =============================================================================

    /// List applications with the given name and owner
    pub async fn list_applications(&self, name: &str, owner: Uuid) -> Result<Vec<Application>> {
        let url = self.endpoint.url("/applications");
        let response = self
            .endpoint
            .http()
            .get(&url)
            .query(&[
                ("name", name.to_string()),
                ("owner_uuid", owner.to_string()),
                ("include_master", "true".to_string()),
            ])
            .send()
            .await?;

        self.endpoint.handle_response(response).await
    }

    /// List applications with the given name, whatever their owner
    pub async fn list_applications_named(&self, name: &str) -> Result<Vec<Application>> {
        let url = self.endpoint.url("/applications");
        let response = self
            .endpoint
            .http()
            .get(&url)
            .query(&[("name", name), ("include_master", "true")])
            .send()
            .await?;

        self.endpoint.handle_response(response).await
    }

    /// Create an application
    pub async fn create_application(&self, req: &CreateApplication) -> Result<Application> {
        let url = self.endpoint.url("/applications");
        let response = self.endpoint.http().post(&url).json(req).send().await?;

        self.endpoint.handle_response(response).await
    }

    /// Apply a partial update to an application
    pub async fn update_application(&self, uuid: Uuid, changes: &RecordChanges) -> Result<()> {
        let url = self.endpoint.url(&format!("/applications/{}", uuid));
        let response = self.endpoint.http().put(&url).json(changes).send().await?;

        self.endpoint.handle_empty_response(response).await
    }

    // =============================================================================
    // Services
    // =============================================================================

    /// List services with the given name under an application
    pub async fn list_services(&self, name: &str, application: Uuid) -> Result<Vec<Service>> {
        let url = self.endpoint.url("/services");
        let response = self
            .endpoint
            .http()
            .get(&url)
            .query(&[
                ("name", name.to_string()),
                ("application_uuid", application.to_string()),
                ("include_master", "true".to_string()),
            ])
            .send()
            .await?;

        self.endpoint.handle_response(response).await
    }

    /// Create a service
    pub async fn create_service(&self, req: &CreateService) -> Result<Service> {
        let url = self.endpoint.url("/services");
        let response = self.endpoint.http().post(&url).json(req).send().await?;

        self.endpoint.handle_response(response).await
    }

    /// Apply a partial update to a service
    pub async fn update_service(&self, uuid: Uuid, changes: &RecordChanges) -> Result<()> {
        let url = self.endpoint.url(&format!("/services/{}", uuid));
        let response = self.endpoint.http().put(&url).json(changes).send().await?;

        self.endpoint.handle_empty_response(response).await
    }

    // =============================================================================
    // Manifests
    // =============================================================================

    /// Register every manifest found under `dir`
    ///
    /// Each subdirectory holds a `manifest.json` describing the manifest and
    /// a `template` file with its contents. Returns the created manifests'
    /// UUIDs keyed by manifest name.
    pub async fn load_manifests(&self, dir: &Path) -> Result<HashMap<String, Uuid>> {
        let mut manifests = HashMap::new();
        let mut entries = tokio::fs::read_dir(dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }

            let body = read_manifest(&entry.path()).await?;
            debug!(path = %entry.path().display(), "creating manifest");

            let url = self.endpoint.url("/manifests");
            let response = self.endpoint.http().post(&url).json(&body).send().await?;
            let created: Manifest = self.endpoint.handle_response(response).await?;

            manifests.insert(created.name, created.uuid);
        }

        info!("loaded {} manifests from {}", manifests.len(), dir.display());
        Ok(manifests)
    }
}

/// Read `manifest.json` and `template` from a manifest directory
async fn read_manifest(dir: &Path) -> Result<Map<String, Value>> {
    let raw = tokio::fs::read_to_string(dir.join("manifest.json")).await?;
    let mut body: Map<String, Value> = serde_json::from_str(&raw).map_err(|e| {
        ClientError::ParseError(format!("{}/manifest.json: {}", dir.display(), e))
    })?;

    let template = tokio::fs::read_to_string(dir.join("template")).await?;
    body.insert("template".to_string(), Value::String(template));

    Ok(body)
}
