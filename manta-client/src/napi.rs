//! Network registry client

use manta_core::domain::network::{Network, NetworkPool};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::Endpoint;
use crate::error::Result;

/// HTTP client for the network registry
#[derive(Debug, Clone)]
pub struct NapiClient {
    endpoint: Endpoint,
}

#[derive(Debug, Serialize)]
struct UpdateOwners<'a> {
    owner_uuids: &'a [Uuid],
}

impl NapiClient {
    /// Create a new network registry client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new network registry client with a configured reqwest Client
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            endpoint: Endpoint::new(base_url, client),
        }
    }

    /// Get the base URL of the network registry
    pub fn base_url(&self) -> &str {
        self.endpoint.base_url()
    }

    /// List networks with the given name
    pub async fn list_networks(&self, name: &str) -> Result<Vec<Network>> {
        self.list("/networks", name).await
    }

    /// List network pools with the given name
    pub async fn list_network_pools(&self, name: &str) -> Result<Vec<NetworkPool>> {
        self.list("/network_pools", name).await
    }

    /// Get a network by uuid
    pub async fn get_network(&self, uuid: Uuid) -> Result<Network> {
        let url = self.endpoint.url(&format!("/networks/{}", uuid));
        let response = self.endpoint.http().get(&url).send().await?;

        self.endpoint.handle_response(response).await
    }

    /// Replace the owner list of a network
    pub async fn update_network_owners(&self, uuid: Uuid, owners: &[Uuid]) -> Result<()> {
        self.update_owners(&format!("/networks/{}", uuid), owners)
            .await
    }

    /// Replace the owner list of a network pool
    pub async fn update_network_pool_owners(&self, uuid: Uuid, owners: &[Uuid]) -> Result<()> {
        self.update_owners(&format!("/network_pools/{}", uuid), owners)
            .await
    }

    async fn list<T: DeserializeOwned>(&self, path: &str, name: &str) -> Result<Vec<T>> {
        let url = self.endpoint.url(path);
        let response = self
            .endpoint
            .http()
            .get(&url)
            .query(&[("name", name)])
            .send()
            .await?;

        self.endpoint.handle_response(response).await
    }

    async fn update_owners(&self, path: &str, owners: &[Uuid]) -> Result<()> {
        let url = self.endpoint.url(path);
        let response = self
            .endpoint
            .http()
            .put(&url)
            .json(&UpdateOwners {
                owner_uuids: owners,
            })
            .send()
            .await?;

        self.endpoint.handle_empty_response(response).await
    }
}
