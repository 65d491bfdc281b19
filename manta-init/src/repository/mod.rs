//! Repository layer
//!
//! Narrow, trait-based views of the registries a deployment is converged
//! against. Pipeline steps only talk to these traits; the HTTP clients from
//! `manta-client` implement them for real runs and in-memory fakes
//! implement them in tests.

mod identity;
mod images;
pub mod networks;
mod services;

use std::sync::Arc;

use manta_client::{ImgapiClient, NapiClient, SapiClient, UfdsClient, UfdsCredentials};
use tracing::info;

use crate::config::DeploymentConfig;
use crate::error::Result;
use crate::secrets::{SecretTooling, SystemTooling};

// Re-export traits
pub use identity::IdentityDirectory;
pub use images::ImageRegistry;
pub use networks::NetworkRegistry;
pub use services::ServiceRegistry;

/// Handles to every collaborator a run needs
#[derive(Clone)]
pub struct Collaborators {
    pub identity: Arc<dyn IdentityDirectory>,
    pub services: Arc<dyn ServiceRegistry>,
    pub local_images: Arc<dyn ImageRegistry>,
    pub remote_images: Arc<dyn ImageRegistry>,
    pub networks: Arc<dyn NetworkRegistry>,
    pub tooling: Arc<dyn SecretTooling>,
}

/// Builds collaborator handles from the deployment config
pub trait Connector: Send + Sync {
    fn connect(&self, config: &DeploymentConfig) -> Result<Collaborators>;
}

/// Connects to the registries over HTTP
#[derive(Debug, Default)]
pub struct HttpConnector {
    client: reqwest::Client,
}

impl HttpConnector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Connector for HttpConnector {
    fn connect(&self, config: &DeploymentConfig) -> Result<Collaborators> {
        let mut ufds = UfdsClient::with_client(&config.ufds.url, self.client.clone());
        if let (Some(bind_dn), Some(bind_password)) =
            (&config.ufds.bind_dn, &config.ufds.bind_password)
        {
            ufds = ufds.with_credentials(UfdsCredentials {
                bind_dn: bind_dn.clone(),
                bind_password: bind_password.clone(),
            });
        }

        let collaborators = Collaborators {
            identity: Arc::new(ufds),
            services: Arc::new(SapiClient::with_client(
                &config.sapi.url,
                self.client.clone(),
            )),
            local_images: Arc::new(ImgapiClient::with_client(
                &config.imgapi.url,
                self.client.clone(),
            )),
            remote_images: Arc::new(ImgapiClient::with_client(
                &config.remote_imgapi.url,
                self.client.clone(),
            )),
            networks: Arc::new(NapiClient::with_client(
                &config.napi.url,
                self.client.clone(),
            )),
            tooling: Arc::new(SystemTooling::new()),
        };

        info!(
            "Clients initialized: sapi={}, imgapi={}, remote_imgapi={}",
            config.sapi.url, config.imgapi.url, config.remote_imgapi.url
        );

        Ok(collaborators)
    }
}
