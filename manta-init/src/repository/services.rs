//! Service registry repository
//!
//! Registry mode, the application record, its services, and manifests.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use manta_client::SapiClient;
use manta_core::domain::application::{Application, RegistryMode, Service};
use manta_core::dto::application::{CreateApplication, CreateService, RecordChanges};
use uuid::Uuid;

use crate::error::{InitError, Result};

#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    async fn get_mode(&self) -> Result<RegistryMode>;

    async fn set_mode(&self, mode: RegistryMode) -> Result<()>;

    /// Finds an application by name and owner; `NotFound` when absent
    async fn find_application(&self, name: &str, owner: Uuid) -> Result<Application>;

    /// Finds an application by name regardless of owner; `NotFound` when absent
    async fn find_application_named(&self, name: &str) -> Result<Application>;

    async fn create_application(&self, req: &CreateApplication) -> Result<Application>;

    async fn update_application(&self, uuid: Uuid, changes: &RecordChanges) -> Result<()>;

    /// Finds a service of an application; `NotFound` when absent
    async fn find_service(&self, name: &str, application: Uuid) -> Result<Service>;

    async fn create_service(&self, req: &CreateService) -> Result<Service>;

    async fn update_service(&self, uuid: Uuid, changes: &RecordChanges) -> Result<()>;

    /// Uploads every manifest under `dir`, returning name to manifest uuid
    async fn load_manifests(&self, dir: &Path) -> Result<HashMap<String, Uuid>>;
}

fn first<T>(found: Vec<T>, what: impl FnOnce() -> String) -> Result<T> {
    found
        .into_iter()
        .next()
        .ok_or_else(|| InitError::NotFound(what()))
}

#[async_trait]
impl ServiceRegistry for SapiClient {
    async fn get_mode(&self) -> Result<RegistryMode> {
        Ok(SapiClient::get_mode(self).await?)
    }

    async fn set_mode(&self, mode: RegistryMode) -> Result<()> {
        Ok(SapiClient::set_mode(self, mode).await?)
    }

    async fn find_application(&self, name: &str, owner: Uuid) -> Result<Application> {
        let found = self.list_applications(name, owner).await?;
        first(found, || {
            format!("application {} owned by {} not found", name, owner)
        })
    }

    async fn find_application_named(&self, name: &str) -> Result<Application> {
        let found = self.list_applications_named(name).await?;
        first(found, || format!("application {} not found", name))
    }

    async fn create_application(&self, req: &CreateApplication) -> Result<Application> {
        Ok(SapiClient::create_application(self, req).await?)
    }

    async fn update_application(&self, uuid: Uuid, changes: &RecordChanges) -> Result<()> {
        Ok(SapiClient::update_application(self, uuid, changes).await?)
    }

    async fn find_service(&self, name: &str, application: Uuid) -> Result<Service> {
        let found = self.list_services(name, application).await?;
        first(found, || {
            format!("service {} of application {} not found", name, application)
        })
    }

    async fn create_service(&self, req: &CreateService) -> Result<Service> {
        Ok(SapiClient::create_service(self, req).await?)
    }

    async fn update_service(&self, uuid: Uuid, changes: &RecordChanges) -> Result<()> {
        Ok(SapiClient::update_service(self, uuid, changes).await?)
    }

    async fn load_manifests(&self, dir: &Path) -> Result<HashMap<String, Uuid>> {
        Ok(SapiClient::load_manifests(self, dir).await?)
    }
}
