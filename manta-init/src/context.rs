//! Pipeline context
//!
//! State shared by the pipeline steps. Each step fills in what later steps
//! read; reading a slot no earlier step has filled is a `MissingContext`
//! error naming the slot.

use manta_core::domain::application::{Application, Service};
use manta_core::domain::image::ImageRef;
use manta_core::domain::user::User;

use crate::config::{DeploymentConfig, Options};
use crate::error::{InitError, Result};
use crate::repository::Collaborators;

/// A converged service and the image it runs
#[derive(Debug, Clone)]
pub struct ProvisionedService {
    pub service: Service,
    pub image: ImageRef,
}

/// Context owned by the pipeline executor and lent to one step at a time
pub struct PipelineContext {
    pub options: Options,
    pub config: DeploymentConfig,

    clients: Option<Collaborators>,
    operator: Option<User>,
    existing_application: Option<Application>,
    application: Option<Application>,

    /// `Some(None)` once resolved to the server's default channel
    channel: Option<Option<String>>,

    images: Option<Vec<ImageRef>>,
    services: Option<Vec<ProvisionedService>>,
}

fn require<'a, T>(slot: &'a Option<T>, name: &'static str) -> Result<&'a T> {
    slot.as_ref().ok_or(InitError::MissingContext(name))
}

impl PipelineContext {
    pub fn new(options: Options, config: DeploymentConfig) -> Self {
        Self {
            options,
            config,
            clients: None,
            operator: None,
            existing_application: None,
            application: None,
            channel: None,
            images: None,
            services: None,
        }
    }

    pub fn clients(&self) -> Result<&Collaborators> {
        require(&self.clients, "clients")
    }

    pub fn set_clients(&mut self, clients: Collaborators) {
        self.clients = Some(clients);
    }

    /// Drops the collaborator handles, returning whether any were held
    pub fn release_clients(&mut self) -> bool {
        self.clients.take().is_some()
    }

    pub fn operator(&self) -> Result<&User> {
        require(&self.operator, "operator")
    }

    pub fn set_operator(&mut self, operator: User) {
        self.operator = Some(operator);
    }

    pub fn operator_mut(&mut self) -> Result<&mut User> {
        self.operator
            .as_mut()
            .ok_or(InitError::MissingContext("operator"))
    }

    /// The application found before this run created anything, if any
    pub fn existing_application(&self) -> Option<&Application> {
        self.existing_application.as_ref()
    }

    pub fn set_existing_application(&mut self, application: Option<Application>) {
        self.existing_application = application;
    }

    pub fn application(&self) -> Result<&Application> {
        require(&self.application, "application")
    }

    pub fn set_application(&mut self, application: Application) {
        self.application = Some(application);
    }

    pub fn application_mut(&mut self) -> Result<&mut Application> {
        self.application
            .as_mut()
            .ok_or(InitError::MissingContext("application"))
    }

    /// The update channel; `None` means the server's default
    pub fn channel(&self) -> Result<Option<&str>> {
        require(&self.channel, "channel").map(|channel| channel.as_deref())
    }

    pub fn set_channel(&mut self, channel: Option<String>) {
        self.channel = Some(channel);
    }

    pub fn images(&self) -> Result<&[ImageRef]> {
        require(&self.images, "images").map(Vec::as_slice)
    }

    pub fn set_images(&mut self, images: Vec<ImageRef>) {
        self.images = Some(images);
    }

    pub fn services(&self) -> Result<&[ProvisionedService]> {
        require(&self.services, "services").map(Vec::as_slice)
    }

    pub fn set_services(&mut self, services: Vec<ProvisionedService>) {
        self.services = Some(services);
    }
}
