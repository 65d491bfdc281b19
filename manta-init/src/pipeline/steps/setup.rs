//! Input validation, client lifecycle, and registry mode

use std::sync::Arc;

use async_trait::async_trait;
use manta_core::domain::application::RegistryMode;
use tracing::info;

use crate::context::PipelineContext;
use crate::error::Result;
use crate::pipeline::Step;
use crate::reconcile::update_field_if_different;
use crate::repository::Connector;

pub struct VerifyInput;

#[async_trait]
impl Step for VerifyInput {
    fn name(&self) -> &'static str {
        "verify_input"
    }

    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        ctx.options.validate()?;
        ctx.config.validate()?;

        info!(
            "Deploying region {} ({}), size {}",
            ctx.config.region_name,
            ctx.config.domain_name(),
            ctx.options.size_or_default()
        );
        Ok(())
    }
}

pub struct InitClients {
    connector: Arc<dyn Connector>,
}

impl InitClients {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl Step for InitClients {
    fn name(&self) -> &'static str {
        "init_clients"
    }

    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        let clients = self.connector.connect(&ctx.config)?;
        ctx.set_clients(clients);
        Ok(())
    }
}

/// The service registry must be fully backed before records are written
pub struct EnsureFullMode;

#[async_trait]
impl Step for EnsureFullMode {
    fn name(&self) -> &'static str {
        "ensure_full_mode"
    }

    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        let services = Arc::clone(&ctx.clients()?.services);
        let mode = services.get_mode().await?;

        let changed = update_field_if_different(
            "service registry",
            "sapi",
            "mode",
            Some(&mode),
            &RegistryMode::Full,
            || services.set_mode(RegistryMode::Full),
        )
        .await?;

        if changed {
            info!("Upgraded service registry to full mode");
        } else {
            info!("Service registry in full mode");
        }
        Ok(())
    }
}

pub struct FiniClients;

#[async_trait]
impl Step for FiniClients {
    fn name(&self) -> &'static str {
        "fini_clients"
    }

    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        if ctx.release_clients() {
            info!("Released registry clients");
        }
        Ok(())
    }
}
