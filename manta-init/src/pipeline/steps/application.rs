//! The application record, its secrets, manifests, and update channel

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use manta_core::catalog::{APPLICATION_NAME, MANTA_VERSION};
use manta_core::dto::application::{CreateApplication as ApplicationRequest, RecordChanges};
use serde_json::{Map, Value, json};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::{DeploymentConfig, DeploymentSize};
use crate::context::PipelineContext;
use crate::error::{InitError, Result};
use crate::pipeline::Step;
use crate::reconcile::ensure;
use crate::secrets::provision_admin_key;
use crate::templates::{Template, Templates};

/// Metadata key carrying the application's major version
const VERSION_KEY: &str = "MANTAV";

/// Application that carries the platform's update channel
const PLATFORM_APPLICATION: &str = "sdc";

/// Metadata derived from the deployment config for a new application
pub fn application_metadata(
    config: &DeploymentConfig,
    operator_uuid: Uuid,
    imgapi_url: &str,
    size: DeploymentSize,
) -> Map<String, Value> {
    let domain = config.domain_name();
    let manta_service = format!("manta.{}", domain);

    let metadata = json!({
        VERSION_KEY: MANTA_VERSION,
        "REGION": config.region_name,
        "SIZE": size.as_str(),
        "DNS_DOMAIN": config.dns_domain,
        "DOMAIN_NAME": domain,
        "MANTA_SERVICE": manta_service,
        "AUTH_SERVICE": format!("authcache.{}", domain),
        "ELECTRIC_MORAY": format!("electric-moray.{}", domain),
        "BUCKETS_MDPLACEMENT": format!("buckets-mdplacement.{}", domain),
        "WORKFLOW_SERVICE": format!("workflow.{}", domain),
        "POSEIDON_UUID": operator_uuid,
        "IMGAPI_SERVICE": imgapi_url,
        "MANTA_URL": format!("https://{}", manta_service),
        "MANTA_REJECT_UNAUTHORIZED": false,
        "MANTA_TLS_INSECURE": "1",
        "MUSKIE_MULTI_DC": false,
        "BUCKETS_API_MULTI_DC": false,
        // Storage may only keep connections alive once every webapi is new enough
        "MAKO_HTTP_KEEPALIVE_TIMEOUT": 86400,
        "SERVER_COMPUTE_ID_MAPPING": {},
    });

    match metadata {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

pub struct GetExistingApplication;

#[async_trait]
impl Step for GetExistingApplication {
    fn name(&self) -> &'static str {
        "get_existing_application"
    }

    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        let services = Arc::clone(&ctx.clients()?.services);
        let owner = ctx.operator()?.uuid;

        info!("Fetching {} application", APPLICATION_NAME);
        let existing = match services.find_application(APPLICATION_NAME, owner).await {
            Ok(application) => {
                info!("Found existing application {}", application.uuid);
                Some(application)
            }
            Err(e) if e.is_not_found() => {
                info!("No {} application yet", APPLICATION_NAME);
                None
            }
            Err(e) => return Err(e),
        };

        ctx.set_existing_application(existing);
        Ok(())
    }
}

/// Refuses to touch an application of another major version
pub struct CheckApplicationVersion;

#[async_trait]
impl Step for CheckApplicationVersion {
    fn name(&self) -> &'static str {
        "check_application_version"
    }

    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        let Some(application) = ctx.existing_application() else {
            return Ok(());
        };

        match application.metadata.get(VERSION_KEY) {
            Some(version) if version.as_u64() == Some(MANTA_VERSION) => {
                debug!("Existing application is v{}", MANTA_VERSION);
                Ok(())
            }
            // Applications predating the marker are v1
            None => Err(InitError::VersionMismatch {
                found: "1".to_string(),
            }),
            Some(Value::String(version)) => Err(InitError::VersionMismatch {
                found: version.clone(),
            }),
            Some(version) => Err(InitError::VersionMismatch {
                found: version.to_string(),
            }),
        }
    }
}

pub struct CreateApplication;

#[async_trait]
impl Step for CreateApplication {
    fn name(&self) -> &'static str {
        "create_application"
    }

    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        let clients = ctx.clients()?.clone();
        let owner = ctx.operator()?.uuid;
        let metadata = application_metadata(
            &ctx.config,
            owner,
            clients.local_images.url(),
            ctx.options.size_or_default(),
        );
        let templates = Templates::new(&ctx.config.templates_dir);

        let services = clients.services.as_ref();
        let templates = &templates;
        let application = ensure(
            "application",
            APPLICATION_NAME,
            move || services.find_application(APPLICATION_NAME, owner),
            move || async move {
                let mut template = templates.application().await?;
                template.merge(Template {
                    params: Map::new(),
                    metadata,
                });

                services
                    .create_application(&ApplicationRequest {
                        name: APPLICATION_NAME.to_string(),
                        owner_uuid: owner,
                        params: template.params,
                        metadata: template.metadata,
                        manifests: HashMap::new(),
                        master: true,
                    })
                    .await
            },
        )
        .await?
        .into_inner();

        ctx.set_application(application);
        Ok(())
    }
}

pub struct AddAdminKey;

#[async_trait]
impl Step for AddAdminKey {
    fn name(&self) -> &'static str {
        "add_admin_key"
    }

    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        let clients = ctx.clients()?.clone();

        info!("Adding operator SSH key");
        let written = provision_admin_key(
            ctx.application()?,
            ctx.operator()?,
            clients.identity.as_ref(),
            clients.services.as_ref(),
            clients.tooling.as_ref(),
        )
        .await
        .map_err(|e| {
            error!("Failed to push SSH keys: {}", e);
            e
        })?;

        match written {
            Some(metadata) => ctx.application_mut()?.metadata.extend(metadata),
            None => info!("SSH key already present, not generating"),
        }
        Ok(())
    }
}

pub struct AddApplicationConfigs;

#[async_trait]
impl Step for AddApplicationConfigs {
    fn name(&self) -> &'static str {
        "add_application_configs"
    }

    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        let services = Arc::clone(&ctx.clients()?.services);
        let application = ctx.application()?.uuid;
        let dir = ctx.config.manifests_dir.clone();

        let manifests = services.load_manifests(&dir).await.map_err(|e| {
            error!("Failed to load manifests for {}: {}", application, e);
            e
        })?;

        services
            .update_application(application, &RecordChanges::manifests(manifests.clone()))
            .await?;

        info!("Loaded {} manifests from {}", manifests.len(), dir.display());
        ctx.application_mut()?.manifests.extend(manifests);
        Ok(())
    }
}

/// Falls back to the platform's update channel when none was requested
pub struct DetermineDefaultChannel;

#[async_trait]
impl Step for DetermineDefaultChannel {
    fn name(&self) -> &'static str {
        "determine_default_channel"
    }

    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        if let Some(channel) = ctx.options.channel.clone() {
            ctx.set_channel(Some(channel));
            return Ok(());
        }

        info!("Determining update_channel from the service registry");
        let services = Arc::clone(&ctx.clients()?.services);
        let platform = services
            .find_application_named(PLATFORM_APPLICATION)
            .await
            .map_err(|e| {
                error!("Failed to determine {} update_channel: {}", PLATFORM_APPLICATION, e);
                e
            })?;

        let channel = platform
            .metadata
            .get("update_channel")
            .and_then(Value::as_str)
            .map(str::to_string);

        match &channel {
            Some(channel) => info!("Using update channel \"{}\"", channel),
            None => info!("No update channel set, using the server default"),
        }
        ctx.set_channel(channel);
        Ok(())
    }
}
