//! Services, their image bindings, and the web API secret

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use manta_core::catalog::SERVICES;
use manta_core::domain::application::Service;
use manta_core::dto::application::{CreateService, RecordChanges};
use serde_json::{Map, Value};
use tracing::{debug, error, info};

use crate::context::{PipelineContext, ProvisionedService};
use crate::error::{InitError, Result};
use crate::images::bind_service_image;
use crate::pipeline::Step;
use crate::reconcile::{ensure, update_field_if_different};
use crate::secrets::provision_webapi_key;
use crate::templates::Templates;

/// Ensures every catalog service exists, bound to its discovered image
pub struct CreateServices;

#[async_trait]
impl Step for CreateServices {
    fn name(&self) -> &'static str {
        "create_services"
    }

    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        let clients = ctx.clients()?.clone();
        let application = ctx.application()?.uuid;
        let images = ctx.images()?;
        let size = ctx.options.size;
        let templates = Templates::new(&ctx.config.templates_dir);

        let registry = clients.services.as_ref();
        let templates = &templates;

        debug!("Creating {} services", SERVICES.len());
        let results = join_all(SERVICES.iter().copied().map(|name| async move {
            let image = bind_service_image(name, images)?;

            let ensured = ensure(
                "service",
                name,
                move || registry.find_service(name, application),
                move || async move {
                    let mut template = templates.service(name, size).await?;
                    template
                        .params
                        .insert("image_uuid".to_string(), Value::from(image.uuid.to_string()));

                    registry
                        .create_service(&CreateService {
                            name: name.to_string(),
                            application_uuid: application,
                            params: template.params,
                            metadata: template.metadata,
                            master: true,
                        })
                        .await
                },
            )
            .await?;
            let created = ensured.was_created();

            Ok::<_, InitError>((
                ProvisionedService {
                    service: ensured.into_inner(),
                    image: image.clone(),
                },
                created,
            ))
        }))
        .await;

        let ready = results.into_iter().collect::<Result<Vec<_>>>()?;
        let created = ready.iter().filter(|(_, created)| *created).count();
        info!("{} services ready, {} created", ready.len(), created);

        let provisioned = ready.into_iter().map(|(service, _)| service).collect();

        ctx.set_services(provisioned);
        Ok(())
    }
}

/// Points existing services at their newly discovered images
pub struct UpdateServiceImages;

#[async_trait]
impl Step for UpdateServiceImages {
    fn name(&self) -> &'static str {
        "update_service_images"
    }

    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        let registry = Arc::clone(&ctx.clients()?.services);
        let registry = registry.as_ref();

        let results = join_all(ctx.services()?.iter().map(|provisioned| async move {
            let service = &provisioned.service;
            let desired = provisioned.image.uuid;
            let current = service.image_uuid();

            let mut params = Map::new();
            params.insert("image_uuid".to_string(), Value::from(desired.to_string()));
            let changes = RecordChanges::params(params);

            update_field_if_different(
                "service",
                &service.name,
                "image_uuid",
                current.as_ref(),
                &desired,
                || registry.update_service(service.uuid, &changes),
            )
            .await
        }))
        .await;

        let mut first_error = None;
        for result in results {
            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        info!("Updated all images on services");
        Ok(())
    }
}

pub struct AddWebapiAesKey;

#[async_trait]
impl Step for AddWebapiAesKey {
    fn name(&self) -> &'static str {
        "add_webapi_aes_key"
    }

    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        let clients = ctx.clients()?;
        let services: Vec<Service> = ctx
            .services()?
            .iter()
            .map(|provisioned| provisioned.service.clone())
            .collect();

        let written = provision_webapi_key(
            &services,
            clients.services.as_ref(),
            clients.tooling.as_ref(),
        )
        .await
        .map_err(|e| {
            error!("Failed to push job token keys: {}", e);
            e
        })?;

        match written {
            Some(metadata) => info!("Stored {} webapi AES fields", metadata.len()),
            None => info!("Skipping webapi AES key (already present)"),
        }
        Ok(())
    }
}
