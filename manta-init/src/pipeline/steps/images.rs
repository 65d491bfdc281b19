//! Image discovery and import

use std::sync::Arc;

use async_trait::async_trait;
use manta_core::catalog::SERVICES;
use tracing::info;

use crate::context::PipelineContext;
use crate::error::Result;
use crate::images::{ImageSearch, ImageSync};
use crate::pipeline::Step;

pub struct FindLatestImages;

#[async_trait]
impl Step for FindLatestImages {
    fn name(&self) -> &'static str {
        "find_latest_images"
    }

    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        let clients = ctx.clients()?.clone();
        let branch = ctx.options.branch.as_str();

        let search = if ctx.options.no_download {
            ImageSearch::local(clients.local_images.as_ref(), branch)
        } else {
            ImageSearch::remote(clients.remote_images.as_ref(), branch, ctx.channel()?)
        };
        let images = search.find_latest_for_all(SERVICES).await?;

        ctx.set_images(images);
        Ok(())
    }
}

/// Imports shared origin images one at a time
pub struct ImportImageOrigins;

#[async_trait]
impl Step for ImportImageOrigins {
    fn name(&self) -> &'static str {
        "import_image_origins"
    }

    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        let clients = ctx.clients()?;
        let sync = ImageSync::new(
            Arc::clone(&clients.local_images),
            clients.remote_images.url(),
        );

        let count = sync.import_origins(ctx.images()?).await?;
        info!("Origin images ready ({})", count);
        Ok(())
    }
}

pub struct ImportImages;

#[async_trait]
impl Step for ImportImages {
    fn name(&self) -> &'static str {
        "import_images"
    }

    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        let clients = ctx.clients()?;
        let sync = ImageSync::new(
            Arc::clone(&clients.local_images),
            clients.remote_images.url(),
        )
        .with_channel(ctx.channel()?.map(str::to_string))
        .with_concurrency(ctx.options.concurrent_downloads);

        let count = sync.import_images(ctx.images()?).await?;
        info!("Service images ready ({})", count);
        Ok(())
    }
}
