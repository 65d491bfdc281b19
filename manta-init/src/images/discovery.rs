//! Image discovery
//!
//! For each service, every accepted image name is queried concurrently and
//! the results are merged in name order before the newest image is chosen.

use futures::future::join_all;
use manta_core::catalog;
use manta_core::domain::image::ImageRef;
use manta_core::dto::image::ImageFilters;
use tracing::{debug, error, info};

use crate::error::{InitError, Result};
use crate::repository::ImageRegistry;

/// Search parameters shared by every service lookup of a run
pub struct ImageSearch<'a> {
    registry: &'a dyn ImageRegistry,
    version_substring: &'a str,
    channel: Option<&'a str>,
    local_only: bool,
}

impl<'a> ImageSearch<'a> {
    /// Search the remote update server on `channel` (server default when `None`)
    pub fn remote(
        registry: &'a dyn ImageRegistry,
        version_substring: &'a str,
        channel: Option<&'a str>,
    ) -> Self {
        Self {
            registry,
            version_substring,
            channel,
            local_only: false,
        }
    }

    /// Search only images already present in the local registry
    pub fn local(registry: &'a dyn ImageRegistry, version_substring: &'a str) -> Self {
        Self {
            registry,
            version_substring,
            channel: None,
            local_only: true,
        }
    }

    /// Finds the newest image for every service, in service order
    pub async fn find_latest_for_all(&self, services: &[&str]) -> Result<Vec<ImageRef>> {
        info!("Finding images for {} services", services.len());

        join_all(services.iter().map(|service| self.find_latest(service)))
            .await
            .into_iter()
            .collect()
    }

    /// Finds the newest image accepted by `service`
    pub async fn find_latest(&self, service: &str) -> Result<ImageRef> {
        let names = catalog::image_names(service);

        if self.local_only {
            info!(
                "Searching local images (matching {}) for service {}",
                names.join(", "),
                service
            );
        } else {
            match self.channel {
                Some(channel) => info!(
                    "Finding an image (matching {}) for service {} on channel \"{}\"",
                    names.join(", "),
                    service,
                    channel
                ),
                None => info!(
                    "Finding an image (matching {}) for service {} on default update channel",
                    names.join(", "),
                    service
                ),
            }
        }

        let queries = names.iter().map(|name| {
            let filters = ImageFilters::named(name.as_str())
                .with_version_substring(self.version_substring)
                .with_channel(self.channel);
            async move {
                debug!("Searching for images: {:?}", filters);
                self.registry.list_images(&filters).await.map_err(|e| {
                    error!("Failed to search for images named {}: {}", filters.name, e);
                    e
                })
            }
        });

        // Ordered join: results land in name order whatever order they finish in
        let mut merged = Vec::new();
        for found in join_all(queries).await {
            merged.extend(found?);
        }

        match select_newest(&merged) {
            Some(image) => {
                info!(
                    "Found image {} ({} {}) for {}",
                    image.uuid, image.name, image.version, service
                );
                Ok(image.clone())
            }
            None => {
                let msg = if self.local_only {
                    format!("no local image found for ({}) (remove -n?)", names.join(", "))
                } else {
                    format!(
                        "no remote image found for ({}) on channel \"{}\"",
                        names.join(", "),
                        self.channel.unwrap_or("default")
                    )
                };
                error!("{}", msg);
                Err(InitError::ImageNotFound(msg))
            }
        }
    }
}

/// Newest image by publish time; ties keep the earliest in the slice
pub fn select_newest(images: &[ImageRef]) -> Option<&ImageRef> {
    images.iter().fold(None, |newest, image| match newest {
        Some(current) if current.published_at >= image.published_at => Some(current),
        _ => Some(image),
    })
}

/// The discovered image bound to `service`
///
/// Exactly one of the service's accepted names must appear among the
/// discovered images.
pub fn bind_service_image<'i>(service: &str, images: &'i [ImageRef]) -> Result<&'i ImageRef> {
    let names = catalog::image_names(service);
    let matched: Vec<&ImageRef> = names
        .iter()
        .filter_map(|name| images.iter().find(|image| &image.name == name))
        .collect();

    match matched.as_slice() {
        [image] => Ok(*image),
        [] => Err(InitError::Config(format!(
            "no discovered image for service {} (expected one of {})",
            service,
            names.join(", ")
        ))),
        many => Err(InitError::Config(format!(
            "More than one image name for service {}: {}",
            service,
            many.iter()
                .map(|image| image.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ))),
    }
}
