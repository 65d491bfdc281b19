//! Image registry repository
//!
//! Both the local registry and the remote update server are viewed through
//! this trait; only the local one is ever asked to import.

use async_trait::async_trait;
use manta_client::ImgapiClient;
use manta_core::domain::image::ImageRef;
use manta_core::dto::image::{ImageFilters, ImportOptions};
use uuid::Uuid;

use crate::error::Result;

#[async_trait]
pub trait ImageRegistry: Send + Sync {
    /// Lists images matching the filters; an empty list is not an error
    async fn list_images(&self, filters: &ImageFilters) -> Result<Vec<ImageRef>>;

    /// Imports an image from `source` and waits until it settles
    ///
    /// Returns `AlreadyExists` when the image is already present.
    async fn import_remote_image_and_wait(
        &self,
        uuid: Uuid,
        source: &str,
        options: ImportOptions,
    ) -> Result<()>;

    /// Base URL of the registry
    fn url(&self) -> &str;
}

#[async_trait]
impl ImageRegistry for ImgapiClient {
    async fn list_images(&self, filters: &ImageFilters) -> Result<Vec<ImageRef>> {
        Ok(ImgapiClient::list_images(self, filters).await?)
    }

    async fn import_remote_image_and_wait(
        &self,
        uuid: Uuid,
        source: &str,
        options: ImportOptions,
    ) -> Result<()> {
        Ok(self
            .admin_import_remote_image_and_wait(uuid, source, options)
            .await?)
    }

    fn url(&self) -> &str {
        self.base_url()
    }
}
