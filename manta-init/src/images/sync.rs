//! Image synchronization
//!
//! The local registry fails an import whose origin is itself mid-import,
//! so imports happen in two phases:
//! 1. Every distinct origin image, one at a time.
//! 2. The deduplicated service images, at most `concurrency` at a time.
//!
//! An image the local registry already holds counts as imported.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use manta_core::domain::image::ImageRef;
use manta_core::dto::image::ImportOptions;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::DEFAULT_CONCURRENT_DOWNLOADS;
use crate::error::{InitError, Result};
use crate::repository::ImageRegistry;

/// Distinct origin uuids, in first-seen order
pub fn distinct_origins(images: &[ImageRef]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    images
        .iter()
        .filter_map(|image| image.origin)
        .filter(|origin| seen.insert(*origin))
        .collect()
}

/// Distinct image uuids, in first-seen order
pub fn distinct_images(images: &[ImageRef]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    images
        .iter()
        .map(|image| image.uuid)
        .filter(|uuid| seen.insert(*uuid))
        .collect()
}

/// Imports discovered images into the local registry
pub struct ImageSync {
    local: Arc<dyn ImageRegistry>,
    source_url: String,
    channel: Option<String>,
    concurrency: usize,
}

impl ImageSync {
    /// Creates a sync pulling from `source_url` into `local`
    pub fn new(local: Arc<dyn ImageRegistry>, source_url: impl Into<String>) -> Self {
        Self {
            local,
            source_url: source_url.into(),
            channel: None,
            concurrency: DEFAULT_CONCURRENT_DOWNLOADS,
        }
    }

    /// Sets the channel service images are imported from
    pub fn with_channel(mut self, channel: Option<String>) -> Self {
        self.channel = channel;
        self
    }

    /// Sets the maximum number of concurrent service image imports
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    fn image_source(&self) -> String {
        match &self.channel {
            Some(channel) => format!("{}?channel={}", self.source_url, channel),
            None => self.source_url.clone(),
        }
    }

    /// Phase 1: imports every distinct origin serially
    ///
    /// Returns the number of origins processed.
    pub async fn import_origins(&self, images: &[ImageRef]) -> Result<usize> {
        let origins = distinct_origins(images);
        info!(
            "Downloading {} origin images from {}",
            origins.len(),
            self.source_url
        );

        for uuid in &origins {
            import_one(
                self.local.as_ref(),
                *uuid,
                &self.source_url,
                ImportOptions::default(),
                "origin image",
            )
            .await?;
        }

        Ok(origins.len())
    }

    /// Phase 2: imports the deduplicated images with bounded concurrency
    ///
    /// Once an import fails no further imports start; those already running
    /// finish before the first failure is returned. Returns the number of
    /// distinct images processed.
    pub async fn import_images(&self, images: &[ImageRef]) -> Result<usize> {
        let uuids = distinct_images(images);
        let source: Arc<str> = Arc::from(self.image_source());
        info!(
            "Downloading {} images from {} ({} at a time)",
            uuids.len(),
            source,
            self.concurrency
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let failed = Arc::new(AtomicBool::new(false));
        let first_error: Arc<OnceLock<InitError>> = Arc::new(OnceLock::new());
        let options = ImportOptions {
            skip_owner_check: true,
        };

        let mut handles = Vec::with_capacity(uuids.len());
        for uuid in uuids.iter().copied() {
            let local = Arc::clone(&self.local);
            let semaphore = Arc::clone(&semaphore);
            let failed = Arc::clone(&failed);
            let first_error = Arc::clone(&first_error);
            let source = Arc::clone(&source);

            handles.push(tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        let _ = first_error.set(InitError::upstream(e));
                        return;
                    }
                };

                if failed.load(Ordering::SeqCst) {
                    debug!("Not starting import of {} after an earlier failure", uuid);
                    return;
                }

                if let Err(e) = import_one(local.as_ref(), uuid, &source, options, "image").await
                {
                    failed.store(true, Ordering::SeqCst);
                    let _ = first_error.set(e);
                }
            }));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                failed.store(true, Ordering::SeqCst);
                let _ = first_error.set(InitError::upstream(format!(
                    "image import task failed: {}",
                    e
                )));
            }
        }

        // Every task has finished, so this is the last reference
        match Arc::into_inner(first_error).and_then(OnceLock::into_inner) {
            Some(e) => Err(e),
            None => Ok(uuids.len()),
        }
    }
}

async fn import_one(
    registry: &dyn ImageRegistry,
    uuid: Uuid,
    source: &str,
    options: ImportOptions,
    what: &str,
) -> Result<()> {
    info!("Downloading {} {}", what, uuid);

    match registry
        .import_remote_image_and_wait(uuid, source, options)
        .await
    {
        Ok(()) => {
            info!("Downloaded {} {}", what, uuid);
            Ok(())
        }
        Err(e) if e.is_already_exists() => {
            info!("{} {} already downloaded", what, uuid);
            Ok(())
        }
        Err(e) => {
            error!("Failed to download {} {}: {}", what, uuid, e);
            Err(e)
        }
    }
}
