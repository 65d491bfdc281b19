//! Image discovery and synchronization
//!
//! Discovery finds the newest acceptable image for each service; sync
//! imports the discovered images into the local registry, origins first.

mod discovery;
mod sync;

pub use discovery::{ImageSearch, bind_service_image};
pub use sync::ImageSync;
