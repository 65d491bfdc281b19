//! Core domain types
//!
//! Records as they are stored by the directory, service, image and network
//! registries. They are read by the bootstrap pipeline and compared against
//! the desired state.

pub mod application;
pub mod image;
pub mod network;
pub mod user;
