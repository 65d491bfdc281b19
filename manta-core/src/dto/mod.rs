//! Data Transfer Objects for registry requests
//!
//! Request bodies and query filters sent to the external registries.
//! Responses are decoded directly into the domain types.

pub mod application;
pub mod image;
pub mod user;
