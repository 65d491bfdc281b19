//! Manta Core
//!
//! Core types shared by the Manta deployment bootstrap tooling.
//!
//! This crate contains:
//! - Domain types: records owned by the external registries (users, applications, images, networks)
//! - DTOs: request bodies and query filters sent to those registries
//! - Catalog: the fixed set of deployed services and their image names

pub mod catalog;
pub mod domain;
pub mod dto;
