//! Application and service domain types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

/// A top-level application registered in the service registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub uuid: Uuid,
    pub name: String,
    pub owner_uuid: Uuid,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Configuration manifests keyed by name
    #[serde(default)]
    pub manifests: HashMap<String, Uuid>,
}

/// A service belonging to an application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub uuid: Uuid,
    pub name: String,
    pub application_uuid: Uuid,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Service {
    /// The image currently bound to this service, if any
    pub fn image_uuid(&self) -> Option<Uuid> {
        self.params
            .get("image_uuid")
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
    }
}

/// Operating mode of the service registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryMode {
    /// Bootstrap mode: records are kept locally and not yet authoritative
    Proto,
    /// Records are fully backed by the persistent store
    Full,
}

impl std::fmt::Display for RegistryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryMode::Proto => write!(f, "proto"),
            RegistryMode::Full => write!(f, "full"),
        }
    }
}
