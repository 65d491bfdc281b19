//! Service registry DTOs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

/// Request to create an application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateApplication {
    pub name: String,
    pub owner_uuid: Uuid,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub manifests: HashMap<String, Uuid>,
    pub master: bool,
}

/// Request to create a service under an application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateService {
    pub name: String,
    pub application_uuid: Uuid,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub master: bool,
}

/// How an update is applied to the stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateAction {
    /// Merge the given keys into the existing record
    Update,
    /// Replace the given sections entirely
    Replace,
    /// Remove the given keys
    Delete,
}

/// Partial update of an application or service record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordChanges {
    pub action: UpdateAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifests: Option<HashMap<String, Uuid>>,
}

impl RecordChanges {
    fn update() -> Self {
        Self {
            action: UpdateAction::Update,
            params: None,
            metadata: None,
            manifests: None,
        }
    }

    /// Merge `metadata` into the record's metadata
    pub fn metadata(metadata: Map<String, Value>) -> Self {
        Self {
            metadata: Some(metadata),
            ..Self::update()
        }
    }

    /// Merge `params` into the record's params
    pub fn params(params: Map<String, Value>) -> Self {
        Self {
            params: Some(params),
            ..Self::update()
        }
    }

    /// Merge `manifests` into the record's manifest mapping
    pub fn manifests(manifests: HashMap<String, Uuid>) -> Self {
        Self {
            manifests: Some(manifests),
            ..Self::update()
        }
    }
}
