//! Image domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An image published in an image registry
///
/// The `uuid` is unique per registry. When `origin` is set, the origin image
/// must be present in the local registry before this image can be imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub uuid: Uuid,
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Uuid>,
    pub published_at: DateTime<Utc>,
}

/// Lifecycle state of an image in the local registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageState {
    Active,
    Unactivated,
    Disabled,
    Creating,
    Failed,
}

impl ImageState {
    /// Whether an import has finished (successfully or not)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ImageState::Active | ImageState::Disabled | ImageState::Failed
        )
    }
}

/// Minimal view of an image used while waiting for an import to settle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageStatus {
    pub uuid: Uuid,
    pub state: ImageState,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

impl std::fmt::Display for ImageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageState::Active => write!(f, "active"),
            ImageState::Unactivated => write!(f, "unactivated"),
            ImageState::Disabled => write!(f, "disabled"),
            ImageState::Creating => write!(f, "creating"),
            ImageState::Failed => write!(f, "failed"),
        }
    }
}
