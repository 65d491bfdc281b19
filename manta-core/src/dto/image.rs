//! Image registry DTOs

use serde::{Deserialize, Serialize};

/// Search filters for listing images
///
/// `version` uses the registry's substring syntax (`~<substring>`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFilters {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

impl ImageFilters {
    /// Filters matching every version of `name`
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Restrict to versions containing `substring`; empty means no restriction
    pub fn with_version_substring(mut self, substring: &str) -> Self {
        if !substring.is_empty() {
            self.version = Some(format!("~{}", substring));
        }
        self
    }

    /// Restrict to a distribution channel
    pub fn with_channel(mut self, channel: Option<&str>) -> Self {
        self.channel = channel.map(str::to_string);
        self
    }
}

/// Options for importing an image from a remote registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOptions {
    /// Import even if the image owner does not exist locally
    pub skip_owner_check: bool,
}
