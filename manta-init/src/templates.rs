//! Application and service templates
//!
//! Templates are JSON documents with optional `params` and `metadata`
//! objects. Services may carry a per-size override next to their template
//! (`service.json.<size>`), merged over the base document.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::DeploymentSize;
use crate::error::{InitError, Result};

/// The `params` and `metadata` a record is created with
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Template {
    /// Merges `overlay` over this template
    pub fn merge(&mut self, overlay: Template) {
        merge_objects(&mut self.params, overlay.params);
        merge_objects(&mut self.metadata, overlay.metadata);
    }
}

/// Deep merge: nested objects merge key by key, anything else is replaced
pub fn merge_objects(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_objects(existing, incoming);
            }
            (Some(slot), value) => *slot = value,
            (None, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Template directory reader
#[derive(Debug, Clone)]
pub struct Templates {
    dir: PathBuf,
}

impl Templates {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Reads `application.json`
    pub async fn application(&self) -> Result<Template> {
        let path = self.dir.join("application.json");
        read_template(&path)
            .await?
            .ok_or_else(|| InitError::Config(format!("missing template {}", path.display())))
    }

    /// Reads `services/<name>/service.json` with its size override, if any
    pub async fn service(&self, name: &str, size: Option<DeploymentSize>) -> Result<Template> {
        let path = self.dir.join("services").join(name).join("service.json");
        let mut template = read_template(&path)
            .await?
            .ok_or_else(|| InitError::Config(format!("missing template {}", path.display())))?;

        if let Some(size) = size {
            let override_path = path.with_extension(format!("json.{}", size));
            if let Some(overlay) = read_template(&override_path).await? {
                debug!("Applying {} override for {}", size, name);
                template.merge(overlay);
            }
        }

        Ok(template)
    }
}

async fn read_template(path: &Path) -> Result<Option<Template>> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|e| InitError::Config(format!("invalid template {}: {}", path.display(), e)))
}
