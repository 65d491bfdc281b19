//! Deployment configuration
//!
//! Two layers of settings drive a run:
//! - [`DeploymentConfig`]: the JSON file written at datacenter setup,
//!   naming the registry endpoints, region, and DNS domain.
//! - [`Options`]: the per-invocation command-line choices (operator email,
//!   image channel, download concurrency, deployment size).

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::ValueEnum;
use serde::Deserialize;

use crate::error::{InitError, Result};

/// Default location of the deployment config file
pub const DEFAULT_CONFIG_PATH: &str = "/opt/smartdc/manta-deployment/etc/config.json";

/// Default image import concurrency
pub const DEFAULT_CONCURRENT_DOWNLOADS: usize = 10;

/// Largest accepted image import concurrency
pub const MAX_CONCURRENT_DOWNLOADS: usize = 127;

/// Deployment size, selecting per-size service template overrides
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeploymentSize {
    Coal,
    Lab,
    Production,
}

impl DeploymentSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentSize::Coal => "coal",
            DeploymentSize::Lab => "lab",
            DeploymentSize::Production => "production",
        }
    }
}

impl std::fmt::Display for DeploymentSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-invocation options
#[derive(Debug, Clone)]
pub struct Options {
    /// Email address set on the operator account
    pub email: String,

    /// Version substring images must contain (empty matches all)
    pub branch: String,

    /// Update channel to search; resolved from the platform when unset
    pub channel: Option<String>,

    /// Maximum number of concurrent image imports
    pub concurrent_downloads: usize,

    /// Search the local image registry instead of the remote one
    pub no_download: bool,

    /// Deployment size; `lab` when unset
    pub size: Option<DeploymentSize>,
}

impl Options {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            branch: String::new(),
            channel: None,
            concurrent_downloads: DEFAULT_CONCURRENT_DOWNLOADS,
            no_download: false,
            size: None,
        }
    }

    /// Validates the options
    pub fn validate(&self) -> Result<()> {
        if self.email.trim().is_empty() {
            return Err(InitError::Usage("email cannot be empty".to_string()));
        }

        if let Some(channel) = &self.channel {
            validate_channel(channel).map_err(InitError::Usage)?;
        }

        if !(1..=MAX_CONCURRENT_DOWNLOADS).contains(&self.concurrent_downloads) {
            return Err(InitError::Usage(format!(
                "concurrent downloads must be between 1 and {}, got {}",
                MAX_CONCURRENT_DOWNLOADS, self.concurrent_downloads
            )));
        }

        Ok(())
    }

    pub fn size_or_default(&self) -> DeploymentSize {
        self.size.unwrap_or(DeploymentSize::Lab)
    }
}

/// Reject channels that would match every channel or none
pub fn validate_channel(channel: &str) -> std::result::Result<String, String> {
    if channel.is_empty() || channel == "*" {
        return Err("channel must not be \"*\" or an empty string".to_string());
    }
    Ok(channel.to_string())
}

/// A registry endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    pub url: String,
}

/// Identity directory endpoint and bind credentials
#[derive(Debug, Clone, Deserialize)]
pub struct UfdsConfig {
    pub url: String,

    #[serde(rename = "bindDN", default)]
    pub bind_dn: Option<String>,

    #[serde(rename = "bindPassword", default)]
    pub bind_password: Option<String>,
}

/// Deployment configuration loaded from disk
#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentConfig {
    pub ufds: UfdsConfig,
    pub sapi: EndpointConfig,
    pub imgapi: EndpointConfig,
    pub remote_imgapi: EndpointConfig,
    pub napi: EndpointConfig,

    /// Region name, the first label of the deployment's domain
    #[serde(default)]
    pub region_name: String,

    #[serde(default)]
    pub dns_domain: String,

    /// Password given to the operator account when it is created
    #[serde(default = "default_operator_password")]
    pub operator_password: String,

    /// Directory holding `application.json` and `services/<name>/service.json`
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,

    /// Directory of application manifests, one subdirectory per manifest
    #[serde(default = "default_manifests_dir")]
    pub manifests_dir: PathBuf,
}

fn default_operator_password() -> String {
    "trident123".to_string()
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from("/opt/smartdc/manta-deployment/config")
}

fn default_manifests_dir() -> PathBuf {
    PathBuf::from("/opt/smartdc/manta-deployment/manifests/applications/manta")
}

impl DeploymentConfig {
    /// Loads the deployment config from a JSON file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_json(contents: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.region_name.is_empty() {
            return Err(InitError::Config(
                "config file did not contain a region_name.".to_string(),
            ));
        }

        for (name, url) in [
            ("ufds", &self.ufds.url),
            ("sapi", &self.sapi.url),
            ("imgapi", &self.imgapi.url),
            ("remote_imgapi", &self.remote_imgapi.url),
            ("napi", &self.napi.url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(InitError::Config(format!(
                    "{}.url must start with http:// or https://, got {:?}",
                    name, url
                )));
            }
        }

        Ok(())
    }

    /// The deployment's domain, `<region>.<dns_domain>`
    pub fn domain_name(&self) -> String {
        format!("{}.{}", self.region_name, self.dns_domain)
    }
}
