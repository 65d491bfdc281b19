//! Web API job-token AES key

use manta_core::domain::application::Service;
use manta_core::dto::application::RecordChanges;
use serde_json::{Map, Value};
use tracing::info;

use super::recorded_secret;
use crate::error::{InitError, Result};
use crate::reconcile::ensure;
use crate::repository::ServiceRegistry;
use crate::secrets::SecretTooling;

/// Service metadata field marking the key as provisioned
pub const AES_KEY_FIELD: &str = "MUSKIE_JOB_TOKEN_AES_KEY";

const AES_PREFIX: &str = "MUSKIE_JOB_TOKEN_AES_";

const WEBAPI_SERVICE: &str = "webapi";

/// Turns `openssl enc -P` output into prefixed metadata
///
/// ```text
/// salt=ABDABC20E045270D
/// key=10E0E4E7F8AF968E22819E91AA7D45E9
/// iv =4A603A273291A459A60C5AB240E9CEC2
/// ```
///
/// becomes `MUSKIE_JOB_TOKEN_AES_SALT`, `..._KEY`, and `..._IV`.
pub fn parse_aes_output(output: &str) -> Map<String, Value> {
    output
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(name, value)| {
            (
                format!("{}{}", AES_PREFIX, name.trim().to_uppercase()),
                Value::from(value.trim()),
            )
        })
        .collect()
}

/// Ensures the `webapi` service carries job-token AES key material
///
/// Returns the metadata written, or `None` when the key was already present.
pub async fn provision_webapi_key(
    services: &[Service],
    registry: &dyn ServiceRegistry,
    tooling: &dyn SecretTooling,
) -> Result<Option<Map<String, Value>>> {
    let webapi = services
        .iter()
        .find(|service| service.name == WEBAPI_SERVICE)
        .ok_or_else(|| {
            InitError::Config(format!("did not find expected \"{}\" service!", WEBAPI_SERVICE))
        })?;

    let written = ensure(
        "secret",
        AES_KEY_FIELD,
        || async { recorded_secret(&webapi.metadata, AES_KEY_FIELD).map(|_| None) },
        || async {
            info!("Generating {} AES key", WEBAPI_SERVICE);
            let output = tooling.generate_aes_material().await?;
            let metadata = parse_aes_output(&output);
            if !metadata.contains_key(AES_KEY_FIELD) {
                return Err(InitError::upstream(format!(
                    "openssl output did not contain a key: {}",
                    output.trim()
                )));
            }

            registry
                .update_service(webapi.uuid, &RecordChanges::metadata(metadata.clone()))
                .await?;
            Ok(Some(metadata))
        },
    )
    .await?;

    Ok(written.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeServiceRegistry, FakeTooling};
    use uuid::Uuid;

    fn webapi(metadata: Map<String, Value>) -> Service {
        Service {
            uuid: Uuid::new_v4(),
            name: "webapi".to_string(),
            application_uuid: Uuid::new_v4(),
            params: Map::new(),
            metadata,
        }
    }

    #[test]
    fn test_parse_aes_output() {
        let output = "salt=ABDABC20E045270D\nkey=10E0E4E7F8AF968E22819E91AA7D45E9\niv =4A603A273291A459A60C5AB240E9CEC2\n\n";
        let parsed = parse_aes_output(output);

        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed["MUSKIE_JOB_TOKEN_AES_SALT"], "ABDABC20E045270D");
        assert_eq!(parsed["MUSKIE_JOB_TOKEN_AES_KEY"], "10E0E4E7F8AF968E22819E91AA7D45E9");
        assert_eq!(parsed["MUSKIE_JOB_TOKEN_AES_IV"], "4A603A273291A459A60C5AB240E9CEC2");
    }

    #[test]
    fn test_parse_ignores_lines_without_separator() {
        let parsed = parse_aes_output("*** WARNING : deprecated key derivation used.\nkey= AB \n");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed["MUSKIE_JOB_TOKEN_AES_KEY"], "AB");
    }

    #[tokio::test]
    async fn test_writes_key_to_webapi() {
        let registry = FakeServiceRegistry::default();
        let tooling = FakeTooling::default();
        let service = registry.seed_service(webapi(Map::new()));

        let written = provision_webapi_key(&[service.clone()], &registry, &tooling)
            .await
            .unwrap()
            .unwrap();

        assert!(written.contains_key(AES_KEY_FIELD));
        let stored = registry.service(service.uuid).unwrap();
        assert_eq!(stored.metadata[AES_KEY_FIELD], written[AES_KEY_FIELD]);
    }

    #[tokio::test]
    async fn test_skips_when_key_present() {
        let registry = FakeServiceRegistry::default();
        let tooling = FakeTooling::default();
        let mut metadata = Map::new();
        metadata.insert(AES_KEY_FIELD.to_string(), Value::from("00FF"));

        let written = provision_webapi_key(&[webapi(metadata)], &registry, &tooling)
            .await
            .unwrap();

        assert!(written.is_none());
        assert_eq!(tooling.aes_calls(), 0);
    }

    #[tokio::test]
    async fn test_skips_when_key_recorded_empty() {
        let registry = FakeServiceRegistry::default();
        let tooling = FakeTooling::default();
        let mut metadata = Map::new();
        metadata.insert(AES_KEY_FIELD.to_string(), Value::from(""));

        let written = provision_webapi_key(&[webapi(metadata)], &registry, &tooling)
            .await
            .unwrap();

        assert!(written.is_none());
        assert_eq!(tooling.aes_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_webapi_is_an_error() {
        let registry = FakeServiceRegistry::default();
        let tooling = FakeTooling::default();

        let err = provision_webapi_key(&[], &registry, &tooling).await.unwrap_err();
        assert_eq!(err.to_string(), "did not find expected \"webapi\" service!");
    }
}
