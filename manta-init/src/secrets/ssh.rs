//! Operator SSH key
//!
//! The operator's keypair lives in application metadata. It is generated in
//! a private temporary directory that is removed whether or not the
//! registration succeeds.

use manta_core::domain::application::Application;
use manta_core::domain::user::User;
use manta_core::dto::application::RecordChanges;
use manta_core::dto::user::NewKey;
use serde_json::{Map, Value};
use tracing::info;

use super::existing_secret;
use crate::error::Result;
use crate::reconcile::ensure;
use crate::repository::{IdentityDirectory, ServiceRegistry};
use crate::secrets::SecretTooling;

/// Application metadata field holding the operator's private key
pub const PRIVATE_KEY_FIELD: &str = "ADMIN_PRIVATE_KEY";

/// Ensures the application carries an operator SSH key
///
/// Returns the metadata written, or `None` when a key was already present.
pub async fn provision_admin_key(
    application: &Application,
    operator: &User,
    identity: &dyn IdentityDirectory,
    services: &dyn ServiceRegistry,
    tooling: &dyn SecretTooling,
) -> Result<Option<Map<String, Value>>> {
    let written = ensure(
        "secret",
        PRIVATE_KEY_FIELD,
        || async { existing_secret(&application.metadata, PRIVATE_KEY_FIELD).map(|_| None) },
        || async {
            generate_and_store(application, operator, identity, services, tooling)
                .await
                .map(Some)
        },
    )
    .await?;

    Ok(written.into_inner())
}

async fn generate_and_store(
    application: &Application,
    operator: &User,
    identity: &dyn IdentityDirectory,
    services: &dyn ServiceRegistry,
    tooling: &dyn SecretTooling,
) -> Result<Map<String, Value>> {
    let dir = tempfile::Builder::new().prefix("manta-init-key").tempdir()?;
    let key_path = dir.path().join("key.rsa");

    let key = tooling.generate_ssh_key(&key_path).await?;
    info!("Generated SSH key {}", key.fingerprint);

    identity
        .add_key(
            &operator.login,
            &NewKey {
                name: key.fingerprint.clone(),
                openssh: key.public.clone(),
            },
        )
        .await?;

    let mut metadata = Map::new();
    metadata.insert("ADMIN_USERNAME".to_string(), Value::from(operator.login.clone()));
    metadata.insert(PRIVATE_KEY_FIELD.to_string(), Value::from(key.private));
    metadata.insert("ADMIN_PUBLIC_KEY".to_string(), Value::from(key.public));
    metadata.insert("ADMIN_KEY_ID".to_string(), Value::from(key.fingerprint));

    services
        .update_application(application.uuid, &RecordChanges::metadata(metadata.clone()))
        .await?;

    dir.close()?;
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InitError;
    use crate::testing::{FakeDirectory, FakeServiceRegistry, FakeTooling, operator};

    #[tokio::test]
    async fn test_generates_and_stores_key() {
        let identity = FakeDirectory::default();
        let services = FakeServiceRegistry::default();
        let tooling = FakeTooling::default();
        let app = services.seed_application("manta", Map::new());
        let user = operator();

        let written = provision_admin_key(&app, &user, &identity, &services, &tooling)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(written["ADMIN_USERNAME"], "poseidon");
        assert_eq!(written["ADMIN_KEY_ID"], "aa:bb:cc");
        assert_eq!(identity.keys_added(), vec![("poseidon".to_string(), "aa:bb:cc".to_string())]);

        let stored = services.application(app.uuid).unwrap();
        assert!(stored.metadata.contains_key(PRIVATE_KEY_FIELD));

        let key_dir = tooling.last_key_path().unwrap();
        assert!(!key_dir.parent().unwrap().exists());
    }

    #[tokio::test]
    async fn test_skips_when_key_present() {
        let identity = FakeDirectory::default();
        let services = FakeServiceRegistry::default();
        let tooling = FakeTooling::default();
        let mut metadata = Map::new();
        metadata.insert(PRIVATE_KEY_FIELD.to_string(), Value::from("-----BEGIN"));
        let app = services.seed_application("manta", metadata);

        let written = provision_admin_key(&app, &operator(), &identity, &services, &tooling)
            .await
            .unwrap();

        assert!(written.is_none());
        assert!(identity.keys_added().is_empty());
        assert!(tooling.last_key_path().is_none());
    }

    #[tokio::test]
    async fn test_key_files_removed_on_failure() {
        let identity = FakeDirectory::default();
        identity.fail_add_key();
        let services = FakeServiceRegistry::default();
        let tooling = FakeTooling::default();
        let app = services.seed_application("manta", Map::new());

        let result = provision_admin_key(&app, &operator(), &identity, &services, &tooling).await;
        assert!(matches!(result, Err(InitError::Upstream(_))));

        let key_path = tooling.last_key_path().unwrap();
        assert!(!key_path.exists());
        assert!(!key_path.parent().unwrap().exists());
        assert!(!services.application(app.uuid).unwrap().metadata.contains_key(PRIVATE_KEY_FIELD));
    }
}
