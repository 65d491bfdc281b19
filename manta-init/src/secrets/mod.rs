//! Secret provisioning
//!
//! Secrets are generated once and stored in registry metadata; a secret
//! field that is already present is never regenerated.

pub mod aes;
pub mod ssh;
pub mod tooling;

pub use aes::provision_webapi_key;
pub use ssh::provision_admin_key;
pub use tooling::{SecretTooling, SystemTooling};

use serde_json::{Map, Value};

use crate::error::InitError;

/// Reads a secret field, treating null, false, zero and empty strings as absent
pub(crate) fn existing_secret(
    metadata: &Map<String, Value>,
    field: &str,
) -> Result<Value, InitError> {
    match metadata.get(field) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => {
            Err(InitError::NotFound(field.to_string()))
        }
        Some(Value::String(s)) if s.is_empty() => Err(InitError::NotFound(field.to_string())),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => {
            Err(InitError::NotFound(field.to_string()))
        }
        Some(value) => Ok(value.clone()),
    }
}

/// Reads a secret field that counts as present whatever its value
pub(crate) fn recorded_secret(
    metadata: &Map<String, Value>,
    field: &str,
) -> Result<Value, InitError> {
    metadata
        .get(field)
        .cloned()
        .ok_or_else(|| InitError::NotFound(field.to_string()))
}
