//! Operator identity domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user account in the identity directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uuid: Uuid,
    pub login: String,
    #[serde(default)]
    pub email: String,
    /// Distinguished name used for group membership
    pub dn: String,
}
