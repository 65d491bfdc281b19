//! Network domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A network or network pool and the users allowed to provision on it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub uuid: Uuid,
    pub name: String,
    /// Empty means the network is not restricted to particular owners
    #[serde(default)]
    pub owner_uuids: Vec<Uuid>,
}

/// A named group of networks that is provisioned on as one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkPool {
    pub uuid: Uuid,
    pub name: String,
    #[serde(default)]
    pub owner_uuids: Vec<Uuid>,
    /// Member network uuids
    #[serde(default)]
    pub networks: Vec<Uuid>,
}
