//! Identity directory DTOs

use serde::{Deserialize, Serialize};

/// Request to create a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub login: String,
    pub userpassword: String,
    pub email: String,
}

/// Partial update of a user record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Request to attach an SSH public key to a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewKey {
    pub name: String,
    pub openssh: String,
}

/// Kind of modification applied to a group entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOperation {
    Add,
    Delete,
}

/// Member attribute of a group entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    pub uniquemember: String,
}

/// A single modification of a group entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupChange {
    #[serde(rename = "type")]
    pub operation: ChangeOperation,
    pub modification: GroupMember,
}

impl GroupChange {
    /// Add the entry identified by `dn` as a member of the group
    pub fn add_member(dn: impl Into<String>) -> Self {
        Self {
            operation: ChangeOperation::Add,
            modification: GroupMember {
                uniquemember: dn.into(),
            },
        }
    }
}
