//! Identity directory repository
//!
//! Operator account, SSH keys, and group membership.

use async_trait::async_trait;
use manta_client::UfdsClient;
use manta_core::domain::user::User;
use manta_core::dto::user::{GroupChange, NewKey, NewUser, UserChanges};

use crate::error::Result;

#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Looks up a user by login; `NotFound` when absent
    async fn get_user(&self, login: &str) -> Result<User>;

    async fn add_user(&self, user: &NewUser) -> Result<User>;

    async fn update_user(&self, login: &str, changes: &UserChanges) -> Result<()>;

    /// Registers a public key on a user
    async fn add_key(&self, login: &str, key: &NewKey) -> Result<()>;

    /// Modifies a group; `Conflict` when the change is already in place
    async fn modify_group(&self, group_dn: &str, change: &GroupChange) -> Result<()>;
}

#[async_trait]
impl IdentityDirectory for UfdsClient {
    async fn get_user(&self, login: &str) -> Result<User> {
        Ok(UfdsClient::get_user(self, login).await?)
    }

    async fn add_user(&self, user: &NewUser) -> Result<User> {
        Ok(UfdsClient::add_user(self, user).await?)
    }

    async fn update_user(&self, login: &str, changes: &UserChanges) -> Result<()> {
        Ok(UfdsClient::update_user(self, login, changes).await?)
    }

    async fn add_key(&self, login: &str, key: &NewKey) -> Result<()> {
        Ok(UfdsClient::add_key(self, login, key).await?)
    }

    async fn modify_group(&self, group_dn: &str, change: &GroupChange) -> Result<()> {
        Ok(UfdsClient::modify_group(self, group_dn, change).await?)
    }
}
