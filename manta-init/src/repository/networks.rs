//! Network registry repository
//!
//! Network ownership is a read-modify-write of the owner list. The caller
//! supplies the modification as an [`OwnerCheck`], which either returns the
//! new list or rejects the change with `Conflict`.
//!
//! A name covers the networks called that, the network pools called that,
//! and every network that is a member of one of those pools.

use async_trait::async_trait;
use manta_client::NapiClient;
use manta_core::domain::network::{Network, NetworkPool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{InitError, Result};

/// Computes a network's new owner list from the current one
pub type OwnerCheck = fn(Uuid, &[Uuid]) -> Result<Vec<Uuid>>;

#[async_trait]
pub trait NetworkRegistry: Send + Sync {
    /// Applies `check` to the owners of the named networks, network pools
    /// and the pools' member networks
    ///
    /// Returns `Conflict` when every matching record rejected the change.
    async fn update_owners(&self, network: &str, owner: Uuid, check: OwnerCheck) -> Result<()>;
}

/// An owner list to write back
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum OwnerUpdate {
    Network { uuid: Uuid, owners: Vec<Uuid> },
    Pool { uuid: Uuid, owners: Vec<Uuid> },
}

/// Pool member networks not already in `networks`, in first-seen order
pub(crate) fn missing_members(networks: &[Network], pools: &[NetworkPool]) -> Vec<Uuid> {
    let mut missing: Vec<Uuid> = Vec::new();

    for member in pools.iter().flat_map(|pool| &pool.networks) {
        if !networks.iter().any(|network| network.uuid == *member) && !missing.contains(member) {
            missing.push(*member);
        }
    }

    missing
}

/// Owner lists that `check` changed across networks and pools together
///
/// `Conflict` only when no record changed and at least one rejected.
pub(crate) fn plan_owner_updates(
    networks: &[Network],
    pools: &[NetworkPool],
    owner: Uuid,
    check: OwnerCheck,
) -> Result<Vec<OwnerUpdate>> {
    let mut updates = Vec::new();
    let mut last_conflict = None;

    for network in networks {
        match check(owner, &network.owner_uuids) {
            Ok(owners) => updates.push(OwnerUpdate::Network {
                uuid: network.uuid,
                owners,
            }),
            Err(InitError::Conflict(msg)) => {
                debug!("Network {} ({}) unchanged: {}", network.name, network.uuid, msg);
                last_conflict = Some(msg);
            }
            Err(e) => return Err(e),
        }
    }

    for pool in pools {
        match check(owner, &pool.owner_uuids) {
            Ok(owners) => updates.push(OwnerUpdate::Pool {
                uuid: pool.uuid,
                owners,
            }),
            Err(InitError::Conflict(msg)) => {
                debug!("Network pool {} ({}) unchanged: {}", pool.name, pool.uuid, msg);
                last_conflict = Some(msg);
            }
            Err(e) => return Err(e),
        }
    }

    match (updates.is_empty(), last_conflict) {
        (true, Some(msg)) => Err(InitError::Conflict(msg)),
        _ => Ok(updates),
    }
}

#[async_trait]
impl NetworkRegistry for NapiClient {
    async fn update_owners(&self, network: &str, owner: Uuid, check: OwnerCheck) -> Result<()> {
        let mut networks = self.list_networks(network).await?;
        let pools = self.list_network_pools(network).await?;

        if networks.is_empty() && pools.is_empty() {
            return Err(InitError::Config(format!(
                "no network or network pool named {}",
                network
            )));
        }

        for uuid in missing_members(&networks, &pools) {
            networks.push(self.get_network(uuid).await?);
        }

        for update in plan_owner_updates(&networks, &pools, owner, check)? {
            match update {
                OwnerUpdate::Network { uuid, owners } => {
                    info!("Updating owners of network {} ({})", network, uuid);
                    self.update_network_owners(uuid, &owners).await?;
                }
                OwnerUpdate::Pool { uuid, owners } => {
                    info!("Updating owners of network pool {} ({})", network, uuid);
                    self.update_network_pool_owners(uuid, &owners).await?;
                }
            }
        }

        Ok(())
    }
}
