//! Idempotent reconciliation primitives
//!
//! Every step that touches a registry converges through one of two
//! primitives:
//! - [`ensure`]: look a resource up, create it only on `NotFound`.
//! - [`update_field_if_different`]: write a field only when it differs.
//!
//! Both report whether a write happened so callers and tests can tell a
//! converged run from one that changed something.

use std::fmt::Debug;
use std::future::Future;

use tracing::{debug, error, info};
use uuid::Uuid;

use crate::error::{InitError, Result};

/// Outcome of [`ensure`]
#[derive(Debug, Clone, PartialEq)]
pub enum Ensured<T> {
    /// The resource already existed
    Found(T),
    /// The resource was created by this call
    Created(T),
}

impl<T> Ensured<T> {
    pub fn was_created(&self) -> bool {
        matches!(self, Ensured::Created(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Ensured::Found(value) | Ensured::Created(value) => value,
        }
    }
}

/// Get-or-create
///
/// Runs `lookup`; on `NotFound` runs `create`. Any other lookup error is
/// returned untouched.
pub async fn ensure<T, L, LF, C, CF>(
    kind: &str,
    key: &str,
    lookup: L,
    create: C,
) -> Result<Ensured<T>>
where
    L: FnOnce() -> LF,
    LF: Future<Output = Result<T>>,
    C: FnOnce() -> CF,
    CF: Future<Output = Result<T>>,
{
    match lookup().await {
        Ok(found) => {
            info!("{} {} already exists", kind, key);
            Ok(Ensured::Found(found))
        }
        Err(e) if e.is_not_found() => {
            info!("Creating {} {}", kind, key);
            match create().await {
                Ok(created) => {
                    info!("Created {} {}", kind, key);
                    Ok(Ensured::Created(created))
                }
                Err(e) => {
                    error!("Failed to create {} {}: {}", kind, key, e);
                    Err(e)
                }
            }
        }
        Err(e) => {
            error!("Failed to look up {} {}: {}", kind, key, e);
            Err(e)
        }
    }
}

/// Update-if-different
///
/// A missing current value counts as different. Returns `true` when
/// `write` ran and succeeded.
pub async fn update_field_if_different<V, W, WF>(
    kind: &str,
    key: &str,
    field: &str,
    current: Option<&V>,
    desired: &V,
    write: W,
) -> Result<bool>
where
    V: PartialEq + Debug + ?Sized,
    W: FnOnce() -> WF,
    WF: Future<Output = Result<()>>,
{
    if current == Some(desired) {
        debug!("{} {} {} is already {:?}", kind, key, field, desired);
        return Ok(false);
    }

    info!(
        "Updating {} {} {}: {:?} -> {:?}",
        kind, key, field, current, desired
    );
    write().await.map_err(|e| {
        error!("Failed to update {} {} {}: {}", kind, key, field, e);
        e
    })?;

    Ok(true)
}

/// Owner check for network authorization
///
/// Rejects an owner that is already present with `Conflict`; otherwise
/// returns the list with the owner appended.
pub fn add_owner(owner: Uuid, owners: &[Uuid]) -> Result<Vec<Uuid>> {
    if owners.contains(&owner) {
        return Err(InitError::Conflict(format!(
            "user {} is already an owner of this network",
            owner
        )));
    }

    let mut updated = owners.to_vec();
    updated.push(owner);
    Ok(updated)
}
