//! Operator account and its authorizations

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use manta_core::dto::user::{GroupChange, NewUser, UserChanges};
use tracing::{error, info};

use crate::context::PipelineContext;
use crate::error::Result;
use crate::pipeline::Step;
use crate::reconcile::{add_owner, ensure, update_field_if_different};

/// Login of the operator account that owns the deployment
pub const OPERATOR_LOGIN: &str = "poseidon";

const OPERATORS_GROUP_DN: &str = "cn=operators, ou=groups, o=smartdc";

/// Networks the operator must be allowed to provision on
const ADMIN_NETWORKS: [&str; 2] = ["manta", "admin"];

pub struct GetOrCreateOperator;

#[async_trait]
impl Step for GetOrCreateOperator {
    fn name(&self) -> &'static str {
        "get_or_create_operator"
    }

    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        let identity = Arc::clone(&ctx.clients()?.identity);
        let new_user = NewUser {
            login: OPERATOR_LOGIN.to_string(),
            userpassword: ctx.config.operator_password.clone(),
            email: ctx.options.email.clone(),
        };

        let operator = ensure(
            "user",
            OPERATOR_LOGIN,
            || identity.get_user(OPERATOR_LOGIN),
            || identity.add_user(&new_user),
        )
        .await?
        .into_inner();

        info!("Operator {} has uuid {}", operator.login, operator.uuid);
        ctx.set_operator(operator);
        Ok(())
    }
}

pub struct UpdateOperatorEmail;

#[async_trait]
impl Step for UpdateOperatorEmail {
    fn name(&self) -> &'static str {
        "update_operator_email"
    }

    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        let identity = Arc::clone(&ctx.clients()?.identity);
        let operator = ctx.operator()?.clone();
        let email = ctx.options.email.clone();
        let changes = UserChanges {
            email: Some(email.clone()),
        };

        update_field_if_different(
            "user",
            &operator.login,
            "email",
            Some(operator.email.as_str()),
            email.as_str(),
            || identity.update_user(&operator.login, &changes),
        )
        .await?;

        ctx.operator_mut()?.email = email;
        Ok(())
    }
}

pub struct AddOperatorToOperatorsGroup;

#[async_trait]
impl Step for AddOperatorToOperatorsGroup {
    fn name(&self) -> &'static str {
        "add_operator_to_operators_group"
    }

    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        let identity = Arc::clone(&ctx.clients()?.identity);
        let operator = ctx.operator()?;

        info!("Adding {} to {}", operator.dn, OPERATORS_GROUP_DN);
        match identity
            .modify_group(OPERATORS_GROUP_DN, &GroupChange::add_member(&operator.dn))
            .await
        {
            Ok(()) => info!("Added {} to operators group", operator.login),
            Err(e) if e.is_conflict() => {
                info!("{} is already in the operators group", operator.login)
            }
            Err(e) => {
                error!("Failed to add {} to operators group: {}", operator.login, e);
                return Err(e);
            }
        }
        Ok(())
    }
}

/// Authorizes the operator on the admin networks, all at once
pub struct EnableAdminProvisioning;

#[async_trait]
impl Step for EnableAdminProvisioning {
    fn name(&self) -> &'static str {
        "enable_admin_provisioning"
    }

    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        let networks = Arc::clone(&ctx.clients()?.networks);
        let owner = ctx.operator()?.uuid;

        let results = join_all(
            ADMIN_NETWORKS
                .iter()
                .map(|network| networks.update_owners(network, owner, add_owner)),
        )
        .await;

        let mut first_error = None;
        for (network, result) in ADMIN_NETWORKS.iter().zip(results) {
            match result {
                Ok(()) => info!("Operator may now provision on network {}", network),
                Err(e) if e.is_conflict() => {
                    info!("Operator already owns network {}", network)
                }
                Err(e) => {
                    error!("Failed to update owners of network {}: {}", network, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
