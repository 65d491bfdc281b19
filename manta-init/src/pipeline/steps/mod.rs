//! The provisioning steps, in the order they run

mod application;
mod images;
mod operator;
mod services;
mod setup;

use std::sync::Arc;

use crate::pipeline::Step;
use crate::repository::Connector;

pub use application::{
    AddAdminKey, AddApplicationConfigs, CheckApplicationVersion, CreateApplication,
    DetermineDefaultChannel, GetExistingApplication,
};
pub use images::{FindLatestImages, ImportImageOrigins, ImportImages};
pub use operator::{
    AddOperatorToOperatorsGroup, EnableAdminProvisioning, GetOrCreateOperator, UpdateOperatorEmail,
};
pub use services::{AddWebapiAesKey, CreateServices, UpdateServiceImages};
pub use setup::{EnsureFullMode, FiniClients, InitClients, VerifyInput};

pub fn provisioning_steps(connector: Arc<dyn Connector>) -> Vec<Box<dyn Step>> {
    vec![
        Box::new(VerifyInput),
        Box::new(InitClients::new(connector)),
        Box::new(EnsureFullMode),
        Box::new(GetOrCreateOperator),
        Box::new(UpdateOperatorEmail),
        Box::new(AddOperatorToOperatorsGroup),
        Box::new(EnableAdminProvisioning),
        Box::new(GetExistingApplication),
        Box::new(CheckApplicationVersion),
        Box::new(CreateApplication),
        Box::new(AddAdminKey),
        Box::new(AddApplicationConfigs),
        Box::new(DetermineDefaultChannel),
        Box::new(FindLatestImages),
        Box::new(ImportImageOrigins),
        Box::new(ImportImages),
        Box::new(CreateServices),
        Box::new(UpdateServiceImages),
        Box::new(AddWebapiAesKey),
        Box::new(FiniClients),
    ]
}
