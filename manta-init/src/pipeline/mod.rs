//! Provisioning pipeline
//!
//! A fixed, ordered list of named steps run against one context. The first
//! failing step stops the run; earlier side effects are left in place and a
//! re-run converges from wherever the last one stopped.

pub mod steps;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::context::PipelineContext;
use crate::error::{InitError, Result};
use crate::repository::Connector;

/// One named unit of provisioning work
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, ctx: &mut PipelineContext) -> Result<()>;
}

/// The step that stopped a run and why
#[derive(Debug, Error)]
#[error("step {step} failed: {source}")]
pub struct PipelineFailure {
    pub step: &'static str,
    #[source]
    pub source: InitError,
}

/// An ordered list of steps
pub struct Pipeline {
    steps: Vec<Box<dyn Step>>,
}

impl Pipeline {
    pub fn new(steps: Vec<Box<dyn Step>>) -> Self {
        Self { steps }
    }

    /// The full provisioning sequence
    pub fn provisioning(connector: Arc<dyn Connector>) -> Self {
        Self::new(steps::provisioning_steps(connector))
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    /// Runs every step in order, stopping at the first failure
    pub async fn run(&self, ctx: &mut PipelineContext) -> std::result::Result<(), PipelineFailure> {
        let total = self.steps.len();
        debug!("Pipeline steps: {}", self.step_names().join(", "));

        for (idx, step) in self.steps.iter().enumerate() {
            info!("Executing step {}/{}: {}", idx + 1, total, step.name());

            if let Err(source) = step.run(ctx).await {
                error!("Step '{}' failed: {}", step.name(), source);
                return Err(PipelineFailure {
                    step: step.name(),
                    source,
                });
            }

            debug!("Step '{}' completed successfully", step.name());
        }

        info!("All {} steps completed", total);
        Ok(())
    }
}
