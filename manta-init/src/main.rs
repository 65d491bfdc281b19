//! manta-init
//!
//! Bootstraps a Manta deployment against a Triton datacenter's registries.
//!
//! Architecture:
//! - Configuration: deployment config file plus command-line options
//! - Repositories: trait views of the identity, service, image, and
//!   network registries, backed by `manta-client`
//! - Reconciliation: get-or-create and update-if-different primitives
//! - Images: discovery of the newest image per service and import into the
//!   local registry
//! - Secrets: operator SSH key and web API AES key
//! - Pipeline: the fixed sequence of steps tying the above together
//!
//! Every step converges rather than creates, so a run that failed part way
//! is resumed by running the tool again.

mod config;
mod context;
mod error;
mod images;
mod pipeline;
mod reconcile;
mod repository;
mod secrets;
mod templates;

#[cfg(test)]
mod testing;

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{
    DEFAULT_CONCURRENT_DOWNLOADS, DEFAULT_CONFIG_PATH, DeploymentConfig, DeploymentSize,
    MAX_CONCURRENT_DOWNLOADS, Options, validate_channel,
};
use crate::context::PipelineContext;
use crate::error::InitError;
use crate::pipeline::Pipeline;
use crate::repository::HttpConnector;

const DEFAULT_LOG_FILE: &str = "/var/log/manta-init.log";

#[derive(Parser, Debug)]
#[command(name = "manta-init")]
#[command(about = "Initialize a Manta deployment", long_about = None)]
struct Cli {
    /// Email address for the operator account
    #[arg(short = 'e', long)]
    email: String,

    /// Only use images whose version contains this substring
    #[arg(short = 'B', long, default_value = "")]
    branch: String,

    /// Update channel to find images in (default: the platform's channel)
    #[arg(short = 'C', long, value_parser = validate_channel)]
    channel: Option<String>,

    /// Number of images to download at once
    #[arg(
        short = 'c',
        long = "concurrent-downloads",
        visible_alias = "concurrent_downloads",
        default_value_t = DEFAULT_CONCURRENT_DOWNLOADS as u8,
        value_parser = clap::value_parser!(u8).range(1..=MAX_CONCURRENT_DOWNLOADS as i64)
    )]
    concurrent_downloads: u8,

    /// Log file, or "stdout" to log to the console
    #[arg(short = 'l', long = "log-file", visible_alias = "log_file", default_value = DEFAULT_LOG_FILE)]
    log_file: String,

    /// Use only images already in the local image registry
    #[arg(short = 'n', long = "no-download", visible_alias = "no_download")]
    no_download: bool,

    /// Deployment size
    #[arg(short = 's', long, value_enum)]
    size: Option<DeploymentSize>,

    /// Deployment config file
    #[arg(long, env = "MANTA_INIT_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

impl Cli {
    fn options(&self) -> Options {
        Options {
            branch: self.branch.clone(),
            channel: self.channel.clone(),
            concurrent_downloads: usize::from(self.concurrent_downloads),
            no_download: self.no_download,
            size: self.size,
            ..Options::new(self.email.clone())
        }
    }
}

/// Sends logs to `log_file` (appending, no colors) or to stdout
fn init_logging(log_file: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "manta_init=debug,manta_client=debug".into());

    if log_file == "stdout" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
        return Ok(());
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Failed to open log file {}", log_file))?;
    eprintln!("logs at {}", log_file);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .init();
    Ok(())
}

/// Exit status for a failed run: usage errors share clap's code
fn failure_status(err: &InitError) -> u8 {
    match err {
        InitError::Usage(_) => 2,
        _ => 1,
    }
}

fn report(message: impl std::fmt::Display) {
    eprintln!("{} {}", "Error:".red().bold(), message);
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli.log_file) {
        report(format!("{:#}", e));
        return ExitCode::FAILURE;
    }

    info!("Starting manta-init");

    let config = match DeploymentConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            report(format!("{:#}", e));
            return ExitCode::FAILURE;
        }
    };

    let pipeline = Pipeline::provisioning(Arc::new(HttpConnector::new()));
    let mut ctx = PipelineContext::new(cli.options(), config);

    match pipeline.run(&mut ctx).await {
        Ok(()) => {
            info!("manta-init completed successfully");
            ExitCode::SUCCESS
        }
        Err(failure) => {
            error!("manta-init failed: {}", failure);
            report(&failure.source);
            ExitCode::from(failure_status(&failure.source))
        }
    }
}
