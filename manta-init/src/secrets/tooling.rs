//! Key generation tools
//!
//! Keys are produced by the system's `ssh-keygen` and `openssl` binaries.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;
use uuid::Uuid;

use crate::error::{InitError, Result};

/// A generated SSH keypair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshKeyPair {
    /// Private key, OpenSSH PEM
    pub private: String,
    /// Public key, `authorized_keys` format
    pub public: String,
    /// MD5 fingerprint, colon-separated hex
    pub fingerprint: String,
}

#[async_trait]
pub trait SecretTooling: Send + Sync {
    /// Generates a keypair at `path` (public half at `<path>.pub`)
    async fn generate_ssh_key(&self, path: &Path) -> Result<SshKeyPair>;

    /// Generates AES-128-CBC key material, returning the tool's raw output
    async fn generate_aes_material(&self) -> Result<String>;
}

/// Shells out to `ssh-keygen` and `openssl`
#[derive(Debug, Default)]
pub struct SystemTooling;

impl SystemTooling {
    pub fn new() -> Self {
        Self
    }
}

async fn run(program: &str, args: &[&str]) -> Result<String> {
    debug!("Running {} {}", program, args.join(" "));

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| InitError::upstream(format!("Failed to execute {}: {}", program, e)))?;

    if !output.status.success() {
        return Err(InitError::upstream(format!(
            "{} exited with {}: {}",
            program,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn public_key_path(path: &Path) -> PathBuf {
    let mut public = path.as_os_str().to_owned();
    public.push(".pub");
    PathBuf::from(public)
}

/// Extracts the fingerprint from `ssh-keygen -l -E md5` output
pub(crate) fn parse_fingerprint(output: &str) -> Option<String> {
    let fingerprint = output.split_whitespace().nth(1)?;
    Some(
        fingerprint
            .strip_prefix("MD5:")
            .unwrap_or(fingerprint)
            .to_string(),
    )
}

#[async_trait]
impl SecretTooling for SystemTooling {
    async fn generate_ssh_key(&self, path: &Path) -> Result<SshKeyPair> {
        let key_path = path.to_string_lossy();
        run(
            "ssh-keygen",
            &["-t", "rsa", "-b", "2048", "-N", "", "-C", "poseidon", "-q", "-f", &key_path],
        )
        .await?;

        let public_path = public_key_path(path);
        let listing = run(
            "ssh-keygen",
            &["-l", "-E", "md5", "-f", &public_path.to_string_lossy()],
        )
        .await?;
        let fingerprint = parse_fingerprint(&listing).ok_or_else(|| {
            InitError::upstream(format!("unexpected ssh-keygen output: {}", listing.trim()))
        })?;

        let private = tokio::fs::read_to_string(path).await?;
        let public = tokio::fs::read_to_string(&public_path).await?;

        Ok(SshKeyPair {
            private,
            public: public.trim_end().to_string(),
            fingerprint,
        })
    }

    async fn generate_aes_material(&self) -> Result<String> {
        let passphrase = Uuid::new_v4().to_string();
        run("openssl", &["enc", "-aes-128-cbc", "-k", &passphrase, "-P"]).await
    }
}
