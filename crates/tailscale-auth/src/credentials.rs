//! Secret lookup: password store first, environment second
//!
//! Long-lived credentials (API key, OAuth client id/secret) live in `pass`
//! when it is installed. The store is reached through the `SecretStore`
//! trait so the resolver can be exercised with an in-memory store.

use std::ffi::OsStr;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;

use common::Secret;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Error, Result};

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Marker `pass show` prints to stderr for unknown entries.
const PASS_NOT_FOUND: &str = "is not in the password store";

/// A local secret store addressed by slash-separated paths.
///
/// Uses `Pin<Box<dyn Future>>` return types so `&dyn SecretStore` works.
pub trait SecretStore: Send + Sync {
    /// Human-readable store name for logs and prompts
    fn name(&self) -> &str;

    /// Read the secret stored at `path`.
    fn get<'a>(
        &'a self,
        path: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Secret<String>>> + Send + 'a>>;

    /// Store `value` at `path`, replacing any existing entry.
    fn insert<'a>(
        &'a self,
        path: &'a str,
        value: &'a Secret<String>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// The `pass` password manager, driven as a subprocess.
#[derive(Debug, Clone)]
pub struct PassStore {
    program: PathBuf,
}

impl PassStore {
    /// Locate `pass` on `PATH`. Returns `None` when it is not installed.
    pub fn detect() -> Option<Self> {
        Self::detect_in(&std::env::var_os("PATH")?)
    }

    /// Locate an executable `pass` in a `PATH`-style directory list.
    pub fn detect_in(search_path: &OsStr) -> Option<Self> {
        std::env::split_paths(search_path)
            .map(|dir| dir.join("pass"))
            .find(|candidate| is_executable(candidate))
            .map(Self::with_program)
    }

    /// Use a specific `pass` executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    async fn show(&self, path: &str) -> Result<Secret<String>> {
        let output = Command::new(&self.program)
            .arg("show")
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::Store(format!("failed to run {}: {e}", self.program.display())))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if stderr.contains(PASS_NOT_FOUND) {
                return Err(Error::Store(format!("secret not found at '{path}'")));
            }
            return Err(Error::Store(format!(
                "failed to retrieve secret from pass: {stderr}"
            )));
        }

        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if value.is_empty() {
            return Err(Error::Store(format!("secret at '{path}' is empty")));
        }
        Ok(Secret::new(value))
    }

    async fn store(&self, path: &str, value: &Secret<String>) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(["insert", "-m", "-f", path])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Store(format!("failed to run {}: {e}", self.program.display())))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(value.expose().as_bytes())
                .await
                .map_err(|e| Error::Store(format!("writing secret to pass: {e}")))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| Error::Store(format!("waiting for pass: {e}")))?;
        if !output.status.success() {
            return Err(Error::Store(format!(
                "failed to insert secret into pass: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        debug!(path, "secret stored in pass");
        Ok(())
    }
}

impl SecretStore for PassStore {
    fn name(&self) -> &str {
        "pass"
    }

    fn get<'a>(
        &'a self,
        path: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Secret<String>>> + Send + 'a>> {
        Box::pin(self.show(path))
    }

    fn insert<'a>(
        &'a self,
        path: &'a str,
        value: &'a Secret<String>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(self.store(path, value))
    }
}

/// Resolve a secret from `store`, falling back to the process environment.
pub async fn resolve_secret(
    store: Option<&dyn SecretStore>,
    path: &str,
    env_var: &str,
) -> Result<Secret<String>> {
    resolve_secret_with(store, path, env_var, |name| std::env::var(name).ok()).await
}

/// Resolve a secret with an explicit environment lookup.
///
/// Store failures of any kind fall through to the environment and are only
/// logged at debug. An empty environment value counts as unset.
pub async fn resolve_secret_with<F>(
    store: Option<&dyn SecretStore>,
    path: &str,
    env_var: &str,
    lookup_env: F,
) -> Result<Secret<String>>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(store) = store
        && !path.is_empty()
    {
        match store.get(path).await {
            Ok(secret) => {
                debug!(store = store.name(), path, "secret resolved from store");
                return Ok(secret);
            }
            Err(e) => debug!(store = store.name(), path, error = %e, "store lookup failed, trying environment"),
        }
    }

    match lookup_env(env_var).filter(|value| !value.is_empty()) {
        Some(value) => {
            debug!(env_var, "secret resolved from environment");
            Ok(Secret::new(value))
        }
        None if store.is_some() => Err(Error::SecretNotFound {
            path: path.to_string(),
            env_var: env_var.to_string(),
        }),
        None => Err(Error::StoreUnavailable {
            env_var: env_var.to_string(),
        }),
    }
}
