//! tailkey
//!
//! Command-line tool that:
//! 1. Resolves a Tailscale API key or OAuth client from pass or the environment
//! 2. Exchanges OAuth client credentials for a short-lived token when needed
//! 3. Creates an auth key with the requested capabilities
//! 4. Prints the key (or JSON metadata) to stdout
//!
//! Logs go to stderr so stdout can be piped straight into `tailscale up`.

mod config;
mod error;
mod generate;
mod output;
mod wizard;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use api_client::HttpConfig;
use clap::Parser;
use tailscale_auth::{DEFAULT_API_BASE, PassStore, SecretStore};
use tailscale_keys::KeysClient;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::error::Error;
use crate::generate::{AuthMode, Endpoints, Overrides};

#[derive(Parser, Debug)]
#[command(name = "tailkey")]
#[command(version, about = "Generate Tailscale auth keys using an API key or OAuth client credentials")]
struct Cli {
    /// Config file (defaults to ~/.config/tailkey/config.yaml)
    #[arg(long, env = "TAILKEY_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Show API interactions and debug info on stderr
    #[arg(short, long)]
    verbose: bool,

    /// Run the interactive configuration wizard
    #[arg(long, conflicts_with_all = ["list", "delete"])]
    init: bool,

    /// Use OAuth client credentials instead of an API key
    #[arg(long)]
    use_oauth: bool,

    /// Print JSON with key metadata instead of the bare key
    #[arg(long)]
    json: bool,

    /// Device is removed automatically when it goes offline
    #[arg(short, long)]
    ephemeral: bool,

    /// Key can authenticate multiple devices
    #[arg(short, long)]
    reusable: bool,

    /// Pre-authorize devices (skip manual approval)
    #[arg(short, long)]
    preauthorized: bool,

    /// Require manual approval (overrides --preauthorized)
    #[arg(long)]
    no_preauthorized: bool,

    /// Key expiry in days (1-90, 0 for the config default)
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u32).range(0..=90))]
    expiry_days: u32,

    /// Comma-separated tags (overrides config, required for OAuth)
    #[arg(long, value_name = "LIST")]
    tags: Option<String>,

    /// Description stored with the key
    #[arg(long, default_value = generate::DEFAULT_DESCRIPTION)]
    description: String,

    /// List existing auth keys
    #[arg(long, conflicts_with = "delete")]
    list: bool,

    /// Delete (revoke) the auth key with this ID
    #[arg(long, value_name = "ID")]
    delete: Option<String>,

    /// Tailscale API base URL
    #[arg(long, env = "TAILKEY_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            ephemeral: self.ephemeral,
            reusable: self.reusable,
            preauthorized: self.preauthorized,
            no_preauthorized: self.no_preauthorized,
            expiry_days: self.expiry_days,
            tags: self.tags.clone(),
            description: self.description.clone(),
        }
    }

    fn auth_mode(&self) -> AuthMode {
        if self.use_oauth {
            AuthMode::OAuth
        } else {
            AuthMode::ApiKey
        }
    }
}

/// Tracing to stderr. `--verbose` forces debug; otherwise LOG_LEVEL, then
/// RUST_LOG, then `warn`. LOG_FORMAT=json selects JSON lines.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("LOG_LEVEL")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print(text: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes()).context("failed to write to stdout")?;
    stdout.flush().context("failed to write to stdout")
}

/// Resolve credentials from the store or environment and build a keys client.
async fn open_client(
    mode: AuthMode,
    config: &Config,
    store: Option<&dyn SecretStore>,
    endpoints: &Endpoints,
) -> Result<KeysClient> {
    let credentials =
        generate::resolve_credentials(mode, config, store, |name| std::env::var(name).ok()).await?;
    Ok(generate::connect(credentials, endpoints, &HttpConfig::default()).await?)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = Config::resolve_path(cli.config.as_deref())?;

    let pass = PassStore::detect();
    match &pass {
        Some(pass) => debug!(program = %pass.program().display(), "pass found"),
        None => debug!("pass not found on PATH, secrets come from the environment"),
    }
    let store = pass.as_ref().map(|pass| pass as &dyn SecretStore);

    if cli.init {
        wizard::run_wizard(std::io::stdin().lock(), std::io::stdout(), store, &config_path).await?;
        return Ok(());
    }

    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let mode = cli.auth_mode();
    info!(?mode, api_base = %cli.api_base, "starting");

    let endpoints = Endpoints::from_base(&cli.api_base);

    if cli.list {
        let keys = open_client(mode, &config, store, &endpoints)
            .await?
            .list_auth_keys()
            .await
            .map_err(|e| Error::KeyManagement(e.to_string()))?;
        let rendered = if cli.json {
            output::render_key_list_json(&keys)?
        } else {
            output::render_key_list(&keys)
        };
        return print(&rendered);
    }

    if let Some(id) = &cli.delete {
        open_client(mode, &config, store, &endpoints)
            .await?
            .delete_auth_key(id)
            .await
            .map_err(|e| Error::KeyManagement(e.to_string()))?;
        return print(&format!("deleted auth key {}\n", id.trim()));
    }

    let request = generate::build_request(&config.auth_key_defaults, &cli.overrides(), mode);
    generate::ensure_tags(mode, &request)?;
    let client = open_client(mode, &config, store, &endpoints).await?;
    let record = generate::create_key(&client, &request).await?;

    if cli.json {
        return print(&output::render_json(&record)?);
    }

    print(&output::render_plain(&record))?;
    if cfg!(target_os = "macos") {
        match output::copy_to_clipboard(output::CLIPBOARD_PROGRAM, &record.key).await {
            Ok(()) => info!("auth key copied to clipboard"),
            Err(e) => warn!(error = %e, "failed to copy auth key to clipboard"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn short_flags_map_to_key_options() {
        let cli = Cli::try_parse_from(["tailkey", "-e", "-r", "-p", "--no-preauthorized", "--tags", "ci"]).unwrap();
        let overrides = cli.overrides();
        assert!(overrides.ephemeral);
        assert!(overrides.reusable);
        assert!(overrides.preauthorized);
        assert!(overrides.no_preauthorized);
        assert_eq!(overrides.tags.as_deref(), Some("ci"));
        assert_eq!(overrides.description, "Generated by tailkey");
        assert_eq!(cli.auth_mode(), AuthMode::ApiKey);
    }

    #[test]
    fn expiry_days_is_range_checked() {
        assert!(Cli::try_parse_from(["tailkey", "--expiry-days", "90"]).is_ok());
        assert!(Cli::try_parse_from(["tailkey", "--expiry-days", "91"]).is_err());
    }

    #[test]
    fn list_and_delete_are_exclusive() {
        assert!(Cli::try_parse_from(["tailkey", "--list", "--delete", "k1"]).is_err());
        let cli = Cli::try_parse_from(["tailkey", "--use-oauth", "--delete", "k1"]).unwrap();
        assert_eq!(cli.delete.as_deref(), Some("k1"));
        assert_eq!(cli.auth_mode(), AuthMode::OAuth);
    }
}
