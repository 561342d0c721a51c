//! Interactive configuration wizard (`--init`)
//!
//! Reads answers line by line and writes prompts to any `BufRead`/`Write`
//! pair, so the whole dialogue can be driven from a byte buffer in tests.
//! An empty answer always takes the default shown in brackets.

use std::io::{BufRead, Write};
use std::path::Path;

use api_client::{API_KEY_SETTINGS_URL, OAUTH_CLIENTS_KB_URL};
use common::Secret;
use tailscale_auth::{DEFAULT_OAUTH_TAG, SecretStore};
use tailscale_keys::parse_tags;
use tracing::debug;

use crate::config::{Config, MAX_EXPIRY_DAYS, MIN_EXPIRY_DAYS};
use crate::error::{Error, Result};

const DEFAULT_EXPIRY_DAYS: u32 = 7;

struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    fn say(&mut self, text: &str) -> std::io::Result<()> {
        writeln!(self.output, "{text}")
    }

    fn ask(&mut self, prompt: &str) -> std::io::Result<String> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim().to_string())
    }

    fn ask_default(&mut self, prompt: &str, default: &str) -> std::io::Result<String> {
        let answer = self.ask(&format!("{prompt} [{default}]: "))?;
        Ok(if answer.is_empty() {
            default.to_string()
        } else {
            answer
        })
    }

    fn confirm(&mut self, prompt: &str, default_yes: bool) -> std::io::Result<bool> {
        let choices = if default_yes { "Y/n" } else { "y/N" };
        let answer = self.ask(&format!("{prompt} [{choices}]: "))?.to_ascii_lowercase();
        Ok(match answer.as_str() {
            "" => default_yes,
            "y" | "yes" => true,
            _ => false,
        })
    }

    /// Store a secret, reporting (not failing on) store errors.
    async fn store_secret(
        &mut self,
        store: &dyn SecretStore,
        path: &str,
        label: &str,
        value: String,
    ) -> std::io::Result<()> {
        let secret = Secret::new(value);
        match store.insert(path, &secret).await {
            Ok(()) => self.say(&format!("{label} stored in {} at '{path}'", store.name())),
            Err(e) => self.say(&format!("Warning: failed to store {label} in {}: {e}", store.name())),
        }
    }
}

/// Run the wizard and save the resulting config to `config_path`.
///
/// Returns `None` when the user declines to overwrite or to save.
pub async fn run_wizard<R: BufRead, W: Write>(
    input: R,
    output: W,
    store: Option<&dyn SecretStore>,
    config_path: &Path,
) -> Result<Option<Config>> {
    let mut p = Prompter { input, output };

    p.say("tailkey configuration wizard")?;
    p.say("Sets up how tailkey authenticates to Tailscale and the defaults for new auth keys.")?;
    p.say("")?;

    if config_path.exists() {
        p.say(&format!("Config file already exists at: {}", config_path.display()))?;
        if !p.confirm("Do you want to overwrite it?", false)? {
            p.say("Configuration wizard cancelled.")?;
            return Ok(None);
        }
        p.say("")?;
    }

    p.say("Step 1: Authentication method")?;
    p.say("  1. API key (simpler, tags optional; keys expire after 90 days)")?;
    p.say("  2. OAuth client (requires tags)")?;
    p.say(&format!("Generate API keys at: {API_KEY_SETTINGS_URL}"))?;
    let use_api_key = p.confirm("Do you want to use API key authentication?", true)?;
    p.say("")?;

    p.say("Step 2: Credential storage")?;
    let store = match store {
        Some(store) => {
            p.say(&format!("{} is installed and available", store.name()))?;
            if p.confirm(&format!("Do you want to store credentials in {}?", store.name()), true)? {
                Some(store)
            } else {
                None
            }
        }
        None => {
            p.say("pass (https://www.passwordstore.org/) is not installed; credentials will be read from the environment.")?;
            None
        }
    };
    p.say("")?;

    let mut config = Config::default();

    p.say("Step 3: Credentials")?;
    if use_api_key {
        match store {
            Some(store) => {
                config.api_key.pass_path_api_key =
                    p.ask_default("Enter the pass path for the API key", &config.api_key.pass_path_api_key)?;
                if p.confirm("Do you want to store the API key in pass now?", true)? {
                    let key = p.ask("Enter API key: ")?;
                    let path = config.api_key.pass_path_api_key.clone();
                    p.store_secret(store, &path, "API key", key).await?;
                }
            }
            None => {
                p.say("Remember to set this environment variable:")?;
                p.say("  export TS_API_KEY='your-api-key'")?;
            }
        }
    } else {
        p.say("Create an OAuth client with the auth_keys (or devices:write) scope.")?;
        p.say(&format!("See: {OAUTH_CLIENTS_KB_URL}"))?;
        match store {
            Some(store) => {
                config.oauth.pass_path_client_id = p.ask_default(
                    "Enter the pass path for the OAuth client ID",
                    &config.oauth.pass_path_client_id,
                )?;
                config.oauth.pass_path_client_secret = p.ask_default(
                    "Enter the pass path for the OAuth client secret",
                    &config.oauth.pass_path_client_secret,
                )?;
                if p.confirm("Do you want to store the credentials in pass now?", true)? {
                    let client_id = p.ask("Enter OAuth client ID: ")?;
                    let client_secret = p.ask("Enter OAuth client secret: ")?;
                    let id_path = config.oauth.pass_path_client_id.clone();
                    let secret_path = config.oauth.pass_path_client_secret.clone();
                    p.store_secret(store, &id_path, "client ID", client_id).await?;
                    p.store_secret(store, &secret_path, "client secret", client_secret)
                        .await?;
                }
            }
            None => {
                p.say("Remember to set these environment variables:")?;
                p.say("  export TS_OAUTH_CLIENT_ID='your-client-id'")?;
                p.say("  export TS_OAUTH_CLIENT_SECRET='your-client-secret'")?;
            }
        }
    }
    p.say("")?;

    p.say("Step 4: Auth key defaults")?;
    let defaults = &mut config.auth_key_defaults;
    defaults.ephemeral =
        p.confirm("Make keys ephemeral by default (device removed when offline)?", false)?;
    defaults.reusable =
        p.confirm("Make keys reusable by default (can authenticate multiple devices)?", false)?;
    defaults.preauthorized =
        p.confirm("Pre-authorize devices by default (skip manual approval)?", true)?;

    let expiry = p.ask_default(
        &format!("Default key expiry in days ({MIN_EXPIRY_DAYS}-{MAX_EXPIRY_DAYS})"),
        &DEFAULT_EXPIRY_DAYS.to_string(),
    )?;
    defaults.expiry_days = match expiry.parse::<u32>() {
        Ok(days) if (MIN_EXPIRY_DAYS..=MAX_EXPIRY_DAYS).contains(&days) => days,
        _ => {
            p.say(&format!("Invalid expiry, using default: {DEFAULT_EXPIRY_DAYS} days"))?;
            DEFAULT_EXPIRY_DAYS
        }
    };
    p.say("")?;

    p.say("Step 5: Tags")?;
    if use_api_key {
        defaults.tags = if p.confirm("Do you want to configure default tags?", false)? {
            parse_tags(&p.ask("Enter default tags (comma-separated): ")?)
        } else {
            Vec::new()
        };
    } else {
        p.say("Tailscale requires at least one tag on OAuth-created keys, and each tag must")?;
        p.say("already be defined in the tailnet policy (https://tailscale.com/kb/1068/acl-tags).")?;
        defaults.tags = parse_tags(&p.ask("Enter default tags (comma-separated): ")?);
        if defaults.tags.is_empty() {
            p.say(&format!("No tags specified. Using default: {DEFAULT_OAUTH_TAG}"))?;
            defaults.tags = vec![DEFAULT_OAUTH_TAG.to_string()];
        }
    }
    if !defaults.tags.is_empty() {
        p.say(&format!("Tags configured: {}", defaults.tags.join(", ")))?;
    }
    p.say("")?;

    p.say("Step 6: Save configuration")?;
    p.say(&format!("Configuration will be saved to: {}", config_path.display()))?;
    if !p.confirm("Save configuration?", true)? {
        p.say("Configuration wizard cancelled.")?;
        return Ok(None);
    }

    config
        .validate()
        .map_err(|e| Error::SaveConfig(e.to_string()))?;
    config
        .save(config_path)
        .await
        .map_err(|e| Error::SaveConfig(e.to_string()))?;
    debug!(path = %config_path.display(), "wizard saved configuration");

    p.say("Configuration saved.")?;
    if use_api_key {
        p.say("Run 'tailkey' to generate your first auth key.")?;
    } else {
        p.say("Verify the tailnet policy defines the configured tags, then run 'tailkey --use-oauth'.")?;
    }

    Ok(Some(config))
}
