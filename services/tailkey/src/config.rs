//! Configuration types and loading
//!
//! The YAML file only names where secrets live (pass paths) and the default
//! flags for new keys. Secrets themselves are never written to it.
//!
//! Path precedence: `--config` > `TAILKEY_CONFIG` > `~/.config/tailkey/config.yaml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tailscale_keys::is_valid_tag;
use tracing::debug;

/// Location of the config file relative to the home directory
const DEFAULT_CONFIG_DIR: &str = ".config/tailkey";
const DEFAULT_CONFIG_FILE: &str = "config.yaml";

pub const MIN_EXPIRY_DAYS: u32 = 1;
pub const MAX_EXPIRY_DAYS: u32 = 90;

/// Root configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api_key: ApiKeyConfig,
    #[serde(default)]
    pub oauth: OAuthConfig,
    #[serde(default)]
    pub auth_key_defaults: AuthKeyDefaults,
}

/// Pass path of the long-lived API key. Empty means not configured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyConfig {
    #[serde(default)]
    pub pass_path_api_key: String,
}

/// Pass paths of the OAuth client credentials. Empty means not configured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthConfig {
    #[serde(default)]
    pub pass_path_client_id: String,
    #[serde(default)]
    pub pass_path_client_secret: String,
}

/// Flags applied to new keys unless overridden on the command line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthKeyDefaults {
    pub ephemeral: bool,
    pub reusable: bool,
    pub preauthorized: bool,
    pub expiry_days: u32,
    pub tags: Vec<String>,
}

impl Default for AuthKeyDefaults {
    fn default() -> Self {
        Self {
            ephemeral: false,
            reusable: false,
            preauthorized: true,
            expiry_days: 7,
            tags: Vec::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: ApiKeyConfig {
                pass_path_api_key: "tailscale/api-key".into(),
            },
            oauth: OAuthConfig {
                pass_path_client_id: "tailscale/oauth-client-id".into(),
                pass_path_client_secret: "tailscale/oauth-client-secret".into(),
            },
            auth_key_defaults: AuthKeyDefaults::default(),
        }
    }
}

impl Config {
    /// Load and validate the config file.
    pub fn load(path: &Path) -> common::Result<Self> {
        if !path.exists() {
            return Err(common::Error::Config(format!(
                "config file not found at {}: run with --init to create one",
                path.display()
            )));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;

        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Load the config file, or fall back to defaults when it does not exist.
    /// A file that exists but fails to parse or validate is still an error.
    pub fn load_or_default(path: &Path) -> common::Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Write the config atomically (temp file + rename), owner-only on unix.
    pub async fn save(&self, path: &Path) -> common::Result<()> {
        let yaml = serde_yaml::to_string(self)?;

        let dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        tokio::fs::create_dir_all(dir).await?;

        let tmp_path = dir.join(format!(".config.yaml.tmp.{}", std::process::id()));
        tokio::fs::write(&tmp_path, yaml.as_bytes()).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            tokio::fs::set_permissions(&tmp_path, perms).await?;
        }

        tokio::fs::rename(&tmp_path, path).await?;

        debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.pass_path_api_key.is_empty()
    }

    pub fn has_oauth(&self) -> bool {
        !self.oauth.pass_path_client_id.is_empty() && !self.oauth.pass_path_client_secret.is_empty()
    }

    pub fn validate(&self) -> common::Result<()> {
        if !self.has_api_key() && !self.has_oauth() {
            return Err(common::Error::Config(
                "at least one authentication method must be configured (API key or OAuth)".into(),
            ));
        }

        let days = self.auth_key_defaults.expiry_days;
        if !(MIN_EXPIRY_DAYS..=MAX_EXPIRY_DAYS).contains(&days) {
            return Err(common::Error::Config(format!(
                "auth_key_defaults.expiry_days must be between {MIN_EXPIRY_DAYS} and {MAX_EXPIRY_DAYS}, got {days}"
            )));
        }

        if let Some(tag) = self
            .auth_key_defaults
            .tags
            .iter()
            .find(|tag| !is_valid_tag(tag))
        {
            return Err(common::Error::Config(format!(
                "invalid tag format '{tag}': tags must start with 'tag:'"
            )));
        }

        Ok(())
    }

    /// Resolve the config path. `cli_path` already carries `TAILKEY_CONFIG`
    /// when the flag is absent (clap reads the variable).
    pub fn resolve_path(cli_path: Option<&Path>) -> common::Result<PathBuf> {
        if let Some(p) = cli_path {
            return Ok(p.to_path_buf());
        }
        let home = std::env::var_os("HOME").ok_or_else(|| {
            common::Error::Config("cannot locate config: HOME is not set (use --config)".into())
        })?;
        Ok(Self::default_path_in(Path::new(&home)))
    }

    /// Default config location under a home directory.
    pub fn default_path_in(home: &Path) -> PathBuf {
        home.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_yaml() -> &'static str {
        r#"
api_key:
  pass_path_api_key: tailscale/api-key
oauth:
  pass_path_client_id: tailscale/oauth-client-id
  pass_path_client_secret: tailscale/oauth-client-secret
auth_key_defaults:
  ephemeral: true
  reusable: false
  preauthorized: true
  expiry_days: 30
  tags:
    - tag:ci
    - tag:server
"#
    }

    fn write(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("config.yaml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), valid_yaml());

        let config = Config::load(&path).unwrap();
        assert_eq!(config.api_key.pass_path_api_key, "tailscale/api-key");
        assert!(config.has_oauth());
        assert!(config.auth_key_defaults.ephemeral);
        assert_eq!(config.auth_key_defaults.expiry_days, 30);
        assert_eq!(config.auth_key_defaults.tags, vec!["tag:ci", "tag:server"]);
    }

    #[test]
    fn test_load_missing_file_suggests_init() {
        let err = Config::load(Path::new("/nonexistent/tailkey/config.yaml")).unwrap_err();
        assert!(err.to_string().contains("--init"), "got: {err}");
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.auth_key_defaults.preauthorized);
        assert_eq!(config.auth_key_defaults.expiry_days, 7);
    }

    #[test]
    fn test_load_or_default_still_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "api_key: [unclosed");
        assert!(Config::load_or_default(&path).is_err());
    }

    #[test]
    fn test_missing_defaults_section_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "api_key:\n  pass_path_api_key: ts/key\n");
        let config = Config::load(&path).unwrap();
        assert!(!config.has_oauth());
        assert_eq!(config.auth_key_defaults, AuthKeyDefaults::default());
    }

    #[test]
    fn test_rejects_no_auth_method() {
        let config = Config {
            api_key: ApiKeyConfig::default(),
            oauth: OAuthConfig {
                pass_path_client_id: "tailscale/oauth-client-id".into(),
                pass_path_client_secret: String::new(),
            },
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("at least one authentication method"));
    }

    #[test]
    fn test_rejects_out_of_range_expiry() {
        for days in [0, 91] {
            let mut config = Config::default();
            config.auth_key_defaults.expiry_days = days;
            assert!(config.validate().is_err(), "{days} days must be rejected");
        }
        let mut config = Config::default();
        config.auth_key_defaults.expiry_days = 90;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_malformed_tag() {
        let mut config = Config::default();
        config.auth_key_defaults.tags = vec!["tag:ok".into(), "server".into()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("'server'"), "got: {err}");

        config.auth_key_defaults.tags = vec!["tag:".into()];
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dir/config.yaml");

        let mut config = Config::default();
        config.auth_key_defaults.tags = vec!["tag:container".into()];
        config.save(&path).await.unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().contains(".tmp."))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_resolve_path_prefers_cli() {
        let path = Config::resolve_path(Some(Path::new("/tmp/custom.yaml"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/custom.yaml"));
    }

    #[test]
    fn test_default_path_layout() {
        assert_eq!(
            Config::default_path_in(Path::new("/home/alice")),
            PathBuf::from("/home/alice/.config/tailkey/config.yaml")
        );
    }
}
