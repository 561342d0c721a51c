//! Tailscale API endpoints and credential environment variables

/// Public Tailscale control-plane API
pub const DEFAULT_API_BASE: &str = "https://api.tailscale.com";

/// OAuth client-credentials token endpoint, relative to the API base
pub const TOKEN_PATH: &str = "/api/v2/oauth/token";

/// Auth-key collection of the caller's default tailnet (`-`)
pub const KEYS_PATH: &str = "/api/v2/tailnet/-/keys";

pub const ENV_API_KEY: &str = "TS_API_KEY";
pub const ENV_OAUTH_CLIENT_ID: &str = "TS_OAUTH_CLIENT_ID";
pub const ENV_OAUTH_CLIENT_SECRET: &str = "TS_OAUTH_CLIENT_SECRET";

/// Tag applied to OAuth-created keys when none is configured.
/// Keys created by an OAuth client must carry at least one tag.
pub const DEFAULT_OAUTH_TAG: &str = "tag:container";

/// Full token endpoint URL for an API base.
pub fn token_url(api_base: &str) -> String {
    format!("{}{TOKEN_PATH}", api_base.trim_end_matches('/'))
}

/// Full auth-key collection URL for an API base.
pub fn keys_url(api_base: &str) -> String {
    format!("{}{KEYS_PATH}", api_base.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_join_default_base() {
        assert_eq!(
            token_url(DEFAULT_API_BASE),
            "https://api.tailscale.com/api/v2/oauth/token"
        );
        assert_eq!(
            keys_url(DEFAULT_API_BASE),
            "https://api.tailscale.com/api/v2/tailnet/-/keys"
        );
    }

    #[test]
    fn urls_tolerate_trailing_slash() {
        assert_eq!(
            keys_url("http://127.0.0.1:8080/"),
            "http://127.0.0.1:8080/api/v2/tailnet/-/keys"
        );
    }
}
