//! Rendering of created and listed keys
//!
//! stdout carries only the result (the bare key, or JSON); diagnostics go
//! to the tracing subscriber on stderr.

use std::process::Stdio;

use serde::Serialize;
use tailscale_keys::{AuthKeyRecord, AuthKeySummary};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Timestamp layout for JSON and list output
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Clipboard helper used on macOS
pub const CLIPBOARD_PROGRAM: &str = "pbcopy";

#[derive(Serialize)]
struct KeyOutput<'a> {
    key: &'a str,
    id: &'a str,
    created: String,
    expires: String,
    capabilities: OutputCapabilities,
    tags: &'a [String],
}

#[derive(Serialize)]
struct OutputCapabilities {
    ephemeral: bool,
    reusable: bool,
    preauthorized: bool,
}

/// The key alone, newline-terminated.
pub fn render_plain(record: &AuthKeyRecord) -> String {
    format!("{}\n", record.key)
}

/// Indented JSON with the key, its metadata and echoed capabilities.
pub fn render_json(record: &AuthKeyRecord) -> serde_json::Result<String> {
    let flags = record.flags();
    let output = KeyOutput {
        key: &record.key,
        id: &record.id,
        created: record.created.format(TIMESTAMP_FORMAT).to_string(),
        expires: record.expires.format(TIMESTAMP_FORMAT).to_string(),
        capabilities: OutputCapabilities {
            ephemeral: flags.ephemeral,
            reusable: flags.reusable,
            preauthorized: flags.preauthorized,
        },
        tags: &flags.tags,
    };
    let mut json = serde_json::to_string_pretty(&output)?;
    json.push('\n');
    Ok(json)
}

/// One line per key: `id  created  expires  description`.
pub fn render_key_list(keys: &[AuthKeySummary]) -> String {
    if keys.is_empty() {
        return "no auth keys found\n".to_string();
    }
    let stamp = |ts: Option<chrono::DateTime<chrono::Utc>>| {
        ts.map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_else(|| "-".to_string())
    };
    keys.iter()
        .map(|key| {
            format!(
                "{}  {}  {}  {}\n",
                key.id,
                stamp(key.created),
                stamp(key.expires),
                key.description
            )
        })
        .collect()
}

pub fn render_key_list_json(keys: &[AuthKeySummary]) -> serde_json::Result<String> {
    let mut json = serde_json::to_string_pretty(keys)?;
    json.push('\n');
    Ok(json)
}

/// Pipe `text` into a clipboard program's stdin.
pub async fn copy_to_clipboard(program: &str, text: &str) -> std::io::Result<()> {
    let mut child = Command::new(program)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes()).await?;
    }

    let status = child.wait().await?;
    if !status.success() {
        return Err(std::io::Error::other(format!("{program} exited with {status}")));
    }
    Ok(())
}
