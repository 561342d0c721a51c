//! ACL tag parsing

/// Every ACL tag starts with this prefix.
pub const TAG_PREFIX: &str = "tag:";

/// Parse a comma-separated tag list.
///
/// Segments are trimmed, empty segments dropped, and bare names get the
/// `tag:` prefix, so `"tag:docker, ci"` yields `["tag:docker", "tag:ci"]`.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(|tag| {
            if tag.starts_with(TAG_PREFIX) {
                tag.to_string()
            } else {
                format!("{TAG_PREFIX}{tag}")
            }
        })
        .collect()
}

/// A tag is `tag:` followed by a non-empty name.
pub fn is_valid_tag(tag: &str) -> bool {
    tag.len() > TAG_PREFIX.len() && tag.starts_with(TAG_PREFIX)
}
