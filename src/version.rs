//! Build metadata embedded by `build.rs`.
//!
//! Identifies this build towards the optimization service (via the HTTP
//! `User-Agent`) and on the command line.

/// Package name from Cargo.toml.
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

const GIT_BRANCH: Option<&str> = option_env!("VERGEN_GIT_BRANCH");
const GIT_SHA: Option<&str> = option_env!("VERGEN_GIT_SHA");
const GIT_DIRTY: Option<&str> = option_env!("VERGEN_GIT_DIRTY");
const BUILD_TIMESTAMP: Option<&str> = option_env!("VERGEN_BUILD_TIMESTAMP");

/// Source revision as `branch@sha`, with `-dirty` for uncommitted builds.
///
/// `None` when built outside a git checkout.
pub fn revision() -> Option<String> {
    let sha = GIT_SHA?;
    let short = &sha[..7.min(sha.len())];
    let dirty = if GIT_DIRTY == Some("true") { "-dirty" } else { "" };
    Some(format!("{}@{short}{dirty}", GIT_BRANCH.unwrap_or("detached")))
}

/// `User-Agent` sent with every optimization request.
pub fn user_agent() -> String {
    match revision() {
        Some(rev) => format!("{PKG_NAME}/{PKG_VERSION} ({rev})"),
        None => format!("{PKG_NAME}/{PKG_VERSION}"),
    }
}

/// Human-readable version line, e.g. `0.1.0 (main@abc1234, built 2024-05-01T10:00:00Z)`.
pub fn version_string() -> String {
    let mut details = Vec::new();
    if let Some(rev) = revision() {
        details.push(rev);
    }
    if let Some(ts) = BUILD_TIMESTAMP {
        details.push(format!("built {ts}"));
    }
    if details.is_empty() {
        PKG_VERSION.to_string()
    } else {
        format!("{PKG_VERSION} ({})", details.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_pkg_version() {
        assert!(version_string().starts_with(PKG_VERSION));
    }

    #[test]
    fn user_agent_names_the_crate() {
        let ua = user_agent();
        assert!(ua.starts_with("asset-optimizer/"));
        assert!(ua.contains(PKG_VERSION));
    }

    #[test]
    fn revision_has_short_sha() {
        if let Some(rev) = revision() {
            let (_, sha) = rev.split_once('@').unwrap();
            assert!(sha.trim_end_matches("-dirty").len() <= 7);
        }
    }
}
