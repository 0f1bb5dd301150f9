use semver::Version;
use thiserror::Error;

pub const APP_NAME: &str = "WorthyTen Valuation";
pub const APP_REPO_URL: &str = "https://github.com/worthyten/worthyten_valuation";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_TAG: Option<&str> = option_env!("GIT_TAG");

#[derive(Error, Debug)]
pub enum VersionError {
    #[error("invalid version format: {0}")]
    InvalidVersion(String),
}

fn parse_version_str(input: &str) -> Result<Version, VersionError> {
    let trimmed = input.trim_start_matches(|ch| ch == 'v' || ch == 'V');
    Version::parse(trimmed).map_err(|err| VersionError::InvalidVersion(err.to_string()))
}

/// The running version: the embedded git tag when built from a tag,
/// otherwise the crate version.
pub fn current_version() -> Result<Version, VersionError> {
    if let Some(tag) = GIT_TAG {
        return parse_version_str(tag);
    }

    parse_version_str(APP_VERSION)
}

/// Display label used in User-Agent strings and diagnostics.
pub fn version_label() -> String {
    if let Some(tag) = GIT_TAG {
        tag.to_string()
    } else {
        format!("v{}", APP_VERSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_version_parses() {
        assert!(current_version().is_ok());
    }

    #[test]
    fn tag_prefixes_are_stripped() {
        assert_eq!(parse_version_str("v1.2.3").unwrap(), Version::new(1, 2, 3));
        assert_eq!(parse_version_str("1.2.3").unwrap(), Version::new(1, 2, 3));
        assert!(parse_version_str("not-a-version").is_err());
    }
}
