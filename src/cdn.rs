//! Download URL construction.

use anyhow::{Result, bail};

use crate::platform::{Arch, Platform, Target};
use crate::settings::Settings;

/// Where Electron releases are published by default.
pub const DEFAULT_CDN_URL: &str = "https://github.com/electron/electron/";

/// A base URL ending in this repository path gets the release path appended.
const GITHUB_REPOSITORY_SUFFIX: &str = "github.com/electron/electron/";

/// Base URL for `version`: override setting, then manifest `extra`, then the default.
pub fn cdn_url(settings: &Settings, version: &str) -> String {
    let configured = settings
        .cdn_url
        .as_deref()
        .or(settings.extra.cdnurl.as_deref())
        .filter(|url| !url.is_empty())
        .unwrap_or(DEFAULT_CDN_URL);

    normalize_cdn_url(configured, version)
}

/// Adds the trailing slash, and the per-release path when the URL points at
/// the GitHub repository itself rather than at a specific release.
pub fn normalize_cdn_url(url: &str, version: &str) -> String {
    let mut url = url.to_string();
    if !url.ends_with('/') {
        url.push('/');
    }

    if url.to_lowercase().ends_with(GITHUB_REPOSITORY_SUFFIX) {
        url.push_str(&format!("releases/download/v{}/", version));
    }

    url
}

pub fn artifact_file_name(version: &str, platform: Platform, arch: Arch) -> String {
    format!("electron-v{}-{}-{}.zip", version, platform, arch)
}

/// Both halves of the target, or the error telling the user to install by hand.
pub fn ensure_supported(target: Target) -> Result<(Platform, Arch)> {
    match (target.platform, target.arch) {
        (Some(platform), Some(arch)) => Ok((platform, arch)),
        _ => bail!(
            "The installer could not select an Electron package for this OS (platform: {}, architecture: {}). \
             Please install Electron manually into the bin folder of your project.",
            describe(target.platform),
            describe(target.arch)
        ),
    }
}

/// Full download URL of the archive for `version` on `target`.
pub fn artifact_url(settings: &Settings, version: &str, target: Target) -> Result<String> {
    let (platform, arch) = ensure_supported(target)?;
    Ok(format!(
        "{}{}",
        cdn_url(settings, version),
        artifact_file_name(version, platform, arch)
    ))
}

fn describe<T: std::fmt::Display>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
