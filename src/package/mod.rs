//! Description of the Electron distribution handed to the downloader.

use std::fmt;
use std::path::PathBuf;

/// Package name the Electron distribution is registered under.
pub const ELECTRON_PACKAGE_NAME: &str = "Electron";

/// Archive format of a distribution, derived from its URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistType {
    Zip,
    Tar,
}

impl DistType {
    pub fn from_url(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        if path.to_lowercase().ends_with(".zip") {
            DistType::Zip
        } else {
            DistType::Tar
        }
    }
}

impl fmt::Display for DistType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistType::Zip => write!(f, "zip"),
            DistType::Tar => write!(f, "tar"),
        }
    }
}

/// One download attempt. Built fresh for every version the installer tries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    pub name: String,
    /// Four numeric segments, e.g. `1.6.2.0`.
    pub version: String,
    pub pretty_version: String,
    pub target_dir: PathBuf,
    pub installation_source: &'static str,
    pub dist_type: DistType,
    pub dist_url: String,
}

impl PackageDescriptor {
    pub fn new(version: &str, target_dir: PathBuf, dist_url: String) -> Self {
        Self {
            name: ELECTRON_PACKAGE_NAME.to_string(),
            version: normalize_four_segments(version),
            pretty_version: version.to_string(),
            target_dir,
            installation_source: "dist",
            dist_type: DistType::from_url(&dist_url),
            dist_url,
        }
    }
}

/// `1.6.2` -> `1.6.2.0`. Non-numeric trailing text is dropped.
pub fn normalize_four_segments(version: &str) -> String {
    let version = version.trim();
    let version = version.strip_prefix('v').unwrap_or(version);

    let mut parts: Vec<String> = version
        .split('.')
        .map_while(|part| {
            let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
            (!digits.is_empty()).then_some(digits)
        })
        .take(4)
        .collect();

    parts.resize(4, "0".to_string());
    parts.join(".")
}
