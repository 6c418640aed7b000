use anyhow::{Result, bail};
use log::debug;
use regex::Regex;
use std::sync::LazyLock;

use super::catalog::KnownVersions;
use crate::host::{Host, PACKAGE_NAME, is_declared};
use crate::settings::Settings;

static TRIPLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+\.\d+\.\d+)").expect("static regex")
});

static PATCH_TAGGED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+\.\d+\.\d+)(?:-p\d{2})?").expect("static regex")
});

/// Reduce a raw version candidate to a concrete release number.
///
/// Returns `None` only when the catalog is empty and the candidate needs the
/// latest version to resolve.
pub fn normalize_version(raw: &str, known: &KnownVersions) -> Option<String> {
    let raw = raw.trim();
    let raw = raw.strip_prefix('v').unwrap_or(raw);

    if raw.eq_ignore_ascii_case("dev-master") {
        return known.latest().map(String::from);
    }

    if raw.to_lowercase().starts_with("dev-master#") {
        if let Some(m) = TRIPLE.find_iter(raw).last() {
            return Some(m.as_str().to_string());
        }
        return known.latest().map(String::from);
    }

    if let Some(caps) = PATCH_TAGGED.captures(raw) {
        return Some(caps[1].to_string());
    }

    known.latest().map(String::from)
}

/// Pick the Electron version to install.
#[tracing::instrument(skip(settings, host, known))]
pub fn resolve_version<H: Host + ?Sized>(
    settings: &Settings,
    host: &H,
    known: &KnownVersions,
) -> Result<String> {
    if known.is_empty() {
        bail!("No known Electron versions to choose from");
    }

    let candidate = settings
        .version
        .clone()
        .or_else(|| settings.extra.version.clone().filter(|v| !v.is_empty()))
        .or_else(|| host.locked_alias(PACKAGE_NAME))
        .or_else(|| host.locked_version(PACKAGE_NAME))
        .or_else(|| host.required_constraint(PACKAGE_NAME));

    let version = match candidate {
        Some(raw) => {
            debug!("Version candidate {:?}", raw);
            normalize_version(&raw, known)
        }
        None if !is_declared(host, PACKAGE_NAME) => {
            bail!("Can not determine required version of {}", PACKAGE_NAME)
        }
        None => known.latest().map(String::from),
    };

    match version {
        Some(v) => Ok(v),
        None => bail!("Can not determine required version of {}", PACKAGE_NAME),
    }
}
