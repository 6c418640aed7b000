//! Per-run settings.
//!
//! Every override the installer honours is looked up exactly once, at the
//! start of a run, and threaded through as a [`Settings`] value. Lookups go
//! to the process environment first and then to the host's server-context
//! variables; empty values count as unset.

use anyhow::{Result, bail};
use log::warn;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::host::{Host, PACKAGE_NAME};
use crate::runtime::Runtime;

pub const ENV_VERSION: &str = "ELECTRON_VERSION";
pub const ENV_PLATFORM: &str = "ELECTRON_PLATFORM";
pub const ENV_ARCHITECTURE: &str = "ELECTRON_ARCHITECTURE";
pub const ENV_CDN_URL: &str = "ELECTRON_CDNURL";
pub const ENV_RELEASES_URL: &str = "ELECTRON_RELEASES_URL";
pub const ENV_PLACEMENT: &str = "ELECTRON_PLACEMENT";

/// How the binary ends up in the bin directory.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    /// Symlink into the staging directory.
    #[default]
    Symlink,
    /// Copy the binary out of the staging directory.
    Copy,
}

impl FromStr for Placement {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "symlink" | "link" => Ok(Placement::Symlink),
            "copy" => Ok(Placement::Copy),
            other => bail!("Unknown placement '{}'. Expected 'symlink' or 'copy'.", other),
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placement::Symlink => write!(f, "symlink"),
            Placement::Copy => write!(f, "copy"),
        }
    }
}

/// `extra["uuf6429/electron-installer"]` in the project manifest.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ExtraConfig {
    pub cdnurl: Option<String>,
    pub version: Option<String>,
    pub placement: Option<Placement>,
}

impl ExtraConfig {
    pub fn from_host<H: Host + ?Sized>(host: &H) -> Self {
        let Some(value) = host.extra(PACKAGE_NAME) else {
            return Self::default();
        };
        match serde_json::from_value(value) {
            Ok(extra) => extra,
            Err(e) => {
                warn!("Ignoring malformed extra.{} block: {}", PACKAGE_NAME, e);
                Self::default()
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub version: Option<String>,
    pub platform: Option<String>,
    pub arch: Option<String>,
    pub cdn_url: Option<String>,
    pub releases_url: Option<String>,
    pub placement: Option<String>,
    pub extra: ExtraConfig,
}

impl Settings {
    #[tracing::instrument(skip(runtime, host))]
    pub fn resolve<R: Runtime, H: Host + ?Sized>(runtime: &R, host: &H) -> Self {
        Self {
            version: lookup(runtime, host, ENV_VERSION),
            platform: lookup(runtime, host, ENV_PLATFORM),
            arch: lookup(runtime, host, ENV_ARCHITECTURE),
            cdn_url: lookup(runtime, host, ENV_CDN_URL),
            releases_url: lookup(runtime, host, ENV_RELEASES_URL),
            placement: lookup(runtime, host, ENV_PLACEMENT),
            extra: ExtraConfig::from_host(host),
        }
    }

    /// Placement strategy: override variable, then manifest, then symlink.
    pub fn placement(&self) -> Result<Placement> {
        match &self.placement {
            Some(raw) => raw.parse(),
            None => Ok(self.extra.placement.unwrap_or_default()),
        }
    }
}

fn lookup<R: Runtime, H: Host + ?Sized>(runtime: &R, host: &H, key: &str) -> Option<String> {
    runtime
        .env_var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(|| host.server_var(key).filter(|v| !v.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MockHost;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;
    use std::collections::HashMap;

    fn runtime_with_env(vars: &[(&'static str, &'static str)]) -> MockRuntime {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut runtime = MockRuntime::new();
        runtime
            .expect_env_var()
            .returning(move |k| vars.get(k).cloned().ok_or(std::env::VarError::NotPresent));
        runtime
    }

    fn host_with_vars(
        vars: &[(&'static str, &'static str)],
        extra: Option<serde_json::Value>,
    ) -> MockHost {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut host = MockHost::new();
        host.expect_server_var()
            .returning(move |k| vars.get(k).cloned());
        host.expect_extra()
            .with(eq(PACKAGE_NAME))
            .return_const(extra);
        host
    }

    #[test]
    fn test_env_wins_over_server_vars() {
        let runtime = runtime_with_env(&[
            (ENV_VERSION, "1.6.2"),
            (ENV_PLATFORM, "darwin"),
            (ENV_ARCHITECTURE, "x64"),
            (ENV_CDN_URL, "scheme://host/env-var-url/"),
        ]);
        let host = host_with_vars(
            &[
                (ENV_VERSION, "1.4.12"),
                (ENV_PLATFORM, "win32"),
                (ENV_ARCHITECTURE, "ia32"),
                (ENV_CDN_URL, "scheme://host/server-var-url/"),
            ],
            None,
        );

        let settings = Settings::resolve(&runtime, &host);
        assert_eq!(settings.version.as_deref(), Some("1.6.2"));
        assert_eq!(settings.platform.as_deref(), Some("darwin"));
        assert_eq!(settings.arch.as_deref(), Some("x64"));
        assert_eq!(settings.cdn_url.as_deref(), Some("scheme://host/env-var-url/"));
    }

    #[test]
    fn test_server_vars_fill_in_missing_env() {
        let runtime = runtime_with_env(&[(ENV_PLATFORM, "")]);
        let host = host_with_vars(&[(ENV_PLATFORM, "linux"), (ENV_PLACEMENT, "copy")], None);

        let settings = Settings::resolve(&runtime, &host);
        assert_eq!(settings.platform.as_deref(), Some("linux"));
        assert_eq!(settings.version, None);
        assert_eq!(settings.placement().unwrap(), Placement::Copy);
    }

    #[test]
    fn test_extra_config_is_read() {
        let runtime = runtime_with_env(&[]);
        let host = host_with_vars(
            &[],
            Some(serde_json::json!({
                "cdnurl": "scheme://host/extra-url/",
                "version": "1.4.15",
                "placement": "copy"
            })),
        );

        let settings = Settings::resolve(&runtime, &host);
        assert_eq!(
            settings.extra,
            ExtraConfig {
                cdnurl: Some("scheme://host/extra-url/".into()),
                version: Some("1.4.15".into()),
                placement: Some(Placement::Copy),
            }
        );
        assert_eq!(settings.placement().unwrap(), Placement::Copy);
    }

    #[test]
    fn test_malformed_extra_is_ignored() {
        let runtime = runtime_with_env(&[]);
        let host = host_with_vars(&[], Some(serde_json::json!({ "placement": 42 })));

        let settings = Settings::resolve(&runtime, &host);
        assert_eq!(settings.extra, ExtraConfig::default());
        assert_eq!(settings.placement().unwrap(), Placement::Symlink);
    }

    #[test]
    fn test_placement_parsing() {
        assert_eq!("COPY".parse::<Placement>().unwrap(), Placement::Copy);
        assert_eq!("link".parse::<Placement>().unwrap(), Placement::Symlink);
        assert!("hardlink".parse::<Placement>().is_err());
        assert_eq!(Placement::Copy.to_string(), "copy");
    }
}
