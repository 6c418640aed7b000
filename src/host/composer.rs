use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::Host;
use crate::runtime::Runtime;

pub const MANIFEST_FILE: &str = "composer.json";
pub const LOCK_FILE: &str = "composer.lock";

const DEFAULT_VENDOR_DIR: &str = "vendor";
const DEFAULT_BIN_DIR: &str = "{$vendor-dir}/bin";

/// The parts of `composer.json` the installer reads.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    #[serde(default)]
    pub config: ManifestConfig,
    #[serde(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub require: BTreeMap<String, String>,
    #[serde(default, rename = "require-dev")]
    pub require_dev: BTreeMap<String, String>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ManifestConfig {
    #[serde(rename = "bin-dir")]
    pub bin_dir: Option<String>,
    #[serde(rename = "vendor-dir")]
    pub vendor_dir: Option<String>,
}

/// The parts of `composer.lock` the installer reads.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct LockFile {
    #[serde(default)]
    pub packages: Vec<LockedPackage>,
    #[serde(default, rename = "packages-dev")]
    pub packages_dev: Vec<LockedPackage>,
    #[serde(default)]
    pub aliases: Vec<LockAlias>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct LockedPackage {
    pub name: String,
    pub version: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct LockAlias {
    pub package: String,
    #[serde(default)]
    pub version: Option<String>,
    pub alias: String,
}

/// A Composer project on disk, as seen by a post-install hook.
#[derive(Debug, Clone)]
pub struct ComposerProject {
    manifest: Manifest,
    lock: LockFile,
    bin_dir: PathBuf,
    vendor_dir: PathBuf,
    server_vars: BTreeMap<String, String>,
}

impl ComposerProject {
    /// Loads `composer.json` (required) and `composer.lock` (optional) from `project_dir`.
    ///
    /// `COMPOSER_VENDOR_DIR` and `COMPOSER_BIN_DIR` take precedence over the manifest's
    /// `config` block, the same way Composer itself resolves them.
    #[tracing::instrument(skip(runtime, server_vars))]
    pub fn load<R: Runtime>(
        runtime: &R,
        project_dir: &Path,
        server_vars: BTreeMap<String, String>,
    ) -> Result<Self> {
        // Symlink targets and the binding file need absolute paths.
        let project_dir = &runtime.absolute_path(project_dir)?;
        let manifest_path = project_dir.join(MANIFEST_FILE);
        let content = runtime
            .read_to_string(&manifest_path)
            .with_context(|| format!("Failed to read project manifest {:?}", manifest_path))?;
        let manifest: Manifest = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse project manifest {:?}", manifest_path))?;

        let lock_path = project_dir.join(LOCK_FILE);
        let lock = if runtime.exists(&lock_path) {
            let content = runtime
                .read_to_string(&lock_path)
                .with_context(|| format!("Failed to read lock file {:?}", lock_path))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse lock file {:?}", lock_path))?
        } else {
            debug!("No lock file at {:?}", lock_path);
            LockFile::default()
        };

        let vendor_setting = runtime
            .env_var("COMPOSER_VENDOR_DIR")
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| manifest.config.vendor_dir.clone())
            .unwrap_or_else(|| DEFAULT_VENDOR_DIR.to_string());
        let vendor_dir = absolutize(project_dir, &vendor_setting);

        let bin_setting = runtime
            .env_var("COMPOSER_BIN_DIR")
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| manifest.config.bin_dir.clone())
            .unwrap_or_else(|| DEFAULT_BIN_DIR.to_string());
        let bin_dir = absolutize(
            project_dir,
            &bin_setting.replace("{$vendor-dir}", &vendor_setting),
        );

        debug!("vendor-dir={:?} bin-dir={:?}", vendor_dir, bin_dir);

        Ok(Self::new(manifest, lock, bin_dir, vendor_dir, server_vars))
    }

    pub fn new(
        manifest: Manifest,
        lock: LockFile,
        bin_dir: PathBuf,
        vendor_dir: PathBuf,
        server_vars: BTreeMap<String, String>,
    ) -> Self {
        Self {
            manifest,
            lock,
            bin_dir,
            vendor_dir,
            server_vars,
        }
    }
}

fn absolutize(base: &Path, value: &str) -> PathBuf {
    let path = Path::new(value);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

impl Host for ComposerProject {
    fn bin_dir(&self) -> PathBuf {
        self.bin_dir.clone()
    }

    fn vendor_dir(&self) -> PathBuf {
        self.vendor_dir.clone()
    }

    fn server_var(&self, key: &str) -> Option<String> {
        self.server_vars.get(key).cloned()
    }

    fn extra(&self, package: &str) -> Option<serde_json::Value> {
        self.manifest.extra.get(package).cloned()
    }

    fn locked_version(&self, package: &str) -> Option<String> {
        self.lock
            .packages
            .iter()
            .chain(self.lock.packages_dev.iter())
            .find(|p| p.name == package)
            .map(|p| p.version.clone())
    }

    fn locked_alias(&self, package: &str) -> Option<String> {
        self.lock
            .aliases
            .iter()
            .find(|a| a.package == package)
            .map(|a| a.alias.clone())
    }

    fn required_constraint(&self, package: &str) -> Option<String> {
        self.manifest
            .require
            .get(package)
            .or_else(|| self.manifest.require_dev.get(package))
            .cloned()
    }
}
