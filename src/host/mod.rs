//! The host package manager's view of the project.
//!
//! The installer runs as a hook of the host package manager. Everything it
//! needs to know about the surrounding project (where binaries go, what the
//! project declared, what the lock data pins) comes through [`Host`].

mod composer;

use std::path::PathBuf;

pub use composer::{ComposerProject, LockAlias, LockFile, LockedPackage, Manifest, ManifestConfig};

/// Identity of this installer inside the host's dependency graph.
pub const PACKAGE_NAME: &str = "uuf6429/electron-installer";

#[cfg_attr(test, mockall::automock)]
pub trait Host: Send + Sync {
    /// Directory executables are exposed from (absolute).
    fn bin_dir(&self) -> PathBuf;

    /// Directory dependencies are installed into (absolute).
    fn vendor_dir(&self) -> PathBuf;

    /// A variable handed to this invocation by the host, consulted after the
    /// process environment.
    fn server_var(&self, key: &str) -> Option<String>;

    /// The `extra` metadata block the project declares for `package`.
    fn extra(&self, package: &str) -> Option<serde_json::Value>;

    /// Version of `package` recorded in the lock data.
    fn locked_version(&self, package: &str) -> Option<String>;

    /// Alias the lock data declares for `package`, e.g. `dev-master as 1.6.2`.
    fn locked_alias(&self, package: &str) -> Option<String>;

    /// Constraint the project declares for `package` in its requirements.
    fn required_constraint(&self, package: &str) -> Option<String>;
}

/// True when the host project knows about `package` in any way.
pub fn is_declared<H: Host + ?Sized>(host: &H, package: &str) -> bool {
    host.locked_alias(package).is_some()
        || host.locked_version(package).is_some()
        || host.required_constraint(package).is_some()
}
