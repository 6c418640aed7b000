//! Which Electron version to install, and what the fallbacks are.

mod catalog;
mod compare;
mod resolve;

pub use catalog::{
    BUILTIN_VERSIONS, DEFAULT_RELEASES_URL, GitHubReleases, KnownVersions, ReleaseSource,
    VersionCatalog,
};
pub use compare::compare_versions;
pub use resolve::{normalize_version, resolve_version};

#[cfg(test)]
pub use catalog::MockReleaseSource;
