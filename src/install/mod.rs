//! The install run: resolve, check, download, place, bind.

use anyhow::{Context, Result, bail};
use log::{debug, info};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::{
    archive::ArchiveExtractorImpl,
    binding::{Binding, binding_path},
    cdn,
    download::{Downloader, HttpDownloader},
    host::{ComposerProject, Host},
    package::PackageDescriptor,
    platform::Target,
    runtime::Runtime,
    settings::Settings,
    version::{
        DEFAULT_RELEASES_URL, GitHubReleases, ReleaseSource, VersionCatalog, resolve_version,
    },
};

pub mod config;
mod ladder;
mod place;
mod skip;

pub use ladder::download_with_fallback;
pub use place::place_binary;
pub use skip::{installed_version, is_current};

/// Staging directory for extracted distributions, relative to the vendor dir.
pub const STAGING_DIR: &str = "uuf6429/electron";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallOptions {
    /// Reinstall even when the installed version is current.
    pub force: bool,
    /// Use the built-in version list instead of the release listing.
    pub offline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed { version: String, bin: PathBuf },
    AlreadyInstalled { version: String, bin: PathBuf },
}

/// Install Electron into the project at `project_dir`.
#[tracing::instrument(skip(runtime, server_vars))]
pub async fn install<R: Runtime + 'static>(
    runtime: R,
    project_dir: &Path,
    server_vars: BTreeMap<String, String>,
    options: InstallOptions,
) -> Result<InstallOutcome> {
    let host = ComposerProject::load(&runtime, project_dir, server_vars)?;
    let settings = Settings::resolve(&runtime, &host);

    let catalog = catalog(&runtime, &settings, options.offline)?;
    let downloader = HttpDownloader::new(
        &runtime,
        config::http_client()?,
        ArchiveExtractorImpl::new(),
    );

    Installer::new(&runtime, &host, settings, catalog, downloader)
        .install(options.force)
        .await
}

/// Print every known Electron version, newest first.
#[tracing::instrument(skip(runtime, server_vars))]
pub async fn list_versions<R: Runtime + 'static>(
    runtime: R,
    project_dir: &Path,
    server_vars: BTreeMap<String, String>,
    offline: bool,
) -> Result<()> {
    let host = ComposerProject::load(&runtime, project_dir, server_vars)?;
    let settings = Settings::resolve(&runtime, &host);
    let catalog = catalog(&runtime, &settings, offline)?;

    for version in catalog.known().await.versions() {
        println!("{}", version);
    }
    Ok(())
}

/// Print the binding file of the project at `project_dir`.
#[tracing::instrument(skip(runtime, server_vars))]
pub fn show<R: Runtime>(
    runtime: R,
    project_dir: &Path,
    server_vars: BTreeMap<String, String>,
) -> Result<()> {
    let host = ComposerProject::load(&runtime, project_dir, server_vars)?;
    let path = binding_path(&host);
    if !runtime.exists(&path) {
        bail!("Electron is not installed: no binding file at {}", path.display());
    }

    let binding = Binding::load(&runtime, &path)?;
    print!("{}", binding.to_json()?);
    Ok(())
}

fn catalog<R: Runtime>(
    runtime: &R,
    settings: &Settings,
    offline: bool,
) -> Result<VersionCatalog<GitHubReleases>> {
    if offline {
        return Ok(VersionCatalog::offline());
    }

    let url = settings
        .releases_url
        .clone()
        .unwrap_or_else(|| DEFAULT_RELEASES_URL.to_string());
    let http_client = config::release_client(runtime, &url)?;
    Ok(VersionCatalog::new(GitHubReleases::new(http_client, Some(url))))
}

pub struct Installer<'a, R, H, S, D>
where
    R: Runtime,
    H: Host + ?Sized,
    S: ReleaseSource,
    D: Downloader,
{
    runtime: &'a R,
    host: &'a H,
    settings: Settings,
    catalog: VersionCatalog<S>,
    downloader: D,
}

impl<'a, R, H, S, D> Installer<'a, R, H, S, D>
where
    R: Runtime,
    H: Host + ?Sized,
    S: ReleaseSource,
    D: Downloader,
{
    pub fn new(
        runtime: &'a R,
        host: &'a H,
        settings: Settings,
        catalog: VersionCatalog<S>,
        downloader: D,
    ) -> Self {
        Self {
            runtime,
            host,
            settings,
            catalog,
            downloader,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn install(&self, force: bool) -> Result<InstallOutcome> {
        let target = Target::detect(self.runtime, &self.settings);
        let (platform, arch) = cdn::ensure_supported(target)?;
        let placement = self.settings.placement()?;

        let known = self.catalog.known().await;
        let requested = resolve_version(&self.settings, self.host, known)?;
        println!("   resolving electron {} for {}-{}", requested, platform, arch);

        let bin = self.host.bin_dir().join(platform.executable_name());
        let binding_file = binding_path(self.host);

        if force {
            debug!("Forced install, skipping the installed version check");
        } else if let Some(installed) = installed_version(self.runtime, &binding_file, &bin)
            && is_current(&installed, &requested)
        {
            println!("  up-to-date electron {} is already installed", installed);
            return Ok(InstallOutcome::AlreadyInstalled {
                version: installed,
                bin,
            });
        }

        let staging = self.host.vendor_dir().join(STAGING_DIR);
        println!(" downloading electron {}", requested);
        let version = download_with_fallback(&self.downloader, known, &requested, |v| {
            let url = cdn::artifact_url(&self.settings, v, target)?;
            Ok(PackageDescriptor::new(v, staging.clone(), url))
        })
        .await?;

        let source = staging.join(platform.binary_relative_path());
        place_binary(self.runtime, &source, &bin, placement)
            .with_context(|| format!("Failed to install Electron {} into {:?}", version, bin))?;

        Binding::new(&bin, Some(&version)).save(self.runtime, &binding_file)?;
        info!("Wrote binding for Electron {} at {:?}", version, binding_file);

        println!("   installed electron {} {}", version, bin.display());
        Ok(InstallOutcome::Installed { version, bin })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::MockDownloader;
    use crate::host::MockHost;
    use crate::http::NonRetryableError;
    use crate::runtime::RealRuntime;
    use crate::version::MockReleaseSource;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    fn linux_settings() -> Settings {
        Settings {
            version: Some("1.6.2".into()),
            platform: Some("linux".into()),
            arch: Some("x64".into()),
            ..Default::default()
        }
    }

    fn project() -> (TempDir, MockHost) {
        let dir = tempdir().unwrap();
        let mut host = MockHost::new();
        host.expect_bin_dir()
            .return_const(dir.path().join("vendor/bin"));
        host.expect_vendor_dir()
            .return_const(dir.path().join("vendor"));
        (dir, host)
    }

    /// A downloader that unpacks a fake linux build into the staging dir.
    fn unpacking_downloader(missing: &'static [&'static str]) -> MockDownloader {
        let mut downloader = MockDownloader::new();
        downloader.expect_download().returning(move |pkg| {
            if missing.contains(&pkg.pretty_version.as_str()) {
                return Err(NonRetryableError::NotFound(pkg.dist_url.clone()).into());
            }
            fs::create_dir_all(&pkg.target_dir)?;
            fs::write(pkg.target_dir.join("electron"), &pkg.pretty_version)?;
            Ok(())
        });
        downloader
    }

    fn installer<'a>(
        host: &'a MockHost,
        settings: Settings,
        downloader: MockDownloader,
    ) -> Installer<'a, RealRuntime, MockHost, MockReleaseSource, MockDownloader> {
        Installer::new(
            &RealRuntime,
            host,
            settings,
            VersionCatalog::offline(),
            downloader,
        )
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_fresh_install() {
        let (dir, host) = project();
        let outcome = installer(&host, linux_settings(), unpacking_downloader(&[]))
            .install(false)
            .await
            .unwrap();

        let bin = dir.path().join("vendor/bin/electron");
        assert_eq!(
            outcome,
            InstallOutcome::Installed {
                version: "1.6.2".into(),
                bin: bin.clone()
            }
        );
        assert!(fs::symlink_metadata(&bin).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&bin).unwrap(), "1.6.2");

        let binding = Binding::load(&RealRuntime, &binding_path(&host)).unwrap();
        assert_eq!(binding.version.as_deref(), Some("1.6.2"));
        assert_eq!(binding.bin_path(), bin.as_path());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_release_falls_back() {
        let (_dir, host) = project();
        let outcome = installer(&host, linux_settings(), unpacking_downloader(&["1.6.2"]))
            .install(false)
            .await
            .unwrap();

        assert!(matches!(outcome, InstallOutcome::Installed { ref version, .. } if version == "1.6.1"));
        let binding = Binding::load(&RealRuntime, &binding_path(&host)).unwrap();
        assert_eq!(binding.version.as_deref(), Some("1.6.1"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_current_install_is_skipped() {
        let (_dir, host) = project();
        installer(&host, linux_settings(), unpacking_downloader(&[]))
            .install(false)
            .await
            .unwrap();

        // strict mock: a second run must not download
        let settings = Settings {
            version: Some("1.6.1".into()),
            ..linux_settings()
        };
        let outcome = installer(&host, settings, MockDownloader::new())
            .install(false)
            .await
            .unwrap();
        assert!(matches!(outcome, InstallOutcome::AlreadyInstalled { ref version, .. } if version == "1.6.2"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_force_reinstalls() {
        let (_dir, host) = project();
        installer(&host, linux_settings(), unpacking_downloader(&[]))
            .install(false)
            .await
            .unwrap();

        let mut downloader = MockDownloader::new();
        downloader.expect_download().times(1).returning(|pkg| {
            fs::create_dir_all(&pkg.target_dir)?;
            fs::write(pkg.target_dir.join("electron"), "again")?;
            Ok(())
        });

        let outcome = installer(&host, linux_settings(), downloader)
            .install(true)
            .await
            .unwrap();
        assert!(matches!(outcome, InstallOutcome::Installed { .. }));
    }

    #[tokio::test]
    async fn test_unsupported_platform_fails_early() {
        // strict mocks: nothing may be consulted
        let host = MockHost::new();
        let settings = Settings {
            platform: Some("beos".into()),
            ..linux_settings()
        };
        let err = installer(&host, settings, MockDownloader::new())
            .install(false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("install Electron manually"));
    }

    #[tokio::test]
    async fn test_missing_binary_after_download_is_fatal() {
        let (_dir, host) = project();
        let mut downloader = MockDownloader::new();
        downloader.expect_download().returning(|pkg| {
            fs::create_dir_all(&pkg.target_dir)?;
            Ok(())
        });

        let err = installer(&host, linux_settings(), downloader)
            .install(false)
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("not found"));
    }
}
