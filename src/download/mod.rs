use crate::archive::ArchiveExtractor;
use crate::http::HttpClient;
use crate::package::{DistType, PackageDescriptor};
use crate::runtime::Runtime;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Fetches a distribution and unpacks it into the descriptor's target directory.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, package: &PackageDescriptor) -> Result<()>;
}

/// Downloads over HTTP into a sibling archive file, then extracts.
///
/// Nothing is written before the server answers with a success status, so a
/// missing release leaves the target directory as it was.
pub struct HttpDownloader<'a, R: Runtime, E: ArchiveExtractor> {
    runtime: &'a R,
    http_client: HttpClient,
    extractor: E,
}

impl<'a, R: Runtime + 'static, E: ArchiveExtractor> HttpDownloader<'a, R, E> {
    pub fn new(runtime: &'a R, http_client: HttpClient, extractor: E) -> Self {
        Self {
            runtime,
            http_client,
            extractor,
        }
    }

    fn archive_path(package: &PackageDescriptor) -> Result<PathBuf> {
        let parent = package
            .target_dir
            .parent()
            .with_context(|| format!("Invalid target directory {:?}", package.target_dir))?;
        let stem = package
            .target_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "electron".to_string());
        Ok(parent.join(format!("{}-{}.{}", stem, package.pretty_version, package.dist_type)))
    }

    fn unpack(&self, archive_path: &Path, target_dir: &Path) -> Result<()> {
        if self.runtime.exists(target_dir) {
            debug!("Clearing staging directory {:?}", target_dir);
            self.runtime
                .remove_dir_all(target_dir)
                .with_context(|| format!("Failed to clear staging directory {:?}", target_dir))?;
        }
        self.extractor
            .extract(self.runtime, archive_path, target_dir)
            .with_context(|| format!("Failed to extract {:?}", archive_path))
    }
}

#[async_trait]
impl<R: Runtime + 'static, E: ArchiveExtractor> Downloader for HttpDownloader<'_, R, E> {
    #[tracing::instrument(skip(self, package), fields(version = %package.pretty_version))]
    async fn download(&self, package: &PackageDescriptor) -> Result<()> {
        if package.dist_type == DistType::Tar {
            bail!(
                "Unsupported distribution format for {} (only zip archives are supported)",
                package.dist_url
            );
        }

        let archive_path = Self::archive_path(package)?;
        info!("Downloading {} {} from {}...", package.name, package.pretty_version, package.dist_url);

        self.http_client
            .download_file(&package.dist_url, || {
                if let Some(parent) = archive_path.parent() {
                    self.runtime.create_dir_all(parent)?;
                }
                self.runtime
                    .create_file(&archive_path)
                    .with_context(|| format!("Failed to create archive file at {:?}", archive_path))
            })
            .await?;

        let result = self.unpack(&archive_path, &package.target_dir);

        if let Err(e) = self.runtime.remove_file(&archive_path) {
            debug!("Failed to remove archive {:?}: {}", archive_path, e);
        }

        result?;
        info!("Download complete.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveExtractorImpl;
    use crate::http::{RetryPolicy, is_not_found};
    use crate::runtime::RealRuntime;
    use reqwest::Client;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::ZipWriter;
    use zip::write::FileOptions;

    fn zip_bytes(files: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, content) in files {
            zip.start_file(*name, FileOptions::<()>::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn client() -> HttpClient {
        HttpClient::new(Client::new()).with_policy(RetryPolicy::none())
    }

    #[tokio::test]
    async fn test_download_and_extract() {
        let dir = tempdir().unwrap();
        let target_dir = dir.path().join("vendor/uuf6429/electron");

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/electron-v1.6.2-linux-x64.zip")
            .with_status(200)
            .with_body(zip_bytes(&[("electron", "binary"), ("version", "v1.6.2")]))
            .create_async()
            .await;

        let package = PackageDescriptor::new(
            "1.6.2",
            target_dir.clone(),
            format!("{}/electron-v1.6.2-linux-x64.zip", server.url()),
        );
        let downloader = HttpDownloader::new(&RealRuntime, client(), ArchiveExtractorImpl::new());
        downloader.download(&package).await.unwrap();

        mock.assert_async().await;
        assert_eq!(std::fs::read_to_string(target_dir.join("electron")).unwrap(), "binary");
        // archive is cleaned up
        assert!(!dir.path().join("vendor/uuf6429/electron-1.6.2.zip").exists());
    }

    #[tokio::test]
    async fn test_staging_dir_is_cleared_before_extraction() {
        let dir = tempdir().unwrap();
        let target_dir = dir.path().join("electron");
        std::fs::create_dir_all(&target_dir).unwrap();
        std::fs::write(target_dir.join("stale"), "old").unwrap();

        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/a.zip")
            .with_status(200)
            .with_body(zip_bytes(&[("electron", "new")]))
            .create_async()
            .await;

        let package = PackageDescriptor::new("1.6.1", target_dir.clone(), format!("{}/a.zip", server.url()));
        let downloader = HttpDownloader::new(&RealRuntime, client(), ArchiveExtractorImpl::new());
        downloader.download(&package).await.unwrap();

        assert!(!target_dir.join("stale").exists());
        assert!(target_dir.join("electron").exists());
    }

    #[tokio::test]
    async fn test_not_found_touches_nothing() {
        let dir = tempdir().unwrap();
        let target_dir = dir.path().join("vendor/uuf6429/electron");

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/missing.zip")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let package = PackageDescriptor::new("9.9.9", target_dir, format!("{}/missing.zip", server.url()));
        let downloader = HttpDownloader::new(&RealRuntime, client(), ArchiveExtractorImpl::new());
        let err = downloader.download(&package).await.unwrap_err();

        mock.assert_async().await;
        assert!(is_not_found(&err));
        assert!(!dir.path().join("vendor").exists());
    }

    #[tokio::test]
    async fn test_tar_distribution_is_rejected() {
        let package = PackageDescriptor::new(
            "1.6.2",
            PathBuf::from("/nowhere/electron"),
            "https://cdn.example/electron.tar.gz".to_string(),
        );
        // strict mock runtime: nothing may be touched
        let runtime = crate::runtime::MockRuntime::new();
        let downloader = HttpDownloader {
            runtime: &runtime,
            http_client: client(),
            extractor: ArchiveExtractorImpl::new(),
        };
        let err = downloader.download(&package).await.unwrap_err();
        assert!(err.to_string().contains("only zip archives"));
    }
}
