//! Walks down the known versions while the CDN answers 404.

use anyhow::{Result, bail};
use log::warn;

use crate::download::Downloader;
use crate::http::{find_non_retryable, is_not_found};
use crate::package::PackageDescriptor;
use crate::version::KnownVersions;

/// Download `requested`, or the nearest lower known version that exists.
///
/// A 404 moves one step down the list; any other failure stops the walk.
/// Returns the version that was actually downloaded.
#[tracing::instrument(skip(downloader, known, build))]
pub async fn download_with_fallback<D, F>(
    downloader: &D,
    known: &KnownVersions,
    requested: &str,
    mut build: F,
) -> Result<String>
where
    D: Downloader + ?Sized,
    F: FnMut(&str) -> Result<PackageDescriptor>,
{
    let max_attempts = known.len() + 1;
    let mut version = requested.to_string();

    for _ in 0..max_attempts {
        let package = build(&version)?;
        match downloader.download(&package).await {
            Ok(()) => return Ok(version),
            Err(e) if is_not_found(&e) => match known.lower_version(&version) {
                Some(lower) => {
                    warn!(
                        "Electron {} is not available at {}; trying {}",
                        version, package.dist_url, lower
                    );
                    version = lower.to_string();
                }
                None => {
                    return Err(e.context(format!(
                        "No downloadable Electron release found at or below {}",
                        requested
                    )));
                }
            },
            Err(e) => {
                let message = match find_non_retryable(&e) {
                    Some(status) => format!(
                        "Failed to download Electron {} (HTTP status code: {})",
                        version,
                        status.status_code()
                    ),
                    None => format!("Failed to download Electron {}", version),
                };
                return Err(e.context(message));
            }
        }
    }

    bail!(
        "Gave up looking for an Electron release after {} attempts",
        max_attempts
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::MockDownloader;
    use crate::http::NonRetryableError;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    fn build(version: &str) -> Result<PackageDescriptor> {
        Ok(PackageDescriptor::new(
            version,
            PathBuf::from("/v/uuf6429/electron"),
            format!("https://cdn.example/electron-v{}-linux-x64.zip", version),
        ))
    }

    fn not_found(url: &str) -> anyhow::Error {
        anyhow::Error::new(NonRetryableError::NotFound(url.to_string()))
            .context("Failed to download file")
    }

    fn recording(
        downloader: &mut MockDownloader,
        outcome: impl Fn(&str) -> Result<()> + Send + Sync + 'static,
    ) -> Arc<Mutex<Vec<String>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        downloader.expect_download().returning(move |pkg| {
            log.lock().unwrap().push(pkg.pretty_version.clone());
            outcome(&pkg.pretty_version)
        });
        seen
    }

    #[test_log::test(tokio::test)]
    async fn test_not_found_steps_down() {
        let known = KnownVersions::builtin();
        let mut downloader = MockDownloader::new();
        let seen = recording(&mut downloader, |v| {
            if v == "1.6.2" {
                Err(not_found("https://cdn.example/1.6.2"))
            } else {
                Ok(())
            }
        });

        let installed = download_with_fallback(&downloader, &known, "1.6.2", build)
            .await
            .unwrap();

        assert_eq!(installed, "1.6.1");
        assert_eq!(*seen.lock().unwrap(), vec!["1.6.2", "1.6.1"]);
    }

    #[tokio::test]
    async fn test_unknown_requested_version_steps_into_list() {
        let known = KnownVersions::builtin();
        let mut downloader = MockDownloader::new();
        let seen = recording(&mut downloader, |v| {
            if v == "1.5.0" {
                Err(not_found("x"))
            } else {
                Ok(())
            }
        });

        let installed = download_with_fallback(&downloader, &known, "1.5.0", build)
            .await
            .unwrap();

        assert_eq!(installed, "1.4.15");
        assert_eq!(*seen.lock().unwrap(), vec!["1.5.0", "1.4.15"]);
    }

    #[tokio::test]
    async fn test_other_errors_are_fatal() {
        let known = KnownVersions::builtin();
        let mut downloader = MockDownloader::new();
        downloader
            .expect_download()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("HTTP status server error (500)")));

        let err = download_with_fallback(&downloader, &known, "1.6.2", build)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to download Electron 1.6.2"));
    }

    #[tokio::test]
    async fn test_client_error_reports_status_code() {
        let known = KnownVersions::builtin();
        let mut downloader = MockDownloader::new();
        downloader.expect_download().times(1).returning(|pkg| {
            Err(NonRetryableError::Forbidden(pkg.dist_url.clone()).into())
        });

        let err = download_with_fallback(&downloader, &known, "1.6.2", build)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to download Electron 1.6.2 (HTTP status code: 403)"
        );
    }

    #[tokio::test]
    async fn test_not_found_at_minimum_is_fatal() {
        let known = KnownVersions::builtin();
        let mut downloader = MockDownloader::new();
        let seen = recording(&mut downloader, |_| Err(not_found("x")));

        let err = download_with_fallback(&downloader, &known, "1.4.12", build)
            .await
            .unwrap_err();

        assert!(is_not_found(&err));
        assert_eq!(*seen.lock().unwrap(), vec!["1.4.12"]);
    }

    #[tokio::test]
    async fn test_attempts_are_bounded_by_catalog() {
        let known = KnownVersions::builtin();
        let mut downloader = MockDownloader::new();
        let seen = recording(&mut downloader, |_| Err(not_found("x")));

        let result = download_with_fallback(&downloader, &known, "9.0.0", build).await;

        assert!(result.is_err());
        assert!(seen.lock().unwrap().len() <= known.len() + 1);
    }

    #[tokio::test]
    async fn test_build_failure_stops_before_download() {
        let known = KnownVersions::builtin();
        // strict mock: download must not be called
        let downloader = MockDownloader::new();

        let result = download_with_fallback(&downloader, &known, "1.6.2", |_| {
            anyhow::bail!("install Electron manually")
        })
        .await;
        assert!(result.is_err());
    }
}
