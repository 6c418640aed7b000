use crate::runtime::Runtime;
use anyhow::{Context, Result, bail};
use log::{debug, info};
use std::collections::HashSet;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use zip::ZipArchive;

use super::ArchiveExtractor;

const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

/// Extractor for .zip archives
#[derive(Default)]
pub struct ZipExtractor;

impl ArchiveExtractor for ZipExtractor {
    fn can_handle(&self, archive_path: &Path) -> bool {
        let name = archive_path.to_string_lossy().to_lowercase();
        name.ends_with(".zip")
    }

    #[tracing::instrument(skip(self, runtime))]
    fn extract<R: Runtime + 'static>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<()> {
        debug!("Extracting zip archive to {:?}...", extract_to);
        let mut file = runtime
            .open(archive_path)
            .with_context(|| format!("Failed to open archive at {:?}", archive_path))?;

        // ZipArchive needs Read + Seek; Runtime::open only gives Read.
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)
            .with_context(|| format!("Failed to read archive {:?}", archive_path))?;
        let mut archive = ZipArchive::new(std::io::Cursor::new(buffer))
            .with_context(|| format!("Failed to parse ZIP archive {:?}", archive_path))?;

        if archive.is_empty() {
            bail!("Archive appears to be empty.");
        }

        runtime.create_dir_all(extract_to)?;

        // Relative paths of the links extracted so far.
        let mut links: HashSet<PathBuf> = HashSet::new();

        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .with_context(|| format!("Failed to read ZIP entry {}", i))?;

            let Some(entry_path) = entry.enclosed_name() else {
                debug!("Skipping entry with invalid path: {}", entry.name());
                continue;
            };
            if entry_path.ancestors().any(|a| links.contains(a)) {
                bail!(
                    "Refusing to extract {:?}: it goes through a symbolic link",
                    entry_path
                );
            }
            let full_path = extract_to.join(&entry_path);

            if entry.is_dir() {
                runtime.create_dir_all(&full_path)?;
                continue;
            }

            if let Some(parent) = full_path.parent() {
                runtime.create_dir_all(parent)?;
            }

            let mode = entry.unix_mode();
            if mode.is_some_and(|m| m & S_IFMT == S_IFLNK) {
                let mut target = String::new();
                entry
                    .read_to_string(&mut target)
                    .with_context(|| format!("Failed to read link target of {:?}", full_path))?;
                if resolve_link_target(&entry_path, Path::new(&target)).is_none() {
                    bail!(
                        "Refusing to extract link {:?}: target {:?} is outside the archive",
                        entry_path,
                        target
                    );
                }
                runtime
                    .symlink(Path::new(&target), &full_path)
                    .with_context(|| format!("Failed to create link {:?}", full_path))?;
                links.insert(entry_path);
                continue;
            }

            let mut dest_file = runtime.create_file(&full_path)?;
            std::io::copy(&mut entry, &mut dest_file)
                .with_context(|| format!("Failed to extract file {:?}", full_path))?;

            #[cfg(unix)]
            if let Some(mode) = mode
                && let Err(e) = runtime.set_permissions(&full_path, mode & 0o7777)
            {
                debug!("Failed to set permissions on {:?}: {}", full_path, e);
            }
        }

        info!("Extraction complete.");
        Ok(())
    }
}

/// Where `target` lands when read from the directory holding `link`, both
/// relative to the extraction root. `None` if it leaves the root.
fn resolve_link_target(link: &Path, target: &Path) -> Option<PathBuf> {
    let base = link.parent().unwrap_or(Path::new(""));
    let mut resolved: Vec<Component> = Vec::new();
    for component in base.components().chain(target.components()) {
        match component {
            Component::Normal(_) => resolved.push(component),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop()?;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(resolved.iter().collect())
}
