use anyhow::{Context, Result, bail};
use log::debug;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;
use crate::settings::Placement;

/// Put `source` at `target` using `placement`.
///
/// The entry is built under a temporary name beside `target` and renamed
/// over it. Directory sources (the macOS app bundle) are always symlinked.
#[tracing::instrument(skip(runtime))]
pub fn place_binary<R: Runtime>(
    runtime: &R,
    source: &Path,
    target: &Path,
    placement: Placement,
) -> Result<()> {
    if !runtime.exists(source) {
        bail!("Electron binary not found at {:?} after download", source);
    }

    let bin_dir = target
        .parent()
        .with_context(|| format!("Invalid target path {:?}", target))?;
    runtime
        .create_dir_all(bin_dir)
        .with_context(|| format!("Failed to create bin directory {:?}", bin_dir))?;

    let placement = if runtime.is_dir(source) {
        Placement::Symlink
    } else {
        placement
    };

    let tmp = temporary_path(target);
    remove_entry(runtime, &tmp)?;

    match placement {
        Placement::Symlink => {
            debug!("Linking {:?} -> {:?}", target, source);
            runtime
                .symlink(source, &tmp)
                .with_context(|| format!("Failed to link {:?} to {:?}", tmp, source))?;
        }
        Placement::Copy => {
            debug!("Copying {:?} to {:?}", source, target);
            runtime
                .copy(source, &tmp)
                .with_context(|| format!("Failed to copy {:?} to {:?}", source, tmp))?;
        }
    }

    // rename cannot replace a real directory
    if runtime.is_dir(target) && !runtime.is_symlink(target) {
        runtime.remove_dir_all(target)?;
    }
    runtime
        .rename(&tmp, target)
        .with_context(|| format!("Failed to move {:?} into place at {:?}", tmp, target))?;

    let mode = 0o777 & !runtime.umask();
    if let Err(e) = runtime.set_permissions(target, mode) {
        debug!("Failed to set permissions {:o} on {:?}: {}", mode, target, e);
    }

    Ok(())
}

fn temporary_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "electron".to_string());
    target.with_file_name(format!(".{}.tmp", name))
}

fn remove_entry<R: Runtime>(runtime: &R, path: &Path) -> Result<()> {
    if runtime.is_symlink(path) {
        runtime.remove_symlink(path)
    } else if runtime.is_dir(path) {
        runtime.remove_dir_all(path)
    } else if runtime.exists(path) {
        runtime.remove_file(path)
    } else {
        Ok(())
    }
}
