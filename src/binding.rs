//! The binding file consuming code reads to locate the installed binary.

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::host::{Host, PACKAGE_NAME};
use crate::runtime::Runtime;

pub const BINDING_FILE_NAME: &str = "electron-binary.json";

/// `<vendor-dir>/uuf6429/electron-installer/electron-binary.json`
pub fn binding_path<H: Host + ?Sized>(host: &H) -> PathBuf {
    host.vendor_dir().join(PACKAGE_NAME).join(BINDING_FILE_NAME)
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Absolute path of the placed executable.
    pub bin: String,
    /// Directory containing it.
    pub dir: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Binding {
    pub fn new(bin: &Path, version: Option<&str>) -> Self {
        let dir = bin.parent().unwrap_or(bin);
        Self {
            bin: bin.to_string_lossy().into_owned(),
            dir: dir.to_string_lossy().into_owned(),
            version: version.map(String::from),
        }
    }

    pub fn bin_path(&self) -> &Path {
        Path::new(&self.bin)
    }

    /// Pretty JSON with a trailing newline. Same input, same bytes.
    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let content = runtime
            .read_to_string(path)
            .with_context(|| format!("Failed to read binding file {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse binding file {:?}", path))
    }

    /// Written to a temporary sibling first and renamed into place.
    #[tracing::instrument(skip(runtime, self))]
    pub fn save<R: Runtime>(&self, runtime: &R, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        if let Some(parent) = path.parent() {
            runtime
                .create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        let tmp_path = path.with_extension("json.tmp");
        runtime.write(&tmp_path, json.as_bytes())?;
        runtime
            .rename(&tmp_path, path)
            .with_context(|| format!("Failed to move binding file into {:?}", path))?;
        debug!("Wrote binding {:?}", path);
        Ok(())
    }
}
