//! Platform and architecture detection.
//!
//! Electron publishes one archive per `<platform>-<arch>` pair. Detection
//! prefers the override settings and falls back to host introspection through
//! the [`Runtime`]. It never fails: an unsupported host simply yields `None`.

use log::{debug, warn};
use std::fmt;
use std::str::FromStr;

use crate::runtime::Runtime;
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Win32,
    Linux,
    Darwin,
}

impl Platform {
    /// Match a lowercased `uname`-style identification string.
    ///
    /// BSDs are served the darwin build. The "darwin" check must come before "win".
    pub fn from_host_identification(ident: &str) -> Option<Self> {
        let ident = ident.to_lowercase();
        if ident.contains("darwin") || ident.contains("openbsd") || ident.contains("freebsd") {
            Some(Platform::Darwin)
        } else if ident.contains("win") {
            Some(Platform::Win32)
        } else if ident.contains("linux") {
            Some(Platform::Linux)
        } else {
            None
        }
    }

    /// Location of the runnable Electron inside an extracted archive.
    pub fn binary_relative_path(&self) -> &'static str {
        match self {
            Platform::Win32 => "electron.exe",
            Platform::Linux => "electron",
            Platform::Darwin => "Electron.app",
        }
    }

    /// Name of the entry placed in the project's bin directory.
    pub fn executable_name(&self) -> &'static str {
        match self {
            Platform::Win32 => "electron.exe",
            Platform::Linux | Platform::Darwin => "electron",
        }
    }
}

impl FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "win32" => Ok(Platform::Win32),
            "linux" => Ok(Platform::Linux),
            "darwin" => Ok(Platform::Darwin),
            other => anyhow::bail!("Unsupported platform '{}'", other),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Win32 => write!(f, "win32"),
            Platform::Linux => write!(f, "linux"),
            Platform::Darwin => write!(f, "darwin"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    Ia32,
    X64,
}

impl Arch {
    pub fn from_pointer_width(bytes: usize) -> Option<Self> {
        match bytes {
            4 => Some(Arch::Ia32),
            8 => Some(Arch::X64),
            _ => None,
        }
    }
}

impl FromStr for Arch {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ia32" => Ok(Arch::Ia32),
            "x64" => Ok(Arch::X64),
            other => anyhow::bail!("Unsupported architecture '{}'", other),
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arch::Ia32 => write!(f, "ia32"),
            Arch::X64 => write!(f, "x64"),
        }
    }
}

/// Resolved target of a run. Either half may be unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub platform: Option<Platform>,
    pub arch: Option<Arch>,
}

impl Target {
    #[tracing::instrument(skip(runtime, settings))]
    pub fn detect<R: Runtime>(runtime: &R, settings: &Settings) -> Self {
        Self {
            platform: detect_platform(runtime, settings),
            arch: detect_arch(runtime, settings),
        }
    }
}

pub fn detect_platform<R: Runtime>(runtime: &R, settings: &Settings) -> Option<Platform> {
    if let Some(value) = &settings.platform {
        return parse_override(value);
    }
    let ident = runtime.host_identification();
    let platform = Platform::from_host_identification(&ident);
    debug!("Host {:?} detected as platform {:?}", ident, platform);
    platform
}

pub fn detect_arch<R: Runtime>(runtime: &R, settings: &Settings) -> Option<Arch> {
    if let Some(value) = &settings.arch {
        return parse_override(value);
    }
    Arch::from_pointer_width(runtime.pointer_width())
}

fn parse_override<T: FromStr<Err = anyhow::Error>>(value: &str) -> Option<T> {
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!("Ignoring override: {}", e);
            None
        }
    }
}
