//! Environment and host introspection.

use std::env;

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn env_var_impl(&self, key: &str) -> Result<String, env::VarError> {
        env::var(key)
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn host_identification_impl(&self) -> String {
        #[cfg(unix)]
        {
            match nix::sys::utsname::uname() {
                Ok(uts) => format!(
                    "{} {} {}",
                    uts.sysname().to_string_lossy(),
                    uts.release().to_string_lossy(),
                    uts.machine().to_string_lossy()
                ),
                Err(_) => format!("{} {}", env::consts::OS, env::consts::ARCH),
            }
        }
        #[cfg(windows)]
        {
            format!("Windows NT {}", env::consts::ARCH)
        }
        #[cfg(not(any(unix, windows)))]
        {
            format!("{} {}", env::consts::OS, env::consts::ARCH)
        }
    }

    pub(crate) fn pointer_width_impl(&self) -> usize {
        std::mem::size_of::<usize>()
    }

    pub(crate) fn umask_impl(&self) -> u32 {
        #[cfg(unix)]
        {
            use nix::sys::stat::{Mode, umask};
            // umask(2) can only be read by setting it; put the old value straight back.
            let old = umask(Mode::from_bits_truncate(0o022));
            umask(old);
            old.bits() as u32
        }
        #[cfg(not(unix))]
        {
            0
        }
    }
}
