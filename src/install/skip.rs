use log::{debug, warn};
use std::path::Path;

use crate::binding::Binding;
use crate::runtime::Runtime;
use crate::version::compare_versions;

/// Version of Electron already placed at `target`, if it can be trusted.
///
/// Taken from the binding file, or from `<target> -v` when the binding has no
/// version. A binding that points somewhere other than `target` counts as
/// not installed.
#[tracing::instrument(skip(runtime))]
pub fn installed_version<R: Runtime>(
    runtime: &R,
    binding_path: &Path,
    target: &Path,
) -> Option<String> {
    if !runtime.exists(binding_path) || !runtime.exists(target) {
        return None;
    }

    let binding = match Binding::load(runtime, binding_path) {
        Ok(binding) => binding,
        Err(e) => {
            warn!("Ignoring unreadable binding file: {:#}", e);
            return None;
        }
    };

    if binding.bin_path() != target {
        debug!(
            "Binding points at {:?}, expected {:?}; reinstalling",
            binding.bin, target
        );
        return None;
    }

    if let Some(version) = binding.version.filter(|v| !v.is_empty()) {
        return Some(version);
    }

    match runtime.command_output(target, &["-v".to_string()]) {
        Ok(output) => {
            let output = output.trim();
            let version = output.strip_prefix('v').unwrap_or(output);
            (!version.is_empty()).then(|| version.to_string())
        }
        Err(e) => {
            warn!("Could not query installed Electron version: {:#}", e);
            None
        }
    }
}

/// An install can be skipped when what is there is at least what was asked for.
pub fn is_current(installed: &str, requested: &str) -> bool {
    compare_versions(installed, requested).is_ge()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;
    use std::path::PathBuf;

    const BINDING: &str = "/v/uuf6429/electron-installer/electron-binary.json";
    const TARGET: &str = "/v/bin/electron";

    fn runtime_with_binding(json: &'static str) -> MockRuntime {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| true);
        runtime
            .expect_read_to_string()
            .with(eq(PathBuf::from(BINDING)))
            .returning(move |_| Ok(json.to_string()));
        runtime
    }

    #[test]
    fn test_is_current() {
        let pairs = [
            ("1.6.2", "1.6.1", true),
            ("1.6.2", "1.6.2", true),
            ("1.4.15", "1.4.9", true),
            ("1.6.1", "1.6.2", false),
            ("1.4.9", "1.4.15", false),
        ];
        for (installed, requested, expected) in pairs {
            assert_eq!(
                is_current(installed, requested),
                expected,
                "{} vs {}",
                installed,
                requested
            );
        }
    }

    #[test]
    fn test_version_from_binding() {
        let runtime = runtime_with_binding(
            r#"{"bin": "/v/bin/electron", "dir": "/v/bin", "version": "1.6.2"}"#,
        );
        assert_eq!(
            installed_version(&runtime, Path::new(BINDING), Path::new(TARGET)).as_deref(),
            Some("1.6.2")
        );
    }

    #[test]
    fn test_version_from_binary() {
        let mut runtime = runtime_with_binding(r#"{"bin": "/v/bin/electron", "dir": "/v/bin"}"#);
        runtime
            .expect_command_output()
            .withf(|program, args| program == Path::new(TARGET) && args == ["-v"])
            .times(1)
            .returning(|_, _| Ok("v1.4.15\n".to_string()));

        assert_eq!(
            installed_version(&runtime, Path::new(BINDING), Path::new(TARGET)).as_deref(),
            Some("1.4.15")
        );
    }

    #[test]
    fn test_binary_query_failure_means_not_installed() {
        let mut runtime = runtime_with_binding(r#"{"bin": "/v/bin/electron", "dir": "/v/bin"}"#);
        runtime
            .expect_command_output()
            .returning(|_, _| Err(anyhow::anyhow!("exec format error")));

        assert_eq!(
            installed_version(&runtime, Path::new(BINDING), Path::new(TARGET)),
            None
        );
    }

    #[test]
    fn test_mismatched_binding_means_not_installed() {
        let runtime = runtime_with_binding(
            r#"{"bin": "/elsewhere/electron", "dir": "/elsewhere", "version": "9.0.0"}"#,
        );
        assert_eq!(
            installed_version(&runtime, Path::new(BINDING), Path::new(TARGET)),
            None
        );
    }

    #[test]
    fn test_unreadable_binding_means_not_installed() {
        let runtime = runtime_with_binding("{ not json");
        assert_eq!(
            installed_version(&runtime, Path::new(BINDING), Path::new(TARGET)),
            None
        );
    }

    #[test]
    fn test_missing_target_means_not_installed() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_exists()
            .with(eq(PathBuf::from(BINDING)))
            .returning(|_| true);
        runtime
            .expect_exists()
            .with(eq(PathBuf::from(TARGET)))
            .returning(|_| false);

        assert_eq!(
            installed_version(&runtime, Path::new(BINDING), Path::new(TARGET)),
            None
        );
    }
}
