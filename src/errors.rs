//! Error mapping guide:
//! - NoClassName and ConflictingMode are configuration errors and exit with 10.
//! - CompatExec is fatal; the caller aborts the process instead of mapping it.
//! - Map io::ErrorKind::NotFound to exit code 127; all other errors to 1.
use std::fmt;
use std::io;

use nix::errno::Errno;

/// Exit status for a launch without a class name outside Zygote mode.
pub const EXIT_NO_CLASS_NAME: u8 = 10;

/// Map an io::Error to a process exit code:
/// - 127 for NotFound (runtime launcher not found)
/// - 1 for all other errors
pub fn exit_code_for_io_error(e: &io::Error) -> u8 {
    if e.kind() == io::ErrorKind::NotFound {
        127
    } else {
        1
    }
}

/// Failures of a single bootstrap invocation.
#[derive(Debug)]
pub enum BootstrapError {
    /// No class name was supplied and `--zygote` was not given.
    NoClassName,
    /// `--zygote` was given together with a class name.
    ConflictingMode(String),
    /// Replacing the process image during the compat layout fixup failed.
    CompatExec(Errno),
}

/// Convert BootstrapError to exit code.
pub fn exit_code_for_bootstrap_error(e: &BootstrapError) -> u8 {
    match e {
        BootstrapError::NoClassName | BootstrapError::ConflictingMode(_) => EXIT_NO_CLASS_NAME,
        BootstrapError::CompatExec(_) => 1,
    }
}

/// Render a user-facing string for BootstrapError.
pub fn display_for_bootstrap_error(e: &BootstrapError) -> String {
    match e {
        BootstrapError::NoClassName => "no class name or --zygote supplied.".to_string(),
        BootstrapError::ConflictingMode(class) => {
            format!("--zygote cannot be combined with class name '{class}'.")
        }
        BootstrapError::CompatExec(errno) => {
            format!("failed to re-exec for compat memory layout: {errno}")
        }
    }
}

impl fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&display_for_bootstrap_error(self))
    }
}

impl std::error::Error for BootstrapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BootstrapError::CompatExec(errno) => Some(errno),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_exit_with_10() {
        assert_eq!(exit_code_for_bootstrap_error(&BootstrapError::NoClassName), 10);
        assert_eq!(
            exit_code_for_bootstrap_error(&BootstrapError::ConflictingMode("a.B".into())),
            10
        );
    }

    #[test]
    fn test_io_errors_map_not_found_to_127() {
        let nf = io::Error::new(io::ErrorKind::NotFound, "missing");
        assert_eq!(exit_code_for_io_error(&nf), 127);
        let other = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(exit_code_for_io_error(&other), 1);
    }

    #[test]
    fn test_display_no_class_name_text() {
        assert_eq!(
            BootstrapError::NoClassName.to_string(),
            "no class name or --zygote supplied."
        );
    }
}
