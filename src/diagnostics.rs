#![allow(clippy::module_name_repetitions)]
//! Diagnostic subcommands and the startup info log.

use std::io::{self, Write};

use crate::logging::LOG_TAG;
use crate::properties::PropertyStore;
use crate::safemode::SafemodeTrigger;

/// Version of the framework extension this bootstrap ships with.
pub const XPOSED_VERSION: &str = env!("APP_PROCESS_XPOSED_VERSION");

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Diagnostic {
    /// `--xposedversion`
    Version,
    /// `--xposedtestsafemode`
    TestSafemode,
}

impl Diagnostic {
    /// Recognized only when the flag is the sole argument (argv[0] excluded).
    pub fn detect(args: &[String]) -> Option<Self> {
        match args {
            [only] if only == "--xposedversion" => Some(Diagnostic::Version),
            [only] if only == "--xposedtestsafemode" => Some(Diagnostic::TestSafemode),
            _ => None,
        }
    }

    /// Run the diagnostic, writing its report to `out`. Always exits with 0.
    pub fn run(
        &self,
        out: &mut dyn Write,
        trigger: &dyn SafemodeTrigger,
        skip_delay: bool,
    ) -> io::Result<u8> {
        match self {
            Diagnostic::Version => {
                writeln!(out, "Xposed version: {XPOSED_VERSION}")?;
            }
            Diagnostic::TestSafemode => {
                writeln!(out, "Testing Xposed safemode trigger")?;
                out.flush()?;
                if trigger.detect(skip_delay) {
                    writeln!(out, "Safemode triggered")?;
                } else {
                    writeln!(out, "Safemode not triggered")?;
                }
            }
        }
        out.flush()?;
        Ok(0)
    }
}

/// Log the extension version and the device it runs on.
pub fn log_startup_info(props: &dyn PropertyStore, sdk: i64) {
    tracing::info!(
        target: LOG_TAG,
        version = XPOSED_VERSION,
        build_date = env!("APP_PROCESS_BUILD_DATE"),
        build_target = env!("APP_PROCESS_BUILD_TARGET"),
        rustc = env!("APP_PROCESS_BUILD_RUSTC"),
        "Starting Xposed binary version {XPOSED_VERSION}"
    );
    tracing::info!(
        target: LOG_TAG,
        sdk,
        release = %props.get("ro.build.version.release", ""),
        manufacturer = %props.get("ro.product.manufacturer", ""),
        model = %props.get("ro.product.model", ""),
        abi = %props.get("ro.product.cpu.abi", ""),
        "Device"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(bool);

    impl SafemodeTrigger for Fixed {
        fn detect(&self, _skip_delay: bool) -> bool {
            self.0
        }
    }

    fn sv(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_detect_only_sole_argument() {
        assert_eq!(Diagnostic::detect(&sv(&["--xposedversion"])), Some(Diagnostic::Version));
        assert_eq!(
            Diagnostic::detect(&sv(&["--xposedtestsafemode"])),
            Some(Diagnostic::TestSafemode)
        );
        assert_eq!(Diagnostic::detect(&sv(&["--xposedversion", "x"])), None);
        assert_eq!(Diagnostic::detect(&sv(&["/system/bin", "--xposedversion"])), None);
        assert_eq!(Diagnostic::detect(&[]), None);
    }

    #[test]
    fn test_version_output() {
        let mut out = Vec::new();
        let code = Diagnostic::Version.run(&mut out, &Fixed(true), false).expect("run");
        assert_eq!(code, 0);
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            format!("Xposed version: {XPOSED_VERSION}\n")
        );
    }

    #[test]
    fn test_safemode_outcomes() {
        let mut out = Vec::new();
        Diagnostic::TestSafemode.run(&mut out, &Fixed(true), true).expect("run");
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "Testing Xposed safemode trigger\nSafemode triggered\n"
        );

        let mut out = Vec::new();
        Diagnostic::TestSafemode.run(&mut out, &Fixed(false), true).expect("run");
        assert!(String::from_utf8(out)
            .expect("utf8")
            .ends_with("Safemode not triggered\n"));
    }
}
