#![allow(clippy::module_name_repetitions)]
//! Gates deciding whether the injected framework extension is loaded.
//!
//! Three independent inputs feed the entry selector: a global disable
//! (persisted flag file or incompatible runtime), an ignore predicate for
//! specific commands, and the Zygote-only safemode decision. Any one of
//! them suppresses the extension.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use crate::launch::{LaunchConfig, Mode};
use crate::logging::LOG_TAG;
use crate::properties::PropertyStore;
use crate::safemode::SafemodeDecision;

/// Command-line class of the activity manager tool.
pub const AM_CLASS: &str = "com.android.commands.am.Am";

const RUNTIME_LIB_PROPERTY: &str = "persist.sys.dalvik.vm.lib";
const SUPPORTED_RUNTIME_LIB: &str = "libdvm.so";
/// First SDK level where the runtime library is selectable.
const RUNTIME_SELECTABLE_SDK: i64 = 19;

/// Flag files kept in the extension's configuration directory.
#[derive(Debug, Clone)]
pub struct ExtensionFlags {
    conf_dir: PathBuf,
}

impl ExtensionFlags {
    pub fn new(conf_dir: impl Into<PathBuf>) -> Self {
        Self {
            conf_dir: conf_dir.into(),
        }
    }

    pub fn conf_dir(&self) -> &Path {
        &self.conf_dir
    }

    fn flag(&self, name: &str) -> bool {
        self.conf_dir.join(name).exists()
    }

    /// The extension was disabled by a previous decision.
    pub fn is_disabled(&self) -> bool {
        self.flag("disabled")
    }

    /// The operator turned safemode detection off.
    pub fn safemode_disabled(&self) -> bool {
        self.flag("disable_safemode")
    }

    pub fn skip_safemode_delay(&self) -> bool {
        self.flag("safemode_nodelay")
    }

    /// Persist a disable decision for this and later launches.
    pub fn persist_disable(&self) -> io::Result<()> {
        fs::create_dir_all(&self.conf_dir)?;
        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.conf_dir.join("disabled"))
            .map(|_| ())
    }
}

/// Whether the selected runtime library can host the extension.
pub fn runtime_supported(props: &dyn PropertyStore, sdk: i64) -> bool {
    if sdk < RUNTIME_SELECTABLE_SDK {
        return true;
    }
    let lib = props.get(RUNTIME_LIB_PROPERTY, SUPPORTED_RUNTIME_LIB);
    if lib != SUPPORTED_RUNTIME_LIB {
        tracing::error!(
            target: LOG_TAG,
            "Unsupported runtime library {lib}, extension stays disabled"
        );
        return false;
    }
    true
}

/// Commands that must run without the extension: `am start`/`am broadcast`
/// aimed at the installer, so it can still be reached when the extension
/// breaks the system.
pub fn should_ignore_command(class_name: Option<&str>, args: &[String], installer: &str) -> bool {
    if class_name != Some(AM_CLASS) || installer.is_empty() {
        return false;
    }
    let Some(pos) = args.iter().position(|a| a == AM_CLASS) else {
        return false;
    };
    let rest = &args[pos + 1..];
    match rest.first().map(String::as_str) {
        Some("start" | "broadcast") => {}
        _ => return false,
    }
    let slash = format!("{installer}/");
    let dot = format!("{installer}.");
    rest[1..]
        .iter()
        .any(|a| a == installer || a.starts_with(&slash) || a.starts_with(&dot))
}

/// Inputs of [`crate::entry::select_entry_point`].
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct GateOutcome {
    pub globally_disabled: bool,
    pub command_ignored: bool,
    /// Present only in Zygote mode.
    pub safemode: Option<SafemodeDecision>,
}

impl GateOutcome {
    /// Whether the extension's entry class should be started.
    pub fn keep_extension(&self, mode: Mode) -> bool {
        if self.globally_disabled || self.command_ignored {
            return false;
        }
        match (mode, self.safemode) {
            (Mode::Zygote, Some(decision)) => !decision.disabled,
            _ => true,
        }
    }
}

/// Evaluate the mode-independent gates and combine them with the safemode
/// decision.
pub fn evaluate_gates(
    config: &LaunchConfig,
    args: &[String],
    flags: &ExtensionFlags,
    props: &dyn PropertyStore,
    sdk: i64,
    installer: &str,
    safemode: Option<SafemodeDecision>,
) -> GateOutcome {
    let globally_disabled = flags.is_disabled() || !runtime_supported(props, sdk);
    let command_ignored = should_ignore_command(config.class_name.as_deref(), args, installer);
    GateOutcome {
        globally_disabled,
        command_ignored,
        safemode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::safemode::SafemodeReason;
    use std::collections::BTreeMap;

    const INSTALLER: &str = "de.robv.android.xposed.installer";

    fn sv(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_ignore_am_start_of_installer() {
        let args = sv(&[
            "/system/bin",
            AM_CLASS,
            "start",
            "-n",
            "de.robv.android.xposed.installer/.WelcomeActivity",
        ]);
        assert!(should_ignore_command(Some(AM_CLASS), &args, INSTALLER));

        let args = sv(&["/system/bin", AM_CLASS, "broadcast", "-p", INSTALLER]);
        assert!(should_ignore_command(Some(AM_CLASS), &args, INSTALLER));
    }

    #[test]
    fn test_other_commands_are_not_ignored() {
        let args = sv(&["/system/bin", AM_CLASS, "start", "-n", "com.example/.Main"]);
        assert!(!should_ignore_command(Some(AM_CLASS), &args, INSTALLER));

        let args = sv(&["/system/bin", AM_CLASS, "force-stop", INSTALLER]);
        assert!(!should_ignore_command(Some(AM_CLASS), &args, INSTALLER));

        let args = sv(&["/system/bin", "com.android.commands.pm.Pm", "start", INSTALLER]);
        assert!(!should_ignore_command(
            Some("com.android.commands.pm.Pm"),
            &args,
            INSTALLER
        ));
        assert!(!should_ignore_command(None, &[], INSTALLER));
    }

    #[test]
    fn test_flag_files() {
        let td = tempfile::tempdir().expect("tmpdir");
        let flags = ExtensionFlags::new(td.path().join("conf"));
        assert!(!flags.is_disabled());
        assert!(!flags.safemode_disabled());
        assert!(!flags.skip_safemode_delay());

        flags.persist_disable().expect("persist");
        assert!(flags.is_disabled());
        // Idempotent.
        flags.persist_disable().expect("persist again");

        fs::write(flags.conf_dir().join("disable_safemode"), "").expect("write");
        fs::write(flags.conf_dir().join("safemode_nodelay"), "").expect("write");
        assert!(flags.safemode_disabled());
        assert!(flags.skip_safemode_delay());
    }

    #[test]
    fn test_runtime_support_by_sdk_and_library() {
        let art: BTreeMap<String, String> =
            [(RUNTIME_LIB_PROPERTY.to_string(), "libart.so".to_string())].into();
        assert!(runtime_supported(&art, 18));
        assert!(!runtime_supported(&art, 19));

        let none = BTreeMap::<String, String>::new();
        assert!(runtime_supported(&none, 19));
    }

    #[test]
    fn test_keep_extension_truth_table() {
        let triggered = SafemodeDecision::new(true, SafemodeReason::TriggerDetected);
        let quiet = SafemodeDecision::new(false, SafemodeReason::NotTriggered);

        let base = GateOutcome::default();
        assert!(base.keep_extension(Mode::Tool));
        assert!(base.keep_extension(Mode::Zygote));

        for mode in [Mode::Zygote, Mode::Application, Mode::Tool] {
            let g = GateOutcome {
                globally_disabled: true,
                ..GateOutcome::default()
            };
            assert!(!g.keep_extension(mode));
            let g = GateOutcome {
                command_ignored: true,
                ..GateOutcome::default()
            };
            assert!(!g.keep_extension(mode));
        }

        let g = GateOutcome {
            safemode: Some(triggered),
            ..GateOutcome::default()
        };
        assert!(!g.keep_extension(Mode::Zygote));
        // Safemode only affects the supervisor.
        assert!(g.keep_extension(Mode::Application));

        let g = GateOutcome {
            safemode: Some(quiet),
            ..GateOutcome::default()
        };
        assert!(g.keep_extension(Mode::Zygote));
    }
}
