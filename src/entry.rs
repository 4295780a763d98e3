//! Selection of the managed-runtime entry class.

use crate::extension::GateOutcome;
use crate::launch::{LaunchConfig, Mode};

/// Bootstrap class of the injected framework extension.
pub const EXTENSION_CLASS: &str = "de.robv.android.xposed.XposedBridge";
/// Platform entry class for the supervisor.
pub const ZYGOTE_INIT_CLASS: &str = "com.android.internal.os.ZygoteInit";
/// Platform entry class for applications and tools.
pub const RUNTIME_INIT_CLASS: &str = "com.android.internal.os.RuntimeInit";

pub const START_SYSTEM_SERVER_ARG: &str = "start-system-server";

/// Class started by the runtime plus the single argument it receives.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RuntimeEntryPoint {
    pub class_name: String,
    pub start_argument: String,
}

/// Pure function of the launch mode and the gate outcome.
pub fn select_entry_point(config: &LaunchConfig, gates: &GateOutcome) -> RuntimeEntryPoint {
    let class_name = if gates.keep_extension(config.mode) {
        EXTENSION_CLASS
    } else if config.mode == Mode::Zygote {
        ZYGOTE_INIT_CLASS
    } else {
        RUNTIME_INIT_CLASS
    };
    let start_argument = match config.mode {
        Mode::Zygote if config.start_system_server => START_SYSTEM_SERVER_ARG,
        Mode::Zygote => "",
        Mode::Application => "application",
        Mode::Tool => "tool",
    };
    RuntimeEntryPoint {
        class_name: class_name.to_string(),
        start_argument: start_argument.to_string(),
    }
}
