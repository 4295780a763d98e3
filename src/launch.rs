//! Parsed state of one bootstrap invocation.

use std::fmt;

/// Operating mode of the process.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Mode {
    /// Supervisor process that forks application processes.
    Zygote,
    Application,
    /// Command-line tool started through the runtime (`am`, `pm`, ...).
    Tool,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Zygote => "zygote",
            Mode::Application => "application",
            Mode::Tool => "tool",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Launch configuration produced by [`crate::args::parse_launch_args`].
///
/// Exactly one of `mode == Mode::Zygote` and `class_name.is_some()` holds for
/// every value the parser returns.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LaunchConfig {
    /// Directory context for class resolution (first positional argument).
    pub parent_dir: Option<String>,
    pub mode: Mode,
    /// Only meaningful in Zygote mode.
    pub start_system_server: bool,
    pub nice_name: Option<String>,
    /// Dotted class name of the program to run; absent in Zygote mode.
    pub class_name: Option<String>,
    /// Arguments passed verbatim to the class's `main`.
    pub trailing_args: Vec<String>,
    /// Options forwarded to runtime initialization.
    pub vm_args: Vec<String>,
}

impl LaunchConfig {
    pub fn is_zygote(&self) -> bool {
        self.mode == Mode::Zygote
    }
}

/// Convert a dotted class name to the slash form used by class lookup.
pub fn to_slash_class_name(class_name: &str) -> String {
    class_name.replace('.', "/")
}
