//! Bootstrap of the managed-runtime host process (`app_process`).
//!
//! The binary decides how this process runs (supervisor, application or
//! tool), whether the injected framework extension is loaded, and which
//! runtime entry class starts, then hands off to the runtime. The runtime
//! drives [`lifecycle::LifecycleHandler`] while it runs.

pub mod args;
pub mod bootstrap;
pub mod color;
pub mod compat;
pub mod diagnostics;
pub mod entry;
pub mod errors;
pub mod extension;
pub mod identity;
pub mod launch;
pub mod lifecycle;
pub mod logging;
pub mod platform;
pub mod properties;
pub mod runtime;
pub mod safemode;
pub mod settings;
pub mod util;

pub use args::parse_launch_args;
pub use bootstrap::{hand_off, prepare_launch, BootstrapEnv, Launch};
pub use compat::{attempt_compat_fixup, CompatOutcome};
pub use entry::{select_entry_point, RuntimeEntryPoint};
pub use errors::{exit_code_for_bootstrap_error, exit_code_for_io_error, BootstrapError};
pub use extension::{ExtensionFlags, GateOutcome};
pub use launch::{LaunchConfig, Mode};
pub use lifecycle::{AppRuntime, LifecycleEvent, LifecycleHandler, LifecyclePhase};
pub use safemode::{SafemodeDecision, SafemodeReason, SafemodeTrigger};
pub use settings::Settings;
