//! One bootstrap invocation: parse, gate, select, hand off.

use anyhow::Result;

use crate::args::{parse_launch_args, USAGE};
use crate::color::{color_enabled_stderr, log_error_stderr, log_warn_stderr};
use crate::diagnostics::XPOSED_VERSION;
use crate::entry::{select_entry_point, RuntimeEntryPoint};
use crate::errors::{display_for_bootstrap_error, BootstrapError};
use crate::extension::{evaluate_gates, ExtensionFlags, GateOutcome};
use crate::launch::LaunchConfig;
use crate::lifecycle::LifecycleHandler;
use crate::logging::LOG_TAG;
use crate::properties::PropertyStore;
use crate::runtime::ManagedRuntime;
use crate::safemode::{evaluate_safemode, SafemodeTrigger};

/// Collaborators consulted while deciding how to launch.
pub struct BootstrapEnv<'a> {
    pub props: &'a dyn PropertyStore,
    pub trigger: &'a dyn SafemodeTrigger,
    pub flags: &'a ExtensionFlags,
    pub installer_package: &'a str,
    pub sdk: i64,
}

/// Everything decided before the hand-off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launch {
    pub config: LaunchConfig,
    pub gates: GateOutcome,
    pub entry: RuntimeEntryPoint,
}

/// Parse `args` (argv[0] excluded), run the gates and select the entry point.
pub fn prepare_launch(args: &[String], env: &BootstrapEnv<'_>) -> Result<Launch, BootstrapError> {
    let config = parse_launch_args(args)?;
    let safemode = evaluate_safemode(config.mode, env.flags, env.trigger);
    let gates = evaluate_gates(
        &config,
        args,
        env.flags,
        env.props,
        env.sdk,
        env.installer_package,
        safemode,
    );
    let entry = select_entry_point(&config, &gates);
    tracing::info!(
        target: LOG_TAG,
        mode = %config.mode,
        class = config.class_name.as_deref().unwrap_or(""),
        entry = %entry.class_name,
        start_argument = %entry.start_argument,
        extension = gates.keep_extension(config.mode),
        "launch prepared"
    );
    Ok(Launch {
        config,
        gates,
        entry,
    })
}

/// Pass the VM arguments and start the selected entry point.
pub fn hand_off(
    launch: &Launch,
    runtime: &mut dyn ManagedRuntime,
    handler: &mut dyn LifecycleHandler,
) -> Result<()> {
    runtime.add_vm_arguments(&launch.config.vm_args);
    runtime.start(&launch.entry, &launch.config, handler)
}

/// Report a fatal configuration error on stderr and in the log.
pub fn report_config_error(e: &BootstrapError) {
    let use_err = color_enabled_stderr();
    let msg = display_for_bootstrap_error(e);
    log_error_stderr(use_err, &format!("Error: {msg}"));
    log_warn_stderr(use_err, USAGE);
    log_warn_stderr(
        use_err,
        &format!("   with Xposed support (version {XPOSED_VERSION})"),
    );
    tracing::error!(target: LOG_TAG, fatal = true, "app_process: {msg}");
}
