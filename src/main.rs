use std::env;
use std::io;
use std::process::ExitCode;

use app_process::bootstrap::report_config_error;
use app_process::color::{color_enabled_stderr, log_error_stderr};
use app_process::compat::{CompatPolicy, ProcessCompatHost};
use app_process::diagnostics::{log_startup_info, Diagnostic};
use app_process::identity::{apply_nice_name, Argv0Storage, KernelNamer, OriginalArgv0};
use app_process::logging::{self, LOG_TAG};
use app_process::platform::PlatformInfo;
use app_process::properties::{LayeredProperties, PropertyStore, SystemProperties};
use app_process::runtime::exec::ExecRuntime;
use app_process::runtime::DetachedIpc;
use app_process::safemode::evdev::KeyTrigger;
use app_process::{
    attempt_compat_fixup, exit_code_for_bootstrap_error, exit_code_for_io_error, hand_off,
    prepare_launch, AppRuntime, BootstrapEnv, CompatOutcome, ExtensionFlags, Settings,
};

fn main() -> ExitCode {
    logging::init();

    let argv: Vec<String> = env::args_os()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    let args = argv.get(1..).unwrap_or(&[]);

    let settings = Settings::load();
    let props = LayeredProperties::new(settings.properties.clone(), SystemProperties);
    let flags = ExtensionFlags::new(&settings.conf_dir);
    let trigger = KeyTrigger::from_settings(&settings);

    // Diagnostic subcommands exit before anything else happens.
    if let Some(diag) = Diagnostic::detect(args) {
        let mut out = io::stdout().lock();
        return match diag.run(&mut out, &trigger, flags.skip_safemode_delay()) {
            Ok(code) => ExitCode::from(code),
            Err(e) => {
                eprintln!("app_process: {e}");
                ExitCode::from(exit_code_for_io_error(&e))
            }
        };
    }

    let sdk = props.get_int("ro.build.version.sdk", 0);
    let mut host = ProcessCompatHost::new(&props);
    match attempt_compat_fixup(
        &mut host,
        CompatPolicy::for_this_build(sdk),
        &settings.exec_path,
        &argv,
    ) {
        Ok(CompatOutcome::Continue) => {}
        Ok(CompatOutcome::ProcessReplaced) => return ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(target: LOG_TAG, fatal = true, "{e}");
            log_error_stderr(color_enabled_stderr(), &format!("app_process: {e}"));
            std::process::abort();
        }
    }

    let platform = PlatformInfo::probe(&props);
    let env = BootstrapEnv {
        props: &props,
        trigger: &trigger,
        flags: &flags,
        installer_package: &settings.installer_package,
        sdk: platform.sdk,
    };
    let launch = match prepare_launch(args, &env) {
        Ok(l) => l,
        Err(e) => {
            report_config_error(&e);
            return ExitCode::from(exit_code_for_bootstrap_error(&e));
        }
    };

    let mut argv0 = OriginalArgv0::capture();
    apply_nice_name(
        launch.config.nice_name.as_deref(),
        argv0.as_mut().map(|a| a as &mut dyn Argv0Storage),
        &mut KernelNamer,
    );
    log_startup_info(&props, platform.sdk);

    let ipc = DetachedIpc;
    let mut handler = AppRuntime::new(&launch.config, &ipc, platform.tracing_hook);
    let mut runtime = ExecRuntime::new(&settings.launcher, settings.dry_run);
    match hand_off(&launch, &mut runtime, &mut handler) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log_error_stderr(color_enabled_stderr(), &format!("app_process: {e:#}"));
            let code = e
                .downcast_ref::<io::Error>()
                .map(exit_code_for_io_error)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}
