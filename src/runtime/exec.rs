//! Hand-off to an out-of-process runtime launcher.
//!
//! The launcher replaces this process image and receives:
//! `<launcher> <vm args...> <entry class> [start argument] [<class> <args...>]`.
//! Lifecycle callbacks are not delivered on this path; the launcher owns the
//! process from then on.

use std::convert::Infallible;
use std::ffi::CString;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use crate::entry::RuntimeEntryPoint;
use crate::launch::LaunchConfig;
use crate::lifecycle::LifecycleHandler;
use crate::logging::LOG_TAG;
use crate::runtime::{ClassHandle, ManagedRuntime};
use crate::util::shell_join;

#[derive(Debug, Clone)]
pub struct ExecRuntime {
    launcher: PathBuf,
    vm_args: Vec<String>,
    dry_run: bool,
}

impl ExecRuntime {
    pub fn new(launcher: impl Into<PathBuf>, dry_run: bool) -> Self {
        Self {
            launcher: launcher.into(),
            vm_args: Vec::new(),
            dry_run,
        }
    }

    /// Full argument vector of the launcher, argv[0] included.
    pub fn command_line(&self, entry: &RuntimeEntryPoint, config: &LaunchConfig) -> Vec<String> {
        let mut argv: Vec<String> = vec![self.launcher.display().to_string()];
        argv.extend(self.vm_args.iter().cloned());
        argv.push(entry.class_name.clone());
        if !entry.start_argument.is_empty() {
            argv.push(entry.start_argument.clone());
        }
        if let Some(class) = &config.class_name {
            argv.push(class.clone());
            argv.extend(config.trailing_args.iter().cloned());
        }
        argv
    }

    fn exec(&self, argv: &[String]) -> Result<Infallible> {
        let path = CString::new(self.launcher.as_os_str().as_bytes())
            .map_err(|_| anyhow!("launcher path contains NUL: {}", self.launcher.display()))?;
        let args = argv
            .iter()
            .map(|a| CString::new(a.as_bytes()))
            .collect::<Result<Vec<_>, _>>()
            .context("argument contains NUL")?;
        nix::unistd::execv(&path, &args)
            .map_err(io::Error::from)
            .with_context(|| format!("failed to exec {}", self.launcher.display()))
    }
}

impl ManagedRuntime for ExecRuntime {
    fn add_vm_arguments(&mut self, args: &[String]) {
        self.vm_args.extend(args.iter().cloned());
    }

    fn start(
        &mut self,
        entry: &RuntimeEntryPoint,
        config: &LaunchConfig,
        _handler: &mut dyn LifecycleHandler,
    ) -> Result<()> {
        let argv = self.command_line(entry, config);
        let preview = shell_join(&argv);
        if self.dry_run {
            eprintln!("app_process: mode: {}", config.mode);
            eprintln!("app_process: entry: {} {}", entry.class_name, entry.start_argument);
            eprintln!("app_process: exec: {preview}");
            eprintln!("app_process: dry-run requested; not executing the runtime.");
            return Ok(());
        }
        tracing::info!(target: LOG_TAG, "handing off: {preview}");
        let never = self.exec(&argv)?;
        match never {}
    }

    fn call_main(&mut self, class_name: &str, _class: Option<ClassHandle>, _args: &[String]) -> Result<()> {
        Err(anyhow!(
            "cannot call {class_name}.main in-process: the runtime runs in the launcher"
        ))
    }

    fn default_exit(&mut self, code: i32) {
        std::process::exit(code);
    }
}
