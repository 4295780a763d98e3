//! Lifecycle callbacks driven by the managed runtime.
//!
//! Ordering: `VmCreated` first, then at most one of `Started` (applications
//! and tools) or `ZygoteInit` (children forked by the supervisor), then
//! `Exit`. Each phase is entered at most once. The IPC thread pool is stopped
//! exactly once: by `Started` for applications and tools, by `Exit` for the
//! supervisor.
//!
//! `Started` after `ZygoteInit` is rejected: a forked child only receives
//! `ZygoteInit` and keeps the IPC pool running, while `Started` would stop it.

use std::fmt;

use crate::launch::{to_slash_class_name, LaunchConfig};
use crate::logging::LOG_TAG;
use crate::platform::TracingHook;
use crate::runtime::{ClassHandle, IpcLayer, ManagedRuntime, NativeBridge};

pub enum LifecycleEvent<'a> {
    /// The runtime's execution environment exists.
    VmCreated(&'a mut dyn NativeBridge),
    Started,
    ZygoteInit,
    Exit(i32),
}

impl LifecycleEvent<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::VmCreated(_) => "vm-created",
            LifecycleEvent::Started => "started",
            LifecycleEvent::ZygoteInit => "zygote-init",
            LifecycleEvent::Exit(_) => "exit",
        }
    }
}

impl fmt::Debug for LifecycleEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleEvent::Exit(code) => write!(f, "Exit({code})"),
            other => f.write_str(other.name()),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum LifecyclePhase {
    Pending,
    VmCreated,
    Started,
    ZygoteInitialized,
    Exited,
}

impl LifecyclePhase {
    fn next(self, event: &LifecycleEvent<'_>) -> Option<LifecyclePhase> {
        use LifecyclePhase::*;
        match (self, event) {
            (Pending, LifecycleEvent::VmCreated(_)) => Some(VmCreated),
            (VmCreated, LifecycleEvent::Started) => Some(Started),
            (VmCreated, LifecycleEvent::ZygoteInit) => Some(ZygoteInitialized),
            (VmCreated | Started | ZygoteInitialized, LifecycleEvent::Exit(_)) => Some(Exited),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum LifecycleError {
    /// The event is not allowed in the current phase; nothing was done.
    OutOfOrder {
        phase: LifecyclePhase,
        event: &'static str,
    },
    /// The runtime failed while running the program.
    Runtime(anyhow::Error),
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleError::OutOfOrder { phase, event } => {
                write!(f, "lifecycle event '{event}' not allowed in phase {phase:?}")
            }
            LifecycleError::Runtime(e) => write!(f, "runtime failure: {e:#}"),
        }
    }
}

impl std::error::Error for LifecycleError {}

/// Single dispatch point the runtime calls for every lifecycle event.
pub trait LifecycleHandler {
    fn handle(
        &mut self,
        event: LifecycleEvent<'_>,
        runtime: &mut dyn ManagedRuntime,
    ) -> Result<(), LifecycleError>;
}

/// The bootstrap's lifecycle handler.
pub struct AppRuntime<'a> {
    config: &'a LaunchConfig,
    ipc: &'a dyn IpcLayer,
    tracing_hook: Option<TracingHook>,
    class: Option<ClassHandle>,
    phase: LifecyclePhase,
}

impl<'a> AppRuntime<'a> {
    pub fn new(config: &'a LaunchConfig, ipc: &'a dyn IpcLayer, tracing_hook: Option<TracingHook>) -> Self {
        Self {
            config,
            ipc,
            tracing_hook,
            class: None,
            phase: LifecyclePhase::Pending,
        }
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    /// Global reference to the program class, once resolved.
    pub fn class(&self) -> Option<ClassHandle> {
        self.class
    }

    fn on_vm_created(&mut self, bridge: &mut dyn NativeBridge) {
        // Zygote: nothing to resolve, forked children do the work.
        let Some(class_name) = self.config.class_name.as_deref() else {
            return;
        };
        // Resolve now, before boot classes run: later lookups would use the
        // boot class loader and miss non-boot classes.
        let local = bridge.find_class(&to_slash_class_name(class_name));
        self.class = local.and_then(|c| bridge.new_global_ref(c));
        if self.class.is_none() {
            tracing::error!(target: LOG_TAG, "ERROR: could not find class '{class_name}'");
        }
    }

    fn on_started(&mut self, runtime: &mut dyn ManagedRuntime) -> Result<(), LifecycleError> {
        tracing::trace!(target: LOG_TAG, "App process: starting thread pool.");
        self.ipc.start_thread_pool();
        let class_name = self.config.class_name.as_deref().unwrap_or_default();
        let res = runtime.call_main(class_name, self.class, &self.config.trailing_args);
        self.ipc.stop_process();
        res.map_err(LifecycleError::Runtime)
    }

    fn on_zygote_init(&mut self) {
        if let Some(hook) = self.tracing_hook {
            // No longer in the supervisor: tracing can be re-enabled.
            hook.set_enabled(true);
        }
        tracing::trace!(target: LOG_TAG, "App process: starting thread pool.");
        self.ipc.start_thread_pool();
    }

    fn on_exit(&mut self, code: i32, runtime: &mut dyn ManagedRuntime) {
        if self.config.class_name.is_none() {
            self.ipc.stop_process();
        }
        runtime.default_exit(code);
    }
}

impl LifecycleHandler for AppRuntime<'_> {
    fn handle(
        &mut self,
        event: LifecycleEvent<'_>,
        runtime: &mut dyn ManagedRuntime,
    ) -> Result<(), LifecycleError> {
        let Some(next) = self.phase.next(&event) else {
            let err = LifecycleError::OutOfOrder {
                phase: self.phase,
                event: event.name(),
            };
            tracing::error!(target: LOG_TAG, "{err}");
            return Err(err);
        };
        self.phase = next;
        match event {
            LifecycleEvent::VmCreated(bridge) => {
                self.on_vm_created(bridge);
                Ok(())
            }
            LifecycleEvent::Started => self.on_started(runtime),
            LifecycleEvent::ZygoteInit => {
                self.on_zygote_init();
                Ok(())
            }
            LifecycleEvent::Exit(code) => {
                self.on_exit(code, runtime);
                Ok(())
            }
        }
    }
}
