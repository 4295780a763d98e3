//! Interfaces of the managed runtime and its neighbours.
//!
//! The bootstrap does not implement a runtime; it talks to one through
//! these traits and implements [`crate::lifecycle::LifecycleHandler`] for the
//! runtime to call back into.

pub mod exec;

use std::fmt;
use std::num::NonZeroUsize;

use anyhow::Result;

use crate::entry::RuntimeEntryPoint;
use crate::launch::LaunchConfig;
use crate::lifecycle::LifecycleHandler;
use crate::logging::LOG_TAG;

/// Opaque reference to a class object owned by the runtime.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct ClassHandle(NonZeroUsize);

impl ClassHandle {
    pub fn new(raw: usize) -> Option<Self> {
        NonZeroUsize::new(raw).map(Self)
    }

    pub fn raw(&self) -> usize {
        self.0.get()
    }
}

impl fmt::Debug for ClassHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassHandle({:#x})", self.0.get())
    }
}

/// Class lookup from native code.
pub trait NativeBridge {
    /// Resolve a class by slash-separated descriptor (`com/example/Main`).
    /// The returned reference is only valid for the current native frame.
    fn find_class(&mut self, descriptor: &str) -> Option<ClassHandle>;
    /// Promote a frame-local reference to a global one.
    fn new_global_ref(&mut self, class: ClassHandle) -> Option<ClassHandle>;
}

/// Process-wide IPC layer (binder thread pool).
pub trait IpcLayer {
    fn start_thread_pool(&self);
    /// Detach this process from the IPC driver.
    fn stop_process(&self);
}

/// The managed runtime the bootstrap hands off to.
pub trait ManagedRuntime {
    /// Options forwarded verbatim to runtime initialization.
    fn add_vm_arguments(&mut self, args: &[String]);
    /// Start the runtime and run `entry`. The runtime drives `handler`
    /// through the lifecycle while it runs.
    fn start(
        &mut self,
        entry: &RuntimeEntryPoint,
        config: &LaunchConfig,
        handler: &mut dyn LifecycleHandler,
    ) -> Result<()>;
    /// Invoke `main(String[])` of a resolved class.
    fn call_main(&mut self, class_name: &str, class: Option<ClassHandle>, args: &[String]) -> Result<()>;
    /// Default exit handling of the runtime.
    fn default_exit(&mut self, code: i32);
}

/// IPC layer for hosts without an IPC driver; only logs the requests.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedIpc;

impl IpcLayer for DetachedIpc {
    fn start_thread_pool(&self) {
        tracing::debug!(target: LOG_TAG, "no IPC driver: thread pool not started");
    }

    fn stop_process(&self) {
        tracing::debug!(target: LOG_TAG, "no IPC driver: nothing to stop");
    }
}
