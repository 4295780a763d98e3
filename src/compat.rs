#![allow(clippy::module_name_repetitions)]
//! Compat memory layout fixup.
//!
//! Newer kernels map the address space top-down, which breaks programs that
//! embed an old copy of the platform linker. On affected platforms the
//! bootstrap sets `ADDR_COMPAT_LAYOUT` and re-executes itself once; the
//! re-executed image carries `NO_ADDR_COMPAT_LAYOUT_FIXUP` and skips the step.

use std::convert::Infallible;
use std::env;
use std::ffi::CString;
use std::path::Path;

use nix::errno::Errno;
use nix::sys::personality::{self, Persona};

use crate::errors::BootstrapError;
use crate::logging::LOG_TAG;
use crate::properties::PropertyStore;

/// Environment marker carried by the re-executed image.
pub const COMPAT_MARKER_ENV: &str = "NO_ADDR_COMPAT_LAYOUT_FIXUP";

const COMPAT_MIN_SDK: i64 = 16;

/// Result of [`attempt_compat_fixup`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CompatOutcome {
    /// Bootstrap continues in this process image.
    Continue,
    /// The process image was replaced; the caller must not proceed.
    ProcessReplaced,
}

/// When the fixup applies at all.
#[derive(Copy, Clone, Debug)]
pub struct CompatPolicy {
    /// The CPU architecture needs the compat layout.
    pub arch_affected: bool,
    pub sdk: i64,
}

impl CompatPolicy {
    pub fn for_this_build(sdk: i64) -> Self {
        Self {
            arch_affected: cfg!(target_arch = "arm"),
            sdk,
        }
    }

    fn applies(&self) -> bool {
        self.arch_affected && self.sdk >= COMPAT_MIN_SDK
    }
}

/// Process facilities touched by the fixup.
pub trait CompatHost {
    fn marker_present(&self) -> bool;
    fn set_marker(&mut self);
    fn clear_marker(&mut self);
    /// Whether the process runs inside the emulator.
    fn is_emulator(&self) -> bool;
    fn compat_layout_set(&self) -> Result<bool, Errno>;
    fn set_compat_layout(&mut self) -> Result<(), Errno>;
    /// Replace the current process image. Ok means the image was replaced;
    /// the real host never returns in that case.
    fn replace_image(&mut self, exec_path: &Path, argv: &[String]) -> Result<(), Errno>;
}

/// Run the fixup once. See the module documentation.
pub fn attempt_compat_fixup(
    host: &mut dyn CompatHost,
    policy: CompatPolicy,
    exec_path: &Path,
    argv: &[String],
) -> Result<CompatOutcome, BootstrapError> {
    if !policy.applies() {
        return Ok(CompatOutcome::Continue);
    }

    if !host.marker_present() && !host.is_emulator() {
        let already_set = host.compat_layout_set().unwrap_or_else(|e| {
            tracing::warn!(target: LOG_TAG, "personality query failed: {e}");
            true
        });
        if !already_set {
            // The marker alone prevents a second re-exec, so a failed
            // personality change is not fatal.
            if let Err(e) = host.set_compat_layout() {
                tracing::warn!(target: LOG_TAG, "could not set compat memory layout: {e}");
            }
            host.set_marker();
            tracing::info!(
                target: LOG_TAG,
                exec_path = %exec_path.display(),
                "re-executing with compat memory layout"
            );
            host.replace_image(exec_path, argv)
                .map_err(BootstrapError::CompatExec)?;
            return Ok(CompatOutcome::ProcessReplaced);
        }
    }

    host.clear_marker();
    Ok(CompatOutcome::Continue)
}

/// The running process: environment, `personality(2)` and `execv(2)`.
pub struct ProcessCompatHost<'a> {
    props: &'a dyn PropertyStore,
}

impl<'a> ProcessCompatHost<'a> {
    pub fn new(props: &'a dyn PropertyStore) -> Self {
        Self { props }
    }
}

impl CompatHost for ProcessCompatHost<'_> {
    fn marker_present(&self) -> bool {
        env::var_os(COMPAT_MARKER_ENV).is_some()
    }

    fn set_marker(&mut self) {
        env::set_var(COMPAT_MARKER_ENV, "1");
    }

    fn clear_marker(&mut self) {
        env::remove_var(COMPAT_MARKER_ENV);
    }

    fn is_emulator(&self) -> bool {
        self.props.get("ro.kernel.qemu", "") == "1"
    }

    fn compat_layout_set(&self) -> Result<bool, Errno> {
        Ok(personality::get()?.contains(Persona::ADDR_COMPAT_LAYOUT))
    }

    fn set_compat_layout(&mut self) -> Result<(), Errno> {
        let current = personality::get()?;
        personality::set(current | Persona::ADDR_COMPAT_LAYOUT).map(|_| ())
    }

    fn replace_image(&mut self, exec_path: &Path, argv: &[String]) -> Result<(), Errno> {
        let path = path_cstring(exec_path)?;
        let args = argv
            .iter()
            .map(|a| CString::new(a.as_bytes()).map_err(|_| Errno::EINVAL))
            .collect::<Result<Vec<_>, _>>()?;
        let never: Infallible = nix::unistd::execv(&path, &args)?;
        match never {}
    }
}

fn path_cstring(p: &Path) -> Result<CString, Errno> {
    use std::os::unix::ffi::OsStrExt;
    CString::new(p.as_os_str().as_bytes()).map_err(|_| Errno::EINVAL)
}
