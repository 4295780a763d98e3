//! Safemode gate: lets an operator boot without the extension.
//!
//! Evaluated only for the supervisor. The operator override short-circuits
//! the physical trigger, which may block for a bounded window.

pub mod evdev;

use crate::extension::ExtensionFlags;
use crate::launch::Mode;
use crate::logging::LOG_TAG;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SafemodeReason {
    TriggerDetected,
    /// Safemode detection itself was turned off by the operator flag.
    DisabledByFlag,
    NotTriggered,
}

/// Outcome of the safemode gate. Immutable once created.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct SafemodeDecision {
    pub disabled: bool,
    pub reason: SafemodeReason,
}

impl SafemodeDecision {
    pub fn new(disabled: bool, reason: SafemodeReason) -> Self {
        Self { disabled, reason }
    }
}

/// Detection of the physical safemode trigger.
pub trait SafemodeTrigger {
    /// Whether the operator requested safemode. Unless `skip_delay` is set the
    /// call may wait for a bounded window.
    fn detect(&self, skip_delay: bool) -> bool;
}

/// Run the gate for `mode`. `None` outside Zygote mode.
///
/// A detected trigger also persists the disable decision in the flag
/// directory; failing to write it is logged and does not change the result.
pub fn evaluate_safemode(
    mode: Mode,
    flags: &ExtensionFlags,
    trigger: &dyn SafemodeTrigger,
) -> Option<SafemodeDecision> {
    if mode != Mode::Zygote {
        return None;
    }
    if flags.safemode_disabled() {
        tracing::debug!(target: LOG_TAG, "safemode detection disabled by flag");
        return Some(SafemodeDecision::new(false, SafemodeReason::DisabledByFlag));
    }
    if !trigger.detect(flags.skip_safemode_delay()) {
        return Some(SafemodeDecision::new(false, SafemodeReason::NotTriggered));
    }

    tracing::warn!(target: LOG_TAG, "safemode triggered, disabling the extension");
    if let Err(e) = flags.persist_disable() {
        tracing::error!(
            target: LOG_TAG,
            conf_dir = %flags.conf_dir().display(),
            "could not persist disable flag: {e}"
        );
    }
    Some(SafemodeDecision::new(true, SafemodeReason::TriggerDetected))
}
