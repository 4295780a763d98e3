//! Platform probe: SDK level and the optional tracing hook.

use std::ffi::CStr;
use std::fmt;

use crate::logging::LOG_TAG;
use crate::properties::PropertyStore;

/// First SDK level exporting `atrace_set_tracing_enabled`.
const TRACING_HOOK_MIN_SDK: i64 = 18;

const TRACING_HOOK_SYMBOL: &CStr = c"atrace_set_tracing_enabled";

/// `atrace_set_tracing_enabled(bool)`, resolved at startup when available.
#[derive(Clone, Copy)]
pub struct TracingHook(extern "C" fn(bool));

impl TracingHook {
    pub fn from_fn(f: extern "C" fn(bool)) -> Self {
        Self(f)
    }

    pub fn set_enabled(&self, enabled: bool) {
        (self.0)(enabled)
    }

    /// Look the symbol up in the global namespace of the process.
    pub fn resolve() -> Result<Self, String> {
        // SAFETY: dlerror/dlsym are called with a valid NUL-terminated name;
        // the returned address is only reinterpreted when non-null, and the
        // symbol has the C signature `void (bool)`.
        unsafe {
            libc::dlerror();
            let addr = libc::dlsym(libc::RTLD_DEFAULT, TRACING_HOOK_SYMBOL.as_ptr());
            let err = libc::dlerror();
            if !err.is_null() {
                return Err(CStr::from_ptr(err).to_string_lossy().into_owned());
            }
            if addr.is_null() {
                return Err("symbol resolved to null".to_string());
            }
            Ok(Self(std::mem::transmute::<*mut libc::c_void, extern "C" fn(bool)>(addr)))
        }
    }
}

impl fmt::Debug for TracingHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TracingHook").field(&(self.0 as *const ())).finish()
    }
}

/// Facts about the running platform, determined once per process.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformInfo {
    pub sdk: i64,
    pub tracing_hook: Option<TracingHook>,
}

impl PlatformInfo {
    pub fn probe(props: &dyn PropertyStore) -> Self {
        let sdk = props.get_int("ro.build.version.sdk", 0);
        let tracing_hook = if sdk >= TRACING_HOOK_MIN_SDK {
            match TracingHook::resolve() {
                Ok(hook) => Some(hook),
                Err(e) => {
                    tracing::error!(
                        target: LOG_TAG,
                        "Could not find address for function atrace_set_tracing_enabled: {e}"
                    );
                    None
                }
            }
        } else {
            None
        };
        Self { sdk, tracing_hook }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, Ordering};

    static HOOK_CALLED: AtomicBool = AtomicBool::new(false);

    extern "C" fn record_hook(enabled: bool) {
        HOOK_CALLED.store(enabled, Ordering::SeqCst);
    }

    #[test]
    fn test_old_sdk_skips_hook_resolution() {
        let props: BTreeMap<String, String> =
            [("ro.build.version.sdk".to_string(), "16".to_string())].into();
        let info = PlatformInfo::probe(&props);
        assert_eq!(info.sdk, 16);
        assert!(info.tracing_hook.is_none());
    }

    #[test]
    fn test_missing_sdk_defaults_to_zero() {
        let info = PlatformInfo::probe(&BTreeMap::<String, String>::new());
        assert_eq!(info.sdk, 0);
        assert!(info.tracing_hook.is_none());
    }

    #[test]
    fn test_hook_from_fn_is_invoked() {
        let hook = TracingHook::from_fn(record_hook);
        hook.set_enabled(true);
        assert!(HOOK_CALLED.load(Ordering::SeqCst));
    }
}
