//! System property access with default substitution.
//!
//! Reads never fail: a missing property or an unavailable store yields the
//! caller-supplied default.

use std::collections::BTreeMap;

/// Read-only view of the platform's system-property store.
pub trait PropertyStore {
    /// Value of `key`, or `default` when unset or unreadable.
    fn get(&self, key: &str, default: &str) -> String;

    fn get_int(&self, key: &str, default: i64) -> i64 {
        self.get(key, "")
            .trim()
            .parse()
            .unwrap_or(default)
    }
}

/// The platform property store (`__system_property_get` on Android).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProperties;

#[cfg(target_os = "android")]
impl PropertyStore for SystemProperties {
    fn get(&self, key: &str, default: &str) -> String {
        use std::ffi::{CStr, CString};

        let Ok(name) = CString::new(key) else {
            return default.to_string();
        };
        let mut buf = [0 as libc::c_char; libc::PROP_VALUE_MAX as usize];
        // SAFETY: buf holds PROP_VALUE_MAX bytes, the documented maximum
        // including the terminating NUL.
        let len = unsafe { libc::__system_property_get(name.as_ptr(), buf.as_mut_ptr()) };
        if len <= 0 {
            return default.to_string();
        }
        // SAFETY: the store NUL-terminates the value inside buf.
        let value = unsafe { CStr::from_ptr(buf.as_ptr()) };
        value.to_string_lossy().into_owned()
    }
}

#[cfg(not(target_os = "android"))]
impl PropertyStore for SystemProperties {
    fn get(&self, _key: &str, default: &str) -> String {
        default.to_string()
    }
}

/// Fixed properties layered over a fallback store.
#[derive(Debug, Clone)]
pub struct LayeredProperties<S> {
    overrides: BTreeMap<String, String>,
    fallback: S,
}

impl<S: PropertyStore> LayeredProperties<S> {
    pub fn new(overrides: BTreeMap<String, String>, fallback: S) -> Self {
        Self {
            overrides,
            fallback,
        }
    }
}

impl<S: PropertyStore> PropertyStore for LayeredProperties<S> {
    fn get(&self, key: &str, default: &str) -> String {
        match self.overrides.get(key) {
            Some(v) => v.clone(),
            None => self.fallback.get(key, default),
        }
    }
}

impl PropertyStore for BTreeMap<String, String> {
    fn get(&self, key: &str, default: &str) -> String {
        BTreeMap::get(self, key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }
}
