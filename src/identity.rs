//! Process renaming: argv[0] storage and the kernel task name.
//!
//! The argv[0] storage is captured from the `.init_array` constructor
//! arguments at process start and handed out as an explicit value.

use std::ffi::CString;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

use nix::errno::Errno;

use crate::logging::LOG_TAG;

static ARGV0: AtomicPtr<libc::c_char> = AtomicPtr::new(ptr::null_mut());

#[cfg(any(target_os = "linux", target_os = "android"))]
#[used]
#[link_section = ".init_array.00099"]
static CAPTURE_ARGV: extern "C" fn(
    libc::c_int,
    *const *const libc::c_char,
    *const *const libc::c_char,
) = capture_argv;

#[cfg(any(target_os = "linux", target_os = "android"))]
extern "C" fn capture_argv(
    argc: libc::c_int,
    argv: *const *const libc::c_char,
    _envp: *const *const libc::c_char,
) {
    if argc > 0 && !argv.is_null() {
        // SAFETY: the loader passes argc valid entries in argv.
        let first = unsafe { *argv };
        ARGV0.store(first as *mut libc::c_char, Ordering::Relaxed);
    }
}

/// Writable storage whose contents show up as the process's argv[0].
pub trait Argv0Storage {
    /// The bytes of the original argv[0], without the terminating NUL.
    fn buffer(&mut self) -> &mut [u8];
}

/// Updates the externally visible process name.
pub trait ProcessNamer {
    fn set_name(&mut self, name: &str) -> Result<(), Errno>;
}

/// argv[0] of this process as laid out by the loader.
#[derive(Debug)]
pub struct OriginalArgv0 {
    ptr: *mut u8,
    len: usize,
}

impl OriginalArgv0 {
    /// The captured argv[0], if the loader provided one.
    pub fn capture() -> Option<Self> {
        let p = ARGV0.load(Ordering::Relaxed);
        if p.is_null() {
            return None;
        }
        // SAFETY: p points at the NUL-terminated argv[0] string of this process.
        let len = unsafe { libc::strlen(p) };
        Some(Self {
            ptr: p.cast::<u8>(),
            len,
        })
    }
}

impl Argv0Storage for OriginalArgv0 {
    fn buffer(&mut self) -> &mut [u8] {
        // SAFETY: argv strings live in writable process memory for the whole
        // process lifetime; len excludes the NUL terminator.
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.len) }
    }
}

impl Argv0Storage for Vec<u8> {
    fn buffer(&mut self) -> &mut [u8] {
        self.as_mut_slice()
    }
}

/// `prctl(PR_SET_NAME)`; the kernel keeps the first 15 bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct KernelNamer;

impl ProcessNamer for KernelNamer {
    fn set_name(&mut self, name: &str) -> Result<(), Errno> {
        let c = CString::new(name).map_err(|_| Errno::EINVAL)?;
        nix::sys::prctl::set_name(&c)
    }
}

/// Copy as much of `src` as fits into `dst`, always NUL-terminated
/// (strlcpy with `dst.len()` as size). Returns the number of bytes copied.
pub fn copy_truncated(dst: &mut [u8], src: &[u8]) -> usize {
    let Some(room) = dst.len().checked_sub(1) else {
        return 0;
    };
    let n = src.len().min(room);
    dst[..n].copy_from_slice(&src[..n]);
    dst[n] = 0;
    n
}

/// Apply `--nice-name` (or the Zygote default). No-op for an empty name.
/// Returns whether a rename was attempted.
pub fn apply_nice_name(
    nice_name: Option<&str>,
    argv0: Option<&mut dyn Argv0Storage>,
    namer: &mut dyn ProcessNamer,
) -> bool {
    let Some(name) = nice_name.filter(|n| !n.is_empty()) else {
        return false;
    };
    match argv0 {
        Some(storage) => {
            copy_truncated(storage.buffer(), name.as_bytes());
        }
        None => tracing::warn!(target: LOG_TAG, "argv[0] storage unavailable; not rewritten"),
    }
    if let Err(e) = namer.set_name(name) {
        tracing::warn!(target: LOG_TAG, "could not set process name to '{name}': {e}");
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingNamer(Vec<String>);

    impl ProcessNamer for RecordingNamer {
        fn set_name(&mut self, name: &str) -> Result<(), Errno> {
            self.0.push(name.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_copy_truncated_fits() {
        let mut buf = b"/system/bin/app_process".to_vec();
        let n = copy_truncated(&mut buf, b"zygote");
        assert_eq!(n, 6);
        assert_eq!(&buf[..7], b"zygote\0");
        // Bytes after the terminator are left as they were.
        assert_eq!(&buf[7..], b"n/app_process");
    }

    #[test]
    fn test_copy_truncated_never_overflows() {
        let mut buf = b"app".to_vec();
        let n = copy_truncated(&mut buf, b"system_server");
        assert_eq!(n, 2);
        assert_eq!(buf, b"sy\0");

        let mut empty: Vec<u8> = Vec::new();
        assert_eq!(copy_truncated(&mut empty, b"x"), 0);
    }

    #[test]
    fn test_apply_nice_name_renames_both() {
        let mut storage = b"/system/bin/app_process".to_vec();
        let mut namer = RecordingNamer::default();
        let applied = apply_nice_name(Some("zygote"), Some(&mut storage), &mut namer);
        assert!(applied);
        assert_eq!(&storage[..7], b"zygote\0");
        assert_eq!(namer.0, vec!["zygote".to_string()]);
    }

    #[test]
    fn test_empty_or_missing_name_is_a_no_op() {
        let mut storage = b"app_process".to_vec();
        let mut namer = RecordingNamer::default();
        assert!(!apply_nice_name(Some(""), Some(&mut storage), &mut namer));
        assert!(!apply_nice_name(None, Some(&mut storage), &mut namer));
        assert_eq!(storage, b"app_process");
        assert!(namer.0.is_empty());
    }

    #[test]
    fn test_missing_storage_still_sets_kernel_name() {
        let mut namer = RecordingNamer::default();
        assert!(apply_nice_name(Some("system_server"), None, &mut namer));
        assert_eq!(namer.0, vec!["system_server".to_string()]);
    }
}
