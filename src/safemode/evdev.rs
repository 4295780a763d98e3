//! Safemode trigger backed by Linux input devices.
//!
//! A volume key held while the supervisor starts triggers safemode at once.
//! Otherwise the key state is sampled for a short window and a number of
//! separate presses triggers it.

use std::fs::{self, File};
use std::os::unix::io::AsRawFd;
use std::path::PathBuf;
use std::time::Duration;

use crate::logging::LOG_TAG;
use crate::safemode::SafemodeTrigger;
use crate::settings::Settings;

pub const KEY_VOLUMEDOWN: u16 = 114;
pub const KEY_VOLUMEUP: u16 = 115;

const KEY_MAX: usize = 0x2ff;
const KEY_BITMAP_LEN: usize = KEY_MAX / 8 + 1;

nix::ioctl_read_buf!(eviocgkey, b'E', 0x18, u8);

/// Source of key state samples.
pub trait KeySampler {
    /// Whether any watched key is down right now.
    fn any_pressed(&mut self) -> bool;
    fn pause(&mut self, d: Duration);
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TriggerPolicy {
    pub window: Duration,
    pub poll: Duration,
    pub presses: u32,
}

impl TriggerPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            window: Duration::from_millis(settings.safemode_window_ms),
            poll: Duration::from_millis(settings.safemode_poll_ms.max(1)),
            presses: settings.safemode_presses.max(1),
        }
    }

    fn samples(&self) -> u128 {
        self.window.as_millis() / self.poll.as_millis().max(1)
    }
}

/// Counts released-to-pressed transitions.
#[derive(Debug, Default)]
struct PressCounter {
    down: bool,
    presses: u32,
}

impl PressCounter {
    fn observe(&mut self, pressed: bool) -> u32 {
        if pressed && !self.down {
            self.presses += 1;
        }
        self.down = pressed;
        self.presses
    }
}

/// Core detection loop, independent of the device backend.
pub fn detect_with(sampler: &mut dyn KeySampler, policy: TriggerPolicy, skip_delay: bool) -> bool {
    if sampler.any_pressed() {
        return true;
    }
    if skip_delay {
        return false;
    }
    let mut counter = PressCounter::default();
    for _ in 0..policy.samples() {
        sampler.pause(policy.poll);
        if counter.observe(sampler.any_pressed()) >= policy.presses {
            return true;
        }
    }
    false
}

fn key_down(bitmap: &[u8], key: u16) -> bool {
    let key = key as usize;
    bitmap
        .get(key / 8)
        .map(|b| b & (1 << (key % 8)) != 0)
        .unwrap_or(false)
}

/// Samples the key bitmap of every opened input device.
struct DeviceSampler {
    devices: Vec<File>,
    keys: &'static [u16],
}

impl KeySampler for DeviceSampler {
    fn any_pressed(&mut self) -> bool {
        self.devices.iter().any(|dev| {
            let mut bitmap = [0u8; KEY_BITMAP_LEN];
            // SAFETY: the fd is open for the lifetime of `dev` and the buffer
            // length is passed to the kernel through the request size.
            match unsafe { eviocgkey(dev.as_raw_fd(), &mut bitmap) } {
                Ok(_) => self.keys.iter().any(|k| key_down(&bitmap, *k)),
                Err(_) => false,
            }
        })
    }

    fn pause(&mut self, d: Duration) {
        std::thread::sleep(d);
    }
}

/// The shipped [`SafemodeTrigger`]: volume keys on `/dev/input/event*`.
#[derive(Debug, Clone)]
pub struct KeyTrigger {
    input_dir: PathBuf,
    policy: TriggerPolicy,
}

impl KeyTrigger {
    pub fn new(input_dir: impl Into<PathBuf>, policy: TriggerPolicy) -> Self {
        Self {
            input_dir: input_dir.into(),
            policy,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.input_dir, TriggerPolicy::from_settings(settings))
    }

    fn open_devices(&self) -> Vec<File> {
        let entries = match fs::read_dir(&self.input_dir) {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!(
                    target: LOG_TAG,
                    input_dir = %self.input_dir.display(),
                    "no input devices: {e}"
                );
                return Vec::new();
            }
        };
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with("event"))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();
        paths.iter().filter_map(|p| File::open(p).ok()).collect()
    }
}

impl SafemodeTrigger for KeyTrigger {
    fn detect(&self, skip_delay: bool) -> bool {
        let devices = self.open_devices();
        if devices.is_empty() {
            return false;
        }
        let mut sampler = DeviceSampler {
            devices,
            keys: &[KEY_VOLUMEDOWN, KEY_VOLUMEUP],
        };
        detect_with(&mut sampler, self.policy, skip_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct Scripted {
        samples: VecDeque<bool>,
        taken: usize,
    }

    impl Scripted {
        fn new(samples: &[bool]) -> Self {
            Self {
                samples: samples.iter().copied().collect(),
                taken: 0,
            }
        }
    }

    impl KeySampler for Scripted {
        fn any_pressed(&mut self) -> bool {
            self.taken += 1;
            self.samples.pop_front().unwrap_or(false)
        }
        fn pause(&mut self, _d: Duration) {}
    }

    fn policy(presses: u32) -> TriggerPolicy {
        TriggerPolicy {
            window: Duration::from_millis(100),
            poll: Duration::from_millis(10),
            presses,
        }
    }

    #[test]
    fn test_held_key_triggers_immediately() {
        let mut s = Scripted::new(&[true]);
        assert!(detect_with(&mut s, policy(5), false));
        assert_eq!(s.taken, 1);
    }

    #[test]
    fn test_skip_delay_only_checks_once() {
        let mut s = Scripted::new(&[false, true, false, true]);
        assert!(!detect_with(&mut s, policy(1), true));
        assert_eq!(s.taken, 1);
    }

    #[test]
    fn test_presses_within_window_trigger() {
        let mut s = Scripted::new(&[false, true, false, true, true, false, true]);
        assert!(detect_with(&mut s, policy(3), false));
    }

    #[test]
    fn test_holding_counts_as_one_press() {
        let mut s = Scripted::new(&[false, true, true, true, true, true, true, true]);
        assert!(!detect_with(&mut s, policy(2), false));
        // 1 initial sample + 10 samples in the window.
        assert_eq!(s.taken, 11);
    }

    #[test]
    fn test_key_bitmap_lookup() {
        let mut bitmap = [0u8; KEY_BITMAP_LEN];
        bitmap[(KEY_VOLUMEDOWN / 8) as usize] |= 1 << (KEY_VOLUMEDOWN % 8);
        assert!(key_down(&bitmap, KEY_VOLUMEDOWN));
        assert!(!key_down(&bitmap, KEY_VOLUMEUP));
        assert!(!key_down(&bitmap[..1], KEY_VOLUMEDOWN));
    }

    #[test]
    fn test_no_devices_is_not_triggered() {
        let td = tempfile::tempdir().expect("tmpdir");
        let trigger = KeyTrigger::new(td.path(), policy(1));
        assert!(!trigger.detect(false));
        let missing = KeyTrigger::new(td.path().join("absent"), policy(1));
        assert!(!missing.detect(false));
    }

    #[test]
    fn test_non_input_files_never_report_presses() {
        let td = tempfile::tempdir().expect("tmpdir");
        fs::write(td.path().join("event0"), b"not a device").expect("write");
        let trigger = KeyTrigger::new(td.path(), policy(1));
        assert!(!trigger.detect(true));
    }
}
