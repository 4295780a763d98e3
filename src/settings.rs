#![allow(clippy::module_name_repetitions)]
//! Bootstrap settings: YAML file plus environment overrides.
//!
//! Lookup order:
//! 1) `APP_PROCESS_CONFIG` (path) or `/system/etc/app_process.yaml`; a missing
//!    file yields defaults, a malformed one is reported and ignored.
//! 2) `APP_PROCESS_CONF_DIR`, `APP_PROCESS_INPUT_DIR`, `APP_PROCESS_EXEC_PATH`,
//!    `APP_PROCESS_LAUNCHER`, `APP_PROCESS_DRY_RUN` override single fields.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::logging::LOG_TAG;

pub const DEFAULT_CONFIG_PATH: &str = "/system/etc/app_process.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Binary re-executed by the compat layout fixup.
    pub exec_path: PathBuf,
    /// Managed runtime launcher the binary hands off to.
    pub launcher: PathBuf,
    /// Directory holding the extension's flag files
    /// (`disabled`, `disable_safemode`, `safemode_nodelay`).
    pub conf_dir: PathBuf,
    /// Package name of the extension installer app.
    pub installer_package: String,
    /// Directory scanned for input devices by the safemode trigger.
    pub input_dir: PathBuf,
    pub safemode_window_ms: u64,
    pub safemode_poll_ms: u64,
    pub safemode_presses: u32,
    /// Print the hand-off command instead of executing it.
    pub dry_run: bool,
    /// System property overrides, consulted before the platform store.
    pub properties: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            exec_path: PathBuf::from("/system/bin/app_process"),
            launcher: PathBuf::from("/system/bin/dalvikvm"),
            conf_dir: PathBuf::from("/data/data/de.robv.android.xposed.installer/conf"),
            installer_package: "de.robv.android.xposed.installer".to_string(),
            input_dir: PathBuf::from("/dev/input"),
            safemode_window_ms: 2000,
            safemode_poll_ms: 50,
            safemode_presses: 5,
            dry_run: false,
            properties: BTreeMap::new(),
        }
    }
}

fn env_is_truthy(key: &str) -> bool {
    matches!(
        env::var(key).ok().as_deref(),
        Some("1" | "true" | "TRUE" | "yes" | "YES" | "on" | "ON")
    )
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

impl Settings {
    /// Parse settings from YAML text; absent keys keep their defaults.
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).context("invalid app_process settings")
    }

    /// Read settings from a file. Ok(None) when the file does not exist.
    pub fn from_file(path: &Path) -> Result<Option<Self>> {
        match fs::read_to_string(path) {
            Ok(text) => Self::from_yaml(&text)
                .with_context(|| format!("while reading {}", path.display()))
                .map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    /// Load settings for this process. Never fails: problems are logged and
    /// defaults are used instead.
    pub fn load() -> Self {
        let path = env_path("APP_PROCESS_CONFIG").unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        let mut settings = match Self::from_file(&path) {
            Ok(Some(s)) => s,
            Ok(None) => Self::default(),
            Err(e) => {
                tracing::warn!(target: LOG_TAG, "ignoring settings: {e:#}");
                Self::default()
            }
        };
        settings.apply_env_overrides();
        settings
    }

    pub fn apply_env_overrides(&mut self) {
        if let Some(p) = env_path("APP_PROCESS_CONF_DIR") {
            self.conf_dir = p;
        }
        if let Some(p) = env_path("APP_PROCESS_INPUT_DIR") {
            self.input_dir = p;
        }
        if let Some(p) = env_path("APP_PROCESS_EXEC_PATH") {
            self.exec_path = p;
        }
        if let Some(p) = env_path("APP_PROCESS_LAUNCHER") {
            self.launcher = p;
        }
        if env_is_truthy("APP_PROCESS_DRY_RUN") {
            self.dry_run = true;
        }
    }
}
