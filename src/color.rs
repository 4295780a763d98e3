#![allow(clippy::module_name_repetitions)]
//! Color mode configuration and ANSI painting helpers for stderr output.
//!
//! Policy:
//! - Only the usage text and one-line error/warning messages printed before
//!   the runtime takes over are painted; stdout diagnostics stay plain.
//! - Precompute once per scope: `let use_err = color_enabled_stderr();`
//! - Keep exact message strings; helpers only add color when enabled.

use clap::ValueEnum;
use once_cell::sync::OnceCell;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, ValueEnum)]
pub enum ColorMode {
    Auto,
    #[value(alias = "on")]
    #[value(alias = "true")]
    #[value(alias = "yes")]
    Always,
    #[value(alias = "off")]
    #[value(alias = "false")]
    #[value(alias = "no")]
    Never,
}

static COLOR_MODE: OnceCell<Option<ColorMode>> = OnceCell::new();

fn parse_color_mode(s: &str) -> Option<ColorMode> {
    ColorMode::from_str(s.trim(), true).ok()
}

fn env_color_mode_pref() -> Option<ColorMode> {
    *COLOR_MODE.get_or_init(|| {
        std::env::var("APP_PROCESS_COLOR")
            .ok()
            .and_then(|v| parse_color_mode(&v))
    })
}

fn no_color_env() -> bool {
    // Per https://no-color.org/
    std::env::var("NO_COLOR").is_ok()
}

fn color_enabled_for(is_tty: bool) -> bool {
    // NO_COLOR disables color unconditionally
    if no_color_env() {
        return false;
    }
    match env_color_mode_pref() {
        Some(ColorMode::Always) => true,
        Some(ColorMode::Never) => false,
        Some(ColorMode::Auto) | None => is_tty,
    }
}

pub fn color_enabled_stderr() -> bool {
    color_enabled_for(atty::is(atty::Stream::Stderr))
}

/// Wrap string with ANSI color code when enabled; otherwise return unchanged.
pub fn paint(enabled: bool, code: &str, s: &str) -> String {
    if enabled {
        format!("{code}{s}\x1b[0m")
    } else {
        s.to_string()
    }
}

pub fn log_warn_stderr(use_color: bool, msg: &str) {
    eprintln!("{}", paint(use_color, "\x1b[33m", msg));
}

pub fn log_error_stderr(use_color: bool, msg: &str) {
    eprintln!("{}", paint(use_color, "\x1b[31;1m", msg));
}
