//! Launch argument parsing.
//!
//! Semantics
//! - A leading run of single-dash options (`-Xzygote`, `-Dkey=value`, a lone
//!   `-`) is the VM-argument prefix; a bare `--` ends it and is dropped.
//! - The next token is the parent directory, unless it is one of the
//!   bootstrap flags below (the parent directory is optional).
//! - `--zygote`, `--start-system-server`, `--application` and
//!   `--nice-name=<name>` are recognized in that order; the first other token
//!   is the class name and everything after it is passed through verbatim.

use crate::errors::BootstrapError;
use crate::launch::{LaunchConfig, Mode};

const ZYGOTE: &str = "--zygote";
const START_SYSTEM_SERVER: &str = "--start-system-server";
const APPLICATION: &str = "--application";
const NICE_NAME_PREFIX: &str = "--nice-name=";

/// Process name used by the supervisor unless `--nice-name=` overrides it.
pub const ZYGOTE_NICE_NAME: &str = "zygote";

/// Usage line printed on configuration errors.
pub const USAGE: &str =
    "Usage: app_process [java-options] cmd-dir start-class-name [options]";

/// Length of the VM-argument prefix of `args`, including a terminating `--`.
pub fn vm_args_prefix_len(args: &[String]) -> usize {
    for (i, a) in args.iter().enumerate() {
        if a == "--" {
            return i + 1;
        }
        if !is_vm_option(a) {
            return i;
        }
    }
    args.len()
}

fn is_vm_option(token: &str) -> bool {
    token.starts_with('-') && !token.starts_with("--")
}

fn is_bootstrap_flag(token: &str) -> bool {
    token == ZYGOTE
        || token == START_SYSTEM_SERVER
        || token == APPLICATION
        || token.starts_with(NICE_NAME_PREFIX)
}

/// Parse the argument vector (argv[0] excluded) into a [`LaunchConfig`].
pub fn parse_launch_args(args: &[String]) -> Result<LaunchConfig, BootstrapError> {
    let prefix = vm_args_prefix_len(args);
    let vm_args: Vec<String> = args[..prefix]
        .iter()
        .filter(|a| a.as_str() != "--")
        .cloned()
        .collect();

    let mut zygote = false;
    let mut start_system_server = false;
    let mut application = false;
    let mut parent_dir: Option<String> = None;
    let mut nice_name: Option<String> = None;
    let mut class_name: Option<String> = None;
    let mut trailing_args: Vec<String> = Vec::new();

    let mut rest = args[prefix..].iter();
    let mut first = true;
    while let Some(arg) = rest.next() {
        if first {
            first = false;
            if !is_bootstrap_flag(arg) {
                parent_dir = Some(arg.clone());
                continue;
            }
        }
        if arg == ZYGOTE {
            zygote = true;
            nice_name = Some(ZYGOTE_NICE_NAME.to_string());
        } else if arg == START_SYSTEM_SERVER {
            start_system_server = true;
        } else if arg == APPLICATION {
            application = true;
        } else if let Some(name) = arg.strip_prefix(NICE_NAME_PREFIX) {
            nice_name = Some(name.to_string());
        } else {
            class_name = Some(arg.clone());
            trailing_args.extend(rest.by_ref().cloned());
            break;
        }
    }

    let mode = if zygote {
        Mode::Zygote
    } else if application {
        Mode::Application
    } else {
        Mode::Tool
    };

    match (mode, &class_name) {
        (Mode::Zygote, Some(class)) => return Err(BootstrapError::ConflictingMode(class.clone())),
        (Mode::Application | Mode::Tool, None) => return Err(BootstrapError::NoClassName),
        _ => {}
    }

    Ok(LaunchConfig {
        parent_dir,
        mode,
        start_system_server,
        nice_name,
        class_name,
        trailing_args,
        vm_args,
    })
}
