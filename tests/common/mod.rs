#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};

/// Hermetic environment for running the binary: empty flag directory, no
/// input devices, dry-run hand-off.
pub struct Sandbox {
    pub dir: tempfile::TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tmpdir");
        std::fs::create_dir_all(dir.path().join("conf")).expect("conf dir");
        std::fs::create_dir_all(dir.path().join("input")).expect("input dir");
        Self { dir }
    }

    pub fn conf_dir(&self) -> PathBuf {
        self.dir.path().join("conf")
    }

    pub fn set_flag(&self, name: &str) {
        std::fs::write(self.conf_dir().join(name), "").expect("write flag");
    }

    pub fn write_config(&self, yaml: &str) -> PathBuf {
        let p = self.dir.path().join("app_process.yaml");
        std::fs::write(&p, yaml).expect("write config");
        p
    }

    fn config_path(&self) -> PathBuf {
        self.dir.path().join("app_process.yaml")
    }

    pub fn command(&self, args: &[&str]) -> Command {
        let bin = env!("CARGO_BIN_EXE_app_process");
        let mut cmd = Command::new(bin);
        cmd.args(args)
            .env("APP_PROCESS_CONFIG", self.config_path())
            .env("APP_PROCESS_CONF_DIR", self.conf_dir())
            .env("APP_PROCESS_INPUT_DIR", self.dir.path().join("input"))
            .env("APP_PROCESS_DRY_RUN", "1")
            .env("APP_PROCESS_LOG", "info")
            .env("NO_COLOR", "1")
            .env_remove("NO_ADDR_COMPAT_LAYOUT_FIXUP");
        cmd
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.command(args).output().expect("run app_process")
    }
}

pub fn stdout_of(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).to_string()
}

pub fn stderr_of(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).to_string()
}

/// The `app_process: exec: ...` preview line printed in dry-run mode.
pub fn exec_line(out: &Output) -> Option<String> {
    stderr_of(out)
        .lines()
        .find_map(|l| l.strip_prefix("app_process: exec: ").map(|s| s.to_string()))
}
