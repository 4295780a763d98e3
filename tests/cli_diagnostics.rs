mod common;

use common::{stderr_of, stdout_of, Sandbox};

#[test]
fn test_version_prints_and_exits_zero() {
    let sb = Sandbox::new();
    let out = sb.run(&["--xposedversion"]);
    assert!(out.status.success(), "stderr={}", stderr_of(&out));
    let stdout = stdout_of(&out);
    assert!(
        stdout.starts_with("Xposed version: "),
        "unexpected output: {stdout}"
    );
    assert_eq!(stdout.lines().count(), 1);
    // No launch happened.
    assert!(!stderr_of(&out).contains("app_process: exec:"));
    assert!(!stderr_of(&out).contains("launch prepared"));
}

#[test]
fn test_version_with_extra_args_is_a_normal_launch() {
    let sb = Sandbox::new();
    let out = sb.run(&["--xposedversion", "com.example.Tool"]);
    assert!(out.status.success(), "stderr={}", stderr_of(&out));
    assert!(!stdout_of(&out).contains("Xposed version"));
    assert!(stderr_of(&out).contains("app_process: exec:"));
}

#[test]
fn test_safemode_trigger_reports_not_triggered_without_devices() {
    let sb = Sandbox::new();
    let out = sb.run(&["--xposedtestsafemode"]);
    assert!(out.status.success(), "stderr={}", stderr_of(&out));
    assert_eq!(
        stdout_of(&out),
        "Testing Xposed safemode trigger\nSafemode not triggered\n"
    );
}
