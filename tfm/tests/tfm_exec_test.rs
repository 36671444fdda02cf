#![cfg(unix)]

use std::io::Write;
use std::process::{Command, Output, Stdio};
use std::time::Duration;

use tfm::format::ansi::{strip_ansi, visual_width};
use tfm::format::status::STATUS_LINE_WIDTH;

fn tfm_exec() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tfm-exec"));
    cmd.env_remove("TFM_DEBUG");
    cmd
}

fn output_with_deadline(mut cmd: Command, stdin: Option<&'static str>) -> Output {
    let (tx, rx) = std::sync::mpsc::channel::<std::io::Result<Output>>();
    std::thread::spawn(move || {
        let out = (|| {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
            cmd.stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });
            let mut child = cmd.spawn()?;
            if let Some(text) = stdin {
                let mut pipe = child.stdin.take().expect("stdin pipe");
                pipe.write_all(text.as_bytes())?;
            }
            child.wait_with_output()
        })();
        let _ = tx.send(out);
    });
    rx.recv_timeout(Duration::from_secs(15))
        .expect("timed out waiting for tfm-exec")
        .expect("tfm-exec output")
}

fn stdout_of(out: &Output) -> String {
    strip_ansi(&String::from_utf8_lossy(&out.stdout))
}

fn stderr_of(out: &Output) -> String {
    strip_ansi(&String::from_utf8_lossy(&out.stderr))
}

#[test]
fn strict_failure_terminates_with_the_command_exit_code() {
    let mut cmd = tfm_exec();
    cmd.args(["--strict", "--decorate", "--report", "sh -c 'exit 7'"]);
    let out = output_with_deadline(cmd, None);
    assert_eq!(out.status.code(), Some(7));
    let stdout = stdout_of(&out);
    assert!(!stdout.contains("exit_code="), "stdout:\n{stdout}");
    assert!(stdout.contains("[ ✗ ]"), "stdout:\n{stdout}");
}

#[test]
fn strict_failure_terminates_even_without_a_status_line() {
    let mut cmd = tfm_exec();
    cmd.args(["--strict", "--no-status", "--report", "sh -c 'exit 5'"]);
    let out = output_with_deadline(cmd, None);
    assert_eq!(out.status.code(), Some(5));
    let stdout = stdout_of(&out);
    assert!(!stdout.contains("exit_code="), "stdout:\n{stdout}");
    assert!(!stdout.contains("[ ✗ ]"), "stdout:\n{stdout}");
}

#[test]
fn non_strict_failure_returns_to_the_caller() {
    let mut cmd = tfm_exec();
    cmd.args(["--decorate", "--report", "sh -c 'exit 7'"]);
    let out = output_with_deadline(cmd, None);
    assert_eq!(out.status.code(), Some(7));
    assert!(stdout_of(&out).contains("exit_code=7 success=false"));
}

#[test]
fn extra_valid_exit_codes_count_as_success() {
    let mut cmd = tfm_exec();
    cmd.args([
        "--strict",
        "--report",
        "--valid-exit-code",
        "0",
        "--valid-exit-code",
        "2",
        "sh -c 'exit 2'",
    ]);
    let out = output_with_deadline(cmd, None);
    assert_eq!(out.status.code(), Some(2));
    let stdout = stdout_of(&out);
    assert!(stdout.contains("exit_code=2 success=true"), "stdout:\n{stdout}");
    assert!(stdout.contains("[ ✓ ]"), "stdout:\n{stdout}");
}

#[test]
fn pass_through_mode_wires_the_terminal_stdin() {
    let mut cmd = tfm_exec();
    cmd.args(["--no-status", "sh -c 'read line; echo got:$line'"]);
    let out = output_with_deadline(cmd, Some("ping\n"));
    assert_eq!(out.status.code(), Some(0));
    assert!(stdout_of(&out).contains("got:ping"));
}

#[test]
fn decorated_lines_are_tagged_by_stream() {
    let mut cmd = tfm_exec();
    cmd.args([
        "--decorate",
        "--no-status",
        "sh -c 'echo to-out; echo to-err 1>&2'",
    ]);
    let out = output_with_deadline(cmd, None);
    assert_eq!(out.status.code(), Some(0));
    let stdout = stdout_of(&out);
    assert!(stdout.contains("[cmd] to-out"), "stdout:\n{stdout}");
    assert!(stdout.contains("[err] to-err"), "stdout:\n{stdout}");
}

#[test]
fn status_line_spans_the_fixed_width() {
    let mut cmd = tfm_exec();
    cmd.args([
        "--decorate",
        "--no-output",
        "--message",
        "Checking formatting",
        "true",
    ]);
    let out = output_with_deadline(cmd, None);
    assert_eq!(out.status.code(), Some(0));
    let stdout = stdout_of(&out);
    let line = stdout
        .lines()
        .find(|line| line.starts_with("[tfm-exec] Checking formatting"))
        .unwrap_or_else(|| panic!("no status line in:\n{stdout}"));
    assert_eq!(visual_width(line), STATUS_LINE_WIDTH);
    assert!(line.ends_with("[ ✓ ]"));
}

#[test]
fn outcome_and_fail_message_are_reported_on_failure() {
    let mut cmd = tfm_exec();
    cmd.args([
        "--outcome",
        "--fail-message",
        "lint is unhappy",
        "sh -c 'exit 1'",
    ]);
    let out = output_with_deadline(cmd, None);
    assert_eq!(out.status.code(), Some(1));
    assert!(stdout_of(&out).contains("[ ✗ ] (continuing...)"));
    assert!(stderr_of(&out).contains("lint is unhappy"));
}

#[test]
fn launch_failure_reports_detail_and_exits_one() {
    let mut cmd = tfm_exec();
    cmd.args(["--no-status", "tfm-definitely-not-a-real-binary --flag"]);
    let out = output_with_deadline(cmd, None);
    assert_eq!(out.status.code(), Some(1));
    assert!(
        stderr_of(&out).contains("failed to start tfm-definitely-not-a-real-binary"),
        "stderr:\n{}",
        stderr_of(&out)
    );
}

#[test]
fn working_directory_is_applied_to_the_child() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("marker.txt"), "x").expect("marker");
    let mut cmd = tfm_exec();
    cmd.arg("--cwd")
        .arg(dir.path())
        .args(["--decorate", "--no-status", "ls"]);
    let out = output_with_deadline(cmd, None);
    assert_eq!(out.status.code(), Some(0));
    assert!(stdout_of(&out).contains("marker.txt"));
}
