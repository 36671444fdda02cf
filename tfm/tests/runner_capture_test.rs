use std::time::Duration;

use tfm::process::{ExecutionFlags, ExecutionResult, run};

fn capture_flags(print_output: bool) -> ExecutionFlags {
    ExecutionFlags {
        decorate_output: true,
        print_output,
        print_message: false,
        ..ExecutionFlags::default()
    }
}

/// Runs on a helper thread so a hung pump fails the test instead of the suite.
fn run_with_deadline(command_line: &str, flags: ExecutionFlags) -> ExecutionResult {
    let command_line = command_line.to_string();
    let (tx, rx) = std::sync::mpsc::channel::<ExecutionResult>();
    std::thread::spawn(move || {
        let result = run(&command_line, "capture test", &flags, None);
        let _ = tx.send(result);
    });
    rx.recv_timeout(Duration::from_secs(10))
        .expect("timed out waiting for the runner to return")
}

#[cfg(unix)]
#[test]
fn echo_hello_is_captured_in_pipe_mode() {
    let result = run("echo hello", "msg", &capture_flags(true), None);
    assert_eq!(result.exit_code(), 0);
    assert!(result.success());
    assert_eq!(result.captured_stdout(), "hello\n");
    assert_eq!(result.captured_stderr(), "");
    assert_eq!(result.error_detail(), "");
}

#[cfg(unix)]
#[test]
fn each_stream_keeps_its_own_line_order() {
    let result = run_with_deadline(
        "sh -c 'for i in 1 2 3 4 5; do echo out$i; echo err$i 1>&2; done'",
        capture_flags(true),
    );
    assert!(result.success());
    assert_eq!(result.captured_stdout(), "out1\nout2\nout3\nout4\nout5\n");
    assert_eq!(result.captured_stderr(), "err1\nerr2\nerr3\nerr4\nerr5\n");
}

#[cfg(unix)]
#[test]
fn relayed_output_larger_than_the_print_queue_is_fully_captured() {
    let result = run_with_deadline(
        "sh -c 'i=0; while [ $i -lt 600 ]; do echo line$i; echo warn$i 1>&2; i=$((i+1)); done'",
        capture_flags(true),
    );
    assert!(result.success());
    let stdout = result.captured_stdout().lines().collect::<Vec<_>>();
    let stderr = result.captured_stderr().lines().collect::<Vec<_>>();
    assert_eq!(stdout.len(), 600);
    assert_eq!(stderr.len(), 600);
    assert_eq!(stdout.first(), Some(&"line0"));
    assert_eq!(stdout.last(), Some(&"line599"));
    assert_eq!(stderr.last(), Some(&"warn599"));
}

#[cfg(unix)]
#[test]
fn no_output_leaves_empty_buffers_and_does_not_hang() {
    let result = run_with_deadline("sh -c 'exit 0'", capture_flags(false));
    assert!(result.success());
    assert_eq!(result.captured_stdout(), "");
    assert_eq!(result.captured_stderr(), "");
}

#[cfg(unix)]
#[test]
fn stdin_is_closed_in_pipe_mode() {
    let result = run_with_deadline("sh -c 'cat; echo done'", capture_flags(false));
    assert!(result.success());
    assert_eq!(result.captured_stdout(), "done\n");
}

#[cfg(unix)]
#[test]
fn crlf_and_missing_final_newline_are_normalized() {
    let result = run_with_deadline(r"printf 'a\r\nb\r\ntail'", capture_flags(false));
    assert!(result.success());
    assert_eq!(result.captured_stdout(), "a\nb\ntail\n");
}

#[cfg(unix)]
#[test]
fn non_zero_exit_keeps_captured_output() {
    let result = run_with_deadline(
        "sh -c 'echo partial; echo boom 1>&2; exit 4'",
        capture_flags(false),
    );
    assert!(!result.success());
    assert_eq!(result.exit_code(), 4);
    assert_eq!(result.captured_stdout(), "partial\n");
    assert_eq!(result.captured_stderr(), "boom\n");
    assert_eq!(result.error_detail(), "");
}

#[cfg(unix)]
#[test]
fn repeated_runs_produce_identical_results() {
    let command_line = "sh -c 'echo one; echo two 1>&2; exit 2'";
    let first = run_with_deadline(command_line, capture_flags(false));
    let second = run_with_deadline(command_line, capture_flags(false));
    assert_eq!(first, second);
    assert_eq!(first.exit_code(), 2);
}

#[cfg(unix)]
#[test]
fn pass_through_mode_captures_nothing() {
    let flags = ExecutionFlags {
        print_message: false,
        ..ExecutionFlags::default()
    };
    let result = run_with_deadline("echo visible-on-terminal", flags);
    assert!(result.success());
    assert_eq!(result.captured_stdout(), "");
    assert_eq!(result.captured_stderr(), "");
}

#[cfg(unix)]
#[test]
fn concurrent_runs_do_not_share_buffers() {
    let handles = (0..4)
        .map(|n| {
            std::thread::spawn(move || {
                let command_line = format!("sh -c 'for i in 1 2 3; do echo job{n}-$i; done'");
                run(&command_line, "concurrent", &capture_flags(false), None)
            })
        })
        .collect::<Vec<_>>();
    for (n, handle) in handles.into_iter().enumerate() {
        let result = handle.join().expect("runner thread");
        assert_eq!(
            result.captured_stdout(),
            format!("job{n}-1\njob{n}-2\njob{n}-3\n")
        );
    }
}
