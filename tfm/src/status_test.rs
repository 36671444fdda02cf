use std::sync::Mutex;

use crate::format::ansi::{self, strip_ansi, visual_width};
use crate::format::status::{STATUS_LINE_WIDTH, present_with, render_status_line};
use crate::process::{ExecutionFlags, ExecutionResult};
use crate::terminate::Terminate;

#[derive(Default)]
struct RecordingTerminator {
    codes: Mutex<Vec<i32>>,
}

impl Terminate for RecordingTerminator {
    fn terminate(&self, exit_code: i32) {
        self.codes.lock().unwrap().push(exit_code);
    }
}

#[test]
fn status_line_spans_configured_width_for_short_messages() {
    let flags = ExecutionFlags::default();
    for len in [0usize, 1, 17, 60, 100, 108] {
        let message = "m".repeat(len);
        for success in [true, false] {
            let line = render_status_line("[tf]", &message, success, &flags);
            assert_eq!(
                visual_width(&line),
                STATUS_LINE_WIDTH,
                "len={len} success={success}"
            );
        }
    }
}

#[test]
fn status_line_measures_message_without_color_codes() {
    let flags = ExecutionFlags::default();
    let message = format!("Checking product {} is valid", ansi::blue("product1"));
    let line = render_status_line("[tf]", &message, true, &flags);
    assert_eq!(strip_ansi(&line).chars().count(), STATUS_LINE_WIDTH);
}

#[test]
fn status_line_keeps_one_space_when_message_overflows() {
    let flags = ExecutionFlags::default();
    let message = "x".repeat(200);
    let line = render_status_line("[tf]", &message, true, &flags);
    let plain = strip_ansi(&line);
    assert_eq!(plain, format!("[tf] {message}  [ \u{2713} ]"));
}

#[test]
fn status_line_shows_green_check_or_red_cross() {
    let flags = ExecutionFlags::default();
    let ok = render_status_line("[tf]", "msg", true, &flags);
    let failed = render_status_line("[tf]", "msg", false, &flags);
    assert!(ok.contains(&ansi::green(ansi::CHECK_MARK)));
    assert!(failed.contains(&ansi::red(ansi::CROSS_MARK)));
    assert!(strip_ansi(&ok).starts_with("[tf] msg "));
}

#[test]
fn status_line_outcome_follows_strictness() {
    let done = render_status_line(
        "[tf]",
        "msg",
        true,
        &ExecutionFlags {
            print_outcome: true,
            ..ExecutionFlags::default()
        },
    );
    assert!(strip_ansi(&done).ends_with("[ \u{2713} ] (done)"));

    let continuing = render_status_line(
        "[tf]",
        "msg",
        false,
        &ExecutionFlags {
            print_outcome: true,
            ..ExecutionFlags::default()
        },
    );
    assert!(strip_ansi(&continuing).ends_with("[ \u{2717} ] (continuing...)"));

    let aborting = render_status_line(
        "[tf]",
        "msg",
        false,
        &ExecutionFlags {
            print_outcome: true,
            strict: true,
            ..ExecutionFlags::default()
        },
    );
    assert!(aborting.contains(&ansi::red("aborting...")));
}

#[test]
fn status_line_without_outcome_has_no_suffix() {
    let line = render_status_line("[tf]", "msg", true, &ExecutionFlags::default());
    assert!(strip_ansi(&line).ends_with("[ \u{2713} ]"));
}

#[test]
fn present_terminates_on_strict_failure() {
    let terminator = RecordingTerminator::default();
    let flags = ExecutionFlags {
        strict: true,
        ..ExecutionFlags::default()
    };
    let result = ExecutionResult::completed(7, &flags, String::new(), String::new());
    present_with(&terminator, "msg", &result, &flags, Some("it broke"));
    assert_eq!(*terminator.codes.lock().unwrap(), vec![7]);
}

#[test]
fn present_does_not_terminate_on_success_or_non_strict_failure() {
    let terminator = RecordingTerminator::default();
    let strict = ExecutionFlags {
        strict: true,
        ..ExecutionFlags::default()
    };
    let ok = ExecutionResult::completed(0, &strict, String::new(), String::new());
    present_with(&terminator, "msg", &ok, &strict, None);

    let lenient = ExecutionFlags::default();
    let failed = ExecutionResult::completed(3, &lenient, String::new(), String::new());
    present_with(&terminator, "msg", &failed, &lenient, None);

    assert!(terminator.codes.lock().unwrap().is_empty());
}

#[test]
fn present_is_a_no_op_without_print_status() {
    let terminator = RecordingTerminator::default();
    let flags = ExecutionFlags {
        strict: true,
        ..ExecutionFlags::silent()
    };
    let result = ExecutionResult::completed(7, &flags, String::new(), String::new());
    present_with(&terminator, "msg", &result, &flags, Some("ignored"));
    assert!(terminator.codes.lock().unwrap().is_empty());
}
