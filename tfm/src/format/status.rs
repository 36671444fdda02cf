use std::io::Write;

use crate::console;
use crate::format::ansi;
use crate::process::{ExecutionFlags, ExecutionResult};
use crate::terminate::{ExitProcess, Terminate};

pub const STATUS_LINE_WIDTH: usize = 120;
const MIN_PADDING: usize = 1;

fn status_indicator(success: bool) -> String {
    if success {
        format!("[ {} ]", ansi::green(ansi::CHECK_MARK))
    } else {
        format!("[ {} ]", ansi::red(ansi::CROSS_MARK))
    }
}

fn outcome_text(success: bool, flags: &ExecutionFlags) -> String {
    if success {
        return "(done)".to_string();
    }
    let message = if flags.strict {
        &flags.strict_message
    } else {
        &flags.no_strict_message
    };
    format!("({})", ansi::red(message))
}

/// `[tag] message<padding> [ ✓ ]`, padded so the visible text spans
/// [`STATUS_LINE_WIDTH`] columns. The outcome, when enabled, is appended past
/// that width.
pub fn render_status_line(
    entrypoint_tag: &str,
    message: &str,
    success: bool,
    flags: &ExecutionFlags,
) -> String {
    let indicator = status_indicator(success);
    let used = ansi::visual_width(entrypoint_tag)
        + 1
        + ansi::visual_width(message)
        + 1
        + ansi::visual_width(&indicator);
    let padding = STATUS_LINE_WIDTH.saturating_sub(used).max(MIN_PADDING);

    let mut line = format!(
        "{} {message}{} {indicator}",
        ansi::gray(entrypoint_tag),
        " ".repeat(padding)
    );
    if flags.print_outcome {
        line.push(' ');
        line.push_str(&outcome_text(success, flags));
    }
    line
}

/// Prints the status line and, on failure, the fail message. Never terminates.
pub(crate) fn emit_status(
    message: &str,
    result: &ExecutionResult,
    flags: &ExecutionFlags,
    fail_message: Option<&str>,
) {
    if !flags.print_status {
        return;
    }
    let line = render_status_line(
        &console::entrypoint_tag(),
        message,
        result.success(),
        flags,
    );
    {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        let _ = writeln!(lock, "{line}");
    }
    if !result.success() {
        if let Some(fail_message) = fail_message.filter(|m| !m.is_empty()) {
            console::error(fail_message);
        }
    }
}

pub fn present_with(
    terminator: &dyn Terminate,
    message: &str,
    result: &ExecutionResult,
    flags: &ExecutionFlags,
    fail_message: Option<&str>,
) {
    if !flags.print_status {
        return;
    }
    emit_status(message, result, flags, fail_message);
    if flags.strict && !result.success() {
        terminator.terminate(result.exit_code());
    }
}

/// Renders one status line for `result`. A strict failure ends the program
/// here with the result's exit code.
pub fn present(
    message: &str,
    result: &ExecutionResult,
    flags: &ExecutionFlags,
    fail_message: Option<&str>,
) {
    present_with(&ExitProcess, message, result, flags, fail_message);
}
