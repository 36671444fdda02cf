use std::io::Write;
use std::path::Path;

use once_cell::sync::Lazy;

use crate::format::ansi;

const FALLBACK_ENTRYPOINT: &str = "tf";

static ENTRYPOINT_NAME: Lazy<String> = Lazy::new(|| {
    std::env::args_os()
        .next()
        .as_deref()
        .map(Path::new)
        .and_then(|p| p.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_ENTRYPOINT.to_string())
});

/// Basename of the running executable, used to tag every line we print.
pub fn entrypoint_name() -> String {
    ENTRYPOINT_NAME.clone()
}

pub fn entrypoint_tag() -> String {
    format!("[{}]", entrypoint_name())
}

fn write_stderr_line(line: &str) {
    let stderr = std::io::stderr();
    let mut lock = stderr.lock();
    let _ = writeln!(lock, "{line}");
}

pub fn info(message: &str) {
    write_stderr_line(&format!("{} {message}", ansi::gray(&entrypoint_tag())));
}

pub fn warn(message: &str) {
    write_stderr_line(&format!("{} {message}", ansi::yellow(&entrypoint_tag())));
}

pub fn error(message: &str) {
    write_stderr_line(&format!("{} {message}", ansi::red(&entrypoint_tag())));
}

pub fn debug_enabled() -> bool {
    std::env::var("TFM_DEBUG")
        .ok()
        .is_some_and(|value| !value.trim().is_empty())
}

pub fn debug(message: &str) {
    if debug_enabled() {
        write_stderr_line(&format!("[DEBUG] {message}"));
    }
}
