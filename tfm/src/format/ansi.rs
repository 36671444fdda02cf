use unicode_width::UnicodeWidthStr;

pub const CHECK_MARK: &str = "\u{2713}";
pub const CROSS_MARK: &str = "\u{2717}";

pub fn red(text: &str) -> String {
    format!("\u{1b}[31m{text}\u{1b}[0m")
}

pub fn green(text: &str) -> String {
    format!("\u{1b}[32m{text}\u{1b}[0m")
}

pub fn blue(text: &str) -> String {
    format!("\u{1b}[34m{text}\u{1b}[0m")
}

pub fn magenta(text: &str) -> String {
    format!("\u{1b}[35m{text}\u{1b}[0m")
}

pub fn yellow(text: &str) -> String {
    format!("\u{1b}[33m{text}\u{1b}[0m")
}

pub fn gray(text: &str) -> String {
    format!("\u{1b}[30;1m{text}\u{1b}[0m")
}

pub fn strip_ansi(text: &str) -> String {
    let stripped = strip_ansi_escapes::strip(text.as_bytes());
    String::from_utf8_lossy(&stripped).into_owned()
}

/// Terminal columns occupied by `text` once escape sequences are removed.
pub fn visual_width(text: &str) -> usize {
    UnicodeWidthStr::width(strip_ansi(text).as_str())
}
